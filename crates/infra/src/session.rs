//! Per-request sessions checked out from a shared pool.
//!
//! ## Lifecycle
//!
//! 1. [`SessionPool::copy`] checks out an independent [`Session`]. Sessions
//!    share the pool's configuration and network connections but never each
//!    other's in-flight state.
//! 2. The session is cheap to clone; every clone refers to the same checkout.
//! 3. [`Session::close`] (or dropping a [`SessionGuard`]) returns the checkout
//!    to the pool. Closing is idempotent, and any clone used afterwards fails
//!    with [`StoreError::SessionClosed`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::document::{Document, StoredDocument};
use crate::error::StoreError;

/// A checked-out connection to a document store backend.
///
/// Returning the connection to its pool happens on drop.
#[async_trait]
pub trait Connection: Send {
    async fn insert(&mut self, collection: &str, doc: StoredDocument) -> Result<(), StoreError>;

    /// All documents of `collection`, newest `created_at` first, at most `limit`.
    async fn find_recent(
        &mut self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Shared, concurrency-safe source of sessions.
#[async_trait]
pub trait SessionPool: Send + Sync {
    /// Check out a fresh session. May wait for capacity or network.
    async fn copy(&self) -> Result<Session, StoreError>;

    /// Number of sessions currently checked out and not yet released.
    fn checked_out(&self) -> usize;
}

#[async_trait]
impl<P> SessionPool for Arc<P>
where
    P: SessionPool + ?Sized,
{
    async fn copy(&self) -> Result<Session, StoreError> {
        (**self).copy().await
    }

    fn checked_out(&self) -> usize {
        (**self).checked_out()
    }
}

/// Handle to one checkout. Clones share the checkout.
#[derive(Clone)]
pub struct Session {
    conn: Arc<Mutex<Option<Box<dyn Connection>>>>,
}

impl Session {
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    pub async fn insert<D: Document>(&self, doc: &D) -> Result<(), StoreError> {
        let stored = StoredDocument::encode(doc)?;
        let mut slot = self.conn.lock().await;
        let conn = slot.as_mut().ok_or(StoreError::SessionClosed)?;
        conn.insert(D::COLLECTION, stored).await
    }

    pub async fn find_recent<D: Document>(&self, limit: usize) -> Result<Vec<D>, StoreError> {
        let stored = {
            let mut slot = self.conn.lock().await;
            let conn = slot.as_mut().ok_or(StoreError::SessionClosed)?;
            conn.find_recent(D::COLLECTION, limit).await?
        };

        stored
            .into_iter()
            .map(|doc| doc.decode::<D>().map_err(StoreError::from))
            .collect()
    }

    /// Release the checkout back to the pool.
    ///
    /// Returns `true` if this call released it. If another clone is mid
    /// operation the checkout cannot be taken here; it is then released when
    /// the last clone drops.
    pub fn close(&self) -> bool {
        match self.conn.try_lock() {
            Ok(mut slot) => slot.take().is_some(),
            Err(_) => {
                tracing::warn!("session busy at close; release deferred to last handle");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.try_lock().map(|slot| slot.is_none()).unwrap_or(false)
    }

    /// A guard that closes this session when dropped.
    pub fn guard(&self) -> SessionGuard {
        SessionGuard {
            session: self.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Closes its session on drop, including during unwinding.
#[derive(Debug)]
pub struct SessionGuard {
    session: Session,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.session.close() {
            tracing::debug!("session released");
        }
    }
}
