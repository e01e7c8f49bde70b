//! In-memory document store for tests/dev.
//!
//! Collections live in process memory behind an `RwLock`. The pool counts
//! outstanding checkouts, can cap them, and can simulate losing the backing
//! connection so failure paths are reachable without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::document::StoredDocument;
use crate::error::StoreError;
use crate::session::{Connection, Session, SessionPool};

#[derive(Debug, Default)]
struct Shared {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
    checked_out: AtomicUsize,
    disconnected: AtomicBool,
}

/// In-memory session pool. Clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    shared: Arc<Shared>,
    max_sessions: Option<usize>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse checkouts beyond `max` concurrently outstanding sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = Some(max);
        self
    }

    /// Drop the (simulated) backing connection: session operations fail with
    /// [`StoreError::Disconnected`] until [`MemoryPool::reconnect`].
    pub fn disconnect(&self) {
        self.shared.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.shared.disconnected.store(false, Ordering::SeqCst);
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.shared
            .collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn reserve(&self) -> Result<(), StoreError> {
        let max = self.max_sessions.unwrap_or(usize::MAX);
        self.shared
            .checked_out
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .map(|_| ())
            .map_err(|_| StoreError::PoolExhausted { max })
    }
}

#[async_trait]
impl SessionPool for MemoryPool {
    async fn copy(&self) -> Result<Session, StoreError> {
        self.reserve()?;
        Ok(Session::new(Box::new(MemoryConnection {
            shared: self.shared.clone(),
        })))
    }

    fn checked_out(&self) -> usize {
        self.shared.checked_out.load(Ordering::SeqCst)
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
}

impl MemoryConnection {
    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.shared.disconnected.load(Ordering::SeqCst) {
            return Err(StoreError::Disconnected);
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn insert(&mut self, collection: &str, doc: StoredDocument) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let mut collections = self
            .shared
            .collections
            .write()
            .map_err(|_| StoreError::Disconnected)?;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.iter().any(|d| d.id == doc.id) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                id: doc.id,
            });
        }
        docs.push(doc);
        Ok(())
    }

    async fn find_recent(
        &mut self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.ensure_connected()?;
        let mut docs = self
            .shared
            .collections
            .read()
            .map_err(|_| StoreError::Disconnected)?
            .get(collection)
            .cloned()
            .unwrap_or_default();

        docs.sort_by(|a, b| (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)));
        docs.truncate(limit);
        Ok(docs)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shared.checked_out.fetch_sub(1, Ordering::SeqCst);
    }
}
