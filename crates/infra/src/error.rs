//! Document store errors.

use thiserror::Error;

/// Document store operation error.
///
/// These are **infrastructure errors** (connectivity, capacity, encoding). The
/// messages are surfaced verbatim to HTTP clients, so they stay single-line.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Every session the pool may hand out is currently checked out.
    #[error("session pool exhausted: {max} sessions checked out")]
    PoolExhausted { max: usize },

    /// The backing store cannot be reached.
    #[error("no reachable servers")]
    Disconnected,

    /// The session was already released back to its pool.
    #[error("session already closed")]
    SessionClosed,

    /// A document with the same id already exists in the collection.
    #[error("duplicate key error: collection {collection} id {id}")]
    DuplicateKey { collection: String, id: String },

    /// A document could not be converted to or from its stored form.
    #[error("document encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}
