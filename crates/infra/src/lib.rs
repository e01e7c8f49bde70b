//! Infrastructure layer: document store sessions and their backends.
//!
//! Handlers never touch a pool directly. They work through a [`Session`]
//! checked out from a [`SessionPool`] for the lifetime of one request.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod session;

pub use document::{Document, StoredDocument};
pub use error::StoreError;
pub use memory::MemoryPool;
pub use postgres::PostgresPool;
pub use session::{Connection, Session, SessionGuard, SessionPool};
