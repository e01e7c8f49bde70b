//! Postgres-backed document store.
//!
//! Documents of every collection share one table; the body is stored as
//! JSONB next to the columns used for identity and ordering:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT        NOT NULL,
//!     id         TEXT        NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     body       JSONB       NOT NULL,
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! `created_at` keeps microseconds. Documents are expected to carry creation
//! times at that precision so the body and the sort column agree; ties are
//! broken by id.
//!
//! ## Sessions
//!
//! A session is one `PoolConnection` checked out of the SQLx pool. Dropping the
//! session returns the connection to the pool.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `DuplicateKey` |
//! | anything else | - | `Database` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use crate::document::StoredDocument;
use crate::error::StoreError;
use crate::session::{Connection, Session, SessionPool};

const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT        NOT NULL,
    id         TEXT        NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    body       JSONB       NOT NULL,
    PRIMARY KEY (collection, id)
)
"#;

/// Postgres session pool.
///
/// `PgPool` is internally reference counted and safe for concurrent
/// checkout/return, so this type is cheap to clone and share.
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Connect to `database_url`, establishing at least one connection.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the documents table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionPool for PostgresPool {
    async fn copy(&self) -> Result<Session, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Session::new(Box::new(PostgresConnection { conn })))
    }

    fn checked_out(&self) -> usize {
        (self.pool.size() as usize).saturating_sub(self.pool.num_idle())
    }
}

struct PostgresConnection {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Connection for PostgresConnection {
    #[instrument(skip(self, doc), fields(id = %doc.id), err)]
    async fn insert(&mut self, collection: &str, doc: StoredDocument) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, created_at, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(collection)
        .bind(&doc.id)
        .bind(doc.created_at)
        .bind(&doc.body)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| map_sqlx_error(collection, &doc.id, e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_recent(
        &mut self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, body
            FROM documents
            WHERE collection = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(collection)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok::<_, StoreError>(StoredDocument {
                    id: row.try_get::<String, _>("id")?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                    body: row.try_get::<JsonValue, _>("body")?,
                })
            })
            .collect()
    }
}

fn map_sqlx_error(collection: &str, id: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            };
        }
    }
    StoreError::Database(err)
}
