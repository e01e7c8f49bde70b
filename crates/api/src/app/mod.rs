//! HTTP application wiring (Axum router + storage wiring).
//!
//! - `services.rs`: storage wiring (which session pool backs the service)
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: plaintext error responses

use std::sync::Arc;

use axum::Router;

use companies_infra::SessionPool;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(pool: Arc<dyn SessionPool>) -> Router {
    routes::router(pool)
}
