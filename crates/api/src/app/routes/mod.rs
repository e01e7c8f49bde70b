use std::sync::Arc;

use axum::{Router, routing::get};

use companies_infra::SessionPool;

use crate::adapter::adapt;
use crate::middleware::{with_request_logging, with_session};

pub mod companies;
pub mod system;

/// Router for the companies collection.
///
/// The collection handler runs inside its session scope, wrapped by the
/// adapter chain with request logging outermost.
pub fn router(pool: Arc<dyn SessionPool>) -> Router {
    let handler = adapt(
        with_session(pool, companies::handle),
        [with_request_logging()],
    );

    Router::new()
        .route("/health", get(system::health))
        .route_service(companies::COLLECTION_PATH, handler)
}
