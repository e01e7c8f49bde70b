use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;
use uuid::Uuid;

use companies_infra::SessionPool;

use crate::adapter::{Adapter, Handler, adapter, call, handler_fn};
use crate::app::errors::ApiError;
use crate::context::SessionContext;

/// Run `handler` inside a per-request session scope.
///
/// This is the innermost layer of a chain: it checks out a session, hands it
/// to `handler` as an argument, and yields a plain [`Handler`] that the
/// other adapters wrap. A handler taking a [`SessionContext`] cannot be
/// mounted without one.
///
/// The session is released when `handler` finishes, whatever the outcome: a
/// normal response, an error response, a panic unwinding through this layer,
/// or the request future being dropped mid-flight. A failed checkout answers
/// `503` for that request only.
pub fn with_session<H, Fut>(pool: Arc<dyn SessionPool>, handler: H) -> Handler
where
    H: Fn(SessionContext, Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    handler_fn(move |req: Request| {
        let pool = pool.clone();
        let handler = handler.clone();
        async move {
            let session = match pool.copy().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "session checkout failed");
                    return ApiError::SessionUnavailable(e).into_response();
                }
            };
            let _release = session.guard();
            tracing::debug!("session checked out");

            handler(SessionContext::new(session), req).await
        }
    })
}

/// Open an `http_request` span per request and log its outcome.
pub fn with_request_logging() -> Adapter {
    adapter(|inner: Handler| {
        handler_fn(move |req: Request| {
            let inner = inner.clone();
            let span = tracing::info_span!(
                "http_request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %Uuid::now_v7(),
            );

            async move {
                let started = Instant::now();
                let res = call(inner, req).await;
                tracing::info!(
                    status = res.status().as_u16(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                res
            }
            .instrument(span)
        })
    })
}
