//! Handler adapters: composable wrappers around a request handler.
//!
//! A [`Handler`] turns a request into a response and never fails; failures
//! are responses. An [`Adapter`] takes a handler and returns a new one that
//! adds behavior before and/or after delegating to it.
//!
//! ## Ordering
//!
//! [`adapt`] applies adapters so that **the first adapter in the list is the
//! outermost layer**. For `adapt(h, [a, b, c])` a request flows
//! `a → b → c → h` and the response flows back `h → c → b → a`.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use tower::ServiceExt;
use tower::util::BoxCloneService;

/// A type-erased, cloneable request handler.
pub type Handler = BoxCloneService<Request, Response, Infallible>;

/// Wraps a handler, producing a handler.
pub type Adapter = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Build an [`Adapter`] from a closure.
pub fn adapter<F>(f: F) -> Adapter
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lift an async function into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    BoxCloneService::new(tower::service_fn(move |req: Request| {
        let fut = f(req);
        async move { Ok::<_, Infallible>(fut.await) }
    }))
}

/// Compose `handler` with `adapters`, first adapter outermost.
///
/// Pure composition: nothing runs until the returned handler is called.
pub fn adapt<I>(handler: Handler, adapters: I) -> Handler
where
    I: IntoIterator<Item = Adapter>,
    I::IntoIter: DoubleEndedIterator,
{
    adapters
        .into_iter()
        .rev()
        .fold(handler, |inner, adapter| (*adapter)(inner))
}

/// Run `handler` to completion on `req`.
pub async fn call(handler: Handler, req: Request) -> Response {
    match handler.oneshot(req).await {
        Ok(res) => res,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn recording(name: &'static str, trace: Trace) -> Adapter {
        adapter(move |inner: Handler| {
            let trace = trace.clone();
            handler_fn(move |req| {
                let trace = trace.clone();
                let inner = inner.clone();
                async move {
                    trace.lock().unwrap().push(format!("{name}:before"));
                    let res = call(inner, req).await;
                    trace.lock().unwrap().push(format!("{name}:after"));
                    res
                }
            })
        })
    }

    fn base(trace: Trace) -> Handler {
        handler_fn(move |_req| {
            let trace = trace.clone();
            async move {
                trace.lock().unwrap().push("handler".to_string());
                StatusCode::OK.into_response()
            }
        })
    }

    fn request() -> Request {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn first_adapter_is_outermost() {
        let trace: Trace = Arc::default();
        let h = adapt(
            base(trace.clone()),
            [
                recording("a", trace.clone()),
                recording("b", trace.clone()),
                recording("c", trace.clone()),
            ],
        );

        let res = call(h, request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            *trace.lock().unwrap(),
            [
                "a:before", "b:before", "c:before", "handler", "c:after", "b:after", "a:after"
            ]
        );
    }

    #[tokio::test]
    async fn no_adapters_yields_the_base_handler() {
        let trace: Trace = Arc::default();
        let h = adapt(base(trace.clone()), Vec::new());

        call(h, request()).await;
        assert_eq!(*trace.lock().unwrap(), ["handler"]);
    }

    #[tokio::test]
    async fn composition_alone_runs_nothing() {
        let trace: Trace = Arc::default();
        let _h = adapt(base(trace.clone()), [recording("a", trace.clone())]);
        assert!(trace.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn adapters_can_short_circuit() {
        let trace: Trace = Arc::default();
        let deny = adapter(|_inner: Handler| {
            handler_fn(|_req| async { StatusCode::FORBIDDEN.into_response() })
        });
        let h = adapt(base(trace.clone()), [recording("a", trace.clone()), deny]);

        let res = call(h, request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(*trace.lock().unwrap(), ["a:before", "a:after"]);
    }

    #[tokio::test]
    async fn composed_handler_is_reusable() {
        let trace: Trace = Arc::default();
        let h = adapt(base(trace.clone()), [recording("a", trace.clone())]);

        call(h.clone(), request()).await;
        call(h, request()).await;
        assert_eq!(trace.lock().unwrap().len(), 6);
    }
}
