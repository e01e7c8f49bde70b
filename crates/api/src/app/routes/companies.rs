use axum::Json;
use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;

use companies_core::{Company, CompanyDraft};
use companies_infra::Session;

use crate::app::errors::ApiError;
use crate::context::SessionContext;

/// Collection path; new records live at `COLLECTION_PATH/<id>`.
pub const COLLECTION_PATH: &str = "/companies";

/// Most records a listing returns.
pub const LIST_LIMIT: usize = 100;

/// Largest request body accepted for an insert.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Method dispatch for the collection.
pub async fn handle(ctx: SessionContext, req: Request) -> Response {
    match *req.method() {
        Method::GET => read(ctx.session()).await,
        Method::POST => insert(ctx.session(), req).await,
        _ => ApiError::MethodNotSupported.into_response(),
    }
}

/// `POST /companies`: store a new company and redirect to it.
pub async fn insert(session: &Session, req: Request) -> Response {
    match try_insert(session, req).await {
        Ok(company) => {
            tracing::info!(id = %company.id, "company inserted");
            Redirect::temporary(&format!("{COLLECTION_PATH}/{}", company.id.to_hex())).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "insert failed");
            e.into_response()
        }
    }
}

/// `GET /companies`: the newest companies first.
pub async fn read(session: &Session) -> Response {
    match session.find_recent::<Company>(LIST_LIMIT).await {
        Ok(companies) => Json(companies).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing companies failed");
            ApiError::Query(e).into_response()
        }
    }
}

async fn try_insert(session: &Session, req: Request) -> Result<Company, ApiError> {
    let body = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let draft: CompanyDraft =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let company = Company::register(draft, Utc::now());
    session.insert(&company).await.map_err(ApiError::Insert)?;
    Ok(company)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::call;
    use crate::middleware::with_session;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::http::header::LOCATION;
    use companies_infra::{MemoryPool, SessionPool};
    use std::sync::Arc;

    async fn send(pool: &MemoryPool, method: Method, body: &str) -> Response {
        let h = with_session(Arc::new(pool.clone()), handle);
        let req = Request::builder()
            .method(method)
            .uri(COLLECTION_PATH)
            .body(Body::from(body.to_string()))
            .unwrap();
        call(h, req).await
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn insert_redirects_to_the_new_record() {
        let pool = MemoryPool::new();
        let res = send(
            &pool,
            Method::POST,
            r#"{"name":"Acme","description":"Widgets","floor":3,"unit":12}"#,
        )
        .await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = res.headers()[LOCATION].to_str().unwrap().to_string();
        let id = location.strip_prefix("/companies/").unwrap();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(body_text(res).await.is_empty());
        assert_eq!(pool.count("companies"), 1);
    }

    #[tokio::test]
    async fn insert_rejects_malformed_json_without_writing() {
        let pool = MemoryPool::new();
        let res = send(&pool, Method::POST, r#"{"name":"#).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(res).await.contains("EOF"));
        assert_eq!(pool.count("companies"), 0);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn insert_failure_is_a_400_with_the_store_message() {
        let pool = MemoryPool::new();
        pool.disconnect();
        let res = send(&pool, Method::POST, r#"{"name":"Acme"}"#).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(res).await, "no reachable servers");
    }

    #[tokio::test]
    async fn read_of_empty_collection_is_an_empty_array() {
        let pool = MemoryPool::new();
        let res = send(&pool, Method::GET, "").await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "[]");
    }

    #[tokio::test]
    async fn read_failure_is_a_500_with_the_store_message() {
        let pool = MemoryPool::new();
        pool.disconnect();
        let res = send(&pool, Method::GET, "").await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(res).await, "no reachable servers");
    }

    #[tokio::test]
    async fn other_methods_are_not_supported() {
        let pool = MemoryPool::new();
        for method in [Method::DELETE, Method::PUT, Method::PATCH] {
            let res = send(&pool, method, "").await;
            assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body_text(res).await, "Not supported");
        }
        assert_eq!(pool.count("companies"), 0);
    }

    #[tokio::test]
    async fn handlers_run_on_any_session_they_are_given() {
        let pool = MemoryPool::new();
        let session = pool.copy().await.unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri(COLLECTION_PATH)
            .body(Body::from(r#"{"name":"Acme"}"#))
            .unwrap();

        let res = handle(SessionContext::new(session.clone()), req).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(pool.count("companies"), 1);

        let listed = read(&session).await;
        assert_eq!(listed.status(), StatusCode::OK);
        assert!(body_text(listed).await.contains("Acme"));

        session.close();
        assert_eq!(pool.checked_out(), 0);
    }
}
