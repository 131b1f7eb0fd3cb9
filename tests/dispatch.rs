//! Dispatcher contract tests: body parsing, per-verb statuses, and the
//! error-to-status-code boundary, driven through a real axum router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tokengate::dispatch::{ApiHandler, Context, Dispatcher, Outcome};
use tokengate::errors::ApiError;

/// Records invocations and returns a canned result.
struct Scripted {
    calls: Arc<AtomicUsize>,
    outcome: Box<dyn Fn() -> Result<Outcome, ApiError> + Send + Sync>,
}

impl Scripted {
    fn new(
        calls: Arc<AtomicUsize>,
        outcome: impl Fn() -> Result<Outcome, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls,
            outcome: Box::new(outcome),
        })
    }
}

#[async_trait]
impl ApiHandler for Scripted {
    async fn get_data(&self, _ctx: &Context) -> Result<Outcome, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }

    async fn parse_data(&self, _ctx: &Context, _data: Value) -> Result<Outcome, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn app(dispatcher: Dispatcher) -> Router {
    Router::new().route("/", dispatcher.into_route())
}

async fn send(router: Router, method: Method, body: Option<&str>) -> (StatusCode, Option<String>, Bytes) {
    let req = Request::builder()
        .method(method)
        .uri("/")
        .body(match body {
            Some(b) => Body::from(b.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let res = router.oneshot(req).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, content_type, bytes)
}

#[tokio::test]
async fn malformed_json_body_is_400_and_never_reaches_logic() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls.clone(), || Ok(Outcome::Done));

    let (status, _, body) = send(
        app(Dispatcher::new(handler)),
        Method::POST,
        Some("{\"broken\": "),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_returning_mapping_round_trips_as_json() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls.clone(), || Ok(Outcome::Json(json!({"id": 1}))));

    let (status, content_type, body) = send(app(Dispatcher::new(handler)), Method::GET, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, json!({"id": 1}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn put_with_plain_success_is_201_and_empty() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls, || Ok(Outcome::Done));

    let (status, _, body) = send(
        app(Dispatcher::new(handler)),
        Method::PUT,
        Some("{\"noted\": true}"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn access_denied_maps_to_bare_403() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls.clone(), || {
        Err(ApiError::AccessDenied(Some("not yours".into())))
    });

    let (status, _, body) = send(app(Dispatcher::new(handler)), Method::GET, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty(), "diagnostics must not reach the client");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn not_found_maps_to_404() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls, || Err(ApiError::NotFound(None)));

    let (status, _, body) = send(app(Dispatcher::new(handler)), Method::GET, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn service_unavailable_maps_to_503() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls, || {
        Err(ApiError::ServiceUnavailable(Some("store offline".into())))
    });

    let (status, _, body) = send(app(Dispatcher::new(handler)), Method::DELETE, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.is_empty());
}

#[tokio::test]
async fn unexpected_failure_maps_to_500() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls, || {
        Err(ApiError::Internal(anyhow::anyhow!("row deserialization blew up")))
    });

    let (status, _, body) = send(app(Dispatcher::new(handler)), Method::GET, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn handler_without_required_callback_fails_loudly() {
    // Implements neither callback, so every verb must surface the
    // wiring mistake as a 500 — never a quiet success.
    struct Empty;

    #[async_trait]
    impl ApiHandler for Empty {}

    let router = app(Dispatcher::new(Arc::new(Empty)));
    let (status, _, _) = send(router.clone(), Method::GET, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _, _) = send(router, Method::POST, Some("{}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn body_presence_selects_the_callback() {
    struct Picky;

    #[async_trait]
    impl ApiHandler for Picky {
        async fn get_data(&self, _ctx: &Context) -> Result<Outcome, ApiError> {
            Ok(Outcome::Json(json!({"via": "get_data"})))
        }

        async fn parse_data(&self, _ctx: &Context, data: Value) -> Result<Outcome, ApiError> {
            Ok(Outcome::Json(json!({"via": "parse_data", "echo": data})))
        }
    }

    let router = app(Dispatcher::new(Arc::new(Picky)));

    let (_, _, body) = send(router.clone(), Method::POST, None).await;
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["via"], "get_data");

    let (_, _, body) = send(router, Method::POST, Some("[1, 2]")).await;
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["via"], "parse_data");
    assert_eq!(parsed["echo"], json!([1, 2]));
}

#[tokio::test]
async fn per_route_status_override() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Scripted::new(calls, || Ok(Outcome::Done));
    let dispatcher = Dispatcher::new(handler).status(Method::POST, StatusCode::CREATED);

    let (status, _, _) = send(app(dispatcher), Method::POST, Some("{}")).await;
    assert_eq!(status, StatusCode::CREATED);
}
