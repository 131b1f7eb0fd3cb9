//! JSON request dispatch.
//!
//! An [`ApiHandler`] is a plain value declaring which callbacks it supports:
//! `get_data` for bodyless requests, `parse_data` for requests carrying a
//! JSON body. [`Dispatcher`] wraps one handler into an axum route, owning the
//! whole protocol edge: body parsing, per-verb success statuses, and the
//! single point where typed failures become status codes.
//!
//! Trust boundary: the bearer credential rides in a header on every request
//! and authentication never touches cookies, so there is no CSRF surface to
//! defend — but the header is plaintext to anyone on path. Only expose these
//! routes behind TLS.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use axum::{Extension, Json};
use serde_json::Value;

use crate::errors::ApiError;
use crate::models::Principal;

/// Per-request context handed to handler callbacks.
#[derive(Debug, Clone)]
pub struct Context {
    pub method: Method,
    /// Present when the route sits behind the auth gate.
    pub principal: Option<Principal>,
}

impl Context {
    /// The authenticated principal, or `AccessDenied` on an unguarded route.
    ///
    /// Handlers serving protected routes can rely on the gate having run;
    /// this is the escape hatch for a handler accidentally mounted without it.
    pub fn principal(&self) -> Result<&Principal, ApiError> {
        self.principal
            .as_ref()
            .ok_or_else(|| ApiError::AccessDenied(Some("no authenticated principal".into())))
    }
}

/// What a successful callback hands back to the dispatcher.
///
/// `Json` becomes a serialized `application/json` body; `Done` is an explicit
/// empty-body success. There is no third case: a callback that has nothing to
/// report either returns `Done` or fails with a typed error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Json(Value),
    Done,
}

/// Business-logic capability set behind a route.
///
/// Implement the callbacks the route's verbs actually need; the defaults fail
/// loudly so a handler wired to a verb it does not support surfaces as a 500
/// and an error log, never as a silent success.
#[async_trait]
pub trait ApiHandler: Send + Sync {
    /// Handle a bodyless request.
    async fn get_data(&self, ctx: &Context) -> Result<Outcome, ApiError> {
        Err(ApiError::NotImplemented(verb(&ctx.method), "get_data"))
    }

    /// Handle a request whose body parsed as JSON.
    async fn parse_data(&self, ctx: &Context, data: Value) -> Result<Outcome, ApiError> {
        let _ = data;
        Err(ApiError::NotImplemented(verb(&ctx.method), "parse_data"))
    }
}

/// Adapts one [`ApiHandler`] into a concrete route.
pub struct Dispatcher {
    handler: Arc<dyn ApiHandler>,
    statuses: HashMap<Method, StatusCode>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn ApiHandler>) -> Self {
        let mut statuses = HashMap::new();
        statuses.insert(Method::GET, StatusCode::OK);
        statuses.insert(Method::POST, StatusCode::OK);
        statuses.insert(Method::PUT, StatusCode::CREATED);
        statuses.insert(Method::DELETE, StatusCode::OK);
        Self { handler, statuses }
    }

    /// Override the success status for one verb on this route.
    pub fn status(mut self, method: Method, status: StatusCode) -> Self {
        self.statuses.insert(method, status);
        self
    }

    /// Mount as an axum `MethodRouter`.
    pub fn into_route(self) -> MethodRouter {
        let this = Arc::new(self);
        any(
            move |method: Method, principal: Option<Extension<Principal>>, body: Bytes| {
                let this = this.clone();
                async move {
                    this.dispatch(method, principal.map(|Extension(p)| p), body)
                        .await
                }
            },
        )
    }

    /// One request, end to end: parse, invoke, serialize, map failures.
    pub async fn dispatch(
        &self,
        method: Method,
        principal: Option<Principal>,
        body: Bytes,
    ) -> Response {
        let success = self
            .statuses
            .get(&method)
            .copied()
            .unwrap_or(StatusCode::OK);
        let ctx = Context { method, principal };

        let result = if body.is_empty() {
            self.handler.get_data(&ctx).await
        } else {
            // Parse failures never reach business logic.
            let data: Value = match serde_json::from_slice(&body) {
                Ok(data) => data,
                Err(e) => {
                    tracing::info!("request body is not valid JSON: {}", e);
                    return StatusCode::BAD_REQUEST.into_response();
                }
            };
            self.handler.parse_data(&ctx, data).await
        };

        match result {
            Ok(Outcome::Json(value)) => (success, Json(value)).into_response(),
            Ok(Outcome::Done) => success.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

fn verb(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "HTTP",
    }
}
