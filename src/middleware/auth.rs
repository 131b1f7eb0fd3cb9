//! Auth gate for protected routes.
//!
//! Composed in front of a router with `axum::middleware::from_fn_with_state`.
//! Every rejection is a bodyless 401; a deactivated principal is deliberately
//! indistinguishable from a missing or expired token, so those clients are
//! sent back to re-authenticate instead of being shown a permission error.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::store::TokenResolver;

/// The resolver the gate authenticates against, shared across requests.
pub type SharedResolver = Arc<dyn TokenResolver>;

/// Reject the request unless it carries a currently valid token owned by an
/// active principal. On success the resolved principal and token are attached
/// to the request's extensions for downstream handlers.
///
/// The entire `Authorization` header value is the token — no scheme prefix.
pub async fn require_token(
    State(resolver): State<SharedResolver>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let value = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            tracing::info!("rejecting request without an Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let session = match resolver.find_valid_by_value(&value).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("token lookup failed: {:#}", e);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    let session = match session {
        Some(session) => session,
        None => {
            tracing::info!("rejecting unknown or expired token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    if !session.principal.active {
        tracing::info!(principal = %session.principal.id, "rejecting deactivated principal");
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(session.principal);
    req.extensions_mut().insert(session.token);
    Ok(next.run(req).await)
}
