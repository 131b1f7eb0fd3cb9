use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::store::postgres::PgStore;

pub mod handlers;

/// Build the admin router. The caller mounts this under `/admin`.
///
/// Every route is a [`Dispatcher`]-wrapped handler; the whole router sits
/// behind the admin-key check, not the bearer-token gate, so operators can
/// issue the very first token.
pub fn admin_router(store: PgStore, admin_key: String) -> Router {
    Router::new()
        .route(
            "/principals",
            Dispatcher::new(Arc::new(handlers::CreatePrincipal {
                store: store.clone(),
            }))
            .status(Method::POST, StatusCode::CREATED)
            .into_route(),
        )
        .route(
            "/tokens",
            Dispatcher::new(Arc::new(handlers::Tokens {
                store: store.clone(),
            }))
            .into_route(),
        )
        .route(
            "/tokens/refresh",
            Dispatcher::new(Arc::new(handlers::RefreshTokens { store })).into_route(),
        )
        .layer(middleware::from_fn_with_state(admin_key, admin_auth))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: validates `X-Admin-Key` against the configured admin key.
async fn admin_auth(
    State(expected): State<String>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(k) if k == expected => Ok(next.run(req).await),
        Some(k) => {
            // SECURITY: never log the expected key or the full provided key
            let masked = if k.len() > 8 {
                format!("{}…{}", &k[..4], &k[k.len() - 4..])
            } else {
                "****".to_string()
            };
            tracing::warn!("admin API: invalid key (provided: '{}')", masked);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
