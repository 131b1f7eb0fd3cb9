use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Typed failures business logic may return through the dispatcher.
///
/// Every variant maps to exactly one status code, and every failure response
/// has an empty body — diagnostic detail stays in the server logs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller is authenticated but not allowed to perform this action.
    #[error("access denied{}", fmt_detail(.0))]
    AccessDenied(Option<String>),

    /// The requested resource does not exist.
    #[error("not found{}", fmt_detail(.0))]
    NotFound(Option<String>),

    /// A required downstream dependency is missing or down.
    #[error("service unavailable{}", fmt_detail(.0))]
    ServiceUnavailable(Option<String>),

    /// A handler was invoked for a verb it does not implement.
    /// This is a routing/configuration bug, not a client error.
    #[error("{0} handlers require a {1} implementation")]
    NotImplemented(&'static str, &'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotImplemented(..)
            | ApiError::Database(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            // Expected outcomes of normal operation.
            ApiError::AccessDenied(_) | ApiError::NotFound(_) => {
                tracing::info!("{}", self);
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!("{}", self);
            }
            // Programming error: the route was wired to a handler that
            // does not support this verb.
            ApiError::NotImplemented(..) => {
                tracing::error!("{}", self);
            }
            ApiError::Database(e) => {
                tracing::error!("database error: {}", e);
            }
            ApiError::Internal(e) => {
                tracing::error!("internal error: {:#}", e);
            }
        }

        self.status().into_response()
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}
