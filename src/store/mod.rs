use async_trait::async_trait;

use crate::models::AuthSession;

pub mod postgres;

/// Lookup seam the auth gate composes over.
///
/// Production uses [`postgres::PgStore`]; tests substitute an in-memory
/// resolver so gate behavior is checked without a database.
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// Resolve a bearer value to its token and owning principal.
    ///
    /// Returns `None` for both "no such token" and "token expired" — the
    /// two cases are deliberately indistinguishable to callers.
    async fn find_valid_by_value(&self, value: &str) -> anyhow::Result<Option<AuthSession>>;
}
