use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity a bearer token resolves to.
///
/// Principals are owned by the surrounding user system; this service only
/// reads them. The `active` flag gates authentication: a token held by a
/// deactivated principal authenticates exactly like no token at all.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
