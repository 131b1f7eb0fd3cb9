use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Principal;

/// One principal's current session credential.
///
/// There is at most one live row per principal (`principal_id` is unique in
/// the store). `expires_at = None` means the token never expires.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,
    pub principal_id: Uuid,
    /// The bearer credential itself. Non-empty and globally unique.
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// A token is valid while `expires_at` is unset or strictly in the future.
    pub fn valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    /// Short prefix safe to show in listings and logs.
    pub fn value_preview(&self) -> String {
        let head: String = self.value.chars().take(8).collect();
        format!("{}…", head)
    }
}

/// A successfully resolved credential: the token plus its owning principal.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: Token,
    pub principal: Principal,
}
