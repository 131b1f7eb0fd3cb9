use async_trait::async_trait;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::dispatch::{ApiHandler, Context, Outcome};
use crate::errors::ApiError;
use crate::models::{Principal, Token};
use crate::store::postgres::PgStore;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
struct CreatePrincipalRequest {
    name: String,
}

#[derive(Deserialize)]
struct IssueTokenRequest {
    principal_id: Uuid,
}

#[derive(Deserialize)]
struct RefreshRequest {
    token_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub principal_id: Uuid,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// ── Admin handlers ───────────────────────────────────────────

/// POST /admin/principals — register a principal.
pub struct CreatePrincipal {
    pub store: PgStore,
}

#[async_trait]
impl ApiHandler for CreatePrincipal {
    async fn parse_data(&self, _ctx: &Context, data: Value) -> Result<Outcome, ApiError> {
        let req: CreatePrincipalRequest =
            serde_json::from_value(data).map_err(anyhow::Error::from)?;
        let principal = self
            .store
            .create_principal(&req.name)
            .await
            .map_err(ApiError::Internal)?;
        Ok(Outcome::Json(json!({
            "id": principal.id,
            "name": principal.name,
            "active": principal.active,
        })))
    }
}

/// GET /admin/tokens — list token records (bearer values elided).
/// POST /admin/tokens — ensure a token exists for a principal; the one
/// response that carries the full bearer value.
pub struct Tokens {
    pub store: PgStore,
}

#[async_trait]
impl ApiHandler for Tokens {
    async fn get_data(&self, _ctx: &Context) -> Result<Outcome, ApiError> {
        let rows = self.store.list_tokens().await.map_err(ApiError::Internal)?;
        let listing: Vec<Value> = rows
            .iter()
            .map(|row| {
                let preview: String = row.value.chars().take(8).collect();
                json!({
                    "id": row.id,
                    "principal_id": row.principal_id,
                    "principal_name": row.principal_name,
                    "principal_active": row.principal_active,
                    "value_preview": format!("{}…", preview),
                    "expires_at": row.expires_at,
                    "updated_at": row.updated_at,
                })
            })
            .collect();
        Ok(Outcome::Json(Value::Array(listing)))
    }

    async fn parse_data(&self, _ctx: &Context, data: Value) -> Result<Outcome, ApiError> {
        let req: IssueTokenRequest = serde_json::from_value(data).map_err(anyhow::Error::from)?;

        if self
            .store
            .get_principal(req.principal_id)
            .await
            .map_err(ApiError::Internal)?
            .is_none()
        {
            return Err(ApiError::NotFound(Some(format!(
                "principal {} does not exist",
                req.principal_id
            ))));
        }

        let token = self
            .store
            .create_or_replace(req.principal_id)
            .await
            .map_err(ApiError::Internal)?;
        Ok(Outcome::Json(json!({
            "id": token.id,
            "principal_id": token.principal_id,
            "value": token.value,
            "expires_at": token.expires_at,
        })))
    }
}

/// POST /admin/tokens/refresh — bulk refresh, reporting the count actually
/// refreshed. Ids with no surviving row are skipped, matching how an operator
/// acts on a stale selection.
pub struct RefreshTokens {
    pub store: PgStore,
}

#[async_trait]
impl ApiHandler for RefreshTokens {
    async fn parse_data(&self, _ctx: &Context, data: Value) -> Result<Outcome, ApiError> {
        let req: RefreshRequest = serde_json::from_value(data).map_err(anyhow::Error::from)?;
        let refreshed = self
            .store
            .refresh_all(&req.token_ids)
            .await
            .map_err(ApiError::Internal)?;
        tracing::info!(refreshed, "bulk token refresh");
        Ok(Outcome::Json(json!({ "refreshed": refreshed })))
    }
}

// ── Protected handlers ───────────────────────────────────────

/// GET /session — who the presented token belongs to and when it expires.
/// Sits behind the auth gate; the extensions are installed there.
pub async fn session_info(
    Extension(principal): Extension<Principal>,
    Extension(token): Extension<Token>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        principal_id: principal.id,
        name: principal.name,
        expires_at: token.expires_at,
    })
}
