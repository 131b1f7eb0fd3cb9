use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::generator;
use crate::models::{AuthSession, Principal, Token};
use crate::store::TokenResolver;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    session_length: Duration,
}

impl PgStore {
    pub async fn connect(database_url: &str, session_length: Duration) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self {
            pool,
            session_length,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- Principal Operations --

    pub async fn create_principal(&self, name: &str) -> anyhow::Result<Principal> {
        let principal = sqlx::query_as::<_, Principal>(
            "INSERT INTO principals (name) VALUES ($1) RETURNING id, name, active, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(principal)
    }

    pub async fn get_principal(&self, id: Uuid) -> anyhow::Result<Option<Principal>> {
        let row = sqlx::query_as::<_, Principal>(
            "SELECT id, name, active, created_at FROM principals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_principal_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE principals SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Token Operations --

    /// Ensure exactly one token row exists for the principal.
    ///
    /// A missing row is created with a freshly generated value and no expiry;
    /// an existing row is returned untouched. Safe under concurrent callers:
    /// the insert is `ON CONFLICT DO NOTHING` and the row is re-read after.
    pub async fn create_or_replace(&self, principal_id: Uuid) -> anyhow::Result<Token> {
        sqlx::query(
            "INSERT INTO tokens (principal_id, value) VALUES ($1, $2) \
             ON CONFLICT (principal_id) DO NOTHING",
        )
        .bind(principal_id)
        .bind(generator::generate())
        .execute(&self.pool)
        .await?;

        let token = sqlx::query_as::<_, Token>(
            "SELECT id, principal_id, value, expires_at, created_at, updated_at \
             FROM tokens WHERE principal_id = $1",
        )
        .bind(principal_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(token)
    }

    /// Regenerate the token's value and push its expiry one session length out.
    ///
    /// The previous value stops resolving the moment this commits. Returns
    /// `None` if the row no longer exists (deleted administratively).
    pub async fn refresh(&self, token_id: Uuid) -> anyhow::Result<Option<Token>> {
        let expires_at: DateTime<Utc> = Utc::now() + self.session_length;
        let row = sqlx::query_as::<_, Token>(
            "UPDATE tokens SET value = $2, expires_at = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, principal_id, value, expires_at, created_at, updated_at",
        )
        .bind(token_id)
        .bind(generator::generate())
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Refresh every token in the set; returns how many rows were refreshed.
    /// Ids that no longer resolve to a row are skipped.
    pub async fn refresh_all(&self, token_ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut refreshed = 0;
        for &id in token_ids {
            if self.refresh(id).await?.is_some() {
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    pub async fn list_tokens(&self) -> anyhow::Result<Vec<TokenOverview>> {
        let rows = sqlx::query_as::<_, TokenOverview>(
            "SELECT t.id, t.principal_id, p.name AS principal_name, \
                    p.active AS principal_active, t.value, t.expires_at, t.updated_at \
             FROM tokens t JOIN principals p ON p.id = t.principal_id \
             ORDER BY t.created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl TokenResolver for PgStore {
    /// Exact value match restricted to currently valid rows:
    /// `expires_at IS NULL OR expires_at > now()`.
    async fn find_valid_by_value(&self, value: &str) -> anyhow::Result<Option<AuthSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT t.id, t.principal_id, t.value, t.expires_at, t.created_at, t.updated_at, \
                    p.name AS principal_name, p.active AS principal_active, \
                    p.created_at AS principal_created_at \
             FROM tokens t JOIN principals p ON p.id = t.principal_id \
             WHERE t.value = $1 AND (t.expires_at IS NULL OR t.expires_at > NOW())",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionRow::into_session))
    }
}

/// Joined token + principal row for admin listings. The full bearer value is
/// present here; callers that render it must elide it first.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TokenOverview {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub principal_name: String,
    pub principal_active: bool,
    #[serde(skip)]
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    principal_id: Uuid,
    value: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    principal_name: String,
    principal_active: bool,
    principal_created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            token: Token {
                id: self.id,
                principal_id: self.principal_id,
                value: self.value,
                expires_at: self.expires_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            principal: Principal {
                id: self.principal_id,
                name: self.principal_name,
                active: self.principal_active,
                created_at: self.principal_created_at,
            },
        }
    }
}
