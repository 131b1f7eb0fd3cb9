use chrono::Duration;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// How long a refreshed token stays valid, in seconds.
    /// Set via TOKENGATE_SESSION_SECS. Default: 604800 (one week).
    pub session_secs: i64,
    /// Key expected in the X-Admin-Key header on /admin routes.
    pub admin_key: String,
}

impl Config {
    pub fn session_length(&self) -> Duration {
        Duration::seconds(self.session_secs)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let admin_key =
        std::env::var("TOKENGATE_ADMIN_KEY").unwrap_or_else(|_| "CHANGE_ME_ADMIN_KEY".into());

    if admin_key == "CHANGE_ME_ADMIN_KEY" {
        let env_mode = std::env::var("TOKENGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "TOKENGATE_ADMIN_KEY is still the insecure placeholder. \
                 Set a proper key before running in production."
            );
        }
        eprintln!("⚠️  TOKENGATE_ADMIN_KEY is not set — using insecure placeholder. Set a real key for production.");
    }

    Ok(Config {
        port: std::env::var("TOKENGATE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/tokengate".into()),
        session_secs: std::env::var("TOKENGATE_SESSION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(604_800),
        admin_key,
    })
}
