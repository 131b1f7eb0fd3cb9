use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokengate::api;
use tokengate::cli::{Cli, Commands, PrincipalCommands, TokenCommands};
use tokengate::config::{self, Config};
use tokengate::middleware::auth::{require_token, SharedResolver};
use tokengate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "tokengate=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = Cli::parse();

    match args.command {
        Some(Commands::Serve { port }) => run_server(cfg, port).await,
        Some(Commands::Token { command }) => {
            let store = PgStore::connect(&cfg.database_url, cfg.session_length()).await?;
            handle_token_command(&store, command).await
        }
        Some(Commands::Principal { command }) => {
            let store = PgStore::connect(&cfg.database_url, cfg.session_length()).await?;
            handle_principal_command(&store, command).await
        }
        None => run_server(cfg, None).await,
    }
}

async fn run_server(cfg: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(cfg.port);
    let store = PgStore::connect(&cfg.database_url, cfg.session_length()).await?;
    store.migrate().await?;

    let app = app_router(store, cfg.admin_key);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the full application router: the token-protected surface plus the
/// admin-key-guarded management API.
fn app_router(store: PgStore, admin_key: String) -> Router {
    let resolver: SharedResolver = Arc::new(store.clone());

    let protected = Router::new()
        .route("/session", get(api::handlers::session_info))
        .layer(axum::middleware::from_fn_with_state(resolver, require_token))
        .layer(TraceLayer::new_for_http());

    Router::new()
        .merge(protected)
        .nest("/admin", api::admin_router(store, admin_key))
        .layer(CorsLayer::permissive())
}

async fn handle_token_command(store: &PgStore, command: TokenCommands) -> anyhow::Result<()> {
    match command {
        TokenCommands::Issue { principal_id } => {
            let principal = store
                .get_principal(principal_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("principal {} does not exist", principal_id))?;
            let token = store.create_or_replace(principal.id).await?;
            println!("Token for {} ({})", principal.name, principal.id);
            println!("  id:      {}", token.id);
            println!("  value:   {}", token.value);
            println!("  expires: {}", fmt_expiry(&token.expires_at));
        }
        TokenCommands::List => {
            let rows = store.list_tokens().await?;
            if rows.is_empty() {
                println!("No tokens.");
            }
            for row in rows {
                let preview: String = row.value.chars().take(8).collect();
                println!(
                    "{}  {}…  principal={} active={} expires={}",
                    row.id,
                    preview,
                    row.principal_name,
                    row.principal_active,
                    fmt_expiry(&row.expires_at),
                );
            }
        }
        TokenCommands::Refresh { token_id } => match store.refresh(token_id).await? {
            Some(token) => {
                println!("Refreshed {}.", token.id);
                println!("  value:   {}", token.value);
                println!("  expires: {}", fmt_expiry(&token.expires_at));
            }
            None => anyhow::bail!("token {} does not exist", token_id),
        },
        TokenCommands::RefreshAll { token_ids } => {
            let refreshed = store.refresh_all(&token_ids).await?;
            if refreshed == 1 {
                println!("1 token was refreshed.");
            } else {
                println!("{} tokens were refreshed.", refreshed);
            }
        }
    }
    Ok(())
}

async fn handle_principal_command(
    store: &PgStore,
    command: PrincipalCommands,
) -> anyhow::Result<()> {
    match command {
        PrincipalCommands::Create { name } => {
            let principal = store.create_principal(&name).await?;
            println!("Created principal {} ({})", principal.name, principal.id);
        }
        PrincipalCommands::Deactivate { id } => {
            if store.set_principal_active(id, false).await? {
                println!("Deactivated {}.", id);
            } else {
                anyhow::bail!("principal {} does not exist", id);
            }
        }
        PrincipalCommands::Activate { id } => {
            if store.set_principal_active(id, true).await? {
                println!("Activated {}.", id);
            } else {
                anyhow::bail!("principal {} does not exist", id);
            }
        }
    }
    Ok(())
}

fn fmt_expiry(expires_at: &Option<chrono::DateTime<chrono::Utc>>) -> String {
    match expires_at {
        Some(at) => at.to_rfc3339(),
        None => "never".into(),
    }
}
