use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Tokengate — expirable bearer-token authentication for HTTP APIs
#[derive(Parser)]
#[command(name = "tokengate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Manage principals
    Principal {
        #[command(subcommand)]
        command: PrincipalCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Ensure a token exists for a principal and print its value
    Issue {
        #[arg(long)]
        principal_id: Uuid,
    },
    /// List token records
    List,
    /// Refresh one token: new value, expiry pushed one session out
    Refresh {
        #[arg(long)]
        token_id: Uuid,
    },
    /// Refresh a set of tokens and report how many were refreshed
    RefreshAll {
        #[arg(long, value_delimiter = ',')]
        token_ids: Vec<Uuid>,
    },
}

#[derive(Subcommand)]
pub enum PrincipalCommands {
    /// Register a new principal
    Create {
        #[arg(long)]
        name: String,
    },
    /// Deactivate a principal; its token stops authenticating immediately
    Deactivate {
        #[arg(long)]
        id: Uuid,
    },
    /// Re-activate a principal
    Activate {
        #[arg(long)]
        id: Uuid,
    },
}
