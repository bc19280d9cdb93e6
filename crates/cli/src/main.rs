//! Storekeep CLI - database migrations and bearer tokens.
//!
//! # Usage
//!
//! ```bash
//! # Run inventory and session migrations
//! storekeep migrate
//!
//! # Issue a bearer token for merchant 42, valid for 24 hours
//! storekeep token issue --merchant-id 42 --ttl-hours 24
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storekeep")]
#[command(author, version, about = "Storekeep CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (inventory schema and session table)
    Migrate,
    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a signed bearer token for a merchant
    Issue {
        /// Merchant ID the token authenticates as
        #[arg(short, long)]
        merchant_id: i64,

        /// Lifetime of the token in hours
        #[arg(short, long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Token { action } => match action {
            TokenAction::Issue {
                merchant_id,
                ttl_hours,
            } => commands::token::issue(merchant_id, ttl_hours)?,
        },
    }
    Ok(())
}
