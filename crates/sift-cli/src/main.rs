//! Sift CLI - Rule-based fixed/variable expense classifier
//!
//! Usage:
//!   sift init                       Initialize database and seed rules
//!   sift tx add --date ... --description ... --amount ...
//!   sift pending --month 2024-03    List ambiguous expenses first
//!   sift autotag --month 2024-03    Bulk-apply confident suggestions
//!   sift serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Tx { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                TxAction::Add {
                    date,
                    description,
                    amount,
                    tags,
                } => commands::cmd_tx_add(&db, &date, &description, amount, tags.as_deref()),
                TxAction::List { month, limit } => {
                    commands::cmd_tx_list(&db, month.as_deref(), limit)
                }
            }
        }
        Commands::Suggest { id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_suggest(&db, id)
        }
        Commands::Pending {
            month,
            limit,
            min_confidence,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_pending(&db, &month, limit, min_confidence)
        }
        Commands::Classify { id, kind } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_classify(&db, id, kind.as_deref())
        }
        Commands::Autotag { month, threshold } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_autotag(&db, &month, threshold)
        }
        Commands::Improve { max_events } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_improve(&db, max_events)
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                RulesAction::List { limit } => commands::cmd_rules_list(&db, limit),
                RulesAction::Add {
                    pattern,
                    kind,
                    match_kind,
                    weight,
                    name,
                } => commands::cmd_rules_add(
                    &db,
                    &pattern,
                    &kind,
                    &match_kind,
                    weight,
                    name.as_deref(),
                ),
                RulesAction::Test { label, tags } => {
                    commands::cmd_rules_test(&db, &label, tags.as_deref())
                }
            }
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt).await,
        Commands::Status => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_status(&db)
        }
    }
}
