//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Sort expenses into fixed and variable
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Rule-based fixed/variable expense classifier", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "sift.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SIFT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the rule catalog
    Init,

    /// Manage transactions (add, list)
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },

    /// Show the AI suggestion for a transaction
    Suggest {
        /// Transaction ID
        id: i64,
    },

    /// List unclassified expenses for a month, most ambiguous first
    Pending {
        /// Month to inspect (YYYY-MM)
        #[arg(short, long)]
        month: String,

        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Hide suggestions below this confidence
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Record a classification decision for a transaction
    Classify {
        /// Transaction ID
        id: i64,

        /// Force a class (fixed or variable); omit to follow the AI suggestion
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Bulk-apply suggestions for a month above a confidence threshold
    Autotag {
        /// Month to process (YYYY-MM)
        #[arg(short, long)]
        month: String,

        /// Confidence threshold (defaults to the configured value)
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Adjust rule weights from accumulated feedback
    Improve {
        /// Bound the feedback window (oldest first)
        #[arg(long)]
        max_events: Option<i64>,
    },

    /// Manage classification rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires a bearer API key (SIFT_API_KEYS).
        #[arg(long)]
        no_auth: bool,
    },

    /// Show database status (counts, revision, encryption)
    Status,
}

#[derive(Subcommand)]
pub enum TxAction {
    /// Add a transaction (stand-in for the statement import pipeline)
    Add {
        /// Transaction date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Statement label
        #[arg(long)]
        description: String,

        /// Signed amount; negative = expense
        #[arg(short, long, allow_hyphen_values = true)]
        amount: f64,

        /// Comma-separated historical tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// List transactions
    List {
        /// Restrict to a month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules and the current store revision
    List {
        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Add a user-defined rule
    Add {
        /// Pattern to match
        #[arg(short, long)]
        pattern: String,

        /// Class the rule votes for (fixed or variable)
        #[arg(short, long)]
        kind: String,

        /// Pattern kind: keyword, merchant_exact, or merchant_fuzzy
        #[arg(long, default_value = "keyword")]
        match_kind: String,

        /// Vote strength in [0, 1]
        #[arg(short, long, default_value = "0.3")]
        weight: f64,

        /// Human-readable name (defaults to the pattern)
        #[arg(long)]
        name: Option<String>,
    },

    /// Dry-run a label against the rule store
    Test {
        /// Label to classify
        label: String,

        /// Comma-separated historical tags
        #[arg(short, long)]
        tags: Option<String>,
    },
}
