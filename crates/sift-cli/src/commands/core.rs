//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database and seed the rule catalog
//! - `cmd_status` - Database status summary

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::db::Database;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().unwrap();
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let seeded = db.seed_rules().context("Failed to seed rule catalog")?;
    if seeded > 0 {
        println!("   Seeded {} classification rules", seeded);
    } else {
        println!("   Rule catalog already seeded");
    }

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a transaction:   sift tx add --date 2024-03-01 --description 'NETFLIX.COM' --amount -15.49");
    println!("  2. See the suggestion:  sift suggest 1");
    println!("  3. Start the web API:   sift serve");

    Ok(())
}

pub fn cmd_status(db: &Database) -> Result<()> {
    let transactions = db.count_transactions()?;
    let unclassified = db.count_unclassified(None)?;
    let rules = db.count_rules()?;
    let revision = db.rule_revision()?;
    let backlog = db.count_feedback_events(true)?;
    let encrypted = db.is_encrypted().unwrap_or(false);

    println!();
    println!("📊 Sift Status");
    println!("   ─────────────────────────────────────────────");
    println!("   Database:            {}", db.path());
    println!(
        "   Encryption:          {}",
        if encrypted { "enabled" } else { "disabled" }
    );
    println!("   Transactions:        {}", transactions);
    println!("   Awaiting review:     {}", unclassified);
    println!("   Rules:               {} (revision {})", rules, revision);
    println!("   Feedback backlog:    {}", backlog);

    let jobs = db.list_auto_tag_jobs(5)?;
    if !jobs.is_empty() {
        println!();
        println!("   Recent auto-tag jobs:");
        for job in jobs {
            println!(
                "   [{}] {} {} - {}/{} processed, {} applied",
                job.id,
                job.month,
                job.status.as_str(),
                job.processed,
                job.total,
                job.auto_applied
            );
        }
    }

    Ok(())
}
