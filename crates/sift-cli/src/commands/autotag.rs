//! Bulk auto-tag command
//!
//! The CLI runs the job to completion in-process (no background task); use
//! the server endpoints for a pollable, cancellable run.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use sift_core::db::Database;
use sift_core::{AutoTagger, EngineConfig};

pub fn cmd_autotag(db: &Database, month: &str, threshold: Option<f64>) -> Result<()> {
    let config = EngineConfig::load()?;
    let tagger = AutoTagger::new(db.clone(), config.clone());

    let job = tagger.start(month, threshold)?;

    println!(
        "🏷️  Auto-tagging {} ({} pending, threshold {:.2})...",
        month, job.total, job.confidence_threshold
    );

    let flag = Arc::new(AtomicBool::new(false));
    let outcome = tagger.run(job.id, &flag)?;

    println!();
    println!("📊 Auto-tag results");
    println!("   ─────────────────────────────────────────────");
    println!("   Status:          {}", outcome.status.as_str());
    println!("   Analyzed:        {}", outcome.total_analyzed);
    println!("   Auto-applied:    {}", outcome.auto_applied);
    println!("   Left for review: {}", outcome.pending_review);

    if outcome.pending_review > 0 {
        println!();
        println!("   Review the rest with: sift pending --month {}", month);
    }

    Ok(())
}
