//! Suggestion, pending queue, decision, and improve commands

use anyhow::{anyhow, Result};
use sift_core::db::Database;
use sift_core::{
    ClassificationService, ConfidenceBand, Decision, EngineConfig, ExpenseType, FeedbackLearner,
};

use super::truncate;

pub fn cmd_suggest(db: &Database, id: i64) -> Result<()> {
    let config = EngineConfig::load()?;
    let service = ClassificationService::new(db, &config);

    let suggestion = service.get_suggestion(id)?;
    let band = ConfidenceBand::from_score(suggestion.confidence_score);

    println!();
    println!("🔍 Suggestion for transaction {}", id);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Suggested type:  {}", suggestion.suggested_type);
    println!(
        "   Confidence:      {:.2} ({})",
        suggestion.confidence_score,
        band.as_str()
    );
    println!("   Reasoning:       {}", suggestion.reasoning);

    if !suggestion.matched_rules.is_empty() {
        println!("   Matched rules:");
        for matched in &suggestion.matched_rules {
            println!(
                "   - [{}] {} ({})",
                matched.rule_id,
                matched.rule_name,
                matched.matched_keywords.join(", ")
            );
        }
    }

    println!();
    println!("   Apply with: sift classify {}", id);

    Ok(())
}

pub fn cmd_pending(
    db: &Database,
    month: &str,
    limit: usize,
    min_confidence: Option<f64>,
) -> Result<()> {
    let config = EngineConfig::load()?;
    let service = ClassificationService::new(db, &config);

    let pending = service.list_pending(month, Some(limit), min_confidence)?;
    let stats = ClassificationService::pending_stats(&pending);

    if pending.is_empty() {
        println!("No unclassified expenses for {}.", month);
        return Ok(());
    }

    println!();
    println!("🗂️  Pending classification for {} (most ambiguous first)", month);
    println!("   ─────────────────────────────────────────────────────────────");

    for item in &pending {
        let band = ConfidenceBand::from_score(item.suggestion.confidence_score);
        println!(
            "   [{}] {:.2} {:<6} │ {:<8} │ {}",
            item.transaction.id,
            item.suggestion.confidence_score,
            band.as_str(),
            item.suggestion.suggested_type.as_str(),
            truncate(&item.transaction.description, 40)
        );
    }

    println!();
    println!(
        "   {} pending: {} high / {} medium / {} low confidence",
        stats.total, stats.high, stats.medium, stats.low
    );

    Ok(())
}

pub fn cmd_classify(db: &Database, id: i64, kind: Option<&str>) -> Result<()> {
    let config = EngineConfig::load()?;
    let service = ClassificationService::new(db, &config);

    let decision = match kind {
        None => Decision::AiSuggestion,
        Some(raw) => match raw.parse::<ExpenseType>() {
            Ok(ExpenseType::Fixed) => Decision::Fixed,
            Ok(ExpenseType::Variable) => Decision::Variable,
            Err(_) => return Err(anyhow!("Invalid kind '{}', expected fixed or variable", raw)),
        },
    };

    let suggestion = service.get_suggestion(id)?;
    let tx = service.record_decision(id, decision, &suggestion, true)?;

    let applied = tx
        .expense_type
        .expect("decision was just recorded");
    println!("✅ Transaction {} classified as {}", id, applied);

    if decision == Decision::AiSuggestion {
        println!(
            "   Followed AI suggestion ({:.2} confidence)",
            suggestion.confidence_score
        );
    } else if applied != suggestion.suggested_type {
        println!(
            "   Overrode AI suggestion of {} ({:.2} confidence); feedback recorded",
            suggestion.suggested_type, suggestion.confidence_score
        );
    }

    Ok(())
}

pub fn cmd_improve(db: &Database, max_events: Option<i64>) -> Result<()> {
    let config = EngineConfig::load()?;
    let learner = FeedbackLearner::new(db, &config);

    println!("🧠 Improving rule weights from feedback...");
    let outcome = learner.improve(max_events)?;

    if outcome.events_processed == 0 {
        println!("   No unprocessed feedback events.");
        return Ok(());
    }

    println!(
        "   Processed {} event(s), adjusted {} rule(s), net weight delta {:+.3}",
        outcome.events_processed, outcome.rules_adjusted, outcome.net_weight_delta
    );

    Ok(())
}
