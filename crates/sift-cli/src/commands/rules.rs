//! Rule catalog command implementations

use anyhow::{anyhow, Result};
use sift_core::db::Database;
use sift_core::{
    classify, ClassifySignals, ConfidenceBand, EngineConfig, ExpenseType, NewRule, PatternKind,
};

use super::{parse_tags, truncate};

pub fn cmd_rules_list(db: &Database, limit: usize) -> Result<()> {
    let snapshot = db.rule_snapshot()?;

    if snapshot.rules.is_empty() {
        println!("No rules found. Run 'sift init' to seed the catalog.");
        return Ok(());
    }

    println!();
    println!(
        "📏 Rules ({} total, revision {})",
        snapshot.rules.len(),
        snapshot.revision
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for rule in snapshot.rules.iter().take(limit) {
        println!(
            "   [{}] {:<8} {:<14} {:.2} │ {}",
            rule.id,
            rule.type_label.as_str(),
            rule.pattern_kind.as_str(),
            rule.weight,
            truncate(&rule.pattern, 35)
        );
    }

    if snapshot.rules.len() > limit {
        println!("   ... and {} more", snapshot.rules.len() - limit);
    }

    Ok(())
}

pub fn cmd_rules_add(
    db: &Database,
    pattern: &str,
    kind: &str,
    match_kind: &str,
    weight: f64,
    name: Option<&str>,
) -> Result<()> {
    let type_label: ExpenseType = kind
        .parse()
        .map_err(|_| anyhow!("Invalid kind '{}', expected fixed or variable", kind))?;
    let pattern_kind: PatternKind = match_kind.parse().map_err(|_| {
        anyhow!(
            "Invalid match kind '{}', expected keyword, merchant_exact, or merchant_fuzzy",
            match_kind
        )
    })?;

    if !(0.0..=1.0).contains(&weight) {
        return Err(anyhow!("Weight must be in [0, 1], got {}", weight));
    }

    let id = db.insert_rule(&NewRule {
        name: name
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("custom: {}", pattern)),
        type_label,
        pattern_kind,
        pattern: pattern.to_string(),
        weight,
    })?;

    println!(
        "✅ Added rule {} ({} {} '{}', weight {:.2})",
        id,
        type_label.as_str(),
        pattern_kind.as_str(),
        pattern,
        weight
    );

    Ok(())
}

pub fn cmd_rules_test(db: &Database, label: &str, tags: Option<&str>) -> Result<()> {
    let config = EngineConfig::load()?;
    let snapshot = db.rule_snapshot()?;
    let tags = parse_tags(tags);

    let result = classify(
        &ClassifySignals {
            label,
            amount: -1.0,
            tags: &tags,
        },
        &snapshot,
        &config,
    );

    let band = ConfidenceBand::from_score(result.confidence_score);

    println!();
    println!("🔍 Dry run for '{}'", label);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Suggested type:  {}", result.suggested_type);
    println!(
        "   Confidence:      {:.2} ({})",
        result.confidence_score,
        band.as_str()
    );
    println!("   Reasoning:       {}", result.reasoning);

    for matched in &result.matched_rules {
        println!(
            "   - [{}] {} ({})",
            matched.rule_id,
            matched.rule_name,
            matched.matched_keywords.join(", ")
        );
    }

    Ok(())
}
