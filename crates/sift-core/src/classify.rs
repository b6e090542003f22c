//! Rule-weighted fixed/variable expense classifier
//!
//! Pure scoring over a rule snapshot: deterministic for the same snapshot
//! and transaction, no hidden state. Matched rule weights accumulate into
//! per-class buckets by category (keyword / merchant / historical tag
//! repetition), each bucket clamped to its configured cap, and the winning
//! class is normalized against the runner-up to produce a confidence score
//! in [0, 1].
//!
//! The classifier never fails: an empty label, an empty rule set, or a
//! malformed rule all degrade to a conservative VARIABLE suggestion at 0.5
//! confidence.

use tracing::warn;

use crate::config::{CategoryCaps, EngineConfig};
use crate::models::{
    ClassificationResult, ExpenseType, MatchedRule, PatternKind, RuleSnapshot,
};
use crate::normalize::{contains_word, normalize_label, similarity};

/// The classifier's view of a transaction
#[derive(Debug, Clone)]
pub struct ClassifySignals<'a> {
    pub label: &'a str,
    pub amount: f64,
    /// Historical tags carried on the transaction
    pub tags: &'a [String],
}

impl<'a> ClassifySignals<'a> {
    pub fn from_transaction(tx: &'a crate::models::Transaction) -> Self {
        Self {
            label: &tx.description,
            amount: tx.amount,
            tags: &tx.tags,
        }
    }
}

/// Raw per-category weight sums for one class
#[derive(Debug, Default, Clone, Copy)]
struct CategoryTotals {
    keyword: f64,
    merchant: f64,
    tag_repetition: f64,
}

impl CategoryTotals {
    fn capped_score(&self, caps: &CategoryCaps) -> f64 {
        self.keyword.min(caps.keyword)
            + self.merchant.min(caps.merchant)
            + self.tag_repetition.min(caps.tag_repetition)
    }
}

struct RuleHit {
    rule_id: i64,
    rule_name: String,
    matched_keywords: Vec<String>,
    class: ExpenseType,
    weight: f64,
}

/// Classify a transaction against a rule store snapshot.
pub fn classify(
    signals: &ClassifySignals,
    snapshot: &RuleSnapshot,
    config: &EngineConfig,
) -> ClassificationResult {
    let label = normalize_label(signals.label);
    if label.is_empty() {
        return fallback_result("insufficient data", snapshot.revision);
    }

    let normalized_tags: Vec<String> = signals.tags.iter().map(|t| normalize_label(t)).collect();

    let mut fixed = CategoryTotals::default();
    let mut variable = CategoryTotals::default();
    let mut hits: Vec<RuleHit> = Vec::new();

    for rule in &snapshot.rules {
        let pattern = normalize_label(&rule.pattern);
        if pattern.is_empty() {
            warn!(rule_id = rule.id, name = %rule.name, "Skipping rule with empty pattern");
            continue;
        }

        let totals = match rule.type_label {
            ExpenseType::Fixed => &mut fixed,
            ExpenseType::Variable => &mut variable,
        };

        let mut matched_keywords = Vec::new();

        match rule.pattern_kind {
            PatternKind::Keyword => {
                if contains_word(&label, &pattern) {
                    totals.keyword += rule.weight;
                    matched_keywords.push(rule.pattern.clone());
                }
                // Keyword rules also vote through the transaction's
                // historical tags, in the separate tag-repetition bucket.
                for (raw_tag, tag) in signals.tags.iter().zip(&normalized_tags) {
                    if contains_word(tag, &pattern) {
                        totals.tag_repetition += rule.weight;
                        matched_keywords.push(raw_tag.clone());
                    }
                }
            }
            PatternKind::MerchantExact => {
                if label == pattern {
                    totals.merchant += rule.weight;
                    matched_keywords.push(rule.pattern.clone());
                }
            }
            PatternKind::MerchantFuzzy => {
                if similarity(&label, &pattern) >= config.fuzzy_threshold {
                    totals.merchant += rule.weight;
                    matched_keywords.push(rule.pattern.clone());
                }
            }
        }

        if !matched_keywords.is_empty() {
            hits.push(RuleHit {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                matched_keywords,
                class: rule.type_label,
                weight: rule.weight,
            });
        }
    }

    let score_fixed = fixed.capped_score(&config.caps);
    let score_variable = variable.capped_score(&config.caps);

    if score_fixed <= 0.0 && score_variable <= 0.0 {
        // Either nothing matched, or everything that matched has been
        // demoted to zero weight. Both degrade to the conservative default.
        let mut result = fallback_result("no pattern matched, default", snapshot.revision);
        result.matched_rules = order_hits(hits, ExpenseType::Variable);
        return result;
    }

    let suggested = if score_fixed > score_variable {
        ExpenseType::Fixed
    } else {
        // Exact tie defaults to variable: assuming discretionary spend is
        // the safer error than assuming a recurring commitment.
        ExpenseType::Variable
    };

    let (winning, losing, winner_totals) = match suggested {
        ExpenseType::Fixed => (score_fixed, score_variable, fixed),
        ExpenseType::Variable => (score_variable, score_fixed, variable),
    };

    let confidence = if losing > 0.0 {
        winning / (winning + losing)
    } else {
        winning.min(1.0)
    };

    ClassificationResult {
        suggested_type: suggested,
        confidence_score: confidence.clamp(0.0, 1.0),
        reasoning: build_reasoning(suggested, &winner_totals, &config.caps),
        matched_rules: order_hits(hits, suggested),
        score_fixed,
        score_variable,
        rule_revision: snapshot.revision,
    }
}

fn fallback_result(reasoning: &str, revision: i64) -> ClassificationResult {
    ClassificationResult {
        suggested_type: ExpenseType::Variable,
        confidence_score: 0.5,
        reasoning: reasoning.to_string(),
        matched_rules: Vec::new(),
        score_fixed: 0.0,
        score_variable: 0.0,
        rule_revision: revision,
    }
}

/// Assemble the human-readable explanation: winning-class categories with
/// their capped contributions, strongest first.
fn build_reasoning(
    suggested: ExpenseType,
    totals: &CategoryTotals,
    caps: &CategoryCaps,
) -> String {
    let header = match suggested {
        ExpenseType::Fixed => "Identified as recurring fixed expense",
        ExpenseType::Variable => "Identified as discretionary variable expense",
    };
    let class_name = match suggested {
        ExpenseType::Fixed => "Fixed",
        ExpenseType::Variable => "Variable",
    };

    let mut segments = [
        ("keywords", totals.keyword.min(caps.keyword)),
        ("merchant pattern", totals.merchant.min(caps.merchant)),
        (
            "historical tags",
            totals.tag_repetition.min(caps.tag_repetition),
        ),
    ];
    segments.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut parts = vec![header.to_string()];
    for (category, contribution) in segments {
        if contribution > 0.0 {
            parts.push(format!(
                "{} {} (weight: {})",
                class_name,
                category,
                fmt_weight(contribution)
            ));
        }
    }

    parts.join(". ")
}

/// Order matched rules for output: winning class first, strongest first.
fn order_hits(mut hits: Vec<RuleHit>, winner: ExpenseType) -> Vec<MatchedRule> {
    hits.sort_by(|a, b| {
        (a.class != winner)
            .cmp(&(b.class != winner))
            .then(b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.rule_id.cmp(&b.rule_id))
    });
    hits.into_iter()
        .map(|h| MatchedRule {
            rule_id: h.rule_id,
            rule_name: h.rule_name,
            matched_keywords: h.matched_keywords,
        })
        .collect()
}

/// Format a weight the way it reads in the UI: "0.4", not "0.40"
fn fmt_weight(w: f64) -> String {
    let s = format!("{:.2}", w);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
