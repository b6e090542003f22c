//! Domain models for Sift

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The two expense classes a transaction can be sorted into.
///
/// Fixed expenses recur predictably (subscriptions, rent, insurance);
/// variable expenses are occasional, discretionary spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseType {
    Fixed,
    Variable,
}

impl ExpenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
        }
    }
}

impl std::str::FromStr for ExpenseType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "variable" => Ok(Self::Variable),
            _ => Err(format!("Unknown expense type: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a rule's pattern is matched against a transaction label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Word-boundary substring match against the normalized label
    /// (and against historical tags, which score separately)
    Keyword,
    /// Exact match of the whole normalized label
    MerchantExact,
    /// Normalized edit-distance similarity above the configured threshold
    MerchantFuzzy,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::MerchantExact => "merchant_exact",
            Self::MerchantFuzzy => "merchant_fuzzy",
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "merchant_exact" => Ok(Self::MerchantExact),
            "merchant_fuzzy" => Ok(Self::MerchantFuzzy),
            _ => Err(format!("Unknown pattern kind: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classification rule voting for one expense class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    /// Human-readable label shown in reasoning output
    pub name: String,
    /// The class this rule votes for; never changes over a rule's lifetime
    pub type_label: ExpenseType,
    pub pattern_kind: PatternKind,
    pub pattern: String,
    /// Vote strength in [0, 1]; adjusted by the feedback learner,
    /// demoted toward 0 instead of ever being deleted
    pub weight: f64,
    /// Whether this rule came from the built-in catalog
    pub seeded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rule to be inserted
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub type_label: ExpenseType,
    pub pattern_kind: PatternKind,
    pub pattern: String,
    pub weight: f64,
}

/// A consistent view of the rule store at a specific revision
///
/// Weight updates bump the revision, so a classification pinned to a
/// snapshot is reproducible.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub revision: i64,
    pub rules: Vec<Rule>,
}

/// How a transaction entered the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// Created by the (external) statement import pipeline
    #[default]
    Import,
    /// Manually entered
    Manual,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "import" => Ok(Self::Import),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Unknown transaction source: {}", s)),
        }
    }
}

/// A financial transaction (the subset the engine cares about)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    /// YYYY-MM derivation of `date`, stored for month-scoped queries
    pub month: String,
    pub description: String,
    /// Negative = expense, positive = income. Only expenses are classified.
    pub amount: f64,
    /// Historical tags carried over from the import pipeline
    pub tags: Vec<String>,
    /// Fixed/variable once decided, None while unclassified
    pub expense_type: Option<ExpenseType>,
    pub source: TransactionSource,
    /// Hash for deduplication
    pub entry_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new transaction before DB insertion
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub tags: Vec<String>,
    pub source: TransactionSource,
}

/// A user's classification decision
///
/// `AiSuggestion` is resolved to a concrete class against the suggestion
/// snapshot before anything is persisted; the ambiguous tag never lands on
/// the transaction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AiSuggestion,
    Fixed,
    Variable,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiSuggestion => "ai_suggestion",
            Self::Fixed => "fixed",
            Self::Variable => "variable",
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ai_suggestion" => Ok(Self::AiSuggestion),
            "fixed" => Ok(Self::Fixed),
            "variable" => Ok(Self::Variable),
            _ => Err(format!("Unknown decision: {}", s)),
        }
    }
}

/// A rule that matched during classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRule {
    pub rule_id: i64,
    pub rule_name: String,
    /// The pattern/tag strings that actually hit
    pub matched_keywords: Vec<String>,
}

/// Result of classifying a single transaction
///
/// Derived, not persisted; recomputed per request unless served from the
/// revision-keyed suggestion cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub suggested_type: ExpenseType,
    /// In [0, 1]; winning score normalized against the runner-up
    pub confidence_score: f64,
    /// Human-readable explanation of which rule categories fired
    pub reasoning: String,
    /// Matched rules, winning class first, strongest first
    pub matched_rules: Vec<MatchedRule>,
    pub score_fixed: f64,
    pub score_variable: f64,
    /// Rule store revision this result was computed against
    pub rule_revision: i64,
}

/// Presentation band for a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            Self::High
        } else if score >= 0.65 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A recorded classification decision, consumed by the feedback learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: i64,
    pub transaction_id: i64,
    pub ai_suggested_type: ExpenseType,
    pub ai_confidence: f64,
    pub user_decision: Decision,
    /// Whether the decision confirmed the AI suggestion
    pub agreed: bool,
    /// Rules behind the suggestion, for per-rule agreement ratios
    pub matched_rule_ids: Vec<i64>,
    /// True when a human explicitly reviewed the decision
    /// (auto-tagged decisions record false)
    pub user_confirmed: bool,
    /// Set once the learner has consumed this event
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// A feedback event to be appended
#[derive(Debug, Clone)]
pub struct NewFeedbackEvent {
    pub transaction_id: i64,
    pub ai_suggested_type: ExpenseType,
    pub ai_confidence: f64,
    pub user_decision: Decision,
    pub agreed: bool,
    pub matched_rule_ids: Vec<i64>,
    pub user_confirmed: bool,
}

/// Auto-tag job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

/// Persisted state of an auto-tag run
///
/// Progress is derived from this row, not from in-memory counters, so it
/// reflects the last committed state even after a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoTagJob {
    pub id: i64,
    pub month: String,
    pub status: JobStatus,
    pub confidence_threshold: f64,
    pub total: i64,
    pub processed: i64,
    pub auto_applied: i64,
    pub pending_review: i64,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A pending transaction paired with its fresh suggestion
#[derive(Debug, Clone, Serialize)]
pub struct PendingClassification {
    pub transaction: Transaction,
    pub suggestion: ClassificationResult,
}

/// Pending-queue counts by confidence band
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PendingStats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

/// Outcome of a feedback learning pass
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImproveOutcome {
    pub rules_adjusted: usize,
    /// Sum of applied weight deltas (positive = net promotion)
    pub net_weight_delta: f64,
    pub events_processed: usize,
}

/// Final tally of an auto-tag run
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AutoTagOutcome {
    pub status: JobStatus,
    pub auto_applied: i64,
    pub pending_review: i64,
    pub total_analyzed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_type_round_trip() {
        assert_eq!("fixed".parse::<ExpenseType>().unwrap(), ExpenseType::Fixed);
        assert_eq!(
            "VARIABLE".parse::<ExpenseType>().unwrap(),
            ExpenseType::Variable
        );
        assert_eq!(ExpenseType::Fixed.as_str(), "fixed");
        assert!("income".parse::<ExpenseType>().is_err());
    }

    #[test]
    fn test_expense_type_json_uses_api_casing() {
        let json = serde_json::to_string(&ExpenseType::Fixed).unwrap();
        assert_eq!(json, "\"FIXED\"");
        let parsed: ExpenseType = serde_json::from_str("\"VARIABLE\"").unwrap();
        assert_eq!(parsed, ExpenseType::Variable);
    }

    #[test]
    fn test_pattern_kind_round_trip() {
        for kind in [
            PatternKind::Keyword,
            PatternKind::MerchantExact,
            PatternKind::MerchantFuzzy,
        ] {
            assert_eq!(kind.as_str().parse::<PatternKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_decision_round_trip() {
        assert_eq!(
            "ai_suggestion".parse::<Decision>().unwrap(),
            Decision::AiSuggestion
        );
        assert_eq!("fixed".parse::<Decision>().unwrap(), Decision::Fixed);
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_score(0.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.85), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.7), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.65), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.5), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_score(0.0), ConfidenceBand::Low);
    }
}
