//! Classification service: suggestions, decisions, and the pending queue
//!
//! This is the single write path for `expense_type`. Both the HTTP classify
//! endpoint and the auto-tagger go through `record_decision`, so every
//! classification leaves exactly one feedback event behind.
//!
//! Suggestions are cached per service instance, keyed on
//! `(transaction_id, rule_revision)`: any rule mutation bumps the revision
//! and naturally invalidates stale entries.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::classify::{classify, ClassifySignals};
use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    ClassificationResult, ConfidenceBand, Decision, ExpenseType, NewFeedbackEvent,
    PendingClassification, PendingStats, RuleSnapshot, Transaction,
};

/// Validate a `YYYY-MM` month string
pub fn validate_month(month: &str) -> Result<()> {
    let valid = month.len() == 7
        && chrono::NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok();
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "Invalid month '{}', expected YYYY-MM",
            month
        )))
    }
}

/// Suggestion retrieval, decision recording, and pending-queue listing
pub struct ClassificationService<'a> {
    db: &'a Database,
    config: &'a EngineConfig,
    /// Suggestion cache keyed on (transaction_id, rule_revision)
    cache: Mutex<HashMap<(i64, i64), ClassificationResult>>,
}

impl<'a> ClassificationService<'a> {
    pub fn new(db: &'a Database, config: &'a EngineConfig) -> Self {
        Self {
            db,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Compute (or serve from cache) a suggestion for a stored transaction.
    ///
    /// Fails with `NotFound` for a missing transaction and `NotApplicable`
    /// for income: positive amounts never receive a suggestion.
    pub fn get_suggestion(&self, transaction_id: i64) -> Result<ClassificationResult> {
        let tx = self
            .db
            .get_transaction(transaction_id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", transaction_id)))?;

        self.suggest(&tx)
    }

    /// Suggestion for an already-loaded transaction
    pub fn suggest(&self, tx: &Transaction) -> Result<ClassificationResult> {
        if tx.amount >= 0.0 {
            return Err(Error::NotApplicable(format!(
                "Transaction {} is income; classification applies to expenses only",
                tx.id
            )));
        }

        let revision = self.db.rule_revision()?;
        if let Some(cached) = self.cache.lock().unwrap().get(&(tx.id, revision)) {
            debug!(transaction_id = tx.id, revision, "Suggestion cache hit");
            return Ok(cached.clone());
        }

        let snapshot = self.db.rule_snapshot()?;
        Ok(self.suggest_with_snapshot(tx, &snapshot))
    }

    /// Classify against a shared snapshot (used by the pending listing to
    /// avoid reloading the rule store per transaction)
    fn suggest_with_snapshot(
        &self,
        tx: &Transaction,
        snapshot: &RuleSnapshot,
    ) -> ClassificationResult {
        let key = (tx.id, snapshot.revision);
        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            return cached.clone();
        }

        let result = classify(&ClassifySignals::from_transaction(tx), snapshot, self.config);
        debug!(
            transaction_id = tx.id,
            suggested = %result.suggested_type,
            confidence = result.confidence_score,
            "Classified transaction"
        );

        self.cache.lock().unwrap().insert(key, result.clone());
        result
    }

    /// Resolve a decision against the suggestion snapshot, persist the
    /// expense type, and append one feedback event. Re-recording a decision
    /// overwrites the classification and appends one more event.
    pub fn record_decision(
        &self,
        transaction_id: i64,
        decision: Decision,
        suggestion: &ClassificationResult,
        user_confirmed: bool,
    ) -> Result<Transaction> {
        let resolved = match decision {
            Decision::AiSuggestion => suggestion.suggested_type,
            Decision::Fixed => ExpenseType::Fixed,
            Decision::Variable => ExpenseType::Variable,
        };

        let event = NewFeedbackEvent {
            transaction_id,
            ai_suggested_type: suggestion.suggested_type,
            ai_confidence: suggestion.confidence_score,
            user_decision: decision,
            agreed: resolved == suggestion.suggested_type,
            matched_rule_ids: suggestion.matched_rules.iter().map(|m| m.rule_id).collect(),
            user_confirmed,
        };

        self.db.apply_decision(transaction_id, resolved, &event)?;

        self.db
            .get_transaction(transaction_id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", transaction_id)))
    }

    /// Unclassified expenses for a month, each paired with a fresh
    /// suggestion, in needs-attention order: ascending confidence, so the
    /// most ambiguous cases surface first.
    pub fn list_pending(
        &self,
        month: &str,
        limit: Option<usize>,
        min_confidence: Option<f64>,
    ) -> Result<Vec<PendingClassification>> {
        validate_month(month)?;

        let transactions = self.db.list_unclassified_expenses(month)?;
        let snapshot = self.db.rule_snapshot()?;

        let mut pending: Vec<PendingClassification> = transactions
            .into_iter()
            .map(|tx| {
                let suggestion = self.suggest_with_snapshot(&tx, &snapshot);
                PendingClassification {
                    transaction: tx,
                    suggestion,
                }
            })
            .filter(|p| match min_confidence {
                Some(min) => p.suggestion.confidence_score >= min,
                None => true,
            })
            .collect();

        pending.sort_by(|a, b| {
            a.suggestion
                .confidence_score
                .partial_cmp(&b.suggestion.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.transaction.id.cmp(&b.transaction.id))
        });

        if let Some(limit) = limit {
            pending.truncate(limit);
        }

        Ok(pending)
    }

    /// Counts by confidence band for a pending listing
    pub fn pending_stats(pending: &[PendingClassification]) -> PendingStats {
        let mut stats = PendingStats::default();
        for p in pending {
            match ConfidenceBand::from_score(p.suggestion.confidence_score) {
                ConfidenceBand::High => stats.high += 1,
                ConfidenceBand::Medium => stats.medium += 1,
                ConfidenceBand::Low => stats.low += 1,
            }
            stats.total += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TransactionInsertResult;
    use crate::models::{NewRule, NewTransaction, PatternKind, TransactionSource};
    use chrono::NaiveDate;

    fn setup() -> (Database, EngineConfig) {
        let db = Database::in_memory().unwrap();
        let config = EngineConfig::default();
        (db, config)
    }

    fn add_tx(db: &Database, date: &str, description: &str, amount: f64) -> i64 {
        match db
            .insert_transaction(&NewTransaction {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                description: description.to_string(),
                amount,
                tags: vec![],
                source: TransactionSource::Manual,
            })
            .unwrap()
        {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn add_rule(db: &Database, pattern: &str, type_label: ExpenseType, weight: f64) -> i64 {
        db.insert_rule(&NewRule {
            name: format!("test: {}", pattern),
            type_label,
            pattern_kind: PatternKind::Keyword,
            pattern: pattern.to_string(),
            weight,
        })
        .unwrap()
    }

    #[test]
    fn test_get_suggestion_not_found() {
        let (db, config) = setup();
        let service = ClassificationService::new(&db, &config);

        let err = service.get_suggestion(42).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_income_is_not_applicable() {
        let (db, config) = setup();
        let id = add_tx(&db, "2024-03-01", "PAYROLL DEPOSIT", 2500.0);
        let service = ClassificationService::new(&db, &config);

        let err = service.get_suggestion(id).unwrap_err();
        assert!(matches!(err, Error::NotApplicable(_)));
    }

    #[test]
    fn test_suggestion_for_expense() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let suggestion = service.get_suggestion(id).unwrap();
        assert_eq!(suggestion.suggested_type, ExpenseType::Fixed);
        assert!(suggestion.confidence_score > 0.0);
    }

    #[test]
    fn test_cache_invalidated_by_rule_revision() {
        let (db, config) = setup();
        let rule_id = add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let before = service.get_suggestion(id).unwrap();
        // Second call is served from cache at the same revision
        let cached = service.get_suggestion(id).unwrap();
        assert_eq!(before.rule_revision, cached.rule_revision);

        db.update_rule_weight(rule_id, 0.1).unwrap();

        let after = service.get_suggestion(id).unwrap();
        assert!(after.rule_revision > before.rule_revision);
        assert!(after.confidence_score < before.confidence_score);
    }

    #[test]
    fn test_record_decision_follow_ai() {
        let (db, config) = setup();
        let rule_id = add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let suggestion = service.get_suggestion(id).unwrap();
        let tx = service
            .record_decision(id, Decision::AiSuggestion, &suggestion, true)
            .unwrap();

        assert_eq!(tx.expense_type, Some(ExpenseType::Fixed));

        let events = db.list_feedback_for_transaction(id).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].agreed);
        assert_eq!(events[0].matched_rule_ids, vec![rule_id]);
        assert!(events[0].user_confirmed);
    }

    #[test]
    fn test_record_decision_override_disagrees() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let suggestion = service.get_suggestion(id).unwrap();
        let tx = service
            .record_decision(id, Decision::Variable, &suggestion, true)
            .unwrap();

        assert_eq!(tx.expense_type, Some(ExpenseType::Variable));

        let events = db.list_feedback_for_transaction(id).unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].agreed);
    }

    #[test]
    fn test_forced_decision_matching_suggestion_counts_as_agreement() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let suggestion = service.get_suggestion(id).unwrap();
        service
            .record_decision(id, Decision::Fixed, &suggestion, true)
            .unwrap();

        let events = db.list_feedback_for_transaction(id).unwrap();
        assert!(events[0].agreed);
    }

    #[test]
    fn test_record_decision_idempotent_overwrite() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        let service = ClassificationService::new(&db, &config);

        let suggestion = service.get_suggestion(id).unwrap();
        service
            .record_decision(id, Decision::Fixed, &suggestion, true)
            .unwrap();
        let tx = service
            .record_decision(id, Decision::Fixed, &suggestion, true)
            .unwrap();

        assert_eq!(tx.expense_type, Some(ExpenseType::Fixed));
        assert_eq!(db.list_feedback_for_transaction(id).unwrap().len(), 2);
    }

    #[test]
    fn test_list_pending_needs_attention_order() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        add_rule(&db, "subscription", ExpenseType::Fixed, 0.3);
        add_rule(&db, "restaurant", ExpenseType::Variable, 0.2);

        // Strong match, weak match, no match
        add_tx(&db, "2024-03-01", "NETFLIX SUBSCRIPTION", -15.49);
        add_tx(&db, "2024-03-02", "RESTAURANT LE PETIT PARIS", -45.0);
        add_tx(&db, "2024-03-03", "MYSTERY CHARGE 0423", -12.0);
        // Income and other months are excluded entirely
        add_tx(&db, "2024-03-04", "PAYROLL DEPOSIT", 2500.0);
        add_tx(&db, "2024-04-01", "NETFLIX SUBSCRIPTION", -15.49);

        let service = ClassificationService::new(&db, &config);
        let pending = service.list_pending("2024-03", None, None).unwrap();

        assert_eq!(pending.len(), 3);
        // Ascending confidence: most ambiguous first
        for window in pending.windows(2) {
            assert!(
                window[0].suggestion.confidence_score <= window[1].suggestion.confidence_score
            );
        }
        // Weak variable match (0.2) < capped keyword match (0.4) < no-match default (0.5)
        assert_eq!(
            pending[0].transaction.description,
            "RESTAURANT LE PETIT PARIS"
        );
        assert_eq!(pending[1].transaction.description, "NETFLIX SUBSCRIPTION");
        assert_eq!(pending[2].transaction.description, "MYSTERY CHARGE 0423");
    }

    #[test]
    fn test_list_pending_min_confidence_and_limit() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        add_tx(&db, "2024-03-02", "MYSTERY CHARGE", -12.0);

        let service = ClassificationService::new(&db, &config);

        // min_confidence filters before the limit applies
        let filtered = service.list_pending("2024-03", None, Some(0.45)).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].transaction.description, "MYSTERY CHARGE");

        let limited = service.list_pending("2024-03", Some(1), None).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_list_pending_never_returns_classified() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        add_tx(&db, "2024-03-02", "MYSTERY CHARGE", -12.0);

        let service = ClassificationService::new(&db, &config);
        let suggestion = service.get_suggestion(id).unwrap();
        service
            .record_decision(id, Decision::AiSuggestion, &suggestion, true)
            .unwrap();

        let pending = service.list_pending("2024-03", None, None).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.iter().all(|p| p.transaction.expense_type.is_none()));
    }

    #[test]
    fn test_invalid_month_rejected() {
        let (db, config) = setup();
        let service = ClassificationService::new(&db, &config);

        for month in ["2024", "2024-13", "24-03", "march", "2024-03-01"] {
            let err = service.list_pending(month, None, None).unwrap_err();
            assert!(matches!(err, Error::InvalidData(_)), "month {}", month);
        }
    }

    #[test]
    fn test_pending_stats_bands() {
        let (db, config) = setup();
        add_rule(&db, "netflix", ExpenseType::Fixed, 0.4);
        add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
        add_tx(&db, "2024-03-02", "MYSTERY CHARGE", -12.0);

        let service = ClassificationService::new(&db, &config);
        let pending = service.list_pending("2024-03", None, None).unwrap();
        let stats = ClassificationService::pending_stats(&pending);

        assert_eq!(stats.total, pending.len());
        assert_eq!(stats.high + stats.medium + stats.low, stats.total);
    }
}
