//! Feedback learner: bounded, auditable rule weight adjustment
//!
//! Not gradient descent. Each unprocessed feedback event is grouped by the
//! rules that backed its suggestion; per rule, the agreement ratio decides
//! a single ±step nudge, clamped to [0, 1]. Every adjustment is logged with
//! the ratio that caused it, and consumed events are flagged so a repeated
//! run adjusts nothing.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::ImproveOutcome;

/// Per-rule tally over the unprocessed event window
#[derive(Debug, Default, Clone, Copy)]
struct RuleTally {
    matched: u32,
    agreed: u32,
}

pub struct FeedbackLearner<'a> {
    db: &'a Database,
    config: &'a EngineConfig,
}

impl<'a> FeedbackLearner<'a> {
    pub fn new(db: &'a Database, config: &'a EngineConfig) -> Self {
        Self { db, config }
    }

    /// Consume unprocessed feedback events and nudge rule weights.
    ///
    /// `max_events` bounds the window (oldest first); `None` drains the
    /// whole backlog. Idempotent: events are marked processed in the same
    /// pass, so calling again without new feedback adjusts zero rules.
    pub fn improve(&self, max_events: Option<i64>) -> Result<ImproveOutcome> {
        let events = self.db.list_unprocessed_feedback(max_events)?;
        if events.is_empty() {
            return Ok(ImproveOutcome::default());
        }

        // BTreeMap for deterministic adjustment order
        let mut tallies: BTreeMap<i64, RuleTally> = BTreeMap::new();
        for event in &events {
            for rule_id in &event.matched_rule_ids {
                let tally = tallies.entry(*rule_id).or_default();
                tally.matched += 1;
                if event.agreed {
                    tally.agreed += 1;
                }
            }
        }

        let step = self.config.learning.step;
        let mut outcome = ImproveOutcome {
            events_processed: events.len(),
            ..Default::default()
        };

        for (rule_id, tally) in tallies {
            let ratio = tally.agreed as f64 / tally.matched as f64;

            let delta = if ratio > self.config.learning.promote_ratio {
                step
            } else if ratio < self.config.learning.demote_ratio {
                -step
            } else {
                debug!(
                    rule_id,
                    ratio, "Agreement ratio inside neutral band, no adjustment"
                );
                continue;
            };

            let rule = match self.db.get_rule(rule_id)? {
                Some(rule) => rule,
                None => {
                    debug!(rule_id, "Rule behind feedback no longer present, skipping");
                    continue;
                }
            };

            let applied = self.db.update_rule_weight(rule_id, rule.weight + delta)?;
            let actual_delta = applied - rule.weight;

            if actual_delta.abs() > f64::EPSILON {
                info!(
                    rule_id,
                    name = %rule.name,
                    ratio,
                    matched = tally.matched,
                    old_weight = rule.weight,
                    new_weight = applied,
                    "Adjusted rule weight from feedback"
                );
                outcome.rules_adjusted += 1;
                outcome.net_weight_delta += actual_delta;
            }
        }

        let event_ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        self.db.mark_feedback_processed(&event_ids)?;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TransactionInsertResult;
    use crate::models::{
        Decision, ExpenseType, NewFeedbackEvent, NewRule, NewTransaction, PatternKind,
        TransactionSource,
    };
    use chrono::NaiveDate;

    fn setup() -> (Database, EngineConfig) {
        (Database::in_memory().unwrap(), EngineConfig::default())
    }

    fn add_tx(db: &Database) -> i64 {
        match db
            .insert_transaction(&NewTransaction {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                description: "NETFLIX.COM".to_string(),
                amount: -15.49,
                tags: vec![],
                source: TransactionSource::Manual,
            })
            .unwrap()
        {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn add_rule(db: &Database, weight: f64) -> i64 {
        db.insert_rule(&NewRule {
            name: "test: netflix".to_string(),
            type_label: ExpenseType::Fixed,
            pattern_kind: PatternKind::Keyword,
            pattern: "netflix".to_string(),
            weight,
        })
        .unwrap()
    }

    fn record_events(db: &Database, tx: i64, rule_id: i64, agreements: &[bool]) {
        for &agreed in agreements {
            db.append_feedback_event(&NewFeedbackEvent {
                transaction_id: tx,
                ai_suggested_type: ExpenseType::Fixed,
                ai_confidence: 0.6,
                user_decision: if agreed {
                    Decision::AiSuggestion
                } else {
                    Decision::Variable
                },
                agreed,
                matched_rule_ids: vec![rule_id],
                user_confirmed: true,
            })
            .unwrap();
        }
    }

    #[test]
    fn test_unanimous_agreement_promotes() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.4);
        record_events(&db, tx, rule_id, &[true, true, true]);

        let outcome = FeedbackLearner::new(&db, &config).improve(None).unwrap();

        assert_eq!(outcome.rules_adjusted, 1);
        assert_eq!(outcome.events_processed, 3);
        assert!((outcome.net_weight_delta - config.learning.step).abs() < 1e-9);

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!((rule.weight - (0.4 + config.learning.step)).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_disagreement_demotes() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.4);
        record_events(&db, tx, rule_id, &[false, false, false]);

        let outcome = FeedbackLearner::new(&db, &config).improve(None).unwrap();

        assert_eq!(outcome.rules_adjusted, 1);
        assert!((outcome.net_weight_delta + config.learning.step).abs() < 1e-9);

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!((rule.weight - (0.4 - config.learning.step)).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_ratio_leaves_weight_alone() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.4);
        // 50% agreement sits between demote (0.3) and promote (0.8)
        record_events(&db, tx, rule_id, &[true, false]);

        let outcome = FeedbackLearner::new(&db, &config).improve(None).unwrap();

        assert_eq!(outcome.rules_adjusted, 0);
        assert_eq!(outcome.events_processed, 2);
        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!((rule.weight - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_improve_is_idempotent() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.4);
        record_events(&db, tx, rule_id, &[true, true, true]);

        let learner = FeedbackLearner::new(&db, &config);
        let first = learner.improve(None).unwrap();
        assert_eq!(first.rules_adjusted, 1);

        // Same events must not be counted twice
        let second = learner.improve(None).unwrap();
        assert_eq!(second.rules_adjusted, 0);
        assert_eq!(second.events_processed, 0);

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!((rule.weight - (0.4 + config.learning.step)).abs() < 1e-9);
    }

    #[test]
    fn test_weight_floor_at_zero() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.01);
        record_events(&db, tx, rule_id, &[false, false, false, false]);

        FeedbackLearner::new(&db, &config).improve(None).unwrap();

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!(rule.weight.abs() < 1e-9);
        // Demoted, never deleted
        assert!(db.get_rule(rule_id).unwrap().is_some());
    }

    #[test]
    fn test_weight_cap_at_one() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.995);
        record_events(&db, tx, rule_id, &[true, true, true]);

        FeedbackLearner::new(&db, &config).improve(None).unwrap();

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!((rule.weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_events_window() {
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.4);
        record_events(&db, tx, rule_id, &[true, true, true, true]);

        let learner = FeedbackLearner::new(&db, &config);
        let first = learner.improve(Some(2)).unwrap();
        assert_eq!(first.events_processed, 2);

        // The remaining two are still unprocessed
        assert_eq!(db.count_feedback_events(true).unwrap(), 2);
        let second = learner.improve(None).unwrap();
        assert_eq!(second.events_processed, 2);
    }

    #[test]
    fn test_empty_backlog_is_noop() {
        let (db, config) = setup();
        let outcome = FeedbackLearner::new(&db, &config).improve(None).unwrap();
        assert_eq!(outcome.rules_adjusted, 0);
        assert_eq!(outcome.events_processed, 0);
        assert!(outcome.net_weight_delta.abs() < 1e-9);
    }

    #[test]
    fn test_spec_override_example_demotes_rule() {
        // User overrides an AI suggestion of FIXED (confidence 0.6) to
        // VARIABLE three times for the same rule: the agreement ratio is 0,
        // below the demote threshold, so the weight steps down.
        let (db, config) = setup();
        let tx = add_tx(&db);
        let rule_id = add_rule(&db, 0.5);
        record_events(&db, tx, rule_id, &[false, false, false]);

        FeedbackLearner::new(&db, &config).improve(None).unwrap();

        let rule = db.get_rule(rule_id).unwrap().unwrap();
        assert!(rule.weight < 0.5);
    }
}
