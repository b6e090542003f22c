//! Feedback event operations
//!
//! Events are appended by `apply_decision` and consumed (never deleted) by
//! the feedback learner; the `processed` flag is what makes repeated
//! learner runs idempotent.

use rusqlite::{params, Connection, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Decision, ExpenseType, FeedbackEvent, NewFeedbackEvent};

/// Insert within an existing transaction (shared with `apply_decision`)
pub(crate) fn insert_feedback_event(
    conn: &Connection,
    event: &NewFeedbackEvent,
) -> rusqlite::Result<i64> {
    let matched_json =
        serde_json::to_string(&event.matched_rule_ids).unwrap_or_else(|_| "[]".to_string());

    conn.execute(
        r#"
        INSERT INTO feedback_events (
            transaction_id, ai_suggested_type, ai_confidence, user_decision,
            agreed, matched_rule_ids, user_confirmed
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            event.transaction_id,
            event.ai_suggested_type.as_str(),
            event.ai_confidence,
            event.user_decision.as_str(),
            event.agreed,
            matched_json,
            event.user_confirmed,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn map_event(row: &Row) -> rusqlite::Result<FeedbackEvent> {
    let suggested_str: String = row.get(2)?;
    let decision_str: String = row.get(4)?;
    let matched_json: Option<String> = row.get(6)?;
    let user_confirmed_int: i64 = row.get(7)?;
    let processed_int: i64 = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    Ok(FeedbackEvent {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        ai_suggested_type: suggested_str.parse().unwrap_or(ExpenseType::Variable),
        ai_confidence: row.get(3)?,
        user_decision: decision_str.parse().unwrap_or(Decision::AiSuggestion),
        agreed: row.get::<_, i64>(5)? != 0,
        matched_rule_ids: matched_json
            .and_then(|j| serde_json::from_str(&j).ok())
            .unwrap_or_default(),
        user_confirmed: user_confirmed_int != 0,
        processed: processed_int != 0,
        created_at: parse_datetime(&created_at_str),
    })
}

const EVENT_COLUMNS: &str = "id, transaction_id, ai_suggested_type, ai_confidence, user_decision, \
     agreed, matched_rule_ids, user_confirmed, processed, created_at";

impl Database {
    /// Append a feedback event outside of a decision write (tests, backfill)
    pub fn append_feedback_event(&self, event: &NewFeedbackEvent) -> Result<i64> {
        let conn = self.conn()?;
        Ok(insert_feedback_event(&conn, event)?)
    }

    /// List events the learner has not consumed yet, oldest first
    pub fn list_unprocessed_feedback(&self, limit: Option<i64>) -> Result<Vec<FeedbackEvent>> {
        let conn = self.conn()?;

        let mut sql = format!(
            "SELECT {} FROM feedback_events WHERE processed = 0 ORDER BY id",
            EVENT_COLUMNS
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut stmt = conn.prepare(&sql)?;
        let events = match limit {
            Some(n) => stmt
                .query_map(params![n], map_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], map_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(events)
    }

    /// Mark events as consumed by the learner
    pub fn mark_feedback_processed(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE feedback_events SET processed = 1 WHERE id IN ({})",
            placeholders
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        let updated = conn.execute(&sql, params_refs.as_slice())?;
        Ok(updated)
    }

    /// List all events recorded for a transaction, newest first
    pub fn list_feedback_for_transaction(&self, transaction_id: i64) -> Result<Vec<FeedbackEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feedback_events WHERE transaction_id = ? ORDER BY id DESC",
            EVENT_COLUMNS
        ))?;

        let events = stmt
            .query_map(params![transaction_id], map_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Count feedback events; `only_unprocessed` restricts to the learner's
    /// backlog
    pub fn count_feedback_events(&self, only_unprocessed: bool) -> Result<i64> {
        let conn = self.conn()?;
        let sql = if only_unprocessed {
            "SELECT COUNT(*) FROM feedback_events WHERE processed = 0"
        } else {
            "SELECT COUNT(*) FROM feedback_events"
        };
        let count = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count)
    }
}
