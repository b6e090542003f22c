//! Transaction storage operations
//!
//! Transactions are created by the (external) import pipeline or manually;
//! the engine itself only ever writes `expense_type`, and only through
//! `apply_decision` so every write leaves a feedback event behind.

use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    ExpenseType, NewFeedbackEvent, NewTransaction, Transaction, TransactionSource,
};

/// Result of inserting a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionInsertResult {
    Inserted(i64),
    /// A transaction with the same dedup hash already exists
    Duplicate(i64),
}

/// Dedup hash over the fields that identify a statement line
fn entry_hash(tx: &NewTransaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{:.2}", tx.date, tx.description, tx.amount));
    hex::encode(hasher.finalize())
}

fn map_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    let tags_json: Option<String> = row.get(5)?;
    let expense_type_str: Option<String> = row.get(6)?;
    let source_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;

    Ok(Transaction {
        id: row.get(0)?,
        date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
        month: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        tags: tags_json
            .and_then(|j| serde_json::from_str(&j).ok())
            .unwrap_or_default(),
        expense_type: expense_type_str.and_then(|s| s.parse().ok()),
        source: source_str.parse().unwrap_or(TransactionSource::Import),
        entry_hash: row.get(8)?,
        created_at: parse_datetime(&created_at_str),
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, date, month, description, amount, tags, expense_type, source, entry_hash, created_at";

impl Database {
    /// Insert a transaction, skipping duplicates by dedup hash
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;
        let hash = entry_hash(tx);

        if let Some(existing_id) = conn
            .query_row(
                "SELECT id FROM transactions WHERE entry_hash = ?",
                params![hash],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            return Ok(TransactionInsertResult::Duplicate(existing_id));
        }

        let month = tx.date.format("%Y-%m").to_string();
        let tags_json = serde_json::to_string(&tx.tags)?;

        conn.execute(
            r#"
            INSERT INTO transactions (date, month, description, amount, tags, source, entry_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.date.to_string(),
                month,
                tx.description,
                tx.amount,
                tags_json,
                tx.source.as_str(),
                hash,
            ],
        )?;

        Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()))
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;

        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![id],
                map_transaction,
            )
            .optional()?;

        Ok(tx)
    }

    /// List transactions, optionally scoped to a month
    pub fn list_transactions(
        &self,
        month: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut sql = format!(
            "SELECT {} FROM transactions WHERE 1=1",
            TRANSACTION_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(m) = month {
            sql.push_str(" AND month = ?");
            params_vec.push(Box::new(m.to_string()));
        }

        sql.push_str(" ORDER BY date DESC, id DESC LIMIT ? OFFSET ?");
        params_vec.push(Box::new(limit));
        params_vec.push(Box::new(offset));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params_refs.as_slice(), map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// List unclassified expenses for a month (the auto-tag / pending set)
    pub fn list_unclassified_expenses(&self, month: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE month = ? AND expense_type IS NULL AND amount < 0
             ORDER BY date, id",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![month], map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// List all expenses for a month, classified or not
    pub fn list_expenses(&self, month: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE month = ? AND amount < 0
             ORDER BY date, id",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![month], map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count transactions sharing a description (history depth for a label)
    pub fn count_with_description(&self, description: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE description = ?",
            params![description],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count unclassified expenses, optionally scoped to a month
    pub fn count_unclassified(&self, month: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;
        let count = match month {
            Some(m) => conn.query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE month = ? AND expense_type IS NULL AND amount < 0",
                params![m],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE expense_type IS NULL AND amount < 0",
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Persist a classification decision: set `expense_type` and append the
    /// feedback event in one SQL transaction so history can never diverge
    /// from the stored classification.
    pub fn apply_decision(
        &self,
        transaction_id: i64,
        expense_type: ExpenseType,
        event: &NewFeedbackEvent,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        let updated = sql_tx.execute(
            "UPDATE transactions SET expense_type = ? WHERE id = ?",
            params![expense_type.as_str(), transaction_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!(
                "Transaction {} not found",
                transaction_id
            )));
        }

        super::feedback::insert_feedback_event(&sql_tx, event)?;

        sql_tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;
    use chrono::NaiveDate;

    fn new_tx(date: &str, description: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: description.to_string(),
            amount,
            tags: vec![],
            source: TransactionSource::Manual,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::in_memory().unwrap();

        let result = db
            .insert_transaction(&new_tx("2024-03-15", "NETFLIX.COM", -15.49))
            .unwrap();
        let id = match result {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        };

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.description, "NETFLIX.COM");
        assert_eq!(tx.month, "2024-03");
        assert!(tx.expense_type.is_none());
        assert_eq!(tx.source, TransactionSource::Manual);
    }

    #[test]
    fn test_duplicate_detection() {
        let db = Database::in_memory().unwrap();

        let first = db
            .insert_transaction(&new_tx("2024-03-15", "NETFLIX.COM", -15.49))
            .unwrap();
        let id = match first {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        };

        let second = db
            .insert_transaction(&new_tx("2024-03-15", "NETFLIX.COM", -15.49))
            .unwrap();
        assert_eq!(second, TransactionInsertResult::Duplicate(id));
    }

    #[test]
    fn test_get_missing_is_none() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_transaction(999).unwrap().is_none());
    }

    #[test]
    fn test_unclassified_expenses_excludes_income_and_classified() {
        let db = Database::in_memory().unwrap();

        db.insert_transaction(&new_tx("2024-03-01", "NETFLIX.COM", -15.49))
            .unwrap();
        db.insert_transaction(&new_tx("2024-03-02", "PAYROLL DEPOSIT", 2500.0))
            .unwrap();
        db.insert_transaction(&new_tx("2024-04-01", "NETFLIX.COM", -15.49))
            .unwrap();

        let pending = db.list_unclassified_expenses("2024-03").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].description, "NETFLIX.COM");

        // Classify it and re-check
        let event = NewFeedbackEvent {
            transaction_id: pending[0].id,
            ai_suggested_type: ExpenseType::Fixed,
            ai_confidence: 0.8,
            user_decision: Decision::AiSuggestion,
            agreed: true,
            matched_rule_ids: vec![1],
            user_confirmed: true,
        };
        db.apply_decision(pending[0].id, ExpenseType::Fixed, &event)
            .unwrap();

        assert!(db.list_unclassified_expenses("2024-03").unwrap().is_empty());
        let tx = db.get_transaction(pending[0].id).unwrap().unwrap();
        assert_eq!(tx.expense_type, Some(ExpenseType::Fixed));
    }

    #[test]
    fn test_apply_decision_missing_transaction() {
        let db = Database::in_memory().unwrap();
        let event = NewFeedbackEvent {
            transaction_id: 42,
            ai_suggested_type: ExpenseType::Variable,
            ai_confidence: 0.5,
            user_decision: Decision::Variable,
            agreed: true,
            matched_rule_ids: vec![],
            user_confirmed: true,
        };
        let err = db
            .apply_decision(42, ExpenseType::Variable, &event)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        // Nothing committed: no orphan feedback rows
        assert_eq!(db.count_feedback_events(false).unwrap(), 0);
    }

    #[test]
    fn test_apply_decision_overwrite_appends_one_event_each() {
        let db = Database::in_memory().unwrap();
        let id = match db
            .insert_transaction(&new_tx("2024-03-01", "SPOTIFY", -10.99))
            .unwrap()
        {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        };

        let event = NewFeedbackEvent {
            transaction_id: id,
            ai_suggested_type: ExpenseType::Fixed,
            ai_confidence: 0.7,
            user_decision: Decision::AiSuggestion,
            agreed: true,
            matched_rule_ids: vec![3],
            user_confirmed: true,
        };

        db.apply_decision(id, ExpenseType::Fixed, &event).unwrap();
        db.apply_decision(id, ExpenseType::Fixed, &event).unwrap();

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.expense_type, Some(ExpenseType::Fixed));
        assert_eq!(db.count_feedback_events(false).unwrap(), 2);
    }

    #[test]
    fn test_tags_round_trip() {
        let db = Database::in_memory().unwrap();
        let mut tx = new_tx("2024-03-01", "UBER EATS PARIS", -23.5);
        tx.tags = vec!["dining".to_string(), "delivery".to_string()];

        let id = match db.insert_transaction(&tx).unwrap() {
            TransactionInsertResult::Inserted(id) => id,
            other => panic!("unexpected {:?}", other),
        };

        let stored = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(stored.tags, vec!["dining", "delivery"]);
    }

    #[test]
    fn test_count_with_description() {
        let db = Database::in_memory().unwrap();
        db.insert_transaction(&new_tx("2024-01-15", "NETFLIX.COM", -15.49))
            .unwrap();
        db.insert_transaction(&new_tx("2024-02-15", "NETFLIX.COM", -15.49))
            .unwrap();
        db.insert_transaction(&new_tx("2024-02-20", "SPOTIFY", -10.99))
            .unwrap();

        assert_eq!(db.count_with_description("NETFLIX.COM").unwrap(), 2);
        assert_eq!(db.count_with_description("UNKNOWN").unwrap(), 0);
    }
}
