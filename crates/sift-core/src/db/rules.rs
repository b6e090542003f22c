//! Versioned classification rule store
//!
//! Every mutation (insert or weight update) bumps the store-wide
//! `rule_revision` counter in the same SQL transaction, so readers either
//! see a rule before or after a change, never a torn state, and a
//! classification can be pinned to a revision for reproducibility.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewRule, Rule, RuleSnapshot};
use crate::seed;

fn map_rule(row: &Row) -> rusqlite::Result<std::result::Result<Rule, String>> {
    let type_label_str: String = row.get(2)?;
    let pattern_kind_str: String = row.get(3)?;
    let seeded_int: i64 = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    let type_label = match type_label_str.parse() {
        Ok(t) => t,
        Err(e) => return Ok(Err(e)),
    };
    let pattern_kind = match pattern_kind_str.parse() {
        Ok(k) => k,
        Err(e) => return Ok(Err(e)),
    };

    Ok(Ok(Rule {
        id: row.get(0)?,
        name: row.get(1)?,
        type_label,
        pattern_kind,
        pattern: row.get(4)?,
        weight: row.get(5)?,
        seeded: seeded_int != 0,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    }))
}

const RULE_COLUMNS: &str =
    "id, name, type_label, pattern_kind, pattern, weight, seeded, created_at, updated_at";

fn bump_revision(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE store_meta SET value = CAST(value AS INTEGER) + 1 WHERE key = 'rule_revision'",
        [],
    )?;
    Ok(())
}

fn read_revision(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT CAST(value AS INTEGER) FROM store_meta WHERE key = 'rule_revision'",
        [],
        |row| row.get(0),
    )
}

impl Database {
    /// Seed the built-in rule catalog. Idempotent: does nothing once any
    /// seeded rule exists.
    pub fn seed_rules(&self) -> Result<usize> {
        let mut conn = self.conn()?;

        let already: i64 = conn.query_row(
            "SELECT COUNT(*) FROM classification_rules WHERE seeded = 1",
            [],
            |row| row.get(0),
        )?;
        if already > 0 {
            return Ok(0);
        }

        let sql_tx = conn.transaction()?;
        let mut inserted = 0usize;
        for rule in seed::catalog() {
            sql_tx.execute(
                r#"
                INSERT INTO classification_rules (name, type_label, pattern_kind, pattern, weight, seeded)
                VALUES (?, ?, ?, ?, ?, 1)
                "#,
                params![
                    rule.name,
                    rule.type_label.as_str(),
                    rule.pattern_kind.as_str(),
                    rule.pattern,
                    rule.weight.clamp(0.0, 1.0),
                ],
            )?;
            inserted += 1;
        }
        bump_revision(&sql_tx)?;
        sql_tx.commit()?;

        info!("Seeded {} classification rules", inserted);
        Ok(inserted)
    }

    /// List all rules in insertion order. Rows that fail to parse are
    /// skipped with a warning; a corrupt rule never fails the caller.
    pub fn list_rules(&self) -> Result<Vec<Rule>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM classification_rules ORDER BY id",
            RULE_COLUMNS
        ))?;

        let mut rules = Vec::new();
        for parsed in stmt.query_map([], map_rule)? {
            match parsed? {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("Skipping corrupt rule row: {}", e),
            }
        }

        Ok(rules)
    }

    /// Consistent snapshot of the rule store: revision + rules read in one
    /// transaction.
    pub fn rule_snapshot(&self) -> Result<RuleSnapshot> {
        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        let revision = read_revision(&sql_tx)?;

        let mut rules = Vec::new();
        {
            let mut stmt = sql_tx.prepare(&format!(
                "SELECT {} FROM classification_rules ORDER BY id",
                RULE_COLUMNS
            ))?;
            for parsed in stmt.query_map([], map_rule)? {
                match parsed? {
                    Ok(rule) => rules.push(rule),
                    Err(e) => warn!("Skipping corrupt rule row: {}", e),
                }
            }
        }

        sql_tx.commit()?;
        Ok(RuleSnapshot { revision, rules })
    }

    /// Get a rule by ID
    pub fn get_rule(&self, id: i64) -> Result<Option<Rule>> {
        let conn = self.conn()?;

        let parsed = conn
            .query_row(
                &format!("SELECT {} FROM classification_rules WHERE id = ?", RULE_COLUMNS),
                params![id],
                map_rule,
            )
            .optional()?;

        match parsed {
            None => Ok(None),
            Some(Ok(rule)) => Ok(Some(rule)),
            Some(Err(e)) => Err(Error::RuleStoreCorrupt(format!("rule {}: {}", id, e))),
        }
    }

    /// Insert a user-defined rule. Weight is clamped to [0, 1].
    pub fn insert_rule(&self, rule: &NewRule) -> Result<i64> {
        if rule.pattern.trim().is_empty() {
            return Err(Error::InvalidData("Rule pattern must not be empty".to_string()));
        }

        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        sql_tx.execute(
            r#"
            INSERT INTO classification_rules (name, type_label, pattern_kind, pattern, weight, seeded)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
            params![
                rule.name,
                rule.type_label.as_str(),
                rule.pattern_kind.as_str(),
                rule.pattern,
                rule.weight.clamp(0.0, 1.0),
            ],
        )?;
        let id = sql_tx.last_insert_rowid();
        bump_revision(&sql_tx)?;
        sql_tx.commit()?;

        Ok(id)
    }

    /// Atomically update a rule's weight (clamped to [0, 1]) and bump the
    /// store revision. Returns the applied weight.
    pub fn update_rule_weight(&self, id: i64, new_weight: f64) -> Result<f64> {
        let clamped = new_weight.clamp(0.0, 1.0);

        let mut conn = self.conn()?;
        let sql_tx = conn.transaction()?;

        let updated = sql_tx.execute(
            "UPDATE classification_rules SET weight = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![clamped, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Rule {} not found", id)));
        }
        bump_revision(&sql_tx)?;
        sql_tx.commit()?;

        Ok(clamped)
    }

    /// Current rule store revision
    pub fn rule_revision(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(read_revision(&conn)?)
    }

    pub fn count_rules(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM classification_rules", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseType, PatternKind};

    fn new_rule(pattern: &str, weight: f64) -> NewRule {
        NewRule {
            name: format!("test: {}", pattern),
            type_label: ExpenseType::Fixed,
            pattern_kind: PatternKind::Keyword,
            pattern: pattern.to_string(),
            weight,
        }
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::in_memory().unwrap();

        let first = db.seed_rules().unwrap();
        assert!(first >= 500);
        assert_eq!(db.count_rules().unwrap(), first as i64);

        let second = db.seed_rules().unwrap();
        assert_eq!(second, 0);
        assert_eq!(db.count_rules().unwrap(), first as i64);
    }

    #[test]
    fn test_insert_bumps_revision() {
        let db = Database::in_memory().unwrap();
        let before = db.rule_revision().unwrap();

        db.insert_rule(&new_rule("netflix", 0.4)).unwrap();

        assert_eq!(db.rule_revision().unwrap(), before + 1);
    }

    #[test]
    fn test_insert_rejects_blank_pattern() {
        let db = Database::in_memory().unwrap();
        let err = db.insert_rule(&new_rule("   ", 0.4)).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_update_weight_clamps_and_bumps_revision() {
        let db = Database::in_memory().unwrap();
        let id = db.insert_rule(&new_rule("netflix", 0.4)).unwrap();
        let before = db.rule_revision().unwrap();

        let applied = db.update_rule_weight(id, 1.7).unwrap();
        assert!((applied - 1.0).abs() < 1e-9);

        let applied = db.update_rule_weight(id, -0.5).unwrap();
        assert!(applied.abs() < 1e-9);

        assert_eq!(db.rule_revision().unwrap(), before + 2);

        let rule = db.get_rule(id).unwrap().unwrap();
        assert!(rule.weight.abs() < 1e-9);
    }

    #[test]
    fn test_update_weight_missing_rule() {
        let db = Database::in_memory().unwrap();
        let err = db.update_rule_weight(999, 0.5).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_snapshot_revision_matches_store() {
        let db = Database::in_memory().unwrap();
        db.insert_rule(&new_rule("netflix", 0.4)).unwrap();
        db.insert_rule(&new_rule("spotify", 0.3)).unwrap();

        let snapshot = db.rule_snapshot().unwrap();
        assert_eq!(snapshot.revision, db.rule_revision().unwrap());
        assert_eq!(snapshot.rules.len(), 2);
        // Insertion order preserved
        assert_eq!(snapshot.rules[0].pattern, "netflix");
    }

    #[test]
    fn test_corrupt_rule_is_skipped_not_fatal() {
        let db = Database::in_memory().unwrap();
        db.insert_rule(&new_rule("netflix", 0.4)).unwrap();

        // Simulate a corrupt row written by something else
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO classification_rules (name, type_label, pattern_kind, pattern, weight)
             VALUES ('broken', 'sideways', 'keyword', 'x', 0.5)",
            [],
        )
        .unwrap();

        let rules = db.list_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "netflix");
    }
}
