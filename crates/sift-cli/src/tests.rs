//! CLI command tests
//!
//! Commands print to stdout; tests assert on their database effects.

use crate::commands;
use sift_core::db::Database;
use sift_core::{ExpenseType, NewTransaction, TransactionInsertResult, TransactionSource};

fn setup_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.seed_rules().unwrap();
    db
}

fn add_tx(db: &Database, date: &str, description: &str, amount: f64) -> i64 {
    match db
        .insert_transaction(&NewTransaction {
            date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
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

#[test]
fn test_cmd_tx_add() {
    let db = setup_db();

    commands::cmd_tx_add(&db, "2024-03-01", "NETFLIX.COM", -15.49, Some("netflix"))
        .unwrap();

    let transactions = db.list_transactions(None, 10, 0).unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].description, "NETFLIX.COM");
    assert_eq!(transactions[0].tags, vec!["netflix"]);

    // Duplicate add is reported, not an error
    commands::cmd_tx_add(&db, "2024-03-01", "NETFLIX.COM", -15.49, None).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 1);
}

#[test]
fn test_cmd_tx_add_invalid_date() {
    let db = setup_db();
    let result = commands::cmd_tx_add(&db, "03/01/2024", "NETFLIX.COM", -15.49, None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_tx_list_empty_and_bad_month() {
    let db = setup_db();
    commands::cmd_tx_list(&db, None, 10).unwrap();
    assert!(commands::cmd_tx_list(&db, Some("bogus"), 10).is_err());
}

#[test]
fn test_cmd_suggest_missing_transaction() {
    let db = setup_db();
    assert!(commands::cmd_suggest(&db, 999).is_err());
}

#[test]
fn test_cmd_classify_follows_suggestion() {
    let db = setup_db();
    let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);

    commands::cmd_classify(&db, id, None).unwrap();

    let tx = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.expense_type, Some(ExpenseType::Fixed));
    assert_eq!(db.count_feedback_events(false).unwrap(), 1);
}

#[test]
fn test_cmd_classify_override() {
    let db = setup_db();
    let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);

    commands::cmd_classify(&db, id, Some("variable")).unwrap();

    let tx = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.expense_type, Some(ExpenseType::Variable));

    let events = db.list_feedback_for_transaction(id).unwrap();
    assert!(!events[0].agreed);
}

#[test]
fn test_cmd_classify_rejects_bad_kind() {
    let db = setup_db();
    let id = add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
    assert!(commands::cmd_classify(&db, id, Some("sideways")).is_err());
}

#[test]
fn test_cmd_pending_runs() {
    let db = setup_db();
    add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
    add_tx(&db, "2024-03-02", "MYSTERY CHARGE", -12.0);

    commands::cmd_pending(&db, "2024-03", 50, None).unwrap();
    assert!(commands::cmd_pending(&db, "bogus", 50, None).is_err());
}

#[test]
fn test_cmd_autotag_applies_and_reports() {
    let db = setup_db();
    // Keyword + exact merchant coverage reaches 0.65
    add_tx(&db, "2024-03-01", "NETFLIX.COM", -15.49);
    add_tx(&db, "2024-03-02", "MYSTERY CHARGE", -12.0);

    commands::cmd_autotag(&db, "2024-03", Some(0.6)).unwrap();

    assert_eq!(db.count_unclassified(Some("2024-03")).unwrap(), 1);
    let jobs = db.list_auto_tag_jobs(5).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].auto_applied, 1);
    assert_eq!(jobs[0].pending_review, 1);
}

#[test]
fn test_cmd_improve_after_overrides() {
    let db = setup_db();
    for day in 1..=3 {
        let id = add_tx(
            &db,
            &format!("2024-03-{:02}", day),
            "NETFLIX.COM",
            -15.49 - day as f64,
        );
        commands::cmd_classify(&db, id, Some("variable")).unwrap();
    }

    commands::cmd_improve(&db, None).unwrap();

    // All events consumed
    assert_eq!(db.count_feedback_events(true).unwrap(), 0);
}

#[test]
fn test_cmd_rules_add_and_list() {
    let db = setup_db();
    let before = db.count_rules().unwrap();

    commands::cmd_rules_add(&db, "my landlord llc", "fixed", "keyword", 0.4, None).unwrap();
    assert_eq!(db.count_rules().unwrap(), before + 1);

    commands::cmd_rules_list(&db, 10).unwrap();
}

#[test]
fn test_cmd_rules_add_validation() {
    let db = setup_db();
    assert!(commands::cmd_rules_add(&db, "x", "sideways", "keyword", 0.4, None).is_err());
    assert!(commands::cmd_rules_add(&db, "x", "fixed", "regex", 0.4, None).is_err());
    assert!(commands::cmd_rules_add(&db, "x", "fixed", "keyword", 1.4, None).is_err());
}

#[test]
fn test_cmd_rules_test_dry_run_has_no_side_effects() {
    let db = setup_db();
    let revision = db.rule_revision().unwrap();

    commands::cmd_rules_test(&db, "NETFLIX.COM", Some("netflix,subscription")).unwrap();

    assert_eq!(db.rule_revision().unwrap(), revision);
    assert_eq!(db.count_transactions().unwrap(), 0);
}

#[test]
fn test_cmd_status_runs() {
    let db = setup_db();
    commands::cmd_status(&db).unwrap();
}

#[test]
fn test_truncate_helper() {
    assert_eq!(commands::truncate("short", 10), "short");
    assert_eq!(commands::truncate("exactly-10", 10), "exactly-10");
    assert_eq!(commands::truncate("much longer than that", 10), "much lo...");
}

#[test]
fn test_parse_tags_helper() {
    assert!(commands::parse_tags(None).is_empty());
    assert_eq!(
        commands::parse_tags(Some("netflix, subscription ,")),
        vec!["netflix", "subscription"]
    );
}
