//! Transaction command implementations

use anyhow::{anyhow, Result};
use sift_core::db::Database;
use sift_core::{NewTransaction, TransactionInsertResult, TransactionSource};

use super::{parse_tags, truncate};

pub fn cmd_tx_add(
    db: &Database,
    date: &str,
    description: &str,
    amount: f64,
    tags: Option<&str>,
) -> Result<()> {
    let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}', expected YYYY-MM-DD", date))?;

    let new_tx = NewTransaction {
        date,
        description: description.to_string(),
        amount,
        tags: parse_tags(tags),
        source: TransactionSource::Manual,
    };

    match db.insert_transaction(&new_tx)? {
        TransactionInsertResult::Inserted(id) => {
            println!("✅ Added transaction {}:", id);
            println!("   {} │ ${:.2} │ {}", date, amount.abs(), description);
            if amount >= 0.0 {
                println!("   (income: will never receive a classification suggestion)");
            }
        }
        TransactionInsertResult::Duplicate(existing_id) => {
            println!(
                "Skipped: duplicate of transaction {} (same date, label, and amount)",
                existing_id
            );
        }
    }

    Ok(())
}

pub fn cmd_tx_list(db: &Database, month: Option<&str>, limit: i64) -> Result<()> {
    if let Some(m) = month {
        sift_core::validate_month(m)?;
    }

    let transactions = db.list_transactions(month, limit, 0)?;

    if transactions.is_empty() {
        println!("No transactions found. Add some with:");
        println!("  sift tx add --date 2024-03-01 --description 'NETFLIX.COM' --amount -15.49");
        return Ok(());
    }

    println!();
    println!("📝 Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = if tx.amount < 0.0 {
            format!("\x1b[31m${:.2}\x1b[0m", tx.amount.abs()) // Red for expenses
        } else {
            format!("\x1b[32m+${:.2}\x1b[0m", tx.amount) // Green for income
        };

        let class = match tx.expense_type {
            Some(et) => et.as_str(),
            None => "-",
        };

        println!(
            "   [{}] {} │ {:>10} │ {:<8} │ {}",
            tx.id,
            tx.date,
            amount_str,
            class,
            truncate(&tx.description, 40)
        );
    }

    Ok(())
}
