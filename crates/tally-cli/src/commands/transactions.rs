//! Transaction commands

use anyhow::Result;
use tally_core::db::Database;
use tally_core::models::NewLineItem;

pub fn cmd_transactions_list(db: &Database, account: Option<i64>, limit: i64) -> Result<()> {
    let items = db.list_line_items(account, limit, 0)?;

    if items.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<10}  {:>12}  {:<8}  {}",
        "ID", "DATE", "AMOUNT", "SYMBOL", "DESCRIPTION"
    );
    for item in items {
        println!(
            "{:>6}  {:<10}  {:>12.2}  {:<8}  {}",
            item.id,
            item.date,
            item.amount,
            item.symbol.as_deref().unwrap_or("-"),
            item.description.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

pub fn cmd_transactions_add(
    db: &Database,
    account_id: i64,
    date: &str,
    amount: f64,
    description: Option<&str>,
    memo: Option<&str>,
) -> Result<()> {
    let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{}' (use YYYY-MM-DD)", date))?;

    db.get_account(account_id)?
        .ok_or_else(|| anyhow::anyhow!("Account {} not found", account_id))?;

    let id = db.insert_line_item(
        account_id,
        &NewLineItem {
            date,
            quantity: None,
            amount,
            symbol: None,
            balance_after: None,
            description: description.map(String::from),
            memo: memo.map(String::from),
        },
    )?;

    println!("✅ Added transaction {} ({} {:.2})", id, date, amount);
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_line_item(id)? {
        anyhow::bail!("Transaction {} not found", id);
    }

    println!("🗑️  Deleted transaction {}", id);
    Ok(())
}
