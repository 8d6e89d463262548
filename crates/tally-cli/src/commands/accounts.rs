//! Account commands

use anyhow::Result;
use tally_core::db::Database;
use tally_core::models::AccountKind;

pub fn cmd_accounts_list(db: &Database) -> Result<()> {
    let accounts = db.list_accounts()?;

    if accounts.is_empty() {
        println!("No accounts yet. Add one with: tally accounts add <name>");
        return Ok(());
    }

    println!("{:>6}  {:<24}  {}", "ID", "NAME", "KIND");
    for account in accounts {
        println!("{:>6}  {:<24}  {}", account.id, account.name, account.kind);
    }

    Ok(())
}

pub fn cmd_accounts_add(db: &Database, name: &str, kind: &str) -> Result<()> {
    let kind: AccountKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let id = db.upsert_account(name, kind)?;
    println!("✅ Account '{}' ready (id {})", name, id);

    Ok(())
}

pub fn cmd_accounts_delete(db: &Database, id: i64) -> Result<()> {
    let account = db
        .get_account(id)?
        .ok_or_else(|| anyhow::anyhow!("Account {} not found", id))?;

    db.delete_account(id)?;
    println!("🗑️  Deleted account '{}' and its transactions", account.name);

    Ok(())
}
