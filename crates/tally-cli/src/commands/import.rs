//! Statement import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::import::parse_statement_csv;
use tally_core::models::AccountKind;

pub fn cmd_import(db: &Database, file: &Path, account_name: &str, kind: &str) -> Result<()> {
    let kind: AccountKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    println!("📥 Importing {}...", file.display());

    let reader = File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let items = parse_statement_csv(reader)?;

    let account_id = db.upsert_account(account_name, kind)?;
    let imported = db.insert_line_items(account_id, &items)?;

    println!(
        "✅ Imported {} line items into '{}' (account id {})",
        imported, account_name, account_id
    );
    println!();
    println!("Repeated imports create duplicates by design. Clean them up with:");
    println!("  tally duplicates find {}", account_id);

    Ok(())
}
