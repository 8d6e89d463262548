//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().unwrap();
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an account:       tally accounts add Checking");
    println!("  2. Import a statement:   tally import --file statement.csv --account Checking");
    println!("  3. Scan for duplicates:  tally duplicates find <account-id>");

    Ok(())
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let conn = db.conn()?;

    let accounts: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |r| r.get(0))?;
    let transactions: i64 =
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
    let verified: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE verified_not_duplicate = 1",
        [],
        |r| r.get(0),
    )?;
    let links: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transfer_links WHERE deleted_at IS NULL",
        [],
        |r| r.get(0),
    )?;
    let tags: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))?;

    println!("📊 Database status");
    println!("   ─────────────────────────────");
    println!("   Path: {}", db.path());
    println!(
        "   Encryption: {}",
        if db.is_encrypted()? { "enabled" } else { "disabled" }
    );
    println!("   Accounts: {}", accounts);
    println!(
        "   Transactions: {} ({} verified unique)",
        transactions, verified
    );
    println!("   Active transfer links: {}", links);
    println!("   Tags: {}", tags);

    Ok(())
}
