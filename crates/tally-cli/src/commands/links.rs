//! Transfer link commands

use anyhow::Result;
use tally_core::db::Database;
use tally_core::LinkEngine;

pub fn cmd_linkable(db: &Database, transaction_id: i64) -> Result<()> {
    let found = LinkEngine::new(db).find_candidates(transaction_id)?;
    let source = &found.source_transaction;

    println!(
        "Source #{}: {} {:>12.2}  {}",
        source.id,
        source.date,
        source.amount,
        source.description.as_deref().unwrap_or(""),
    );
    println!(
        "Linked so far: {:.2} of {:.2}{}",
        found.linked_amount,
        source.amount.abs(),
        if found.linking_allowed {
            ""
        } else {
            "  (capacity exhausted)"
        }
    );

    if found.potential_matches.is_empty() {
        println!();
        println!("No transfer candidates in the ±7 day / ±5% window.");
        return Ok(());
    }

    println!();
    println!(
        "{:>6}  {:<10}  {:>12}  {:<24}  {}",
        "ID", "DATE", "AMOUNT", "ACCOUNT", "DESCRIPTION"
    );
    for tx in &found.potential_matches {
        let account = db
            .get_account(tx.account_id)?
            .map(|a| a.name)
            .unwrap_or_else(|| format!("#{}", tx.account_id));
        println!(
            "{:>6}  {:<10}  {:>12.2}  {:<24}  {}",
            tx.id,
            tx.date,
            tx.amount,
            account,
            tx.description.as_deref().unwrap_or(""),
        );
    }

    println!();
    println!("Link with: tally link {} <candidate-id>", transaction_id);

    Ok(())
}

pub fn cmd_link(db: &Database, parent_t_id: i64, child_t_id: i64) -> Result<()> {
    let (parent, child) = LinkEngine::new(db).create_link(parent_t_id, child_t_id)?;
    println!("🔗 Linked transfer: #{} (source) → #{}", parent, child);
    Ok(())
}

pub fn cmd_unlink(db: &Database, transaction_id: i64, linked_t_id: i64) -> Result<()> {
    LinkEngine::new(db).unlink(transaction_id, linked_t_id)?;
    println!("✂️  Unlinked #{} and #{}", transaction_id, linked_t_id);
    Ok(())
}
