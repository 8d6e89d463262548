//! Duplicate detection and merge commands

use anyhow::Result;
use tally_core::db::Database;
use tally_core::models::MergeInstruction;
use tally_core::DedupEngine;

pub fn cmd_duplicates_find(db: &Database, account_id: i64, year: Option<i32>) -> Result<()> {
    println!("🔍 Scanning account {} for duplicates...", account_id);

    let scan = DedupEngine::new(db).find_duplicates(account_id, year)?;

    if scan.groups.is_empty() {
        println!("✅ No duplicate groups found.");
    } else {
        for (i, group) in scan.groups.iter().enumerate() {
            println!();
            println!("Group {} (key {})", i + 1, group.key);
            for tx in &group.transactions {
                let marker = if tx.id == group.keep_id { "keep" } else { "drop" };
                println!(
                    "   [{}] #{:<6} {} {:>12.2}  {}",
                    marker,
                    tx.id,
                    tx.date,
                    tx.amount,
                    tx.description.as_deref().unwrap_or(""),
                );
            }
            println!(
                "   Merge with: tally duplicates merge -a {} -k {} -d {}",
                account_id,
                group.keep_id,
                group
                    .delete_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(" -d ")
            );
        }
    }

    println!();
    println!("📊 Scan summary");
    println!("   Groups found: {}", scan.total);
    if scan.total > scan.groups.len() {
        println!(
            "   ⚠️  Showing first {} groups; re-run after merging to see the rest",
            scan.groups.len()
        );
    }
    println!("   Newly verified unique: {}", scan.marked_as_non_duplicate);
    println!("   Previously verified: {}", scan.previously_marked_count);

    Ok(())
}

pub fn cmd_duplicates_merge(
    db: &Database,
    account_id: i64,
    keep_id: i64,
    delete_ids: &[i64],
) -> Result<()> {
    let outcome = DedupEngine::new(db).merge_duplicates(
        account_id,
        &[MergeInstruction {
            keep_id,
            delete_ids: delete_ids.to_vec(),
        }],
    )?;

    if outcome.merged_count == 0 {
        println!("⚠️  Nothing merged (rows missing or already merged)");
    } else {
        println!(
            "✅ Merged {} transactions into #{} ({} tags carried over)",
            outcome.merged_count, keep_id, outcome.tags_added
        );
    }

    Ok(())
}
