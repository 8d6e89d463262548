//! Tag commands

use anyhow::Result;
use tally_core::db::Database;

pub fn cmd_tags_list(db: &Database) -> Result<()> {
    let tags = db.list_tags()?;

    if tags.is_empty() {
        println!("No tags yet. Add one with: tally tags add <label>");
        return Ok(());
    }

    println!("{:>6}  {:<24}  {}", "ID", "LABEL", "COLOR");
    for tag in tags {
        println!(
            "{:>6}  {:<24}  {}",
            tag.id,
            tag.label,
            tag.color.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub fn cmd_tags_add(db: &Database, label: &str, color: Option<&str>) -> Result<()> {
    let id = db.upsert_tag(label, color)?;
    println!("✅ Tag '{}' ready (id {})", label, id);
    Ok(())
}

pub fn cmd_tags_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_tag(id)? {
        anyhow::bail!("Tag {} not found", id);
    }
    println!("🗑️  Deleted tag {}", id);
    Ok(())
}

pub fn cmd_tag(db: &Database, transaction_id: i64, label: &str) -> Result<()> {
    db.get_line_item(transaction_id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", transaction_id))?;

    let tag_id = db.upsert_tag(label, None)?;
    db.tag_line_item(transaction_id, tag_id)?;

    println!("🏷️  Tagged #{} with '{}'", transaction_id, label);
    Ok(())
}

pub fn cmd_untag(db: &Database, transaction_id: i64, label: &str) -> Result<()> {
    let tag = db
        .find_tag_by_label(label)?
        .ok_or_else(|| anyhow::anyhow!("Tag '{}' not found", label))?;

    if !db.untag_line_item(transaction_id, tag.id)? {
        anyhow::bail!("Tag '{}' is not attached to transaction {}", label, transaction_id);
    }

    println!("Removed '{}' from #{}", label, transaction_id);
    Ok(())
}
