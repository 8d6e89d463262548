//! Database tests

use super::*;
use crate::models::*;
use chrono::NaiveDate;
use rusqlite::params;

fn test_item(date: &str, amount: f64) -> NewLineItem {
    NewLineItem {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        quantity: None,
        amount,
        symbol: None,
        balance_after: None,
        description: Some("Test".to_string()),
        memo: None,
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    let accounts = db.list_accounts().unwrap();
    assert!(accounts.is_empty());
}

#[test]
fn test_account_crud() {
    let db = Database::in_memory().unwrap();

    let id = db.upsert_account("My Checking", AccountKind::Checking).unwrap();
    assert!(id > 0);

    // Upsert same account returns same ID
    let id2 = db.upsert_account("My Checking", AccountKind::Checking).unwrap();
    assert_eq!(id, id2);

    let accounts = db.list_accounts().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "My Checking");
    assert_eq!(accounts[0].kind, AccountKind::Checking);
}

#[test]
fn test_transactions_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('transactions') WHERE name IN ('id', 'account_id', 'date', 'quantity', 'amount', 'symbol', 'balance_after', 'description', 'memo', 'verified_not_duplicate', 'created_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(result, 11, "transactions table should have 11 expected columns");

    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('transfer_links') WHERE name IN ('id', 'parent_t_id', 'child_t_id', 'created_at', 'deleted_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(result, 5, "transfer_links table should have 5 expected columns");

    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('transaction_tags') WHERE name IN ('transaction_id', 'tag_id', 'created_at', 'deleted_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(
        result, 4,
        "transaction_tags table should have 4 expected columns"
    );
}

#[test]
fn test_line_item_crud() {
    let db = Database::in_memory().unwrap();
    let account_id = db.upsert_account("Checking", AccountKind::Checking).unwrap();

    let id = db.insert_line_item(account_id, &test_item("2024-01-05", -42.5)).unwrap();

    let item = db.get_line_item(id).unwrap().unwrap();
    assert_eq!(item.account_id, account_id);
    assert_eq!(item.amount, -42.5);
    assert!(!item.verified_not_duplicate);

    let listed = db.list_line_items(Some(account_id), 100, 0).unwrap();
    assert_eq!(listed.len(), 1);

    assert!(db.delete_line_item(id).unwrap());
    assert!(db.get_line_item(id).unwrap().is_none());
    assert!(!db.delete_line_item(id).unwrap());
}

#[test]
fn test_batch_insert_is_atomic() {
    let db = Database::in_memory().unwrap();
    let account_id = db.upsert_account("Checking", AccountKind::Checking).unwrap();

    let items = vec![test_item("2024-01-05", -1.0), test_item("2024-01-06", -2.0)];
    let inserted = db.insert_line_items(account_id, &items).unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(db.list_line_items(Some(account_id), 10, 0).unwrap().len(), 2);
}

#[test]
fn test_tag_mapping_soft_delete_and_revive() {
    let db = Database::in_memory().unwrap();
    let account_id = db.upsert_account("Checking", AccountKind::Checking).unwrap();
    let tx_id = db.insert_line_item(account_id, &test_item("2024-01-05", -10.0)).unwrap();
    let tag_id = db.upsert_tag("groceries", Some("#10b981")).unwrap();

    db.tag_line_item(tx_id, tag_id).unwrap();
    assert_eq!(db.tags_for_line_item(tx_id).unwrap().len(), 1);

    // Untag soft-deletes the mapping row
    assert!(db.untag_line_item(tx_id, tag_id).unwrap());
    assert!(db.tags_for_line_item(tx_id).unwrap().is_empty());

    let conn = db.conn().unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transaction_tags WHERE transaction_id = ?",
            params![tx_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1, "soft-deleted mapping row should remain");

    // Re-tagging revives the same row instead of inserting another
    db.tag_line_item(tx_id, tag_id).unwrap();
    assert_eq!(db.tags_for_line_item(tx_id).unwrap().len(), 1);
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transaction_tags WHERE transaction_id = ?",
            params![tx_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_active_child_unique_index() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    conn.execute(
        "INSERT INTO transfer_links (parent_t_id, child_t_id) VALUES (1, 2)",
        [],
    )
    .unwrap();

    // A second active link with the same child violates the partial index
    let result = conn.execute(
        "INSERT INTO transfer_links (parent_t_id, child_t_id) VALUES (3, 2)",
        [],
    );
    assert!(result.is_err(), "second active parent for a child should fail");

    // Soft-deleting the first frees the slot
    conn.execute(
        "UPDATE transfer_links SET deleted_at = CURRENT_TIMESTAMP WHERE child_t_id = 2",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO transfer_links (parent_t_id, child_t_id) VALUES (3, 2)",
        [],
    )
    .unwrap();
}

#[test]
fn test_delete_line_item_soft_deletes_links() {
    let db = Database::in_memory().unwrap();
    let checking = db.upsert_account("Checking", AccountKind::Checking).unwrap();
    let savings = db.upsert_account("Savings", AccountKind::Savings).unwrap();

    let parent = db.insert_line_item(checking, &test_item("2024-01-05", -100.0)).unwrap();
    let child = db.insert_line_item(savings, &test_item("2024-01-06", 95.0)).unwrap();
    crate::transfers::LinkEngine::new(&db).create_link(parent, child).unwrap();

    db.delete_line_item(child).unwrap();

    // Link survives as a soft-deleted audit row
    assert!(db.find_active_link(parent, child).unwrap().is_none());
    let conn = db.conn().unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transfer_links WHERE parent_t_id = ? AND deleted_at IS NOT NULL",
            params![parent],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_audit_log() {
    let db = Database::in_memory().unwrap();

    db.log_audit("cli", "merge", Some("account"), Some(1), Some("merged=2")).unwrap();
    db.log_audit("api", "link", Some("transaction"), Some(7), None).unwrap();

    let entries = db.list_audit_log(10).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "link");
    assert_eq!(entries[1].actor, "cli");
}
