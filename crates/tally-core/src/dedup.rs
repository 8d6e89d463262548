//! Duplicate detection and merge
//!
//! Repeated statement imports leave the same real-world transaction in the
//! ledger several times over. The scan buckets an account's rows by a
//! normalized key (date + amount-like fields + symbol), confirms true
//! duplicates inside each bucket with a description/memo text rule, and
//! hands back disjoint groups for the user to approve. The merge then folds
//! each approved group into its surviving row: tags are unioned, transfer
//! links re-pointed, superseded rows deleted.

use std::collections::{HashMap, HashSet};

use rusqlite::TransactionBehavior;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{DuplicateGroup, DuplicateScan, LineItem, MergeInstruction, MergeOutcome};

/// Groups returned per scan. Larger result sets overwhelm the review UI,
/// and a capped scan skips memoization (see `find_duplicates`).
pub const MAX_GROUPS: usize = 150;

/// Round a decimal amount to cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Canonical form for amount-like fields: absent and zero in any rendering
/// collapse to "0", everything else becomes a fixed-point string so equal
/// values compare equal without float equality.
pub fn normalize_decimal(value: Option<f64>) -> String {
    match value {
        None => "0".to_string(),
        Some(v) => {
            let v = round_cents(v);
            if v == 0.0 {
                "0".to_string()
            } else {
                format!("{:.2}", v)
            }
        }
    }
}

/// Canonical form for ticker symbols: trimmed, uppercased, absent -> ""
pub fn normalize_symbol(value: Option<&str>) -> String {
    value.map(|s| s.trim().to_uppercase()).unwrap_or_default()
}

/// Canonical form for free text (description/memo): trimmed, lowercased,
/// absent -> ""
pub fn normalize_text(value: Option<&str>) -> String {
    value.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

/// Equality-bucket key for a line item
pub fn bucket_key(item: &LineItem) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        item.date,
        normalize_decimal(item.quantity),
        normalize_decimal(Some(item.amount)),
        normalize_symbol(item.symbol.as_deref()),
        normalize_decimal(item.balance_after),
    )
}

/// Secondary text rule: identical description/memo, or swapped. Some
/// importers transpose the two columns, so a swapped pair still counts.
pub fn text_match(a: &LineItem, b: &LineItem) -> bool {
    let (da, ma) = (
        normalize_text(a.description.as_deref()),
        normalize_text(a.memo.as_deref()),
    );
    let (db, mb) = (
        normalize_text(b.description.as_deref()),
        normalize_text(b.memo.as_deref()),
    );

    (da == db && ma == mb) || (da == mb && ma == db)
}

/// Union-find over bucket-local indices, so every transaction lands in at
/// most one duplicate group even when matches overlap.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Duplicate detection and merge over one account
pub struct DedupEngine<'a> {
    db: &'a Database,
}

impl<'a> DedupEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Scan an account for duplicate groups.
    ///
    /// Rows already marked `verified_not_duplicate` are skipped. When the
    /// scan completes without hitting the group cap, every scanned row that
    /// landed in no group is marked verified so later scans skip it; a
    /// capped scan cannot certify the untouched remainder and marks nothing.
    pub fn find_duplicates(&self, account_id: i64, year: Option<i32>) -> Result<DuplicateScan> {
        self.db
            .get_account(account_id)?
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))?;

        let previously_marked_count =
            self.db.count_verified_line_items(account_id, year)? as usize;
        let items = self.db.list_unverified_line_items(account_id, year)?;

        // Bucket by normalized key, preserving first-seen (date, id) order
        let mut bucket_index: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let key = bucket_key(item);
            match bucket_index.get(&key) {
                Some(&slot) => buckets[slot].1.push(i),
                None => {
                    bucket_index.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![i]));
                }
            }
        }

        // Confirm duplicates bucket by bucket
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for (key, members) in &buckets {
            if members.len() < 2 {
                continue;
            }

            let mut uf = UnionFind::new(members.len());
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    if text_match(&items[members[i]], &items[members[j]]) {
                        uf.union(i, j);
                    }
                }
            }

            let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
            for (local, &global) in members.iter().enumerate() {
                components.entry(uf.find(local)).or_default().push(global);
            }

            // Deterministic order: components by their earliest member
            let mut components: Vec<Vec<usize>> =
                components.into_values().filter(|c| c.len() >= 2).collect();
            components.sort_by_key(|c| c[0]);

            for component in components {
                let transactions: Vec<LineItem> =
                    component.iter().map(|&i| items[i].clone()).collect();
                // Highest id wins: the latest (re-)import is assumed freshest
                let keep_id = transactions.iter().map(|t| t.id).max().unwrap_or_default();
                let delete_ids: Vec<i64> = transactions
                    .iter()
                    .map(|t| t.id)
                    .filter(|&id| id != keep_id)
                    .collect();

                groups.push(DuplicateGroup {
                    key: key.clone(),
                    transactions,
                    keep_id,
                    delete_ids,
                });
            }
        }

        let total = groups.len();
        let truncated = total > MAX_GROUPS;
        if truncated {
            warn!(
                account_id,
                total, "Duplicate scan truncated at {} groups; memoization skipped", MAX_GROUPS
            );
            groups.truncate(MAX_GROUPS);
        }

        // Memoize: a complete scan certifies every ungrouped row as unique
        let mut marked_as_non_duplicate = 0;
        if !truncated {
            let grouped: HashSet<i64> = groups
                .iter()
                .flat_map(|g| g.transactions.iter().map(|t| t.id))
                .collect();
            let clear_ids: Vec<i64> = items
                .iter()
                .map(|t| t.id)
                .filter(|id| !grouped.contains(id))
                .collect();

            if !clear_ids.is_empty() {
                let mut conn = self.db.conn()?;
                let tx = conn.transaction()?;
                marked_as_non_duplicate = Database::mark_verified_conn(&tx, &clear_ids)?;
                tx.commit()?;
            }
        }

        info!(
            account_id,
            scanned = items.len(),
            groups = groups.len(),
            marked = marked_as_non_duplicate,
            "Duplicate scan complete"
        );

        Ok(DuplicateScan {
            groups,
            total,
            marked_as_non_duplicate,
            previously_marked_count,
        })
    }

    /// Apply a batch of user-confirmed merges.
    ///
    /// Each instruction runs in its own IMMEDIATE transaction: either the
    /// whole fold (tag union, link re-point, delete) lands, or none of it
    /// does. Instructions referencing rows that no longer exist are skipped
    /// without failing their siblings.
    pub fn merge_duplicates(
        &self,
        account_id: i64,
        instructions: &[MergeInstruction],
    ) -> Result<MergeOutcome> {
        for instr in instructions {
            if instr.delete_ids.is_empty() {
                return Err(Error::InvalidData(
                    "Merge instruction has no delete_ids".to_string(),
                ));
            }
            if instr.delete_ids.contains(&instr.keep_id) {
                return Err(Error::InvalidData(format!(
                    "Merge instruction would delete its own keep_id {}",
                    instr.keep_id
                )));
            }
        }

        self.db
            .get_account(account_id)?
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))?;

        let mut outcome = MergeOutcome::default();

        for instr in instructions {
            let mut conn = self.db.conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Re-verify membership right before writing: rows may have been
            // deleted or merged since the scan the user confirmed.
            let mut wanted: Vec<i64> = Vec::with_capacity(instr.delete_ids.len() + 1);
            wanted.push(instr.keep_id);
            wanted.extend_from_slice(&instr.delete_ids);
            let existing = Database::existing_ids_in_account_conn(&tx, account_id, &wanted)?;
            if existing.len() != wanted.len() {
                warn!(
                    account_id,
                    keep_id = instr.keep_id,
                    "Skipping merge instruction referencing missing rows"
                );
                continue;
            }

            // Union tags from the superseded rows onto the survivor
            let mut keep_tags: HashSet<i64> =
                Database::active_tag_ids_conn(&tx, instr.keep_id)?.into_iter().collect();
            for &delete_id in &instr.delete_ids {
                for tag_id in Database::active_tag_ids_conn(&tx, delete_id)? {
                    if keep_tags.insert(tag_id) {
                        Database::attach_tag_conn(&tx, instr.keep_id, tag_id)?;
                        outcome.tags_added += 1;
                    }
                }
            }

            self.repoint_links(&tx, instr.keep_id, &instr.delete_ids)?;

            let deleted = Database::delete_line_items_conn(&tx, &instr.delete_ids)?;
            tx.commit()?;
            outcome.merged_count += deleted;

            debug!(
                keep_id = instr.keep_id,
                deleted, "Merged duplicate group"
            );
        }

        info!(
            account_id,
            merged = outcome.merged_count,
            tags_added = outcome.tags_added,
            "Merge complete"
        );

        Ok(outcome)
    }

    /// Rewrite active links that reference a superseded row so they follow
    /// the survivor. Direction is renormalized after the rewrite; a link
    /// that would become self-referential, duplicate an existing pair,
    /// give a child a second parent, or push the new parent's active
    /// children to or past its own amount is soft-deleted instead (kept
    /// for audit, never silently dropped).
    fn repoint_links(
        &self,
        conn: &rusqlite::Connection,
        keep_id: i64,
        delete_ids: &[i64],
    ) -> Result<()> {
        let deletes: HashSet<i64> = delete_ids.iter().copied().collect();
        let links = Database::links_touching_conn(conn, delete_ids)?;

        for link in links {
            let new_parent = if deletes.contains(&link.parent_t_id) {
                keep_id
            } else {
                link.parent_t_id
            };
            let new_child = if deletes.contains(&link.child_t_id) {
                keep_id
            } else {
                link.child_t_id
            };

            if new_parent == new_child {
                // A link between a duplicate and its survivor collapses
                Database::soft_delete_link_conn(conn, link.id)?;
                continue;
            }

            let a = Database::get_line_item_conn(conn, new_parent)?
                .ok_or_else(|| Error::NotFound(format!("Line item {} not found", new_parent)))?;
            let b = Database::get_line_item_conn(conn, new_child)?
                .ok_or_else(|| Error::NotFound(format!("Line item {} not found", new_child)))?;
            let (parent, child) = crate::transfers::normalize_pair(&a, &b);

            let duplicate_pair = Database::find_active_link_conn(conn, parent.id, child.id)?
                .map(|other| other.id != link.id)
                .unwrap_or(false);
            let second_parent = Database::active_parent_link_conn(conn, child.id)?
                .map(|other| other.id != link.id)
                .unwrap_or(false);

            // Same strict boundary as link creation: both duplicates may
            // have been linked as parents before the merge, and the
            // survivor cannot absorb children beyond its own amount
            let linked_amount =
                Database::active_children_amount_excluding_conn(conn, parent.id, link.id)?;
            let after = round_cents(linked_amount + child.amount.abs());
            let over_capacity = after >= round_cents(parent.amount.abs());

            if duplicate_pair || second_parent || over_capacity {
                Database::soft_delete_link_conn(conn, link.id)?;
            } else {
                Database::update_link_endpoints_conn(conn, link.id, parent.id, child.id)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, NewLineItem};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn item(d: &str, amount: f64, desc: &str, memo: &str) -> NewLineItem {
        NewLineItem {
            date: date(d),
            quantity: None,
            amount,
            symbol: None,
            balance_after: None,
            description: if desc.is_empty() {
                None
            } else {
                Some(desc.to_string())
            },
            memo: if memo.is_empty() {
                None
            } else {
                Some(memo.to_string())
            },
        }
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let account_id = db.upsert_account("Checking", AccountKind::Checking).unwrap();
        (db, account_id)
    }

    #[test]
    fn test_normalize_decimal_zero_forms() {
        assert_eq!(normalize_decimal(None), "0");
        assert_eq!(normalize_decimal(Some(0.0)), "0");
        assert_eq!(normalize_decimal(Some(-0.0)), "0");
        assert_eq!(normalize_decimal(Some(0.0009)), "0");
    }

    #[test]
    fn test_normalize_decimal_fixed_point() {
        assert_eq!(normalize_decimal(Some(-100.0)), "-100.00");
        assert_eq!(normalize_decimal(Some(12.346)), "12.35");
        assert_eq!(normalize_decimal(Some(12.3)), "12.30");
    }

    #[test]
    fn test_normalize_symbol_and_text() {
        assert_eq!(normalize_symbol(Some("  aapl ")), "AAPL");
        assert_eq!(normalize_symbol(None), "");
        assert_eq!(normalize_text(Some("  ACH Transfer ")), "ach transfer");
        assert_eq!(normalize_text(None), "");
    }

    #[test]
    fn test_text_match_swapped_fields() {
        let (db, account_id) = setup();
        db.insert_line_item(account_id, &item("2024-01-05", -50.0, "A", "B"))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-05", -50.0, "B", "A"))
            .unwrap();

        let scan = DedupEngine::new(&db).find_duplicates(account_id, None).unwrap();
        assert_eq!(scan.groups.len(), 1);
        assert_eq!(scan.groups[0].transactions.len(), 2);
    }

    #[test]
    fn test_find_duplicates_basic_scenario() {
        let (db, account_id) = setup();
        let id1 = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        let id2 = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();

        let scan = DedupEngine::new(&db).find_duplicates(account_id, None).unwrap();
        assert_eq!(scan.total, 1);
        assert_eq!(scan.groups[0].keep_id, id2);
        assert_eq!(scan.groups[0].delete_ids, vec![id1]);
    }

    #[test]
    fn test_find_duplicates_requires_matching_key() {
        let (db, account_id) = setup();
        // Same text, different date and amount: three distinct buckets
        db.insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-06", -100.0, "ACH", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-05", -100.5, "ACH", ""))
            .unwrap();

        let scan = DedupEngine::new(&db).find_duplicates(account_id, None).unwrap();
        assert!(scan.groups.is_empty());
        // All three certified unique
        assert_eq!(scan.marked_as_non_duplicate, 3);
    }

    #[test]
    fn test_find_duplicates_text_rule_splits_bucket() {
        let (db, account_id) = setup();
        // Equal key fields but unrelated descriptions stay separate
        db.insert_line_item(account_id, &item("2024-01-05", -25.0, "Coffee", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-05", -25.0, "Parking", ""))
            .unwrap();

        let scan = DedupEngine::new(&db).find_duplicates(account_id, None).unwrap();
        assert!(scan.groups.is_empty());
    }

    #[test]
    fn test_find_duplicates_year_filter() {
        let (db, account_id) = setup();
        db.insert_line_item(account_id, &item("2023-03-01", -10.0, "Dues", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2023-03-01", -10.0, "Dues", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-03-01", -10.0, "Dues", ""))
            .unwrap();

        let scan = DedupEngine::new(&db)
            .find_duplicates(account_id, Some(2024))
            .unwrap();
        assert!(scan.groups.is_empty());

        let scan = DedupEngine::new(&db)
            .find_duplicates(account_id, Some(2023))
            .unwrap();
        assert_eq!(scan.total, 1);
    }

    #[test]
    fn test_memoization_is_idempotent() {
        let (db, account_id) = setup();
        db.insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        db.insert_line_item(account_id, &item("2024-01-08", -42.0, "Gym", ""))
            .unwrap();

        let engine = DedupEngine::new(&db);
        let first = engine.find_duplicates(account_id, None).unwrap();
        assert_eq!(first.groups.len(), 1);
        assert_eq!(first.marked_as_non_duplicate, 1);
        assert_eq!(first.previously_marked_count, 0);

        // Second scan: same groups, no new verified writes
        let second = engine.find_duplicates(account_id, None).unwrap();
        assert_eq!(second.groups.len(), 1);
        assert_eq!(second.groups[0].keep_id, first.groups[0].keep_id);
        assert_eq!(second.marked_as_non_duplicate, 0);
        assert_eq!(second.previously_marked_count, 1);
    }

    #[test]
    fn test_find_duplicates_unknown_account() {
        let (db, _) = setup();
        let err = DedupEngine::new(&db).find_duplicates(999, None).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_merge_unions_tags_and_deletes() {
        let (db, account_id) = setup();
        let d1 = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        let d2 = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();
        let keep = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "ACH", ""))
            .unwrap();

        let groceries = db.upsert_tag("groceries", None).unwrap();
        let shared = db.upsert_tag("shared", None).unwrap();
        let pending = db.upsert_tag("pending", None).unwrap();
        db.tag_line_item(d1, groceries).unwrap();
        db.tag_line_item(d1, shared).unwrap();
        db.tag_line_item(d2, pending).unwrap();
        db.tag_line_item(keep, shared).unwrap();

        let outcome = DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[MergeInstruction {
                    keep_id: keep,
                    delete_ids: vec![d1, d2],
                }],
            )
            .unwrap();

        assert_eq!(outcome.merged_count, 2);
        // "shared" was already on keep, so only groceries + pending are new
        assert_eq!(outcome.tags_added, 2);

        assert!(db.get_line_item(d1).unwrap().is_none());
        assert!(db.get_line_item(d2).unwrap().is_none());

        let labels: Vec<String> = db
            .tags_for_line_item(keep)
            .unwrap()
            .into_iter()
            .map(|t| t.label)
            .collect();
        assert_eq!(labels, vec!["groceries", "pending", "shared"]);
    }

    #[test]
    fn test_merge_repoints_parent_links() {
        let (db, account_id) = setup();
        let other_account = db.upsert_account("Savings", AccountKind::Savings).unwrap();

        let dup = db
            .insert_line_item(account_id, &item("2024-01-05", -200.0, "Transfer out", ""))
            .unwrap();
        let keep = db
            .insert_line_item(account_id, &item("2024-01-05", -200.0, "Transfer out", ""))
            .unwrap();
        let child = db
            .insert_line_item(other_account, &item("2024-01-06", 190.0, "Transfer in", ""))
            .unwrap();

        // The duplicate was linked as a transfer source before dedup ran
        crate::transfers::LinkEngine::new(&db).create_link(dup, child).unwrap();

        DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[MergeInstruction {
                    keep_id: keep,
                    delete_ids: vec![dup],
                }],
            )
            .unwrap();

        let links = db.links_for_line_item(keep).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].parent_t_id, keep);
        assert_eq!(links[0].child_t_id, child);
        assert!(db.links_for_line_item(dup).unwrap().is_empty());
    }

    #[test]
    fn test_merge_repoint_respects_parent_capacity() {
        let (db, account_id) = setup();
        let savings = db.upsert_account("Savings", AccountKind::Savings).unwrap();
        let brokerage = db.upsert_account("Brokerage", AccountKind::Brokerage).unwrap();

        // Both duplicates were linked as transfer sources before the merge:
        // the user linked one child against each import of the same row
        let dup = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "Transfer out", ""))
            .unwrap();
        let keep = db
            .insert_line_item(account_id, &item("2024-01-05", -100.0, "Transfer out", ""))
            .unwrap();
        let c1 = db
            .insert_line_item(savings, &item("2024-01-06", 80.0, "First leg", ""))
            .unwrap();
        let c2 = db
            .insert_line_item(brokerage, &item("2024-01-06", 90.0, "Second leg", ""))
            .unwrap();

        let engine = crate::transfers::LinkEngine::new(&db);
        engine.create_link(dup, c1).unwrap();
        engine.create_link(keep, c2).unwrap();

        DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[MergeInstruction {
                    keep_id: keep,
                    delete_ids: vec![dup],
                }],
            )
            .unwrap();

        // Absorbing both children would put 80 + 90 = 170 against the
        // survivor's 100, so the repointed link is soft-deleted and the
        // capacity invariant still holds
        let links = db.links_for_line_item(keep).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].child_t_id, c2);
        assert!(db.links_for_line_item(c1).unwrap().is_empty());
        assert_eq!(db.active_children_amount(keep).unwrap(), 90.0);
    }

    #[test]
    fn test_merge_collapses_link_between_merged_rows() {
        let (db, account_id) = setup();

        let keep = db
            .insert_line_item(account_id, &item("2024-01-05", -80.0, "Move", ""))
            .unwrap();
        let dup = db
            .insert_line_item(account_id, &item("2024-01-05", 70.0, "Move", ""))
            .unwrap();
        crate::transfers::LinkEngine::new(&db).create_link(keep, dup).unwrap();

        // Folding the two sides of a link into one row would leave it
        // self-referential; it collapses via soft delete instead
        DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[MergeInstruction {
                    keep_id: keep,
                    delete_ids: vec![dup],
                }],
            )
            .unwrap();

        assert!(db.get_line_item(dup).unwrap().is_none());
        assert!(db.links_for_line_item(keep).unwrap().is_empty());
    }

    #[test]
    fn test_merge_skips_missing_rows() {
        let (db, account_id) = setup();
        let a = db
            .insert_line_item(account_id, &item("2024-01-05", -10.0, "One", ""))
            .unwrap();
        let b = db
            .insert_line_item(account_id, &item("2024-01-05", -10.0, "One", ""))
            .unwrap();

        let outcome = DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[
                    // References a row that never existed: skipped
                    MergeInstruction {
                        keep_id: a,
                        delete_ids: vec![9999],
                    },
                    // Valid sibling still applies
                    MergeInstruction {
                        keep_id: b,
                        delete_ids: vec![a],
                    },
                ],
            )
            .unwrap();

        assert_eq!(outcome.merged_count, 1);
        assert!(db.get_line_item(a).unwrap().is_none());
        assert!(db.get_line_item(b).unwrap().is_some());
    }

    #[test]
    fn test_merge_rejects_malformed_instructions() {
        let (db, account_id) = setup();
        let err = DedupEngine::new(&db)
            .merge_duplicates(
                account_id,
                &[MergeInstruction {
                    keep_id: 1,
                    delete_ids: vec![1],
                }],
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
