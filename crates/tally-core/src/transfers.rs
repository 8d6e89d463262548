//! Transfer link detection and normalization
//!
//! A transfer shows up twice: an outflow in one account and an inflow in
//! another. The candidate finder surfaces likely other sides within a date
//! and amount tolerance window; the link itself stores a canonical
//! parent/child direction and enforces the capacity invariant (a parent's
//! active children never add up to its own amount).

use chrono::Duration;
use rusqlite::TransactionBehavior;
use tracing::{debug, info};

use crate::db::Database;
use crate::dedup::round_cents;
use crate::error::{Error, Result};
use crate::models::{LineItem, LinkCandidates};

/// Candidate window: days either side of the source date
pub const DATE_WINDOW_DAYS: i64 = 7;

/// Candidate window: fractional tolerance on the absolute amount
pub const AMOUNT_TOLERANCE: f64 = 0.05;

/// Candidates returned per query
pub const MAX_CANDIDATES: i64 = 50;

/// Canonical parent/child assignment for a pair: earlier date first, lower
/// id breaking ties. Total order, so both argument orders agree.
pub fn normalize_pair<'t>(a: &'t LineItem, b: &'t LineItem) -> (&'t LineItem, &'t LineItem) {
    if (a.date, a.id) <= (b.date, b.id) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Transfer link detection and lifecycle
pub struct LinkEngine<'a> {
    db: &'a Database,
}

impl<'a> LinkEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find transfer candidates for a source transaction.
    ///
    /// Read-only: candidates are other-account line items within
    /// ±`DATE_WINDOW_DAYS` and ±5% of the source's absolute amount that are
    /// not already linked in either role, ranked by amount closeness.
    pub fn find_candidates(&self, transaction_id: i64) -> Result<LinkCandidates> {
        let source = self
            .db
            .get_line_item(transaction_id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", transaction_id)))?;

        let target_abs = source.amount.abs();
        let from = source.date - Duration::days(DATE_WINDOW_DAYS);
        let to = source.date + Duration::days(DATE_WINDOW_DAYS);

        let potential_matches = self.db.list_link_candidates(
            source.id,
            source.account_id,
            from,
            to,
            (1.0 - AMOUNT_TOLERANCE) * target_abs,
            (1.0 + AMOUNT_TOLERANCE) * target_abs,
            target_abs,
            MAX_CANDIDATES,
        )?;

        let linked_amount = round_cents(self.db.active_children_amount(source.id)?);
        let linking_allowed = linked_amount < round_cents(target_abs);

        debug!(
            transaction_id,
            candidates = potential_matches.len(),
            linked_amount,
            "Found transfer candidates"
        );

        Ok(LinkCandidates {
            source_transaction: source,
            potential_matches,
            linked_amount,
            linking_allowed,
        })
    }

    /// Create a transfer link between two transactions.
    ///
    /// The caller's parent/child labels are advisory: direction is
    /// renormalized before storing, so `create_link(a, b)` and
    /// `create_link(b, a)` persist the same row. The capacity check re-reads
    /// the parent's children sum inside the same IMMEDIATE transaction as
    /// the insert, so concurrent requests cannot jointly overshoot it.
    pub fn create_link(&self, parent_candidate_id: i64, child_candidate_id: i64) -> Result<(i64, i64)> {
        if parent_candidate_id == child_candidate_id {
            return Err(Error::InvalidData(
                "Cannot link a transaction to itself".to_string(),
            ));
        }

        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let a = Database::get_line_item_conn(&tx, parent_candidate_id)?.ok_or_else(|| {
            Error::NotFound(format!("Transaction {} not found", parent_candidate_id))
        })?;
        let b = Database::get_line_item_conn(&tx, child_candidate_id)?.ok_or_else(|| {
            Error::NotFound(format!("Transaction {} not found", child_candidate_id))
        })?;

        let (parent, child) = normalize_pair(&a, &b);

        if Database::find_active_link_conn(&tx, parent.id, child.id)?.is_some() {
            return Err(Error::AlreadyLinked);
        }
        if Database::active_parent_link_conn(&tx, child.id)?.is_some() {
            return Err(Error::ChildAlreadyLinked);
        }

        // Strict boundary: the new total must stay below the parent amount,
        // meeting it exactly is already too much
        let linked_amount = Database::active_children_amount_conn(&tx, parent.id)?;
        let after = round_cents(linked_amount + child.amount.abs());
        if after >= round_cents(parent.amount.abs()) {
            return Err(Error::LinkCapacityExceeded);
        }

        Database::insert_link_conn(&tx, parent.id, child.id)?;
        tx.commit()?;

        info!(
            parent_t_id = parent.id,
            child_t_id = child.id,
            "Created transfer link"
        );

        Ok((parent.id, child.id))
    }

    /// Remove the active link between two transactions (soft delete).
    ///
    /// The caller may pass the ids in either order; the stored direction is
    /// looked up both ways. Line items are never deleted here.
    pub fn unlink(&self, transaction_id: i64, linked_t_id: i64) -> Result<()> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;

        let link = Database::find_active_link_conn(&tx, transaction_id, linked_t_id)?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No active link between transactions {} and {}",
                    transaction_id, linked_t_id
                ))
            })?;

        Database::soft_delete_link_conn(&tx, link.id)?;
        tx.commit()?;

        info!(link_id = link.id, "Unlinked transfer");
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

    fn item(d: &str, amount: f64, desc: &str) -> NewLineItem {
        NewLineItem {
            date: date(d),
            quantity: None,
            amount,
            symbol: None,
            balance_after: None,
            description: Some(desc.to_string()),
            memo: None,
        }
    }

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let checking = db.upsert_account("Checking", AccountKind::Checking).unwrap();
        let savings = db.upsert_account("Savings", AccountKind::Savings).unwrap();
        (db, checking, savings)
    }

    #[test]
    fn test_normalize_pair_orders_by_date_then_id() {
        let (db, checking, savings) = setup();
        let late = db
            .insert_line_item(checking, &item("2024-02-10", -50.0, "out"))
            .unwrap();
        let early = db
            .insert_line_item(savings, &item("2024-02-08", 50.0, "in"))
            .unwrap();

        let a = db.get_line_item(late).unwrap().unwrap();
        let b = db.get_line_item(early).unwrap().unwrap();

        let (parent, child) = normalize_pair(&a, &b);
        assert_eq!(parent.id, early);
        assert_eq!(child.id, late);
    }

    #[test]
    fn test_create_link_is_direction_agnostic() {
        let (db, checking, savings) = setup();
        let out = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out"))
            .unwrap();
        let inflow = db
            .insert_line_item(savings, &item("2024-02-09", 98.0, "in"))
            .unwrap();

        // Caller got the roles backwards; stored link is canonical anyway
        let (parent, child) = LinkEngine::new(&db).create_link(inflow, out).unwrap();
        assert_eq!(parent, out);
        assert_eq!(child, inflow);

        let links = db.links_for_line_item(out).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].parent_t_id, out);
        assert_eq!(links[0].child_t_id, inflow);
    }

    #[test]
    fn test_create_link_rejects_existing_pair() {
        let (db, checking, savings) = setup();
        let out = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out"))
            .unwrap();
        let inflow = db
            .insert_line_item(savings, &item("2024-02-09", 95.0, "in"))
            .unwrap();

        let engine = LinkEngine::new(&db);
        engine.create_link(out, inflow).unwrap();

        let err = engine.create_link(inflow, out).unwrap_err();
        assert!(matches!(err, Error::AlreadyLinked));
    }

    #[test]
    fn test_create_link_rejects_second_parent() {
        let (db, checking, savings) = setup();
        let brokerage = db.upsert_account("Brokerage", AccountKind::Brokerage).unwrap();

        let parent_a = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out a"))
            .unwrap();
        let parent_b = db
            .insert_line_item(brokerage, &item("2024-02-08", -100.0, "out b"))
            .unwrap();
        let child = db
            .insert_line_item(savings, &item("2024-02-09", 95.0, "in"))
            .unwrap();

        let engine = LinkEngine::new(&db);
        engine.create_link(parent_a, child).unwrap();

        let err = engine.create_link(parent_b, child).unwrap_err();
        assert!(matches!(err, Error::ChildAlreadyLinked));
    }

    #[test]
    fn test_capacity_boundary_is_strict() {
        let (db, checking, savings) = setup();
        let brokerage = db.upsert_account("Brokerage", AccountKind::Brokerage).unwrap();

        let parent = db
            .insert_line_item(checking, &item("2024-03-01", -200.0, "split transfer"))
            .unwrap();
        let c1 = db
            .insert_line_item(savings, &item("2024-03-02", 80.0, "first leg"))
            .unwrap();
        let c2 = db
            .insert_line_item(brokerage, &item("2024-03-02", 90.0, "second leg"))
            .unwrap();
        let c3 = db
            .insert_line_item(savings, &item("2024-03-03", 40.0, "third leg"))
            .unwrap();

        let engine = LinkEngine::new(&db);
        engine.create_link(parent, c1).unwrap();
        engine.create_link(parent, c2).unwrap();

        // 170 + 40 = 210 >= 200: rejected, and nothing was written
        let err = engine.create_link(parent, c3).unwrap_err();
        assert!(matches!(err, Error::LinkCapacityExceeded));
        assert_eq!(db.links_for_line_item(parent).unwrap().len(), 2);
        assert_eq!(db.active_children_amount(parent).unwrap(), 170.0);
    }

    #[test]
    fn test_capacity_rejects_exact_match() {
        let (db, checking, savings) = setup();
        let parent = db
            .insert_line_item(checking, &item("2024-03-01", -100.0, "out"))
            .unwrap();
        let child = db
            .insert_line_item(savings, &item("2024-03-02", 100.0, "in"))
            .unwrap();

        // Meeting the parent amount exactly is already over the line
        let err = LinkEngine::new(&db).create_link(parent, child).unwrap_err();
        assert!(matches!(err, Error::LinkCapacityExceeded));
    }

    #[test]
    fn test_find_candidates_window_and_exclusions() {
        let (db, checking, savings) = setup();
        let source = db
            .insert_line_item(checking, &item("2024-05-10", -100.0, "transfer out"))
            .unwrap();

        let close = db
            .insert_line_item(savings, &item("2024-05-11", 99.0, "close match"))
            .unwrap();
        let exact = db
            .insert_line_item(savings, &item("2024-05-12", 100.0, "exact match"))
            .unwrap();
        // Outside the 5% amount band
        db.insert_line_item(savings, &item("2024-05-11", 80.0, "too small"))
            .unwrap();
        // Outside the date window
        db.insert_line_item(savings, &item("2024-05-20", 100.0, "too late"))
            .unwrap();
        // Same account as the source
        db.insert_line_item(checking, &item("2024-05-11", 100.0, "same account"))
            .unwrap();

        let found = LinkEngine::new(&db).find_candidates(source).unwrap();
        let ids: Vec<i64> = found.potential_matches.iter().map(|t| t.id).collect();
        // Exact amount ranks above the 1.00-off match
        assert_eq!(ids, vec![exact, close]);
        assert_eq!(found.linked_amount, 0.0);
        assert!(found.linking_allowed);
    }

    #[test]
    fn test_find_candidates_excludes_already_linked() {
        let (db, checking, savings) = setup();
        let brokerage = db.upsert_account("Brokerage", AccountKind::Brokerage).unwrap();

        let source = db
            .insert_line_item(checking, &item("2024-05-10", -100.0, "out"))
            .unwrap();
        let taken = db
            .insert_line_item(savings, &item("2024-05-11", 100.0, "already spoken for"))
            .unwrap();
        let taker = db
            .insert_line_item(brokerage, &item("2024-05-10", -105.0, "other out"))
            .unwrap();
        let free = db
            .insert_line_item(savings, &item("2024-05-12", 99.0, "free"))
            .unwrap();

        LinkEngine::new(&db).create_link(taker, taken).unwrap();

        let found = LinkEngine::new(&db).find_candidates(source).unwrap();
        let ids: Vec<i64> = found.potential_matches.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![free]);
    }

    #[test]
    fn test_linking_allowed_reflects_capacity() {
        let (db, checking, savings) = setup();
        let parent = db
            .insert_line_item(checking, &item("2024-06-01", -100.0, "out"))
            .unwrap();
        let child = db
            .insert_line_item(savings, &item("2024-06-02", 99.5, "in"))
            .unwrap();

        let engine = LinkEngine::new(&db);
        engine.create_link(parent, child).unwrap();

        let found = engine.find_candidates(parent).unwrap();
        assert_eq!(found.linked_amount, 99.5);
        assert!(found.linking_allowed);

        // A manual edit shrinks the parent below its linked total; the
        // next candidate query must grey out further linking
        db.conn()
            .unwrap()
            .execute(
                "UPDATE transactions SET amount = -99.0 WHERE id = ?",
                rusqlite::params![parent],
            )
            .unwrap();

        let found = engine.find_candidates(parent).unwrap();
        assert_eq!(found.linked_amount, 99.5);
        assert!(!found.linking_allowed);
    }

    #[test]
    fn test_unlink_either_direction_and_relink() {
        let (db, checking, savings) = setup();
        let out = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out"))
            .unwrap();
        let inflow = db
            .insert_line_item(savings, &item("2024-02-09", 95.0, "in"))
            .unwrap();

        let engine = LinkEngine::new(&db);
        engine.create_link(out, inflow).unwrap();

        // Caller does not know which side ended up canonical parent
        engine.unlink(inflow, out).unwrap();
        assert!(db.links_for_line_item(out).unwrap().is_empty());
        assert!(db.find_active_link(out, inflow).unwrap().is_none());

        // Soft delete: the pair can be linked again afterwards
        engine.create_link(out, inflow).unwrap();
        assert_eq!(db.links_for_line_item(out).unwrap().len(), 1);
    }

    #[test]
    fn test_unlink_missing_link() {
        let (db, checking, savings) = setup();
        let a = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out"))
            .unwrap();
        let b = db
            .insert_line_item(savings, &item("2024-02-09", 95.0, "in"))
            .unwrap();

        let err = LinkEngine::new(&db).unlink(a, b).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_create_link_missing_transaction() {
        let (db, checking, _) = setup();
        let a = db
            .insert_line_item(checking, &item("2024-02-08", -100.0, "out"))
            .unwrap();

        let err = LinkEngine::new(&db).create_link(a, 9999).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
