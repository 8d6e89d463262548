//! Transfer link store operations
//!
//! Links are never hard-deleted: unlinking stamps `deleted_at`, and every
//! query here is scoped to active rows unless it says otherwise.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{LineItem, TransferLink};

impl Database {
    /// Find the active link between two line items, in either stored direction
    pub fn find_active_link(&self, a_id: i64, b_id: i64) -> Result<Option<TransferLink>> {
        let conn = self.conn()?;
        Self::find_active_link_conn(&conn, a_id, b_id)
    }

    pub(crate) fn find_active_link_conn(
        conn: &Connection,
        a_id: i64,
        b_id: i64,
    ) -> Result<Option<TransferLink>> {
        let link = conn
            .query_row(
                "SELECT id, parent_t_id, child_t_id, created_at, deleted_at FROM transfer_links
                 WHERE deleted_at IS NULL
                   AND ((parent_t_id = ?1 AND child_t_id = ?2) OR (parent_t_id = ?2 AND child_t_id = ?1))",
                params![a_id, b_id],
                |row| Self::row_to_link(row),
            )
            .optional()?;

        Ok(link)
    }

    /// The active link (if any) where this line item is the child
    pub(crate) fn active_parent_link_conn(
        conn: &Connection,
        child_id: i64,
    ) -> Result<Option<TransferLink>> {
        let link = conn
            .query_row(
                "SELECT id, parent_t_id, child_t_id, created_at, deleted_at FROM transfer_links
                 WHERE deleted_at IS NULL AND child_t_id = ?",
                params![child_id],
                |row| Self::row_to_link(row),
            )
            .optional()?;

        Ok(link)
    }

    /// Sum of `abs(amount)` over a parent's active children
    pub fn active_children_amount(&self, parent_id: i64) -> Result<f64> {
        let conn = self.conn()?;
        Self::active_children_amount_conn(&conn, parent_id)
    }

    pub(crate) fn active_children_amount_conn(conn: &Connection, parent_id: i64) -> Result<f64> {
        let sum: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(ABS(t.amount)), 0)
            FROM transfer_links l
            JOIN transactions t ON t.id = l.child_t_id
            WHERE l.parent_t_id = ? AND l.deleted_at IS NULL
            "#,
            params![parent_id],
            |row| row.get(0),
        )?;

        Ok(sum)
    }

    /// Same sum, ignoring one link (capacity re-check while that link is
    /// being rewritten and still stored under its old endpoints)
    pub(crate) fn active_children_amount_excluding_conn(
        conn: &Connection,
        parent_id: i64,
        link_id: i64,
    ) -> Result<f64> {
        let sum: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(ABS(t.amount)), 0)
            FROM transfer_links l
            JOIN transactions t ON t.id = l.child_t_id
            WHERE l.parent_t_id = ? AND l.deleted_at IS NULL AND l.id != ?
            "#,
            params![parent_id, link_id],
            |row| row.get(0),
        )?;

        Ok(sum)
    }

    pub(crate) fn insert_link_conn(conn: &Connection, parent_id: i64, child_id: i64) -> Result<i64> {
        conn.execute(
            "INSERT INTO transfer_links (parent_t_id, child_t_id) VALUES (?, ?)",
            params![parent_id, child_id],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Soft-delete a link (unlink; the row stays for audit)
    pub fn soft_delete_link(&self, link_id: i64) -> Result<()> {
        let conn = self.conn()?;
        Self::soft_delete_link_conn(&conn, link_id)
    }

    pub(crate) fn soft_delete_link_conn(conn: &Connection, link_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE transfer_links SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
            params![link_id],
        )?;
        Ok(())
    }

    /// Active links where the line item appears as parent or child
    pub fn links_for_line_item(&self, id: i64) -> Result<Vec<TransferLink>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, parent_t_id, child_t_id, created_at, deleted_at FROM transfer_links
             WHERE deleted_at IS NULL AND (parent_t_id = ? OR child_t_id = ?)
             ORDER BY id",
        )?;

        let links = stmt
            .query_map(params![id, id], |row| Self::row_to_link(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Active links referencing any of `ids` as parent or child (merge
    /// executor helper; caller supplies the ambient transaction)
    pub(crate) fn links_touching_conn(conn: &Connection, ids: &[i64]) -> Result<Vec<TransferLink>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, parent_t_id, child_t_id, created_at, deleted_at FROM transfer_links
             WHERE deleted_at IS NULL AND (parent_t_id IN ({0}) OR child_t_id IN ({0}))
             ORDER BY id",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(ids.len() * 2);
        params.extend(ids.iter().map(|id| id as &dyn rusqlite::ToSql));
        params.extend(ids.iter().map(|id| id as &dyn rusqlite::ToSql));

        let links = stmt
            .query_map(params.as_slice(), |row| Self::row_to_link(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Re-point a link's endpoints (merge executor helper)
    pub(crate) fn update_link_endpoints_conn(
        conn: &Connection,
        link_id: i64,
        parent_id: i64,
        child_id: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE transfer_links SET parent_t_id = ?, child_t_id = ? WHERE id = ?",
            params![parent_id, child_id, link_id],
        )?;
        Ok(())
    }

    /// Transfer candidates for a source transaction: other-account line
    /// items inside the date window and absolute-amount band that do not
    /// already participate in an active link in either role. Ordered by
    /// amount distance from the source, then date, then id.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn list_link_candidates(
        &self,
        source_id: i64,
        account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        amount_low: f64,
        amount_high: f64,
        target_abs: f64,
        limit: i64,
    ) -> Result<Vec<LineItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.account_id, t.date, t.quantity, t.amount, t.symbol, t.balance_after,
                   t.description, t.memo, t.verified_not_duplicate, t.created_at
            FROM transactions t
            WHERE t.id != ?1
              AND t.account_id != ?2
              AND t.date >= ?3 AND t.date <= ?4
              AND ABS(t.amount) >= ?5 AND ABS(t.amount) <= ?6
              AND NOT EXISTS (
                  SELECT 1 FROM transfer_links l
                  WHERE l.deleted_at IS NULL
                    AND (l.parent_t_id = t.id OR l.child_t_id = t.id)
              )
            ORDER BY ABS(ABS(t.amount) - ?7) ASC, t.date ASC, t.id ASC
            LIMIT ?8
            "#,
        )?;

        let items = stmt
            .query_map(
                params![
                    source_id,
                    account_id,
                    from.to_string(),
                    to.to_string(),
                    amount_low,
                    amount_high,
                    target_abs,
                    limit
                ],
                |row| Self::row_to_line_item(row),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<TransferLink> {
        let created_at_str: String = row.get(3)?;
        let deleted_at_str: Option<String> = row.get(4)?;
        Ok(TransferLink {
            id: row.get(0)?,
            parent_t_id: row.get(1)?,
            child_t_id: row.get(2)?,
            created_at: parse_datetime(&created_at_str),
            deleted_at: deleted_at_str.map(|s| parse_datetime(&s)),
        })
    }
}
