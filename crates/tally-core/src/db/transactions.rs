//! Line item operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::{LineItem, NewLineItem};

/// Shared SELECT column list for line item queries
const LINE_ITEM_COLUMNS: &str = "id, account_id, date, quantity, amount, symbol, balance_after, \
     description, memo, verified_not_duplicate, created_at";

impl Database {
    /// Insert a single line item
    pub fn insert_line_item(&self, account_id: i64, item: &NewLineItem) -> Result<i64> {
        let conn = self.conn()?;
        Self::insert_line_item_conn(&conn, account_id, item)
    }

    /// Insert a batch of line items atomically (statement import)
    pub fn insert_line_items(&self, account_id: i64, items: &[NewLineItem]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for item in items {
            Self::insert_line_item_conn(&tx, account_id, item)?;
        }

        tx.commit()?;
        Ok(items.len())
    }

    pub(crate) fn insert_line_item_conn(
        conn: &Connection,
        account_id: i64,
        item: &NewLineItem,
    ) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO transactions (account_id, date, quantity, amount, symbol, balance_after, description, memo)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                item.date.to_string(),
                item.quantity,
                item.amount,
                item.symbol,
                item.balance_after,
                item.description,
                item.memo,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List line items, optionally filtered by account
    pub fn list_line_items(
        &self,
        account_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LineItem>> {
        let conn = self.conn()?;

        let items = if let Some(aid) = account_id {
            let sql = format!(
                "SELECT {} FROM transactions WHERE account_id = ? ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
                LINE_ITEM_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![aid, limit, offset], |row| {
                    Self::row_to_line_item(row)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let sql = format!(
                "SELECT {} FROM transactions ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
                LINE_ITEM_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit, offset], |row| Self::row_to_line_item(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(items)
    }

    /// Get a single line item by ID
    pub fn get_line_item(&self, id: i64) -> Result<Option<LineItem>> {
        let conn = self.conn()?;
        Self::get_line_item_conn(&conn, id)
    }

    pub(crate) fn get_line_item_conn(conn: &Connection, id: i64) -> Result<Option<LineItem>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", LINE_ITEM_COLUMNS);
        let item = conn
            .prepare(&sql)?
            .query_row(params![id], |row| Self::row_to_line_item(row))
            .optional()?;

        Ok(item)
    }

    /// Delete a line item and its tag mappings; referencing links are
    /// soft-deleted so transfer history survives the deletion.
    pub fn delete_line_item(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE transfer_links SET deleted_at = CURRENT_TIMESTAMP
             WHERE deleted_at IS NULL AND (parent_t_id = ? OR child_t_id = ?)",
            params![id, id],
        )?;
        tx.execute(
            "DELETE FROM transaction_tags WHERE transaction_id = ?",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM transactions WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Load an account's not-yet-verified line items for a duplicate scan,
    /// ordered by date then id ascending
    pub fn list_unverified_line_items(
        &self,
        account_id: i64,
        year: Option<i32>,
    ) -> Result<Vec<LineItem>> {
        let conn = self.conn()?;

        let items = if let Some(y) = year {
            let from = NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or_default();
            let to = NaiveDate::from_ymd_opt(y, 12, 31).unwrap_or_default();
            let sql = format!(
                "SELECT {} FROM transactions
                 WHERE account_id = ? AND verified_not_duplicate = 0 AND date >= ? AND date <= ?
                 ORDER BY date ASC, id ASC",
                LINE_ITEM_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![account_id, from.to_string(), to.to_string()], |row| {
                    Self::row_to_line_item(row)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let sql = format!(
                "SELECT {} FROM transactions
                 WHERE account_id = ? AND verified_not_duplicate = 0
                 ORDER BY date ASC, id ASC",
                LINE_ITEM_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![account_id], |row| Self::row_to_line_item(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(items)
    }

    /// Count line items already marked as verified non-duplicates
    pub fn count_verified_line_items(&self, account_id: i64, year: Option<i32>) -> Result<i64> {
        let conn = self.conn()?;

        let count: i64 = if let Some(y) = year {
            let from = NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or_default();
            let to = NaiveDate::from_ymd_opt(y, 12, 31).unwrap_or_default();
            conn.query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE account_id = ? AND verified_not_duplicate = 1 AND date >= ? AND date <= ?",
                params![account_id, from.to_string(), to.to_string()],
                |row| row.get(0),
            )?
        } else {
            conn.query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE account_id = ? AND verified_not_duplicate = 1",
                params![account_id],
                |row| row.get(0),
            )?
        };

        Ok(count)
    }

    /// Mark line items as verified non-duplicates (dedup-scan memoization)
    pub(crate) fn mark_verified_conn(conn: &Connection, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE transactions SET verified_not_duplicate = 1 WHERE id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        Ok(stmt.execute(params.as_slice())?)
    }

    /// Filter `ids` down to the ones that exist in `account_id`
    pub(crate) fn existing_ids_in_account_conn(
        conn: &Connection,
        account_id: i64,
        ids: &[i64],
    ) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM transactions WHERE account_id = ? AND id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut params: Vec<&dyn rusqlite::ToSql> = vec![&account_id];
        params.extend(ids.iter().map(|id| id as &dyn rusqlite::ToSql));

        let found = stmt
            .query_map(params.as_slice(), |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(found)
    }

    /// Delete a set of line items (merge executor; caller supplies the
    /// ambient transaction)
    pub(crate) fn delete_line_items_conn(conn: &Connection, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let params: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        let sql = format!(
            "DELETE FROM transaction_tags WHERE transaction_id IN ({})",
            placeholders
        );
        conn.prepare(&sql)?.execute(params.as_slice())?;

        let sql = format!("DELETE FROM transactions WHERE id IN ({})", placeholders);
        let deleted = conn.prepare(&sql)?.execute(params.as_slice())?;

        Ok(deleted)
    }

    /// Helper to convert a row to LineItem
    /// Column order: id, account_id, date, quantity, amount, symbol, balance_after,
    ///               description, memo, verified_not_duplicate, created_at
    pub(crate) fn row_to_line_item(row: &rusqlite::Row) -> rusqlite::Result<LineItem> {
        let date_str: String = row.get(2)?;
        let verified_int: i64 = row.get(9)?;
        let created_at_str: String = row.get(10)?;
        Ok(LineItem {
            id: row.get(0)?,
            account_id: row.get(1)?,
            date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            quantity: row.get(3)?,
            amount: row.get(4)?,
            symbol: row.get(5)?,
            balance_after: row.get(6)?,
            description: row.get(7)?,
            memo: row.get(8)?,
            verified_not_duplicate: verified_int != 0,
            created_at: super::parse_datetime(&created_at_str),
        })
    }
}
