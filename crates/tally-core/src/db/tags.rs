//! Tag and line-item-tag association operations
//!
//! Mappings are soft-deleted: untagging stamps `deleted_at`, re-tagging
//! revives the stamped row instead of inserting a second one.

use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::Tag;

impl Database {
    /// Create or get a tag by label
    pub fn upsert_tag(&self, label: &str, color: Option<&str>) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM tags WHERE label = ?",
                params![label],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO tags (label, color) VALUES (?, ?)",
            params![label, color],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List all tags
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, label, color, created_at FROM tags ORDER BY label")?;

        let tags = stmt
            .query_map([], |row| Self::row_to_tag(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Get a tag by ID
    pub fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let conn = self.conn()?;
        let tag = conn
            .query_row(
                "SELECT id, label, color, created_at FROM tags WHERE id = ?",
                params![id],
                |row| Self::row_to_tag(row),
            )
            .optional()?;

        Ok(tag)
    }

    /// Find a tag by its label
    pub fn find_tag_by_label(&self, label: &str) -> Result<Option<Tag>> {
        let conn = self.conn()?;
        let tag = conn
            .query_row(
                "SELECT id, label, color, created_at FROM tags WHERE label = ?",
                params![label],
                |row| Self::row_to_tag(row),
            )
            .optional()?;

        Ok(tag)
    }

    /// Delete a tag and its mappings
    pub fn delete_tag(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM transaction_tags WHERE tag_id = ?", params![id])?;
        let deleted = tx.execute("DELETE FROM tags WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Attach a tag to a line item (revives a soft-deleted mapping)
    pub fn tag_line_item(&self, transaction_id: i64, tag_id: i64) -> Result<()> {
        let conn = self.conn()?;
        Self::attach_tag_conn(&conn, transaction_id, tag_id)
    }

    /// Detach a tag from a line item (soft delete, mapping row is kept)
    pub fn untag_line_item(&self, transaction_id: i64, tag_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transaction_tags SET deleted_at = CURRENT_TIMESTAMP
             WHERE transaction_id = ? AND tag_id = ? AND deleted_at IS NULL",
            params![transaction_id, tag_id],
        )?;
        Ok(updated > 0)
    }

    /// Active tags attached to a line item
    pub fn tags_for_line_item(&self, transaction_id: i64) -> Result<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.label, t.color, t.created_at
            FROM tags t
            JOIN transaction_tags tt ON tt.tag_id = t.id
            WHERE tt.transaction_id = ? AND tt.deleted_at IS NULL
            ORDER BY t.label
            "#,
        )?;

        let tags = stmt
            .query_map(params![transaction_id], |row| Self::row_to_tag(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    pub(crate) fn attach_tag_conn(conn: &Connection, transaction_id: i64, tag_id: i64) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO transaction_tags (transaction_id, tag_id)
            VALUES (?, ?)
            ON CONFLICT(transaction_id, tag_id) DO UPDATE SET deleted_at = NULL
            "#,
            params![transaction_id, tag_id],
        )?;
        Ok(())
    }

    /// Active tag ids on a line item (merge executor helper)
    pub(crate) fn active_tag_ids_conn(conn: &Connection, transaction_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT tag_id FROM transaction_tags WHERE transaction_id = ? AND deleted_at IS NULL",
        )?;

        let ids = stmt
            .query_map(params![transaction_id], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
        let created_at_str: String = row.get(3)?;
        Ok(Tag {
            id: row.get(0)?,
            label: row.get(1)?,
            color: row.get(2)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
