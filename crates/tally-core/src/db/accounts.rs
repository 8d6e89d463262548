//! Account operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Account, AccountKind};

impl Database {
    /// Create or get an account by name
    pub fn upsert_account(&self, name: &str, kind: AccountKind) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM accounts WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO accounts (name, kind) VALUES (?, ?)",
            params![name, kind.as_str()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List all accounts
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, kind, created_at FROM accounts ORDER BY name")?;

        let accounts = stmt
            .query_map([], |row| Self::row_to_account(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account by ID
    pub fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, name, kind, created_at FROM accounts WHERE id = ?",
                params![id],
                |row| Self::row_to_account(row),
            )
            .optional()?;

        Ok(account)
    }

    /// Delete an account, its transactions, and everything hanging off them
    pub fn delete_account(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM transaction_tags WHERE transaction_id IN (SELECT id FROM transactions WHERE account_id = ?)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM transfer_links WHERE parent_t_id IN (SELECT id FROM transactions WHERE account_id = ?)
                OR child_t_id IN (SELECT id FROM transactions WHERE account_id = ?)",
            params![id, id],
        )?;
        tx.execute("DELETE FROM transactions WHERE account_id = ?", params![id])?;
        tx.execute("DELETE FROM accounts WHERE id = ?", params![id])?;

        tx.commit()?;
        Ok(())
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
        let kind_str: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;
        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: kind_str.parse().unwrap_or(AccountKind::Checking),
            created_at: parse_datetime(&created_at_str),
        })
    }
}
