//! Board notes

use super::Store;
use crate::tracker::BoardItem;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

pub(super) fn load_board(conn: &Connection) -> rusqlite::Result<Vec<BoardItem>> {
    let mut stmt = conn.prepare("SELECT id, text, created_at FROM board_items ORDER BY id DESC")?;
    let rows = stmt.query_map([], |row| {
        Ok(BoardItem {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;
    rows.collect()
}

impl Store {
    pub fn add_board_item(&self, text: &str, now: NaiveDateTime) -> anyhow::Result<BoardItem> {
        let conn = self.conn()?;
        let text = text.trim();
        conn.execute(
            "INSERT INTO board_items (text, created_at) VALUES (?1, ?2)",
            params![text, now],
        )?;
        Ok(BoardItem {
            id: conn.last_insert_rowid(),
            text: text.to_string(),
            created_at: now,
        })
    }

    /// Newest first
    pub fn list_board_items(&self) -> anyhow::Result<Vec<BoardItem>> {
        let conn = self.conn()?;
        Ok(load_board(&conn)?)
    }

    /// Returns false when no item has that id
    pub fn delete_board_item(&self, id: i64) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM board_items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
