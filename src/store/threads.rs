//! Thread queries and mutations

use super::Store;
use crate::tracker::calendar::date_40k;
use crate::tracker::{MoveDirection, NewThread, Thread, ThreadStatus};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const THREAD_COLUMNS: &str = "thread_id, thread_name, thread_name_redacted, category, \
     sub_category, type, cadence, status, rank, created_at, created_at_40k, closed_date";

pub(super) fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<Thread> {
    let status: String = row.get(7)?;
    Ok(Thread {
        thread_id: row.get(0)?,
        thread_name: row.get(1)?,
        thread_name_redacted: row.get(2)?,
        category: row.get(3)?,
        sub_category: row.get(4)?,
        thread_type: row.get(5)?,
        cadence: row.get(6)?,
        status: ThreadStatus::parse(&status),
        rank: row.get(8)?,
        created_at: row.get(9)?,
        created_at_40k: row.get(10)?,
        closed_date: row.get(11)?,
    })
}

pub(super) fn load_thread(conn: &Connection, thread_id: i64) -> rusqlite::Result<Option<Thread>> {
    conn.query_row(
        &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = ?1"),
        params![thread_id],
        thread_from_row,
    )
    .optional()
}

pub(super) fn load_threads(conn: &Connection, active_only: bool) -> rusqlite::Result<Vec<Thread>> {
    let sql = if active_only {
        format!("SELECT {THREAD_COLUMNS} FROM threads WHERE status = 'active' ORDER BY rank DESC")
    } else {
        format!("SELECT {THREAD_COLUMNS} FROM threads ORDER BY thread_id")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], thread_from_row)?;
    rows.collect()
}

pub(super) fn insert_thread(conn: &Connection, thread: &Thread) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO threads ({THREAD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            thread.thread_id,
            thread.thread_name,
            thread.thread_name_redacted,
            thread.category,
            thread.sub_category,
            thread.thread_type,
            thread.cadence,
            thread.status.as_str(),
            thread.rank,
            thread.created_at,
            thread.created_at_40k,
            thread.closed_date,
        ],
    )?;
    Ok(())
}

impl Store {
    /// Active threads by rank (highest first), or every thread by id
    pub fn list_threads(&self, active_only: bool) -> anyhow::Result<Vec<Thread>> {
        let conn = self.conn()?;
        Ok(load_threads(&conn, active_only)?)
    }

    pub fn get_thread(&self, thread_id: i64) -> anyhow::Result<Option<Thread>> {
        let conn = self.conn()?;
        Ok(load_thread(&conn, thread_id)?)
    }

    /// Create an active thread ranked above every existing thread
    pub fn add_thread(&self, new: NewThread, today: NaiveDate) -> anyhow::Result<Thread> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let max_rank: i64 =
            tx.query_row("SELECT COALESCE(MAX(rank), 0) FROM threads", [], |row| {
                row.get(0)
            })?;

        tx.execute(
            "INSERT INTO threads (thread_name, thread_name_redacted, category, sub_category, \
             type, cadence, status, rank, created_at, created_at_40k) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7, ?8, ?9)",
            params![
                new.name,
                new.redacted,
                new.category,
                new.sub_category,
                new.thread_type,
                new.cadence.as_str(),
                max_rank + 1,
                today,
                date_40k(today),
            ],
        )?;
        let thread_id = tx.last_insert_rowid();
        let thread = load_thread(&tx, thread_id)?
            .ok_or_else(|| anyhow::anyhow!("Thread {} vanished after insert", thread_id))?;
        tx.commit()?;

        tracing::info!(
            thread_id,
            name = %thread.thread_name,
            cadence = new.cadence.as_str(),
            "Thread created"
        );
        Ok(thread)
    }

    /// Soft delete: flip status and record the closure date.
    /// Returns false when the thread does not exist.
    pub fn delete_thread(&self, thread_id: i64, today: NaiveDate) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE threads SET status = 'deleted', closed_date = ?2 WHERE thread_id = ?1",
            params![thread_id, today],
        )?;
        if changed > 0 {
            tracing::info!(thread_id, "Thread soft-deleted");
        }
        Ok(changed > 0)
    }

    /// Swap rank with the nearest active neighbour in `direction`.
    ///
    /// Returns `None` if the thread does not exist, `Some(false)` if it is
    /// already at the edge.
    pub fn move_thread(
        &self,
        thread_id: i64,
        direction: MoveDirection,
    ) -> anyhow::Result<Option<bool>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(thread) = load_thread(&tx, thread_id)? else {
            return Ok(None);
        };

        let neighbour_sql = match direction {
            MoveDirection::Up => {
                "SELECT thread_id, rank FROM threads \
                 WHERE rank > ?1 AND status = 'active' ORDER BY rank ASC LIMIT 1"
            }
            MoveDirection::Down => {
                "SELECT thread_id, rank FROM threads \
                 WHERE rank < ?1 AND status = 'active' ORDER BY rank DESC LIMIT 1"
            }
        };
        let neighbour: Option<(i64, i64)> = tx
            .query_row(neighbour_sql, params![thread.rank], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let Some((neighbour_id, neighbour_rank)) = neighbour else {
            return Ok(Some(false));
        };

        tx.execute(
            "UPDATE threads SET rank = ?2 WHERE thread_id = ?1",
            params![thread.thread_id, neighbour_rank],
        )?;
        tx.execute(
            "UPDATE threads SET rank = ?2 WHERE thread_id = ?1",
            params![neighbour_id, thread.rank],
        )?;
        tx.commit()?;

        tracing::debug!(thread_id, neighbour_id, ?direction, "Thread moved");
        Ok(Some(true))
    }
}
