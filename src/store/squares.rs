//! Square upserts and per-thread chain rebuilds

use super::threads::load_thread;
use super::Store;
use crate::tracker::model::square_id;
use crate::tracker::{build_chains, Chain, ChainPlan, Square, SquareStatus};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const SQUARE_COLUMNS: &str =
    "square_id, thread_id, period, status, chain_id, chain_start, chain_end, chain_end_reason";

pub(super) fn square_from_row(row: &Row<'_>) -> rusqlite::Result<Square> {
    let status: String = row.get(3)?;
    Ok(Square {
        square_id: row.get(0)?,
        thread_id: row.get(1)?,
        period: row.get(2)?,
        // Unknown statuses degrade to empty rather than failing the whole read
        status: SquareStatus::parse(&status).unwrap_or(SquareStatus::Empty),
        chain_id: row.get(4)?,
        chain_start: row.get(5)?,
        chain_end: row.get(6)?,
        chain_end_reason: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

fn chain_from_row(row: &Row<'_>) -> rusqlite::Result<Chain> {
    Ok(Chain {
        chain_id: row.get(0)?,
        thread_id: row.get(1)?,
        chain_start_date: row.get(2)?,
        chain_end_date: row.get(3)?,
        duration: row.get(4)?,
        end_reason: row.get(5)?,
    })
}

pub(super) fn load_squares_for_thread(
    conn: &Connection,
    thread_id: i64,
) -> rusqlite::Result<Vec<Square>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SQUARE_COLUMNS} FROM squares WHERE thread_id = ?1 ORDER BY period"
    ))?;
    let rows = stmt.query_map(params![thread_id], square_from_row)?;
    rows.collect()
}

pub(super) fn load_non_empty_squares(conn: &Connection) -> rusqlite::Result<Vec<Square>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SQUARE_COLUMNS} FROM squares WHERE status != 'empty' ORDER BY thread_id, period"
    ))?;
    let rows = stmt.query_map([], square_from_row)?;
    rows.collect()
}

pub(super) fn load_chains(conn: &Connection, thread_id: Option<i64>) -> rusqlite::Result<Vec<Chain>> {
    const COLUMNS: &str =
        "chain_id, thread_id, chain_start_date, chain_end_date, duration, end_reason";
    match thread_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM chains WHERE thread_id = ?1 ORDER BY chain_start_date"
            ))?;
            let rows = stmt.query_map(params![id], chain_from_row)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM chains ORDER BY thread_id, chain_start_date"
            ))?;
            let rows = stmt.query_map([], chain_from_row)?;
            rows.collect()
        }
    }
}

pub(super) fn insert_square(conn: &Connection, square: &Square) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO squares ({SQUARE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, NULL, 0, 0, ?5)"
        ),
        params![
            square.square_id,
            square.thread_id,
            square.period,
            square.status.as_str(),
            square.chain_end_reason,
        ],
    )?;
    Ok(())
}

/// Replace one thread's chains with a fresh rebuild, inside its own transaction
pub(super) fn rebuild_chains(conn: &Connection, thread_id: i64) -> anyhow::Result<ChainPlan> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "UPDATE squares SET chain_id = NULL, chain_start = 0, chain_end = 0 WHERE thread_id = ?1",
        params![thread_id],
    )?;
    tx.execute("DELETE FROM chains WHERE thread_id = ?1", params![thread_id])?;

    let Some(thread) = load_thread(&tx, thread_id)? else {
        tx.commit()?;
        return Ok(ChainPlan::default());
    };

    let squares = load_squares_for_thread(&tx, thread_id)?;
    let plan = build_chains(thread_id, thread.cadence(), &squares);

    for chain in &plan.chains {
        tx.execute(
            "INSERT INTO chains (chain_id, thread_id, chain_start_date, chain_end_date, \
             duration, end_reason) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                chain.chain_id,
                chain.thread_id,
                chain.chain_start_date,
                chain.chain_end_date,
                chain.duration,
                chain.end_reason,
            ],
        )?;
    }
    for membership in &plan.memberships {
        tx.execute(
            "UPDATE squares SET chain_id = ?2, chain_start = ?3, chain_end = ?4 \
             WHERE square_id = ?1",
            params![
                membership.square_id,
                membership.chain_id,
                membership.chain_start,
                membership.chain_end,
            ],
        )?;
    }

    tx.commit()?;
    Ok(plan)
}

/// Rebuild and log instead of failing. Returns whether the rebuild succeeded.
pub(super) fn rebuild_chains_logged(conn: &Connection, thread_id: i64) -> bool {
    match rebuild_chains(conn, thread_id) {
        Ok(plan) => {
            tracing::debug!(thread_id, chains = plan.chains.len(), "Chains rebuilt");
            true
        }
        Err(e) => {
            tracing::error!(thread_id, "Chain rebuild failed: {:#}", e);
            false
        }
    }
}

impl Store {
    /// Upsert the square for (thread, date) and rebuild the thread's chains.
    ///
    /// The reason is only stored for misses. Returns false when the thread
    /// does not exist. A failed chain rebuild is logged, not returned.
    pub fn set_square(
        &self,
        thread_id: i64,
        date: NaiveDate,
        status: SquareStatus,
        reason: &str,
    ) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        if load_thread(&conn, thread_id)?.is_none() {
            return Ok(false);
        }

        let reason = if status == SquareStatus::Miss {
            reason.trim()
        } else {
            ""
        };
        conn.execute(
            "INSERT INTO squares (square_id, thread_id, period, status, chain_end_reason) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(thread_id, period) DO UPDATE SET \
                 status = excluded.status, chain_end_reason = excluded.chain_end_reason",
            params![
                square_id(thread_id, date),
                thread_id,
                date,
                status.as_str(),
                reason,
            ],
        )?;
        tracing::debug!(thread_id, %date, status = status.as_str(), "Square updated");

        rebuild_chains_logged(&conn, thread_id);
        Ok(true)
    }

    /// Rebuild one thread's chains on demand
    #[cfg(test)]
    pub fn recalculate_chains(&self, thread_id: i64) -> anyhow::Result<ChainPlan> {
        let conn = self.conn()?;
        rebuild_chains(&conn, thread_id)
    }

    /// All squares whose date falls in `[from, to]`
    pub fn squares_between(&self, from: NaiveDate, to: NaiveDate) -> anyhow::Result<Vec<Square>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SQUARE_COLUMNS} FROM squares \
             WHERE period >= ?1 AND period <= ?2 ORDER BY thread_id, period"
        ))?;
        let rows = stmt.query_map(params![from, to], square_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    #[cfg(test)]
    pub fn squares_for_thread(&self, thread_id: i64) -> anyhow::Result<Vec<Square>> {
        let conn = self.conn()?;
        Ok(load_squares_for_thread(&conn, thread_id)?)
    }

    /// A thread's chains ordered by start date
    pub fn chains_for_thread(&self, thread_id: i64) -> anyhow::Result<Vec<Chain>> {
        let conn = self.conn()?;
        Ok(load_chains(&conn, Some(thread_id))?)
    }
}
