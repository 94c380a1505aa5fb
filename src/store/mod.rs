//! SQLite-backed store for threads, squares, chains, calendar and board
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers ─┐
//! Bot poll loop ─┼──→ Store (r2d2 pool)
//! Backup timer  ─┘        │
//!                         ├──→ SQLite connection 1
//!                         └──→ SQLite connection N (max 4)
//! ```
//!
//! Each public method checks out exactly one connection and passes it down
//! to the private helpers, so nested helpers never wait on the pool. A
//! single-connection in-memory pool is therefore enough for tests.
//!
//! # Module Organization
//!
//! - `threads` - thread CRUD and manual ordering
//! - `squares` - day status upserts and chain rebuilds
//! - `calendar` - day context fields and the journal
//! - `board` - board notes
//! - `backup` - full export and destructive restore

mod backup;
mod board;
mod calendar;
mod squares;
mod threads;

pub use backup::RestoreSummary;

use anyhow::Context;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

/// Current schema version stored in the metadata table
const SCHEMA_VERSION: i32 = 1;

/// Handle to the tracker database
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Open (or create) the database file and apply migrations
    pub fn open(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA busy_timeout=5000;
                "#,
            )
        });
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("Failed to build SQLite connection pool")?;

        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    /// Private in-memory database (single connection)
    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    /// Make every chain insert fail, so rebuilds error out mid-transaction
    #[cfg(test)]
    pub(crate) fn reject_chain_inserts(&self) -> anyhow::Result<()> {
        self.conn()?.execute_batch(
            "CREATE TRIGGER reject_chain_insert BEFORE INSERT ON chains \
             BEGIN SELECT RAISE(ABORT, 'chains are read-only'); END;",
        )?;
        Ok(())
    }

    /// Get a connection from the pool
    fn conn(&self) -> anyhow::Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }

    fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(
                    (SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'schema_version'),
                    0
                )",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < 1 {
            apply_schema_v1(&conn)?;
            tracing::info!("Database schema initialised (v{})", SCHEMA_VERSION);
        }

        Ok(())
    }
}

fn apply_schema_v1(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        BEGIN;

        CREATE TABLE IF NOT EXISTS threads (
            thread_id INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_name TEXT NOT NULL,
            thread_name_redacted TEXT,
            category TEXT,
            sub_category TEXT,
            type TEXT,
            cadence TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            rank INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            created_at_40k TEXT,
            closed_date TEXT
        );

        -- Derived from squares; rebuilt per thread
        CREATE TABLE IF NOT EXISTS chains (
            chain_id TEXT PRIMARY KEY,
            thread_id INTEGER NOT NULL REFERENCES threads(thread_id),
            chain_start_date TEXT NOT NULL,
            chain_end_date TEXT NOT NULL,
            duration INTEGER NOT NULL DEFAULT 0,
            end_reason TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_chains_thread ON chains(thread_id);

        CREATE TABLE IF NOT EXISTS squares (
            square_id TEXT PRIMARY KEY,
            thread_id INTEGER NOT NULL REFERENCES threads(thread_id),
            period TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'empty',
            chain_id TEXT REFERENCES chains(chain_id),
            chain_start INTEGER NOT NULL DEFAULT 0,
            chain_end INTEGER NOT NULL DEFAULT 0,
            chain_end_reason TEXT NOT NULL DEFAULT '',
            UNIQUE (thread_id, period)
        );
        CREATE INDEX IF NOT EXISTS idx_squares_period ON squares(period);

        CREATE TABLE IF NOT EXISTS calendar (
            actual_date TEXT PRIMARY KEY,
            date_40k TEXT,
            week_40k TEXT,
            top_work_priority TEXT NOT NULL DEFAULT '',
            top_other_priority TEXT NOT NULL DEFAULT '',
            off_routine_flag INTEGER NOT NULL DEFAULT 0,
            off_routine_reason TEXT NOT NULL DEFAULT '',
            project_type_this_week TEXT NOT NULL DEFAULT '',
            day_meds INTEGER NOT NULL DEFAULT 0,
            comments TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS board_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', '1');

        COMMIT;
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_repeatable() {
        let store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();

        let conn = store.conn().unwrap();
        let version: String = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, "1");
    }
}
