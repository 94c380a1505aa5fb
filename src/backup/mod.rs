//! JSON backup: export, validated restore, and the daily scheduled export
//!
//! - `document` - backup document shape and validation
//! - `scheduler` - background thread firing once per day

pub mod document;
pub mod scheduler;

pub use document::{BackupDocument, BackupError};
pub use scheduler::{BackupScheduler, BackupSink};

use anyhow::Context;
use chrono::NaiveDateTime;

use crate::store::{RestoreSummary, Store};

/// `backup_YYYY-MM-DD_HH-MM.json`
pub fn backup_file_name(now: NaiveDateTime) -> String {
    format!("backup_{}.json", now.format("%Y-%m-%d_%H-%M"))
}

/// Export the database as pretty-printed JSON
pub fn export_json(store: &Store) -> anyhow::Result<String> {
    let document = store.export().context("Failed to read database for export")?;
    Ok(document.to_json()?)
}

/// Parse and validate `json`, then replace the database with it.
///
/// Nothing is deleted unless the whole document validates.
pub fn restore_json(store: &Store, json: &str, now: NaiveDateTime) -> anyhow::Result<RestoreSummary> {
    let plan = BackupDocument::from_json(json)?.into_plan(now)?;
    store.restore(&plan).context("Restore failed while writing")
}
