//! Backup document format
//!
//! The on-disk shape is a flat JSON object of arrays. Records are lenient
//! on the way in (missing optional fields default) but the whole document
//! is validated into a [`RestorePlan`] before the store is touched.

use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::tracker::calendar::{date_40k, week_40k};
use crate::tracker::model::square_id;
use crate::tracker::{BoardItem, CalendarDay, Chain, Square, SquareStatus, Thread, ThreadStatus};

/// Full export of the tracker database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default)]
    pub threads: Vec<ThreadRecord>,
    #[serde(default)]
    pub squares: Vec<SquareRecord>,
    #[serde(default)]
    pub calendar: Vec<CalendarRecord>,
    #[serde(default)]
    pub board: Vec<BoardRecord>,
    /// Informational; regenerated from squares on restore
    #[serde(default)]
    pub chains: Vec<ChainRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: i64,
    pub thread_name: String,
    pub thread_name_redacted: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    #[serde(rename = "type")]
    pub thread_type: Option<String>,
    pub cadence: Option<String>,
    #[serde(default = "default_thread_status")]
    pub status: String,
    #[serde(default = "default_rank")]
    pub rank: i64,
    pub created_at: Option<NaiveDate>,
    pub created_at_40k: Option<String>,
    pub closed_date: Option<NaiveDate>,
}

fn default_thread_status() -> String {
    ThreadStatus::Active.as_str().to_string()
}

fn default_rank() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareRecord {
    pub square_id: Option<String>,
    pub thread_id: i64,
    pub period: NaiveDate,
    pub status: String,
    pub chain_id: Option<String>,
    #[serde(default)]
    pub chain_start: bool,
    #[serde(default)]
    pub chain_end: bool,
    pub chain_end_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub actual_date: NaiveDate,
    pub date_40k: Option<String>,
    pub week_40k: Option<String>,
    pub top_work_priority: Option<String>,
    pub top_other_priority: Option<String>,
    #[serde(default)]
    pub off_routine_flag: bool,
    pub off_routine_reason: Option<String>,
    pub project_type_this_week: Option<String>,
    #[serde(default)]
    pub day_meds: bool,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: Option<i64>,
    pub text: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRecord {
    pub chain_id: String,
    pub thread_id: i64,
    pub chain_start_date: Option<NaiveDate>,
    pub chain_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: i64,
    pub end_reason: Option<String>,
}

impl From<&Thread> for ThreadRecord {
    fn from(t: &Thread) -> Self {
        Self {
            thread_id: t.thread_id,
            thread_name: t.thread_name.clone(),
            thread_name_redacted: t.thread_name_redacted.clone(),
            category: t.category.clone(),
            sub_category: t.sub_category.clone(),
            thread_type: t.thread_type.clone(),
            cadence: t.cadence.clone(),
            status: t.status.as_str().to_string(),
            rank: t.rank,
            created_at: Some(t.created_at),
            created_at_40k: t.created_at_40k.clone(),
            closed_date: t.closed_date,
        }
    }
}

impl From<&Square> for SquareRecord {
    fn from(s: &Square) -> Self {
        Self {
            square_id: Some(s.square_id.clone()),
            thread_id: s.thread_id,
            period: s.period,
            status: s.status.as_str().to_string(),
            chain_id: s.chain_id.clone(),
            chain_start: s.chain_start,
            chain_end: s.chain_end,
            chain_end_reason: Some(s.chain_end_reason.clone()),
        }
    }
}

impl From<&CalendarDay> for CalendarRecord {
    fn from(c: &CalendarDay) -> Self {
        Self {
            actual_date: c.actual_date,
            date_40k: c.date_40k.clone(),
            week_40k: c.week_40k.clone(),
            top_work_priority: Some(c.top_work_priority.clone()),
            top_other_priority: Some(c.top_other_priority.clone()),
            off_routine_flag: c.off_routine_flag,
            off_routine_reason: Some(c.off_routine_reason.clone()),
            project_type_this_week: Some(c.project_type_this_week.clone()),
            day_meds: c.day_meds,
            comments: Some(c.comments.clone()),
        }
    }
}

impl From<&BoardItem> for BoardRecord {
    fn from(b: &BoardItem) -> Self {
        Self {
            id: Some(b.id),
            text: b.text.clone(),
            created_at: Some(b.created_at),
        }
    }
}

impl From<&Chain> for ChainRecord {
    fn from(c: &Chain) -> Self {
        Self {
            chain_id: c.chain_id.clone(),
            thread_id: c.thread_id,
            chain_start_date: Some(c.chain_start_date),
            chain_end_date: Some(c.chain_end_date),
            duration: c.duration,
            end_reason: Some(c.end_reason.clone()),
        }
    }
}

/// Errors raised while reading a backup document
#[derive(Debug)]
pub enum BackupError {
    /// Not JSON, or a field has the wrong shape (e.g. a malformed date)
    Parse(serde_json::Error),
    /// Well-formed JSON with inconsistent content
    Invalid(String),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Backup is not a valid document: {}", e),
            Self::Invalid(msg) => write!(f, "Backup rejected: {}", msg),
        }
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

/// Board note to insert on restore. Ids are kept when the document has them;
/// notes without one are numbered after the highest explicit id.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
}

/// Validated content ready to replace the database
#[derive(Debug, Clone, Default)]
pub struct RestorePlan {
    pub threads: Vec<Thread>,
    pub squares: Vec<Square>,
    pub calendar: Vec<CalendarDay>,
    pub board: Vec<BoardEntry>,
}

impl BackupDocument {
    pub fn from_json(json: &str) -> Result<Self, BackupError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, BackupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the whole document and convert it into domain records.
    ///
    /// `now` fills in missing creation dates and board timestamps.
    pub fn into_plan(self, now: NaiveDateTime) -> Result<RestorePlan, BackupError> {
        let mut plan = RestorePlan::default();

        let mut thread_ids = HashSet::new();
        for t in self.threads {
            if !thread_ids.insert(t.thread_id) {
                return Err(BackupError::Invalid(format!(
                    "duplicate thread id {}",
                    t.thread_id
                )));
            }
            let status = match t.status.as_str() {
                "active" => ThreadStatus::Active,
                "deleted" => ThreadStatus::Deleted,
                other => {
                    return Err(BackupError::Invalid(format!(
                        "thread {} has unknown status '{}'",
                        t.thread_id, other
                    )))
                }
            };
            let created_at = t.created_at.unwrap_or(now.date());
            plan.threads.push(Thread {
                thread_id: t.thread_id,
                thread_name: t.thread_name,
                thread_name_redacted: t.thread_name_redacted,
                category: t.category,
                sub_category: t.sub_category,
                thread_type: t.thread_type,
                cadence: t.cadence,
                status,
                rank: t.rank,
                created_at,
                created_at_40k: t.created_at_40k.or_else(|| Some(date_40k(created_at))),
                closed_date: t.closed_date,
            });
        }

        let mut square_keys = HashSet::new();
        for s in self.squares {
            if !thread_ids.contains(&s.thread_id) {
                return Err(BackupError::Invalid(format!(
                    "square {} references unknown thread {}",
                    s.period, s.thread_id
                )));
            }
            if !square_keys.insert((s.thread_id, s.period)) {
                return Err(BackupError::Invalid(format!(
                    "duplicate square for thread {} on {}",
                    s.thread_id, s.period
                )));
            }
            let status = SquareStatus::parse(&s.status).ok_or_else(|| {
                BackupError::Invalid(format!(
                    "square {} of thread {} has unknown status '{}'",
                    s.period, s.thread_id, s.status
                ))
            })?;
            let reason = match status {
                SquareStatus::Miss => s.chain_end_reason.unwrap_or_default(),
                _ => String::new(),
            };
            plan.squares.push(Square {
                square_id: square_id(s.thread_id, s.period),
                thread_id: s.thread_id,
                period: s.period,
                status,
                chain_id: None,
                chain_start: false,
                chain_end: false,
                chain_end_reason: reason,
            });
        }

        let mut dates = HashSet::new();
        for c in self.calendar {
            if !dates.insert(c.actual_date) {
                return Err(BackupError::Invalid(format!(
                    "duplicate calendar entry for {}",
                    c.actual_date
                )));
            }
            plan.calendar.push(CalendarDay {
                actual_date: c.actual_date,
                date_40k: c.date_40k.or_else(|| Some(date_40k(c.actual_date))),
                week_40k: c.week_40k.or_else(|| Some(week_40k(c.actual_date))),
                top_work_priority: c.top_work_priority.unwrap_or_default(),
                top_other_priority: c.top_other_priority.unwrap_or_default(),
                off_routine_flag: c.off_routine_flag,
                off_routine_reason: c.off_routine_reason.unwrap_or_default(),
                project_type_this_week: c.project_type_this_week.unwrap_or_default(),
                day_meds: c.day_meds,
                comments: c.comments.unwrap_or_default(),
            });
        }

        let mut board_ids = HashSet::new();
        for id in self.board.iter().filter_map(|b| b.id) {
            if !board_ids.insert(id) {
                return Err(BackupError::Invalid(format!("duplicate board id {}", id)));
            }
        }
        let mut next_id = board_ids.iter().copied().max().unwrap_or(0);
        for b in self.board {
            let id = match b.id {
                Some(id) => id,
                None => {
                    next_id = next_id.checked_add(1).ok_or_else(|| {
                        BackupError::Invalid("board ids exhausted".to_string())
                    })?;
                    next_id
                }
            };
            plan.board.push(BoardEntry {
                id,
                text: b.text,
                created_at: b.created_at.unwrap_or(now),
            });
        }

        Ok(plan)
    }
}
