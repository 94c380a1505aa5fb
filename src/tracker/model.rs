//! Domain records shared by the store, the web API and the bot

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::cadence::Cadence;

/// Lifecycle status of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Active,
    Deleted,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }

    /// Anything other than "deleted" is treated as active
    pub fn parse(s: &str) -> Self {
        if s == "deleted" {
            Self::Deleted
        } else {
            Self::Active
        }
    }
}

/// A habit or goal being tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: i64,
    pub thread_name: String,
    pub thread_name_redacted: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    #[serde(rename = "type")]
    pub thread_type: Option<String>,
    /// Raw cadence text; see [`Thread::cadence`]
    pub cadence: Option<String>,
    pub status: ThreadStatus,
    pub rank: i64,
    pub created_at: NaiveDate,
    pub created_at_40k: Option<String>,
    pub closed_date: Option<NaiveDate>,
}

impl Thread {
    /// Parsed cadence. Unset or unknown values return None.
    pub fn cadence(&self) -> Option<Cadence> {
        self.cadence.as_deref().and_then(Cadence::parse)
    }
}

/// Fields needed to create a thread
#[derive(Debug, Clone)]
pub struct NewThread {
    pub name: String,
    pub redacted: String,
    pub category: Option<String>,
    pub sub_category: String,
    pub thread_type: String,
    pub cadence: Cadence,
}

/// Status of one thread on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareStatus {
    Empty,
    Hit,
    Miss,
}

impl SquareStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "empty" => Some(Self::Empty),
            "hit" => Some(Self::Hit),
            "miss" => Some(Self::Miss),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

/// A thread's record for a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Square {
    pub square_id: String,
    pub thread_id: i64,
    pub period: NaiveDate,
    pub status: SquareStatus,
    pub chain_id: Option<String>,
    pub chain_start: bool,
    pub chain_end: bool,
    /// Miss reason; only meaningful for `miss` squares
    pub chain_end_reason: String,
}

/// Square ids are derived from thread and date
pub fn square_id(thread_id: i64, period: NaiveDate) -> String {
    format!("{}_{}", thread_id, period.format("%Y-%m-%d"))
}

/// Chain ids are derived from thread and start date, so rebuilds are stable
pub fn chain_id(thread_id: i64, start: NaiveDate) -> String {
    format!("CH_{}_{}", thread_id, start.format("%Y%m%d"))
}

/// A run of hits whose gaps stay inside the cadence tolerance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: String,
    pub thread_id: i64,
    pub chain_start_date: NaiveDate,
    pub chain_end_date: NaiveDate,
    /// Number of hit days in the chain
    pub duration: i64,
    pub end_reason: String,
}

/// Per-day journal and context fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub actual_date: NaiveDate,
    pub date_40k: Option<String>,
    pub week_40k: Option<String>,
    pub top_work_priority: String,
    pub top_other_priority: String,
    pub off_routine_flag: bool,
    pub off_routine_reason: String,
    pub project_type_this_week: String,
    pub day_meds: bool,
    /// Newline-joined `[HH:MM] text` journal lines
    pub comments: String,
}

impl CalendarDay {
    /// Blank entry for a date, with its 40k labels filled in
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            actual_date: date,
            date_40k: Some(super::calendar::date_40k(date)),
            week_40k: Some(super::calendar::week_40k(date)),
            top_work_priority: String::new(),
            top_other_priority: String::new(),
            off_routine_flag: false,
            off_routine_reason: String::new(),
            project_type_this_week: String::new(),
            day_meds: false,
            comments: String::new(),
        }
    }
}

/// Partial update of a calendar day; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct DayUpdate {
    pub top_work: Option<String>,
    pub top_other: Option<String>,
    pub project: Option<String>,
    pub meds: Option<bool>,
    pub off_routine: Option<bool>,
    pub off_reason: Option<String>,
    /// Appended to the journal when non-empty
    pub note: Option<String>,
}

/// A note pinned to the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
}

/// Direction for manual thread reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}
