//! Calendar entries: created lazily, updated field by field

use super::Store;
use crate::tracker::calendar::append_journal;
use crate::tracker::{CalendarDay, DayUpdate};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const CALENDAR_COLUMNS: &str = "actual_date, date_40k, week_40k, top_work_priority, \
     top_other_priority, off_routine_flag, off_routine_reason, project_type_this_week, \
     day_meds, comments";

fn day_from_row(row: &Row<'_>) -> rusqlite::Result<CalendarDay> {
    Ok(CalendarDay {
        actual_date: row.get(0)?,
        date_40k: row.get(1)?,
        week_40k: row.get(2)?,
        top_work_priority: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        top_other_priority: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        off_routine_flag: row.get(5)?,
        off_routine_reason: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        project_type_this_week: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        day_meds: row.get(8)?,
        comments: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
    })
}

pub(super) fn load_day(conn: &Connection, date: NaiveDate) -> rusqlite::Result<Option<CalendarDay>> {
    conn.query_row(
        &format!("SELECT {CALENDAR_COLUMNS} FROM calendar WHERE actual_date = ?1"),
        params![date],
        day_from_row,
    )
    .optional()
}

pub(super) fn load_all_days(conn: &Connection) -> rusqlite::Result<Vec<CalendarDay>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM calendar ORDER BY actual_date"
    ))?;
    let rows = stmt.query_map([], day_from_row)?;
    rows.collect()
}

/// Insert or replace a full calendar row
pub(super) fn write_day(conn: &Connection, day: &CalendarDay) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO calendar ({CALENDAR_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            day.actual_date,
            day.date_40k,
            day.week_40k,
            day.top_work_priority,
            day.top_other_priority,
            day.off_routine_flag,
            day.off_routine_reason,
            day.project_type_this_week,
            day.day_meds,
            day.comments,
        ],
    )?;
    Ok(())
}

fn ensure_day(conn: &Connection, date: NaiveDate) -> rusqlite::Result<CalendarDay> {
    if let Some(day) = load_day(conn, date)? {
        return Ok(day);
    }
    let day = CalendarDay::blank(date);
    write_day(conn, &day)?;
    Ok(day)
}

impl Store {
    /// Stored entry for `date`, if any. Does not create one.
    pub fn get_day(&self, date: NaiveDate) -> anyhow::Result<Option<CalendarDay>> {
        let conn = self.conn()?;
        Ok(load_day(&conn, date)?)
    }

    /// Entry for `date`, created on first access
    pub fn ensure_day(&self, date: NaiveDate) -> anyhow::Result<CalendarDay> {
        let conn = self.conn()?;
        Ok(ensure_day(&conn, date)?)
    }

    /// Apply a partial update; a non-empty note is appended to the journal
    /// stamped with `at`.
    pub fn update_day(
        &self,
        date: NaiveDate,
        update: DayUpdate,
        at: NaiveTime,
    ) -> anyhow::Result<CalendarDay> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut day = ensure_day(&tx, date)?;

        if let Some(v) = update.top_work {
            day.top_work_priority = v;
        }
        if let Some(v) = update.top_other {
            day.top_other_priority = v;
        }
        if let Some(v) = update.project {
            day.project_type_this_week = v;
        }
        if let Some(v) = update.meds {
            day.day_meds = v;
        }
        if let Some(v) = update.off_routine {
            day.off_routine_flag = v;
        }
        if let Some(v) = update.off_reason {
            day.off_routine_reason = v;
        }
        if let Some(note) = update.note.as_deref().map(str::trim) {
            if !note.is_empty() {
                day.comments = append_journal(&day.comments, at, note);
            }
        }

        write_day(&tx, &day)?;
        tx.commit()?;
        Ok(day)
    }

    /// Append one `[HH:MM] text` line to the journal of `date`
    pub fn append_journal(
        &self,
        date: NaiveDate,
        at: NaiveTime,
        text: &str,
    ) -> anyhow::Result<CalendarDay> {
        self.update_day(
            date,
            DayUpdate {
                note: Some(text.to_string()),
                ..Default::default()
            },
            at,
        )
    }

    /// Off-routine flag and reason for every flagged day in `[from, to]`
    pub fn off_routine_days(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<HashMap<NaiveDate, String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT actual_date, off_routine_reason FROM calendar \
             WHERE off_routine_flag = 1 AND actual_date >= ?1 AND actual_date <= ?2",
        )?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok((
                row.get::<_, NaiveDate>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }
}
