//! Cadence fulfillment check
//!
//! A day is "fulfilled" when the thread's quota for the surrounding period
//! (week, month, quarter, year) is already met and the day itself is not a
//! hit, i.e. the user does not need to hit it. This is advisory only:
//! anything that cannot be evaluated answers `false`.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::cadence::Cadence;
use super::model::{Square, SquareStatus, Thread};

/// Snapshot of square statuses keyed by (thread id, date)
pub type SquareMap = HashMap<(i64, NaiveDate), SquareStatus>;

/// Build a lookup map from a list of squares
pub fn square_map<'a>(squares: impl IntoIterator<Item = &'a Square>) -> SquareMap {
    squares
        .into_iter()
        .map(|sq| ((sq.thread_id, sq.period), sq.status))
        .collect()
}

/// Whether `date` is already covered by other hits in its period
pub fn is_day_fulfilled(thread: &Thread, date: NaiveDate, squares: &SquareMap) -> bool {
    match thread.cadence() {
        Some(cadence) => evaluate(thread.thread_id, cadence, date, squares).unwrap_or(false),
        None => false,
    }
}

fn evaluate(
    thread_id: i64,
    cadence: Cadence,
    date: NaiveDate,
    squares: &SquareMap,
) -> Option<bool> {
    let quota = cadence.quota()?;
    let period = cadence.period_containing(date)?;

    let is_hit = |d: NaiveDate| squares.get(&(thread_id, d)) == Some(&SquareStatus::Hit);

    let hits = period.days().filter(|d| is_hit(*d)).count();
    Some(hits >= quota && !is_hit(date))
}
