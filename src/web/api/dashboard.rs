// Dashboard endpoints - year grid per thread, today's context, chains
//
// The grid is laid out like a wall calendar: each thread's year starts with
// padding cells up to the Monday of the first week, then one cell per day,
// chunked into rows of seven.

use std::collections::HashMap;

use super::ApiError;
use crate::tracker::calendar::{parse_journal, JournalEntry};
use crate::tracker::{
    is_day_fulfilled, square_map, BoardItem, Chain, Square, SquareStatus, Thread,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Squares outside the year still decide week fulfillment at its edges
const EDGE_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// One cell of the year grid
#[derive(Debug, Serialize, PartialEq)]
pub struct DayCell {
    pub is_padding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub is_today: bool,
    pub status: SquareStatus,
    pub is_off_routine: bool,
    pub is_fulfilled: bool,
    pub miss_reason: String,
}

impl DayCell {
    fn padding() -> Self {
        Self {
            is_padding: true,
            date: None,
            is_today: false,
            status: SquareStatus::Empty,
            is_off_routine: false,
            is_fulfilled: false,
            miss_reason: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadGrid {
    pub info: Thread,
    pub weeks: Vec<Vec<DayCell>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub threads: Vec<ThreadGrid>,
}

/// Today's context block
#[derive(Debug, Serialize)]
pub struct TodayContext {
    pub date: NaiveDate,
    pub date_40k: Option<String>,
    pub week_40k: Option<String>,
    pub top_work: String,
    pub top_other: String,
    pub project: String,
    pub meds: bool,
    pub off_routine: bool,
    pub off_reason: String,
    /// Newest first
    pub comment_list: Vec<JournalEntry>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub year: i32,
    pub today: TodayContext,
    /// Newest first
    pub board: Vec<BoardItem>,
    pub categories: Vec<CategoryGroup>,
}

/// Which bucket a category lands in: itself if listed, else the last one
fn bucket_index(categories: &[String], category: Option<&str>) -> usize {
    category
        .and_then(|c| categories.iter().position(|known| known == c))
        .unwrap_or(categories.len().saturating_sub(1))
}

/// Build one thread's padded year grid
fn thread_grid(
    thread: &Thread,
    year: i32,
    today: NaiveDate,
    squares: &HashMap<(i64, NaiveDate), &Square>,
    status_map: &crate::tracker::SquareMap,
    off_routine: &HashMap<NaiveDate, String>,
) -> Option<Vec<Vec<DayCell>>> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?;

    let mut cells: Vec<DayCell> = (0..start.weekday().num_days_from_monday())
        .map(|_| DayCell::padding())
        .collect();

    for date in start.iter_days().take_while(|d| *d <= end) {
        let square = squares.get(&(thread.thread_id, date));
        cells.push(DayCell {
            is_padding: false,
            date: Some(date),
            is_today: date == today,
            status: square.map(|s| s.status).unwrap_or(SquareStatus::Empty),
            is_off_routine: off_routine.contains_key(&date),
            is_fulfilled: is_day_fulfilled(thread, date, status_map),
            miss_reason: square
                .map(|s| s.chain_end_reason.clone())
                .unwrap_or_default(),
        });
    }

    let mut weeks = Vec::with_capacity(cells.len() / 7 + 1);
    let mut iter = cells.into_iter().peekable();
    while iter.peek().is_some() {
        weeks.push(iter.by_ref().take(7).collect());
    }
    Some(weeks)
}

/// GET /api/dashboard?year= - Everything the dashboard page renders
///
/// Opening the dashboard creates today's calendar entry if missing.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let now = state.clock.now();
    let today = now.date();
    let year = params.year.unwrap_or(today.year());

    // The edge window must fit in chrono's range too, so boundary years are refused
    let edge = Duration::days(EDGE_DAYS);
    let window = NaiveDate::from_ymd_opt(year, 1, 1).zip(NaiveDate::from_ymd_opt(year, 12, 31));
    let Some((start, end, load_from, load_to)) = window.and_then(|(start, end)| {
        Some((
            start,
            end,
            start.checked_sub_signed(edge)?,
            end.checked_add_signed(edge)?,
        ))
    }) else {
        return Err(ApiError::BadRequest(format!("Invalid year {}", year)));
    };

    let day = state.store.ensure_day(today)?;
    let board = state.store.list_board_items()?;
    let threads = state.store.list_threads(true)?;
    let loaded = state.store.squares_between(load_from, load_to)?;
    let off_routine = state.store.off_routine_days(start, end)?;

    let by_key: HashMap<(i64, NaiveDate), &Square> =
        loaded.iter().map(|s| ((s.thread_id, s.period), s)).collect();
    let status_map = square_map(&loaded);

    let mut categories: Vec<CategoryGroup> = state
        .categories
        .iter()
        .map(|c| CategoryGroup {
            category: c.clone(),
            threads: Vec::new(),
        })
        .collect();

    for thread in threads {
        let Some(weeks) = thread_grid(&thread, year, today, &by_key, &status_map, &off_routine)
        else {
            continue;
        };
        let idx = bucket_index(&state.categories, thread.category.as_deref());
        if let Some(group) = categories.get_mut(idx) {
            group.threads.push(ThreadGrid {
                info: thread,
                weeks,
            });
        }
    }

    let comment_list = parse_journal(&day.comments);

    Ok(Json(DashboardResponse {
        success: true,
        year,
        today: TodayContext {
            date: today,
            date_40k: day.date_40k,
            week_40k: day.week_40k,
            top_work: day.top_work_priority,
            top_other: day.top_other_priority,
            project: day.project_type_this_week,
            meds: day.day_meds,
            off_routine: day.off_routine_flag,
            off_reason: day.off_routine_reason,
            comment_list,
        },
        board,
        categories,
    }))
}

#[derive(Debug, Serialize)]
pub struct ChainsResponse {
    pub success: bool,
    pub thread_id: i64,
    pub chains: Vec<Chain>,
}

/// GET /api/threads/:id/chains - A thread's chains, oldest first
pub async fn get_thread_chains(
    State(state): State<AppState>,
    Path(thread_id): Path<i64>,
) -> Result<Json<ChainsResponse>, ApiError> {
    if state.store.get_thread(thread_id)?.is_none() {
        return Err(ApiError::NotFound(format!("Thread {} not found", thread_id)));
    }
    Ok(Json(ChainsResponse {
        success: true,
        thread_id,
        chains: state.store.chains_for_thread(thread_id)?,
    }))
}
