//! Tracking domain: threads, squares, chains and the calendar
//!
//! Everything in here is pure and storage-agnostic. The store feeds
//! snapshots in and persists what comes out.
//!
//! - `cadence` - cadences, gap tolerance and quota periods
//! - `chains` - streak rebuild over a thread's squares
//! - `fulfillment` - "quota already met this period" check
//! - `calendar` - 40k date labels and journal lines
//! - `model` - records shared across layers

pub mod cadence;
pub mod calendar;
pub mod chains;
pub mod fulfillment;
pub mod model;

pub use cadence::{Cadence, Period};
pub use chains::{build_chains, ChainPlan};
pub use fulfillment::{is_day_fulfilled, square_map, SquareMap};
pub use model::{
    BoardItem, CalendarDay, Chain, DayUpdate, MoveDirection, NewThread, Square, SquareStatus,
    Thread, ThreadStatus,
};
