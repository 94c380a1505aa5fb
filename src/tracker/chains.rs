//! Chain (streak) builder
//!
//! Rebuilds a thread's chains from scratch in one left-to-right pass over
//! its hit squares. Two consecutive hits belong to the same chain when the
//! day gap between them is at most the cadence tolerance; otherwise the
//! running chain is closed and a new one starts at the later hit.
//!
//! ```text
//! tolerance = 7 (weekly)
//!
//!   hit ─ 7d ─ hit ─ 8d ─ hit
//!   └──── chain A ───┘    └ chain B
//! ```
//!
//! A closed chain takes its end reason from the earliest `miss` square
//! strictly inside the gap, or [`GAP_REASON`] when the gap has no miss.
//! The output only depends on the squares and the cadence, and chain ids
//! are derived from start dates, so rebuilding unchanged data reproduces the
//! same chains.

use super::cadence::{tolerance_for, Cadence};
use super::model::{chain_id, Chain, Square, SquareStatus};

/// End reason used when a gap contains no recorded miss
pub const GAP_REASON: &str = "gap";

/// Chain annotation for one hit square
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub square_id: String,
    pub chain_id: String,
    pub chain_start: bool,
    pub chain_end: bool,
}

/// Result of a rebuild: the chains plus which square belongs where
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainPlan {
    pub chains: Vec<Chain>,
    pub memberships: Vec<Membership>,
}

/// Rebuild all chains of one thread from its squares.
///
/// `squares` may arrive in any order and may include empty and miss squares;
/// only hits form chains and only misses supply end reasons.
pub fn build_chains(thread_id: i64, cadence: Option<Cadence>, squares: &[Square]) -> ChainPlan {
    let tolerance = tolerance_for(cadence);

    let mut ordered: Vec<&Square> = squares.iter().collect();
    ordered.sort_by_key(|sq| sq.period);

    let hits: Vec<&Square> = ordered
        .iter()
        .copied()
        .filter(|sq| sq.status == SquareStatus::Hit)
        .collect();
    let misses: Vec<&Square> = ordered
        .iter()
        .copied()
        .filter(|sq| sq.status == SquareStatus::Miss)
        .collect();

    let mut plan = ChainPlan::default();
    // Misses are consumed in date order; gaps only move forward
    let mut miss_cursor = 0usize;

    for hit in hits {
        let extends = plan
            .chains
            .last()
            .is_some_and(|chain| (hit.period - chain.chain_end_date).num_days() <= tolerance);

        if extends {
            if let Some(chain) = plan.chains.last_mut() {
                chain.chain_end_date = hit.period;
                chain.duration += 1;
                if let Some(prev) = plan.memberships.last_mut() {
                    prev.chain_end = false;
                }
                plan.memberships.push(Membership {
                    square_id: hit.square_id.clone(),
                    chain_id: chain.chain_id.clone(),
                    chain_start: false,
                    chain_end: true,
                });
            }
            continue;
        }

        if let Some(chain) = plan.chains.last_mut() {
            let last_end = chain.chain_end_date;
            while miss_cursor < misses.len() && misses[miss_cursor].period <= last_end {
                miss_cursor += 1;
            }
            chain.end_reason = match misses.get(miss_cursor) {
                Some(miss) if miss.period < hit.period => miss.chain_end_reason.clone(),
                _ => GAP_REASON.to_string(),
            };
        }

        let id = chain_id(thread_id, hit.period);
        plan.chains.push(Chain {
            chain_id: id.clone(),
            thread_id,
            chain_start_date: hit.period,
            chain_end_date: hit.period,
            duration: 1,
            end_reason: String::new(),
        });
        plan.memberships.push(Membership {
            square_id: hit.square_id.clone(),
            chain_id: id,
            chain_start: true,
            chain_end: true,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::model::square_id;
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap() + Duration::days(offset)
    }

    fn square(offset: i64, status: SquareStatus, reason: &str) -> Square {
        Square {
            square_id: square_id(1, day(offset)),
            thread_id: 1,
            period: day(offset),
            status,
            chain_id: None,
            chain_start: false,
            chain_end: false,
            chain_end_reason: reason.to_string(),
        }
    }

    fn hits(offsets: &[i64]) -> Vec<Square> {
        offsets
            .iter()
            .map(|o| square(*o, SquareStatus::Hit, ""))
            .collect()
    }

    #[test]
    fn test_no_hits_no_chains() {
        let squares = vec![square(0, SquareStatus::Miss, "sick")];
        let plan = build_chains(1, Some(Cadence::Daily), &squares);
        assert!(plan.chains.is_empty());
        assert!(plan.memberships.is_empty());
    }

    #[test]
    fn test_daily_consecutive_hits_form_one_chain() {
        let plan = build_chains(1, Some(Cadence::Daily), &hits(&[0, 1, 2, 3]));
        assert_eq!(plan.chains.len(), 1);
        let chain = &plan.chains[0];
        assert_eq!(chain.chain_id, "CH_1_20250106");
        assert_eq!(chain.chain_start_date, day(0));
        assert_eq!(chain.chain_end_date, day(3));
        assert_eq!(chain.duration, 4);
        assert_eq!(chain.end_reason, "");
    }

    #[test]
    fn test_weekly_seven_days_merge() {
        let plan = build_chains(1, Some(Cadence::Weekly), &hits(&[0, 7]));
        assert_eq!(plan.chains.len(), 1);
        assert_eq!(plan.chains[0].duration, 2);
    }

    #[test]
    fn test_weekly_eight_days_split() {
        let plan = build_chains(1, Some(Cadence::Weekly), &hits(&[0, 8]));
        assert_eq!(plan.chains.len(), 2);
        assert_eq!(plan.chains[0].end_reason, GAP_REASON);
        assert_eq!(plan.chains[1].chain_start_date, day(8));
        assert_eq!(plan.chains[1].end_reason, "");
    }

    #[test]
    fn test_unknown_cadence_uses_daily_tolerance() {
        let plan = build_chains(1, None, &hits(&[0, 1, 3]));
        assert_eq!(plan.chains.len(), 2);
    }

    #[test]
    fn test_end_reason_from_first_miss_in_gap() {
        let mut squares = hits(&[0, 1, 5]);
        squares.push(square(3, SquareStatus::Miss, "travel"));
        squares.push(square(2, SquareStatus::Miss, "flu"));
        // A miss after the last hit sits in no gap
        squares.push(square(6, SquareStatus::Miss, "later"));

        let plan = build_chains(1, Some(Cadence::Daily), &squares);
        assert_eq!(plan.chains.len(), 2);
        assert_eq!(plan.chains[0].end_reason, "flu");
        assert_eq!(plan.chains[1].end_reason, "");
    }

    #[test]
    fn test_miss_before_earlier_chain_is_not_reused() {
        let mut squares = hits(&[2, 3, 10, 20]);
        squares.push(square(0, SquareStatus::Miss, "before everything"));
        squares.push(square(15, SquareStatus::Miss, "busy"));

        let plan = build_chains(1, Some(Cadence::Daily), &squares);
        assert_eq!(plan.chains.len(), 3);
        assert_eq!(plan.chains[0].end_reason, GAP_REASON);
        assert_eq!(plan.chains[1].end_reason, "busy");
    }

    #[test]
    fn test_memberships_mark_boundaries() {
        let plan = build_chains(1, Some(Cadence::Daily), &hits(&[0, 1, 2, 9]));
        let flags: Vec<(bool, bool)> = plan
            .memberships
            .iter()
            .map(|m| (m.chain_start, m.chain_end))
            .collect();
        assert_eq!(
            flags,
            vec![(true, false), (false, false), (false, true), (true, true)]
        );
        assert_eq!(plan.memberships[3].chain_id, "CH_1_20250115");
    }

    #[test]
    fn test_every_hit_in_exactly_one_chain() {
        let squares = hits(&[0, 1, 4, 5, 6, 30, 31]);
        let plan = build_chains(1, Some(Cadence::Daily), &squares);
        assert_eq!(plan.memberships.len(), squares.len());
        let total: i64 = plan.chains.iter().map(|c| c.duration).sum();
        assert_eq!(total as usize, squares.len());
        for pair in plan.chains.windows(2) {
            assert!(pair[0].chain_end_date < pair[1].chain_start_date);
        }
    }

    #[test]
    fn test_rebuild_is_idempotent_and_order_insensitive() {
        let mut squares = hits(&[0, 2, 3, 12]);
        squares.push(square(8, SquareStatus::Miss, "moved house"));
        let first = build_chains(1, Some(Cadence::ThreeTimesWeekly), &squares);
        let second = build_chains(1, Some(Cadence::ThreeTimesWeekly), &squares);
        assert_eq!(first, second);

        squares.reverse();
        let shuffled = build_chains(1, Some(Cadence::ThreeTimesWeekly), &squares);
        assert_eq!(first, shuffled);
    }
}
