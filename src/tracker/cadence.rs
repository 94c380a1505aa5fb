//! Thread cadences and the calendar periods they are measured over

use chrono::{Datelike, Duration, NaiveDate};

/// How often a thread is expected to be hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Daily,
    ThreeTimesWeekly,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Cadence {
    /// All cadences, in the order they are offered to users
    pub const ALL: [Cadence; 6] = [
        Cadence::Daily,
        Cadence::ThreeTimesWeekly,
        Cadence::Weekly,
        Cadence::Monthly,
        Cadence::Quarterly,
        Cadence::Yearly,
    ];

    /// Parse the stored cadence string. Unknown values return None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "daily" => Some(Self::Daily),
            "3x_week" => Some(Self::ThreeTimesWeekly),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Storage / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::ThreeTimesWeekly => "3x_week",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Largest day gap between two hits that still continues a chain
    pub fn tolerance_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::ThreeTimesWeekly => 3,
            Self::Weekly => 7,
            Self::Monthly => 31,
            Self::Quarterly => 92,
            Self::Yearly => 366,
        }
    }

    /// Hits needed inside one period before further days become redundant.
    /// Daily threads have no quota.
    pub fn quota(&self) -> Option<usize> {
        match self {
            Self::Daily => None,
            Self::ThreeTimesWeekly => Some(3),
            Self::Weekly | Self::Monthly | Self::Quarterly | Self::Yearly => Some(1),
        }
    }

    /// The calendar period containing `date`, or None for daily threads
    pub fn period_containing(&self, date: NaiveDate) -> Option<Period> {
        match self {
            Self::Daily => None,
            Self::ThreeTimesWeekly | Self::Weekly => Period::week_of(date),
            Self::Monthly => Period::month_of(date),
            Self::Quarterly => Period::quarter_of(date),
            Self::Yearly => Period::year_of(date),
        }
    }
}

/// Gap tolerance for a possibly unset or unrecognised cadence (treated as daily)
pub fn tolerance_for(cadence: Option<Cadence>) -> i64 {
    cadence.unwrap_or(Cadence::Daily).tolerance_days()
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Monday to Sunday week
    pub fn week_of(date: NaiveDate) -> Option<Self> {
        let offset = i64::from(date.weekday().num_days_from_monday());
        let start = date.checked_sub_signed(Duration::days(offset))?;
        let end = start.checked_add_signed(Duration::days(6))?;
        Some(Self { start, end })
    }

    pub fn month_of(date: NaiveDate) -> Option<Self> {
        let start = date.with_day(1)?;
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?
        };
        Some(Self {
            start,
            end: next_month.pred_opt()?,
        })
    }

    /// Calendar quarter: Jan–Mar, Apr–Jun, Jul–Sep, Oct–Dec
    pub fn quarter_of(date: NaiveDate) -> Option<Self> {
        let quarter = (date.month() - 1) / 3;
        let start_month = quarter * 3 + 1;
        let start = NaiveDate::from_ymd_opt(date.year(), start_month, 1)?;
        let end = if start_month + 3 > 12 {
            NaiveDate::from_ymd_opt(date.year(), 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(date.year(), start_month + 3, 1)?.pred_opt()?
        };
        Some(Self { start, end })
    }

    pub fn year_of(date: NaiveDate) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(date.year(), 1, 1)?,
            end: NaiveDate::from_ymd_opt(date.year(), 12, 31)?,
        })
    }

    /// Every date in the period, start to end
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_roundtrip() {
        for cadence in Cadence::ALL {
            assert_eq!(Cadence::parse(cadence.as_str()), Some(cadence));
        }
        assert_eq!(Cadence::parse("fortnightly"), None);
        assert_eq!(Cadence::parse(""), None);
    }

    #[test]
    fn test_tolerance_defaults_to_daily() {
        assert_eq!(tolerance_for(None), 1);
        assert_eq!(tolerance_for(Some(Cadence::Weekly)), 7);
        assert_eq!(tolerance_for(Some(Cadence::Yearly)), 366);
    }

    #[test]
    fn test_week_is_monday_to_sunday() {
        // 2025-01-01 is a Wednesday
        let week = Period::week_of(d(2025, 1, 1)).unwrap();
        assert_eq!(week.start, d(2024, 12, 30));
        assert_eq!(week.end, d(2025, 1, 5));
        assert_eq!(week.days().count(), 7);
    }

    #[test]
    fn test_quarter_boundaries() {
        let q1 = Period::quarter_of(d(2025, 3, 31)).unwrap();
        assert_eq!(q1.start, d(2025, 1, 1));
        assert_eq!(q1.end, d(2025, 3, 31));

        let q2 = Period::quarter_of(d(2025, 4, 1)).unwrap();
        assert_eq!(q2.start, d(2025, 4, 1));
        assert_eq!(q2.end, d(2025, 6, 30));

        let q4 = Period::quarter_of(d(2025, 11, 15)).unwrap();
        assert_eq!(q4.start, d(2025, 10, 1));
        assert_eq!(q4.end, d(2025, 12, 31));
    }

    #[test]
    fn test_month_handles_december_and_leap_february() {
        let dec = Period::month_of(d(2024, 12, 10)).unwrap();
        assert_eq!(dec.end, d(2024, 12, 31));

        let feb = Period::month_of(d(2024, 2, 3)).unwrap();
        assert_eq!(feb.end, d(2024, 2, 29));
    }

    #[test]
    fn test_daily_has_no_period() {
        assert!(Cadence::Daily.period_containing(d(2025, 5, 5)).is_none());
        assert!(Cadence::Daily.quota().is_none());
    }
}
