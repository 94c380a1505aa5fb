//! Calendar helpers: 40k date labels and the timestamped journal

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;

/// Two-digit ISO year, e.g. 2025 -> "25"
fn short_iso_year(date: NaiveDate) -> String {
    let year = date.iso_week().year().to_string();
    year.get(2..).unwrap_or(&year).to_string()
}

/// `yy.week.weekday` using ISO week numbering (Monday = 1)
pub fn date_40k(date: NaiveDate) -> String {
    format!(
        "{}.{}.{}",
        short_iso_year(date),
        date.iso_week().week(),
        date.weekday().number_from_monday()
    )
}

/// `yy.week` using ISO week numbering
pub fn week_40k(date: NaiveDate) -> String {
    format!("{}.{}", short_iso_year(date), date.iso_week().week())
}

/// Append a timestamped line to a newline-joined journal
pub fn append_journal(journal: &str, at: NaiveTime, text: &str) -> String {
    let entry = format!("[{}] {}", at.format("%H:%M"), text);
    if journal.is_empty() {
        entry
    } else {
        format!("{}\n{}", journal, entry)
    }
}

/// One parsed journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub time: String,
    pub text: String,
}

fn entry_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\[([^\]]*)\](.*)$").ok())
        .as_ref()
}

/// Parse a journal into entries, newest first. Blank lines are skipped and
/// lines without a `[time]` prefix keep an empty time.
pub fn parse_journal(journal: &str) -> Vec<JournalEntry> {
    let mut entries: Vec<JournalEntry> = journal
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match entry_pattern().and_then(|re| re.captures(line)) {
            Some(caps) => JournalEntry {
                time: caps[1].to_string(),
                text: caps[2].trim().to_string(),
            },
            None => JournalEntry {
                time: String::new(),
                text: line.to_string(),
            },
        })
        .collect();
    entries.reverse();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_40k_uses_iso_week() {
        // 2025-03-05 is Wednesday of ISO week 10
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(date_40k(date), "25.10.3");
        assert_eq!(week_40k(date), "25.10");
    }

    #[test]
    fn test_date_40k_iso_year_rollover() {
        // 2024-12-30 is Monday of ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(date_40k(date), "25.1.1");
    }

    #[test]
    fn test_append_journal() {
        let at = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        let first = append_journal("", at, "woke up");
        assert_eq!(first, "[09:05] woke up");
        let second = append_journal(&first, at, "coffee");
        assert_eq!(second, "[09:05] woke up\n[09:05] coffee");
    }

    #[test]
    fn test_parse_journal_newest_first() {
        let entries = parse_journal("[08:00] one\n\nplain line\n[21:30]  two ");
        assert_eq!(
            entries,
            vec![
                JournalEntry {
                    time: "21:30".to_string(),
                    text: "two".to_string()
                },
                JournalEntry {
                    time: String::new(),
                    text: "plain line".to_string()
                },
                JournalEntry {
                    time: "08:00".to_string(),
                    text: "one".to_string()
                },
            ]
        );
    }
}
