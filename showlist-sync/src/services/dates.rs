//! Event date resolution
//!
//! Accepted inputs:
//! - ISO `2026-01-23`, optionally followed by a time (`2026-01-23T20:00:00`)
//! - `Jan 23, 2026`, `January 23 2026`
//! - yearless, optionally weekday-prefixed: `Fri, Jan 23`, `Saturday January 24th`, `Jan 5`
//!
//! A missing year resolves to the next occurrence of that month/day on or
//! after `today`. An explicit year is always used as given.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Weekday names and abbreviations, longest first
pub(crate) const WEEKDAY_PATTERN: &str = r"(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|thurs|tues|thur|mon|tue|wed|thu|fri|sat|sun)";

/// Month names and abbreviations, longest first
pub(crate) const MONTH_PATTERN: &str = r"(?:january|february|march|april|may|june|july|august|september|october|november|december|sept|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec)";

/// Years searched when inferring a yearless date (covers Feb 29)
const MAX_YEAR_LOOKAHEAD: i32 = 8;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})-(\d{1,2})-(\d{1,2})(?:\D|$)").expect("valid ISO date pattern"));

static TEXT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:{}\.?,?\s+)?({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?",
        WEEKDAY_PATTERN, MONTH_PATTERN
    ))
    .expect("valid text date pattern")
});

/// Resolve a source date string to a calendar date
///
/// Returns `None` for anything unparseable or impossible (`Feb 30`).
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = TEXT_DATE.captures(text)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;

    match caps.get(3) {
        Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
        None => infer_year(month, day, today),
    }
}

/// Next occurrence of `month`/`day` on or after `today`
///
/// Tries this year first and rolls forward; Feb 29 lands on the next leap
/// year.
pub fn infer_year(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    (today.year()..=today.year() + MAX_YEAR_LOOKAHEAD)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= today)
}

/// Month number from a name or abbreviation ("Sept" -> 9)
fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
