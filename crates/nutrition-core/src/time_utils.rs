use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Today's calendar date in the named IANA timezone.
///
/// An unrecognised name falls back to UTC and logs a warning.
pub fn today_in(tz_name: &str) -> NaiveDate {
    let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "unrecognised timezone \"{}\", falling back to UTC",
            tz_name
        );
        Tz::UTC
    });
    Utc::now().with_timezone(&tz).date_naive()
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Date keys ─────────────────────────────────────────────────────────────────

fn date_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("regex is valid"))
}

/// Parse a strict, zero-padded `YYYY-MM-DD` key.
///
/// `"2024-3-15"` and `"2024-02-30"` both return `None`.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    if !date_key_pattern().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Zero-padded `YYYY-MM-DD` key for a Gregorian date, or `None` if the date
/// does not exist.
pub fn date_key(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(format_date_key)
}

pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ── ISO weeks ─────────────────────────────────────────────────────────────────

/// ISO-8601 week key `"{year}-{week:02}"` for `date`.
///
/// The date is shifted to the Thursday of its Monday-based week; that
/// Thursday's year names the week, and the week number counts 7-day spans
/// from January 1 of that year.
///
/// ```
/// use chrono::NaiveDate;
/// use nutrition_core::time_utils::week_key;
///
/// let new_year = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
/// assert_eq!(week_key(new_year), "2020-53");
/// ```
pub fn week_key(date: NaiveDate) -> String {
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date + Duration::days(4 - weekday);
    let year = thursday.year();
    // January 1 always exists.
    let year_start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(thursday);
    let offset = (thursday - year_start).num_days() + 1;
    let week = (offset + 6) / 7;
    format!("{}-{:02}", year, week)
}

/// The Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Seven consecutive dates starting at `start`.
pub fn week_days(start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

// ── Month layout ──────────────────────────────────────────────────────────────

/// Shape of a Monday-first month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthLayout {
    pub year: i32,
    pub month: u32,
    /// Number of days in the month.
    pub days: u32,
    /// Empty cells before day 1 (0 when the month starts on a Monday).
    pub leading_blanks: u32,
}

/// Grid layout for `year`/`month`, or `None` for an invalid month.
pub fn month_layout(year: i32, month: u32) -> Option<MonthLayout> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(MonthLayout {
        year,
        month,
        days: (next - first).num_days() as u32,
        leading_blanks: first.weekday().num_days_from_monday(),
    })
}

/// The first day of the month before/after `date`'s month.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
