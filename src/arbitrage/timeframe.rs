//! Wall-clock windows used to restrict matches and opportunities.
//!
//! Windows follow the evaluation time's calendar in its own time zone and are
//! half-open: `[start, next_start)`, which is the same as running to
//! `23:59:59.999999` of the last day.

use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};

/// Format of the `date` field on opportunities.
pub const MATCH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shown in place of a date when the start time is unknown.
pub const UNKNOWN_DATE: &str = "TBD";

/// Date window applied to matches or opportunities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Timeframe {
    /// Local calendar day of the evaluation time.
    Today,
    /// Monday through Sunday of the evaluation time's ISO week.
    Week,
    /// First through last day of the evaluation time's month.
    Month,
    /// No filtering.
    #[default]
    All,
}

impl Timeframe {
    /// Parse a query value; anything unrecognized or absent means no filtering.
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Half-open `[start, end)` bounds, or `None` when unbounded.
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        let today = now.date_naive();
        let (first, next) = match self {
            Timeframe::Today => (today, today.succ_opt()?),
            Timeframe::Week => {
                let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                (monday, monday + Duration::days(7))
            }
            Timeframe::Month => {
                let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (first, next)
            }
            Timeframe::All => return None,
        };

        let tz = now.timezone();
        Some((start_of_day(&tz, first)?, start_of_day(&tz, next)?))
    }

    /// Whether an instant falls inside the window.
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
        match self.window(now) {
            Some((start, end)) => *instant >= start && *instant < end,
            None => true,
        }
    }

    /// Window check on a raw `commence_time`. Unknown start times only pass `All`.
    pub fn contains_timestamp<Tz: TimeZone>(&self, timestamp: Option<i64>, now: &DateTime<Tz>) -> bool {
        if *self == Timeframe::All {
            return true;
        }
        match timestamp.and_then(|ts| now.timezone().timestamp_opt(ts, 0).single()) {
            Some(instant) => self.contains(&instant, now),
            None => false,
        }
    }

    /// Window check on a formatted match date.
    ///
    /// Agrees with [`Timeframe::contains_timestamp`] for the date produced by
    /// [`format_match_date`] in the same time zone.
    pub fn contains_date<Tz: TimeZone>(&self, date: &str, now: &DateTime<Tz>) -> bool {
        if *self == Timeframe::All {
            return true;
        }
        match parse_match_date(date, &now.timezone()) {
            Some(instant) => self.contains(&instant, now),
            None => false,
        }
    }
}

/// Local midnight, or the first valid instant of the day when midnight is
/// skipped by a DST change.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
}

/// Render a start time as `YYYY-MM-DD HH:MM:SS` in the zone of `tz`.
pub fn format_match_date<Tz>(timestamp: Option<i64>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .filter(|ts| *ts != 0)
        .and_then(|ts| tz.timestamp_opt(ts, 0).single())
        .map(|dt| dt.format(MATCH_DATE_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Parse a date produced by [`format_match_date`].
pub fn parse_match_date<Tz: TimeZone>(date: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(date.trim(), MATCH_DATE_FORMAT).ok()?;
    tz.from_local_datetime(&naive).earliest()
}
