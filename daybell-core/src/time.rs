//! Time utilities: local wall-clock parsing and "now".
//!
//! Reminders live in local wall-clock time. A configured IANA zone only
//! decides what "now" means; occurrences are never converted between zones.

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

/// Parse a date like "2024-03-01" and a time like "09:00" into a local anchor.
pub fn combine_date_time(date: &str, time: &str) -> Result<NaiveDateTime> {
    let d = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{date}': {e}"))?;
    let t = parse_time_of_day(time)?;
    Ok(d.and_time(t))
}

/// Parse "HH:MM" (24h).
pub fn parse_time_of_day(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid time '{time}': {e}"))
}

/// Parse a reference instant like "2024-03-01 08:30".
pub fn parse_reference(local: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))
}

pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Current wall-clock time in `tz`, or in the system zone when unset.
pub fn local_now(tz: Option<Tz>) -> NaiveDateTime {
    match tz {
        Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
        None => Local::now().naive_local(),
    }
}

pub fn format_local(dt: NaiveDateTime) -> String {
    dt.format("%a %Y-%m-%d %H:%M").to_string()
}
