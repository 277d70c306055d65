use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{DashError, Result};

const DISPLAY_FORMAT: &str = "%b %d, %Y %H:%M:%S%.3f UTC";

/// Accepts RFC 3339 and the BigQuery canonical `YYYY-MM-DD HH:MM:SS[.f] UTC` form.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    let canonical = trimmed.strip_suffix(" UTC").unwrap_or(trimmed);
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(canonical, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(DashError::MalformedTimestamp(input.to_string()))
}

/// Display form for the table; unparsable input is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Ok(ts) => ts.format(DISPLAY_FORMAT).to_string(),
        Err(err) => {
            tracing::debug!(error = %err, "keeping raw timestamp");
            raw.to_string()
        }
    }
}

pub fn from_unix_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

pub fn to_iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Human distance between two instants, worded like date-fns `formatDistance`.
pub fn distance_to_now(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().unsigned_abs();
    let minutes = (seconds + 30) / 60;

    const MINUTES_IN_DAY: u64 = 1440;
    const MINUTES_IN_MONTH: u64 = 43_200;
    const MINUTES_IN_YEAR: u64 = 525_600;

    match minutes {
        0 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        2..=44 => format!("{minutes} minutes"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {} hours", (minutes + 30) / 60),
        1440..=2519 => "1 day".to_string(),
        2520..=43_199 => format!("{} days", (minutes + MINUTES_IN_DAY / 2) / MINUTES_IN_DAY),
        43_200..=86_399 => {
            let months = (minutes + MINUTES_IN_MONTH / 2) / MINUTES_IN_MONTH;
            format!("about {months} month{}", if months == 1 { "" } else { "s" })
        }
        86_400..=525_599 => format!(
            "{} months",
            (minutes + MINUTES_IN_MONTH / 2) / MINUTES_IN_MONTH
        ),
        _ => {
            let years = minutes / MINUTES_IN_YEAR;
            let rem = minutes % MINUTES_IN_YEAR;
            if rem < MINUTES_IN_YEAR / 4 {
                format!("about {years} year{}", if years == 1 { "" } else { "s" })
            } else if rem < MINUTES_IN_YEAR * 3 / 4 {
                format!("over {years} year{}", if years == 1 { "" } else { "s" })
            } else {
                format!("almost {} years", years + 1)
            }
        }
    }
}
