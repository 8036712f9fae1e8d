//! The time window a sync run covers.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Half-open range `[start, end)` of instants to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// Fill in defaults: start of the current local day, and `lookahead_days`
    /// after the start.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        lookahead_days: u32,
    ) -> Self {
        let start = start.unwrap_or_else(start_of_today);
        let end = end.unwrap_or_else(|| start + Duration::days(i64::from(lookahead_days)));
        SyncWindow { start, end }
    }

    /// Build a window from CLI arguments.
    /// - `from`: YYYY-MM-DD, defaults to today
    /// - `days`: window length, defaults to `lookahead_days`
    pub fn from_args(
        from: Option<&str>,
        days: Option<u32>,
        lookahead_days: u32,
    ) -> Result<Self, String> {
        let start = from.map(parse_date_start).transpose()?;
        Ok(Self::resolve(start, None, days.unwrap_or(lookahead_days)))
    }
}

fn start_of_today() -> DateTime<Utc> {
    local_midnight(Local::now().date_naive())
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Parse YYYY-MM-DD as the start of that local day
fn parse_date_start(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))?;
    Ok(local_midnight(date))
}
