// Time window resolution for metric queries
use chrono::{DateTime, Days, FixedOffset, Local, Months, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wall-clock format the metrics endpoint expects for `start_time` / `end_time`
pub const API_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Symbolic range selector offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    #[default]
    Week,
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range '{0}' (expected day, week or month)")]
pub struct UnknownTimeRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeRange::Day),
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            other => Err(UnknownTimeRange(other.to_string())),
        }
    }
}

impl TimeRange {
    /// Lenient parse used for UI selections: anything unrecognized becomes `Week`
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or_else(|err: UnknownTimeRange| {
            tracing::warn!("{}, falling back to week", err);
            TimeRange::Week
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `[start, end]` query bounds, kept in the caller's local offset.
///
/// The API receives both bounds as local wall-clock strings without an offset,
/// so the offset is retained here only to keep the instants exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Resolve a range against the local clock
    pub fn resolve(range: TimeRange) -> Self {
        Self::resolve_at(range, Local::now())
    }

    /// Resolve a range ending at `now`.
    ///
    /// `day` is exactly 24 hours; `week` and `month` step back calendar units on
    /// the wall clock of `now`'s zone, so a DST change inside the window does not
    /// shift the start time of day.
    pub fn resolve_at<Tz: TimeZone>(range: TimeRange, now: DateTime<Tz>) -> Self {
        let start = match range {
            TimeRange::Day => now.clone() - TimeDelta::hours(24),
            TimeRange::Week => now
                .clone()
                .checked_sub_days(Days::new(7))
                .unwrap_or_else(|| now.clone() - TimeDelta::days(7)),
            TimeRange::Month => now
                .clone()
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now.clone() - TimeDelta::days(30)),
        };

        Self {
            start: start.fixed_offset(),
            end: now.fixed_offset(),
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn start_param(&self) -> String {
        self.start.format(API_TIME_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(API_TIME_FORMAT).to_string()
    }
}
