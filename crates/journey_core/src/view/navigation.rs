//! Day navigation bounds for browsing past entries.
//!
//! Browsing may go back as far as the earliest entry's day and forward up to
//! today, both measured in the reference's time zone.

use crate::model::entry::Entry;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayNavigationError {
    BeforeEarliest { picked: NaiveDate, earliest: NaiveDate },
    AfterToday { picked: NaiveDate, today: NaiveDate },
    /// Picked wall-clock time does not exist on that day (DST gap).
    InvalidLocalTime(NaiveDate),
}

impl DayNavigationError {
    /// Stable machine-readable code used in FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BeforeEarliest { .. } => "before_earliest",
            Self::AfterToday { .. } => "after_today",
            Self::InvalidLocalTime(_) => "invalid_local_time",
        }
    }
}

impl Display for DayNavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeEarliest { picked, earliest } => {
                write!(f, "day {picked} is before the earliest entry day {earliest}")
            }
            Self::AfterToday { picked, today } => {
                write!(f, "day {picked} is after today ({today})")
            }
            Self::InvalidLocalTime(day) => write!(f, "selected time does not exist on {day}"),
        }
    }
}

impl Error for DayNavigationError {}

/// Whether `instant` falls on `reference`'s local calendar day.
pub fn is_same_day<Tz: TimeZone>(instant: &DateTime<Utc>, reference: &DateTime<Tz>) -> bool {
    instant.with_timezone(&reference.timezone()).date_naive() == reference.date_naive()
}

/// Whether `reference` is on the same local day as `now`.
pub fn is_today<Tz: TimeZone>(reference: &DateTime<Tz>, now: &DateTime<Utc>) -> bool {
    is_same_day(now, reference)
}

/// Moves `current` to `picked`, keeping its hour and minute.
///
/// Seconds are zeroed, matching what a minute-resolution picker yields.
///
/// # Errors
/// - `BeforeEarliest` when `picked` precedes the earliest entry's day.
/// - `AfterToday` when `picked` is later than today.
/// - `InvalidLocalTime` when the wall-clock time is skipped on `picked`.
pub fn select_day<Tz: TimeZone>(
    current: &DateTime<Tz>,
    picked: NaiveDate,
    earliest: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DateTime<Tz>, DayNavigationError> {
    let tz = current.timezone();
    let today = now.with_timezone(&tz).date_naive();
    if picked > today {
        return Err(DayNavigationError::AfterToday { picked, today });
    }
    if let Some(earliest) = earliest.map(|value| value.with_timezone(&tz).date_naive()) {
        if picked < earliest {
            return Err(DayNavigationError::BeforeEarliest { picked, earliest });
        }
    }

    let time = NaiveTime::from_hms_opt(current.hour(), current.minute(), 0)
        .ok_or(DayNavigationError::InvalidLocalTime(picked))?;
    tz.from_local_datetime(&picked.and_time(time))
        .earliest()
        .ok_or(DayNavigationError::InvalidLocalTime(picked))
}

/// Distinct local days that hold at least one entry, ascending.
pub fn days_with_entries<Tz: TimeZone>(entries: &[Entry], tz: &Tz) -> Vec<NaiveDate> {
    entries
        .iter()
        .map(|entry| entry.date_time.with_timezone(tz).date_naive())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
