//! Calendar-day filtering.

use crate::model::entry::Entry;
use chrono::{DateTime, Local, TimeZone, Utc};

/// Entries on the same local calendar day as `reference`, newest first.
///
/// Uses the time zone of the running process.
pub fn filter_by_day(entries: &[Entry], reference: &DateTime<Local>) -> Vec<Entry> {
    filter_by_day_in(entries, reference)
}

/// Entries whose timestamp, expressed in `reference`'s time zone, falls on
/// the same year, month and day-of-month as `reference`.
///
/// Output is sorted by `date_time` descending. The sort is stable, so
/// identical timestamps keep their input order.
pub fn filter_by_day_in<Tz: TimeZone>(entries: &[Entry], reference: &DateTime<Tz>) -> Vec<Entry> {
    let tz = reference.timezone();
    let day = reference.date_naive();

    let mut matched = entries
        .iter()
        .filter(|entry| entry.date_time.with_timezone(&tz).date_naive() == day)
        .cloned()
        .collect::<Vec<_>>();
    matched.sort_by(|a, b| b.date_time.cmp(&a.date_time));
    matched
}

/// Earliest timestamp across the whole collection.
pub fn earliest_date(entries: &[Entry]) -> Option<DateTime<Utc>> {
    entries.iter().map(|entry| entry.date_time).min()
}
