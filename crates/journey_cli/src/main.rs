//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `journey_core` linkage without the Flutter runtime.
//! - Print one day's entries from a database file for quick inspection.
//!
//! Usage: `journey_cli [db_path] [YYYY-MM-DD]` (defaults: in-memory, today).

use chrono::{Local, NaiveDate, TimeZone, Utc};
use journey_core::{days_with_entries, filter_by_day, is_today, EntryStore, SqliteKeyValueStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("journey_core ping={}", journey_core::ping());
    println!("journey_core version={}", journey_core::core_version());

    let mut args = std::env::args().skip(1);
    let db_path = args.next();
    let day = args.next();

    match print_day(db_path.as_deref(), day.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn print_day(db_path: Option<&str>, day: Option<&str>) -> Result<(), String> {
    let kv = match db_path {
        Some(path) => SqliteKeyValueStore::open(path),
        None => SqliteKeyValueStore::open_in_memory(),
    }
    .map_err(|err| format!("failed to open storage: {err}"))?;
    let store = EntryStore::new(kv);

    let reference = match day {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|err| format!("invalid day `{raw}`: {err}"))?;
            let noon = date
                .and_hms_opt(12, 0, 0)
                .ok_or_else(|| format!("invalid day `{raw}`"))?;
            Local
                .from_local_datetime(&noon)
                .earliest()
                .ok_or_else(|| format!("invalid local day `{raw}`"))?
        }
        None => Local::now(),
    };

    let entries = store.load().map_err(|err| err.to_string())?;
    let day_entries = filter_by_day(&entries, &reference);
    println!(
        "day={} today={} entries={} total={} days_with_entries={}",
        reference.date_naive(),
        is_today(&reference, &Utc::now()),
        day_entries.len(),
        entries.len(),
        days_with_entries(&entries, &Local).len()
    );
    for entry in day_entries {
        println!(
            "{}  {}",
            entry.date_time.with_timezone(&Local).format("%H:%M"),
            entry.text
        );
    }
    Ok(())
}
