//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose entry create/update/delete, per-day listing and day navigation
//!   to Dart via FRB.
//! - Own the single process-wide `EntryStore` every call goes through.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported in response envelopes (`ok=false`, `error_code`).
//!   Store failures keep their `StoreError::code()` so Dart can tell
//!   `corrupt_data` from `storage_unavailable`.
//! - Timestamps cross the boundary as Unix epoch milliseconds; calendar days
//!   as `YYYY-MM-DD` strings.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use journey_core::{
    core_version as core_version_inner, days_with_entries,
    default_log_level as default_log_level_inner, earliest_date, filter_by_day_in,
    init_logging as init_logging_inner, is_today, logging_status as logging_status_inner,
    ping as ping_inner, select_day, Entry, EntryPatch, EntryStore, EntryUid, KvError, NewEntry,
    SqliteKeyValueStore, StoreError, StoreResult,
};
use log::error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

const ENTRY_DB_FILE_NAME: &str = "journey_entries.sqlite3";
const ENTRY_DB_PATH_ENV: &str = "JOURNEY_DB_PATH";
const DAY_FORMAT: &str = "%Y-%m-%d";

type SharedStore = Arc<EntryStore<SqliteKeyValueStore>>;

static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ENTRY_STORE: Mutex<Option<SharedStore>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Level the host should pass to `init_logging` when it has no preference.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

/// Active logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: String,
    pub log_dir: String,
}

/// Returns the active logger settings, or `None` before `init_logging`.
#[flutter_rust_bridge::frb(sync)]
pub fn logging_status() -> Option<LoggingStatus> {
    logging_status_inner().map(|(level, log_dir)| LoggingStatus {
        level: level.to_owned(),
        log_dir: log_dir.display().to_string(),
    })
}

/// One entry as rendered by the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub uid: String,
    pub text: String,
    pub epoch_ms: i64,
}

/// Result envelope for create/update/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    /// Uid of the affected entry, when known.
    pub uid: Option<String>,
    /// Stable failure code (`validation`, `not_found`, `corrupt_data`, ...).
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, uid: String) -> Self {
        Self {
            ok: true,
            uid: Some(uid),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            uid: None,
            error_code: Some(error_code.to_string()),
            message: message.into(),
        }
    }

    fn from_store_error(action: &str, err: &StoreError) -> Self {
        Self::failure(err.code(), format!("{action} failed: {err}"))
    }
}

/// Entries of one calendar day, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDayResponse {
    pub ok: bool,
    pub items: Vec<EntryItem>,
    pub error_code: Option<String>,
    pub message: String,
}

impl EntryDayResponse {
    fn failure(error_code: &str, message: String) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            error_code: Some(error_code.to_string()),
            message,
        }
    }
}

/// Earliest entry timestamp; `epoch_ms = None` with `ok=true` means no entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryEarliestResponse {
    pub ok: bool,
    pub epoch_ms: Option<i64>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Local days that hold at least one entry, ascending, as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDaysResponse {
    pub ok: bool,
    pub days: Vec<String>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Outcome of moving the browsed day with the date picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySelectResponse {
    pub ok: bool,
    /// New reference instant, same hour and minute as before.
    pub epoch_ms: Option<i64>,
    /// Whether the new reference is on today's local date.
    pub is_today: bool,
    /// `before_earliest`, `after_today`, `invalid_local_time`, `invalid_day`,
    /// `invalid_reference` or a store code.
    pub error_code: Option<String>,
    pub message: String,
}

impl DaySelectResponse {
    fn failure(error_code: &str, message: String) -> Self {
        Self {
            ok: false,
            epoch_ms: None,
            is_today: false,
            error_code: Some(error_code.to_string()),
            message,
        }
    }
}

/// Saves a new entry.
///
/// `epoch_ms = None` files the entry under the current time.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create(text: String, epoch_ms: Option<i64>) -> EntryActionResponse {
    let date_time = match epoch_ms {
        Some(value) => match from_epoch_ms(value) {
            Some(date_time) => date_time,
            None => return invalid_timestamp("entry_create", value),
        },
        None => Utc::now(),
    };

    match entry_store().and_then(|store| store.append(NewEntry::new(text, date_time))) {
        Ok(entries) => match entries.last() {
            Some(created) => EntryActionResponse::success("Entry saved.", created.uid.to_string()),
            None => EntryActionResponse::failure("inconsistent_state", "created entry missing"),
        },
        Err(err) => EntryActionResponse::from_store_error("entry_create", &err),
    }
}

/// Edits text and/or timestamp of an existing entry.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update(
    uid: String,
    text: Option<String>,
    epoch_ms: Option<i64>,
) -> EntryActionResponse {
    let date_time = match epoch_ms.map(|value| (value, from_epoch_ms(value))) {
        Some((value, None)) => return invalid_timestamp("entry_update", value),
        Some((_, parsed)) => parsed,
        None => None,
    };

    let uid = EntryUid::new(uid.trim());
    let patch = EntryPatch { text, date_time };
    match entry_store().and_then(|store| store.update(&uid, &patch)) {
        Ok(_) => EntryActionResponse::success("Entry updated.", uid.to_string()),
        Err(err) => EntryActionResponse::from_store_error("entry_update", &err),
    }
}

/// Deletes an entry; deleting an unknown uid succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete(uid: String) -> EntryActionResponse {
    let uid = EntryUid::new(uid.trim());
    match entry_store().and_then(|store| store.remove(&uid)) {
        Ok(_) => EntryActionResponse::success("Entry deleted.", uid.to_string()),
        Err(err) => EntryActionResponse::from_store_error("entry_delete", &err),
    }
}

/// Lists entries on the local day containing `epoch_ms`.
///
/// `utc_offset_minutes` is the caller's local offset (Dart
/// `DateTime.timeZoneOffset.inMinutes`).
#[flutter_rust_bridge::frb(sync)]
pub fn entries_for_day(epoch_ms: i64, utc_offset_minutes: i32) -> EntryDayResponse {
    match to_local_reference(epoch_ms, utc_offset_minutes) {
        Some(reference) => day_response(load_entries(), &reference),
        None => EntryDayResponse::failure(
            "invalid_reference",
            format!("entries_for_day failed: invalid reference {epoch_ms} offset {utc_offset_minutes}"),
        ),
    }
}

/// Earliest entry timestamp, bounding how far back day browsing may go.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_earliest_epoch_ms() -> EntryEarliestResponse {
    earliest_response(load_entries())
}

/// Days the picker should mark as having entries.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_days(utc_offset_minutes: i32) -> EntryDaysResponse {
    match to_offset(utc_offset_minutes) {
        Some(offset) => days_response(load_entries(), &offset),
        None => EntryDaysResponse {
            ok: false,
            days: Vec::new(),
            error_code: Some("invalid_reference".to_string()),
            message: format!("entry_days failed: invalid offset {utc_offset_minutes}"),
        },
    }
}

/// Moves the browsed reference `current_epoch_ms` to `picked_day`.
///
/// The move is refused for days before the earliest entry or after today.
#[flutter_rust_bridge::frb(sync)]
pub fn day_select(
    current_epoch_ms: i64,
    utc_offset_minutes: i32,
    picked_day: String,
) -> DaySelectResponse {
    let Some(current) = to_local_reference(current_epoch_ms, utc_offset_minutes) else {
        return DaySelectResponse::failure(
            "invalid_reference",
            format!(
                "day_select failed: invalid reference {current_epoch_ms} offset {utc_offset_minutes}"
            ),
        );
    };
    let picked = match NaiveDate::parse_from_str(picked_day.trim(), DAY_FORMAT) {
        Ok(picked) => picked,
        Err(err) => {
            return DaySelectResponse::failure(
                "invalid_day",
                format!("day_select failed: `{picked_day}`: {err}"),
            )
        }
    };
    select_response(load_entries(), &current, picked, Utc::now())
}

fn day_response(
    loaded: StoreResult<Vec<Entry>>,
    reference: &DateTime<FixedOffset>,
) -> EntryDayResponse {
    match loaded {
        Ok(entries) => {
            let items = filter_by_day_in(&entries, reference)
                .iter()
                .map(to_entry_item)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "Looks too empty.".to_string()
            } else {
                format!("Found {} entries.", items.len())
            };
            EntryDayResponse {
                ok: true,
                items,
                error_code: None,
                message,
            }
        }
        Err(err) => {
            EntryDayResponse::failure(err.code(), format!("entries_for_day failed: {err}"))
        }
    }
}

fn earliest_response(loaded: StoreResult<Vec<Entry>>) -> EntryEarliestResponse {
    match loaded {
        Ok(entries) => {
            let epoch_ms = earliest_date(&entries).map(|value| value.timestamp_millis());
            EntryEarliestResponse {
                ok: true,
                epoch_ms,
                error_code: None,
                message: if epoch_ms.is_some() {
                    "ok".to_string()
                } else {
                    "No entries yet.".to_string()
                },
            }
        }
        Err(err) => {
            error!(
                "event=entry_earliest module=ffi status=error error_code={} error={}",
                err.code(),
                err
            );
            EntryEarliestResponse {
                ok: false,
                epoch_ms: None,
                error_code: Some(err.code().to_string()),
                message: format!("entry_earliest_epoch_ms failed: {err}"),
            }
        }
    }
}

fn days_response(loaded: StoreResult<Vec<Entry>>, offset: &FixedOffset) -> EntryDaysResponse {
    match loaded {
        Ok(entries) => {
            let days = days_with_entries(&entries, offset)
                .into_iter()
                .map(|day| day.format(DAY_FORMAT).to_string())
                .collect::<Vec<_>>();
            EntryDaysResponse {
                ok: true,
                message: format!("Found {} days.", days.len()),
                days,
                error_code: None,
            }
        }
        Err(err) => EntryDaysResponse {
            ok: false,
            days: Vec::new(),
            error_code: Some(err.code().to_string()),
            message: format!("entry_days failed: {err}"),
        },
    }
}

fn select_response(
    loaded: StoreResult<Vec<Entry>>,
    current: &DateTime<FixedOffset>,
    picked: NaiveDate,
    now: DateTime<Utc>,
) -> DaySelectResponse {
    let entries = match loaded {
        Ok(entries) => entries,
        Err(err) => {
            return DaySelectResponse::failure(err.code(), format!("day_select failed: {err}"))
        }
    };

    match select_day(current, picked, earliest_date(&entries), now) {
        Ok(moved) => DaySelectResponse {
            ok: true,
            epoch_ms: Some(moved.timestamp_millis()),
            is_today: is_today(&moved, &now),
            error_code: None,
            message: format!("Showing {}.", moved.date_naive()),
        },
        Err(err) => DaySelectResponse::failure(err.code(), format!("day_select failed: {err}")),
    }
}

fn load_entries() -> StoreResult<Vec<Entry>> {
    entry_store()?.load()
}

fn entry_store() -> StoreResult<SharedStore> {
    let mut slot = ENTRY_STORE.lock().map_err(|_| {
        StoreError::StorageUnavailable(KvError::Unavailable(
            "entry store lock poisoned".to_string(),
        ))
    })?;
    if let Some(store) = slot.as_ref() {
        return Ok(Arc::clone(store));
    }

    let db_path = resolve_entry_db_path();
    let kv = SqliteKeyValueStore::open(&db_path).map_err(|err| {
        error!(
            "event=entry_store_open module=ffi status=error path={} error={}",
            db_path.display(),
            err
        );
        StoreError::from(err)
    })?;
    let store = Arc::new(EntryStore::new(kv));
    *slot = Some(Arc::clone(&store));
    Ok(store)
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ENTRY_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn from_epoch_ms(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
}

fn to_offset(utc_offset_minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)
}

fn to_local_reference(epoch_ms: i64, utc_offset_minutes: i32) -> Option<DateTime<FixedOffset>> {
    let offset = to_offset(utc_offset_minutes)?;
    Some(from_epoch_ms(epoch_ms)?.with_timezone(&offset))
}

fn invalid_timestamp(action: &str, epoch_ms: i64) -> EntryActionResponse {
    EntryActionResponse::failure(
        "validation",
        format!("{action} failed: timestamp {epoch_ms} is out of range"),
    )
}

fn to_entry_item(entry: &Entry) -> EntryItem {
    EntryItem {
        uid: entry.uid.to_string(),
        text: entry.text.clone(),
        epoch_ms: entry.date_time.timestamp_millis(),
    }
}
