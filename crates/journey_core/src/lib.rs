//! Core domain logic for Journey.
//! This crate is the single source of truth for journal entry invariants.

pub mod clock;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod session;
pub mod store;
pub mod uid;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{Entry, EntryPatch, EntryUid, EntryValidationError, NewEntry};
pub use session::{Composer, EditDraft, EditSession, EditState, SessionError};
pub use store::{EntryStore, StoreError, StoreEvent, StoreResult, ENTRY_STORAGE_KEY};
pub use uid::{UidGenerator, UuidGenerator};
pub use view::{
    days_with_entries, earliest_date, filter_by_day, filter_by_day_in, is_same_day, is_today,
    select_day, DayNavigationError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
