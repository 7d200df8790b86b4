//! Read-only projections over the entry collection.
//!
//! # Responsibility
//! - Derive per-day entry lists for display.
//! - Bound day navigation by the collection's date range.
//!
//! # Invariants
//! - Views are pure functions of `(entries, reference date)`; nothing here
//!   caches or persists. Recompute after every `StoreEvent`.

pub mod day;
pub mod navigation;

pub use day::{earliest_date, filter_by_day, filter_by_day_in};
pub use navigation::{days_with_entries, is_same_day, is_today, select_day, DayNavigationError};
