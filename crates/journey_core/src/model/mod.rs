//! Journal domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted shape identical to the `journals` blob format.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryUid`.
//! - Deletion is destructive; there are no tombstones.

pub mod entry;
