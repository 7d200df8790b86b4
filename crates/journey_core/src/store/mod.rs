//! Entry persistence.
//!
//! # Responsibility
//! - Own the canonical entry collection and its durable blob.
//! - Notify consumers of changes instead of letting them re-read storage.
//!
//! # Invariants
//! - Only `EntryStore` writes the `journals` key.
//! - Mutations against one store are applied one at a time.

pub mod entry_store;
pub mod events;

pub use entry_store::{EntryStore, StoreError, StoreResult, ENTRY_STORAGE_KEY};
pub use events::StoreEvent;
