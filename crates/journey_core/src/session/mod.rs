//! Transient interaction state reconciled into the entry store.
//!
//! # Responsibility
//! - Model entry selection/edit/delete as an explicit state machine.
//! - Hold the home-screen draft until it is committed.
//!
//! # Invariants
//! - Sessions never write storage directly; every change goes through
//!   `EntryStore` mutations.
//! - A failed save never discards the user's unsaved text.

pub mod composer;
pub mod edit;

pub use composer::Composer;
pub use edit::{EditDraft, EditSession, EditState, SessionError};
