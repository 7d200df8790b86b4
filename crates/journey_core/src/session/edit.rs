//! Edit/delete state machine for one selected entry.
//!
//! ```text
//! Idle --select--> Selected --begin_edit--> Editing --commit_edit--> Idle
//!                     |                        ^  |
//!                     |                        |  +--(store failure)
//!                     +--confirm_delete--> Deleting --> Idle
//! any --dismiss--> Idle
//! ```
//!
//! Animation is derived from [`EditState`] by the presentation layer and
//! never owns state. Delete removes the entry durably before
//! `confirm_delete` returns; exit animations play afterwards.

use crate::kv::KeyValueStore;
use crate::model::entry::{Entry, EntryPatch};
use crate::store::{EntryStore, StoreError};
use crate::uid::{UidGenerator, UuidGenerator};
use chrono::{DateTime, Utc};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::mem;
use std::sync::Arc;

/// Working copy of an entry being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    /// Entry as it was when editing began.
    pub entry: Entry,
    pub text: String,
    pub date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Selected(Entry),
    Editing(EditDraft),
    /// Durable removal of this entry is in flight.
    Deleting(Entry),
}

impl EditState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected(_) => "selected",
            Self::Editing(_) => "editing",
            Self::Deleting(_) => "deleting",
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// Action is not valid in the current state; state is unchanged.
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { action, state } => {
                write!(f, "cannot {action} while {state}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTransition { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Selection/edit/delete session bound to one shared store.
pub struct EditSession<K, G = UuidGenerator> {
    store: Arc<EntryStore<K, G>>,
    state: EditState,
}

impl<K: KeyValueStore, G: UidGenerator> EditSession<K, G> {
    pub fn new(store: Arc<EntryStore<K, G>>) -> Self {
        Self {
            store,
            state: EditState::Idle,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, EditState::Idle)
    }

    /// Entry the session currently refers to, in any non-idle state.
    pub fn selected(&self) -> Option<&Entry> {
        match &self.state {
            EditState::Idle => None,
            EditState::Selected(entry) | EditState::Deleting(entry) => Some(entry),
            EditState::Editing(draft) => Some(&draft.entry),
        }
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.state {
            EditState::Editing(draft) => Some(draft),
            _ => None,
        }
    }

    /// Selects `entry`, replacing any previous read-only selection.
    pub fn select(&mut self, entry: Entry) -> SessionResult<()> {
        match self.state {
            EditState::Idle | EditState::Selected(_) => {
                self.transition(EditState::Selected(entry));
                Ok(())
            }
            _ => Err(self.invalid("select")),
        }
    }

    /// Opens the inline editor seeded from the selected entry.
    pub fn begin_edit(&mut self) -> SessionResult<()> {
        let EditState::Selected(entry) = &self.state else {
            return Err(self.invalid("begin_edit"));
        };
        let draft = EditDraft {
            text: entry.text.clone(),
            date_time: entry.date_time,
            entry: entry.clone(),
        };
        self.transition(EditState::Editing(draft));
        Ok(())
    }

    /// Changes the provided draft fields in place.
    pub fn update_draft(
        &mut self,
        text: Option<String>,
        date_time: Option<DateTime<Utc>>,
    ) -> SessionResult<()> {
        let EditState::Editing(draft) = &mut self.state else {
            return Err(self.invalid("update_draft"));
        };
        if let Some(text) = text {
            draft.text = text;
        }
        if let Some(date_time) = date_time {
            draft.date_time = date_time;
        }
        Ok(())
    }

    /// Saves the draft through `EntryStore::update`.
    ///
    /// On success the session is idle. If the entry vanished meanwhile the
    /// session is idle too and `NotFound` is returned. Any other failure
    /// keeps the session in `Editing` with the draft untouched.
    pub fn commit_edit(&mut self) -> SessionResult<Vec<Entry>> {
        let draft = match mem::take(&mut self.state) {
            EditState::Editing(draft) => draft,
            other => {
                self.state = other;
                return Err(self.invalid("commit_edit"));
            }
        };

        let patch = EntryPatch {
            text: Some(draft.text.clone()),
            date_time: Some(draft.date_time),
        };
        match self.store.update(&draft.entry.uid, &patch) {
            Ok(entries) => {
                debug!("event=session_transition module=session from=editing to=idle action=commit_edit");
                Ok(entries)
            }
            Err(err @ StoreError::NotFound(_)) => {
                debug!("event=session_transition module=session from=editing to=idle action=commit_edit status=not_found");
                Err(err.into())
            }
            Err(err) => {
                self.state = EditState::Editing(draft);
                Err(err.into())
            }
        }
    }

    /// Removes the selected entry from the store immediately.
    ///
    /// On failure the session returns to `Selected` with the same entry.
    pub fn confirm_delete(&mut self) -> SessionResult<Vec<Entry>> {
        let EditState::Selected(entry) = &self.state else {
            return Err(self.invalid("confirm_delete"));
        };
        let entry = entry.clone();
        self.transition(EditState::Deleting(entry.clone()));

        match self.store.remove(&entry.uid) {
            Ok(entries) => {
                self.transition(EditState::Idle);
                Ok(entries)
            }
            Err(err) => {
                self.transition(EditState::Selected(entry));
                Err(err.into())
            }
        }
    }

    /// Returns to `Idle` from any state, discarding unsaved drafts.
    pub fn dismiss(&mut self) {
        if !self.is_idle() {
            self.transition(EditState::Idle);
        }
    }

    fn transition(&mut self, next: EditState) {
        debug!(
            "event=session_transition module=session from={} to={}",
            self.state.label(),
            next.label()
        );
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }
}
