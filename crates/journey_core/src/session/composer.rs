//! Home-screen draft for writing a new entry.

use crate::clock::{Clock, SystemClock};
use crate::kv::KeyValueStore;
use crate::model::entry::{Entry, NewEntry};
use crate::store::{EntryStore, StoreResult};
use crate::uid::{UidGenerator, UuidGenerator};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Unsaved text plus the timestamp it will be filed under.
///
/// The timestamp defaults to "now" and can be moved back by the user.
pub struct Composer<K, G = UuidGenerator, C = SystemClock> {
    store: Arc<EntryStore<K, G>>,
    clock: C,
    text: String,
    date_time: DateTime<Utc>,
}

impl<K: KeyValueStore, G: UidGenerator, C: Clock> Composer<K, G, C> {
    pub fn new(store: Arc<EntryStore<K, G>>, clock: C) -> Self {
        let date_time = clock.now();
        Self {
            store,
            clock,
            text: String::new(),
            date_time,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date_time(&self) -> DateTime<Utc> {
        self.date_time
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_date_time(&mut self, date_time: DateTime<Utc>) {
        self.date_time = date_time;
    }

    /// Whether the draft holds any non-whitespace text.
    pub fn can_save(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Appends the draft as a new entry.
    ///
    /// On success the text is cleared and the timestamp resets to now.
    /// On failure the draft is left exactly as it was.
    pub fn save(&mut self) -> StoreResult<Vec<Entry>> {
        let entries = self
            .store
            .append(NewEntry::new(self.text.clone(), self.date_time))?;
        self.text.clear();
        self.date_time = self.clock.now();
        Ok(entries)
    }
}
