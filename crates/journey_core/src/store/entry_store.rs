//! Entry store over a single serialized blob.
//!
//! # Responsibility
//! - Load, append, update and remove entries stored under `journals`.
//! - Serialize read-modify-write mutations against one collection.
//! - Publish change notifications after successful mutations.
//!
//! # Invariants
//! - Write paths validate entries before persistence.
//! - A blob that fails to read or parse is never overwritten.
//! - `uid` values are unique across the stored collection.
//! - Every mutation rewrites the whole collection; expected sizes are
//!   hundreds of entries.

use crate::kv::{KeyValueStore, KvError};
use crate::model::entry::{
    normalize_date_time, normalize_text, Entry, EntryPatch, EntryUid, EntryValidationError,
    NewEntry,
};
use crate::store::events::{StoreEvent, Subscribers};
use crate::uid::{UidGenerator, UuidGenerator};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Fixed key holding the serialized entry collection.
pub const ENTRY_STORAGE_KEY: &str = "journals";

const MAX_UID_ATTEMPTS: usize = 8;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entry store error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Entry content failed write-time validation.
    Validation(EntryValidationError),
    /// No entry with this uid exists.
    NotFound(EntryUid),
    /// Stored blob is not a list of entries.
    CorruptData(String),
    /// Underlying key-value operation failed.
    StorageUnavailable(KvError),
    /// Generator kept producing uids already in use.
    DuplicateUid(EntryUid),
}

impl StoreError {
    /// Stable machine-readable code used in logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::CorruptData(_) => "corrupt_data",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::DuplicateUid(_) => "duplicate_uid",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(uid) => write!(f, "entry not found: {uid}"),
            Self::CorruptData(message) => write!(f, "stored entries are corrupt: {message}"),
            Self::StorageUnavailable(err) => write!(f, "{err}"),
            Self::DuplicateUid(uid) => write!(f, "could not allocate a unique uid (last: {uid})"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) => Some(err),
            Self::NotFound(_) | Self::CorruptData(_) | Self::DuplicateUid(_) => None,
        }
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KvError> for StoreError {
    fn from(value: KvError) -> Self {
        Self::StorageUnavailable(value)
    }
}

/// Durable entry collection shared by all consumers.
///
/// Share one instance (typically `Arc<EntryStore<_>>`) instead of reading the
/// storage key from several places; subscribers learn about changes through
/// [`EntryStore::subscribe`].
pub struct EntryStore<K, G = UuidGenerator> {
    kv: K,
    uids: G,
    mutation_lock: Mutex<()>,
    subscribers: Subscribers,
}

impl<K: KeyValueStore> EntryStore<K> {
    /// Creates a store using UUID v4 uids.
    pub fn new(kv: K) -> Self {
        Self::with_uid_generator(kv, UuidGenerator)
    }
}

impl<K: KeyValueStore, G: UidGenerator> EntryStore<K, G> {
    pub fn with_uid_generator(kv: K, uids: G) -> Self {
        Self {
            kv,
            uids,
            mutation_lock: Mutex::new(()),
            subscribers: Subscribers::default(),
        }
    }

    /// Loads the full entry collection in stored order.
    ///
    /// # Errors
    /// - `StorageUnavailable` when the backend read fails.
    /// - `CorruptData` when the blob is not a JSON list of entries. Only an
    ///   absent key or an empty string count as "no entries yet".
    pub fn load(&self) -> StoreResult<Vec<Entry>> {
        let raw = self.kv.get_item(ENTRY_STORAGE_KEY)?;
        parse_entries(raw.as_deref())
    }

    /// Looks up one entry by uid.
    pub fn get(&self, uid: &EntryUid) -> StoreResult<Option<Entry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.uid == *uid))
    }

    /// Registers a change listener.
    ///
    /// The receiver gets one event per successful mutation, in mutation
    /// order. Dropping it unsubscribes.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.subscribers.subscribe()
    }

    /// Appends a new entry with a freshly generated uid.
    ///
    /// Text is trimmed and the timestamp truncated to milliseconds; empty
    /// text or an unstorable year is rejected before storage is touched.
    pub fn append(&self, draft: NewEntry) -> StoreResult<Vec<Entry>> {
        let started_at = Instant::now();
        let result = self.append_inner(draft);
        log_mutation("entry_append", started_at, &result);
        result
    }

    /// Applies a partial patch to the entry identified by `uid`.
    pub fn update(&self, uid: &EntryUid, patch: &EntryPatch) -> StoreResult<Vec<Entry>> {
        let started_at = Instant::now();
        let result = self.update_inner(uid, patch);
        log_mutation("entry_update", started_at, &result);
        result
    }

    /// Removes the entry identified by `uid`.
    ///
    /// Removing an absent uid succeeds and leaves storage untouched.
    pub fn remove(&self, uid: &EntryUid) -> StoreResult<Vec<Entry>> {
        let started_at = Instant::now();
        let result = self.remove_inner(uid);
        log_mutation("entry_remove", started_at, &result);
        result
    }

    fn append_inner(&self, draft: NewEntry) -> StoreResult<Vec<Entry>> {
        let text = normalize_text(&draft.text)?;
        let date_time = normalize_date_time(draft.date_time)?;

        let _guard = self.lock_mutations()?;
        let mut entries = self.load()?;
        let uid = self.fresh_uid(&entries)?;
        let entry = Entry {
            uid: uid.clone(),
            text,
            date_time,
        };
        entry.validate()?;
        entries.push(entry);

        self.persist(&entries)?;
        self.subscribers.publish(StoreEvent::Appended {
            uid,
            entries: entries.clone(),
        });
        Ok(entries)
    }

    fn update_inner(&self, uid: &EntryUid, patch: &EntryPatch) -> StoreResult<Vec<Entry>> {
        let _guard = self.lock_mutations()?;
        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.uid == *uid)
            .ok_or_else(|| StoreError::NotFound(uid.clone()))?;

        let before = entry.clone();
        patch.apply_to(entry)?;
        entry.validate()?;
        if *entry == before {
            debug!("event=entry_update module=store status=skipped reason=unchanged uid={uid}");
            return Ok(entries);
        }

        self.persist(&entries)?;
        self.subscribers.publish(StoreEvent::Updated {
            uid: uid.clone(),
            entries: entries.clone(),
        });
        Ok(entries)
    }

    fn remove_inner(&self, uid: &EntryUid) -> StoreResult<Vec<Entry>> {
        let _guard = self.lock_mutations()?;
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|entry| entry.uid != *uid);
        if entries.len() == before {
            debug!("event=entry_remove module=store status=skipped reason=absent uid={uid}");
            return Ok(entries);
        }

        self.persist(&entries)?;
        self.subscribers.publish(StoreEvent::Removed {
            uid: uid.clone(),
            entries: entries.clone(),
        });
        Ok(entries)
    }

    fn lock_mutations(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.mutation_lock.lock().map_err(|_| {
            StoreError::StorageUnavailable(KvError::Unavailable(
                "entry mutation lock poisoned".to_string(),
            ))
        })
    }

    fn fresh_uid(&self, entries: &[Entry]) -> StoreResult<EntryUid> {
        let mut candidate = EntryUid::new(self.uids.generate());
        for _ in 1..MAX_UID_ATTEMPTS {
            if !entries.iter().any(|entry| entry.uid == candidate) {
                return Ok(candidate);
            }
            warn!("event=uid_collision module=store status=retry uid={candidate}");
            candidate = EntryUid::new(self.uids.generate());
        }
        if entries.iter().any(|entry| entry.uid == candidate) {
            return Err(StoreError::DuplicateUid(candidate));
        }
        Ok(candidate)
    }

    fn persist(&self, entries: &[Entry]) -> StoreResult<()> {
        let blob = serde_json::to_string(entries)
            .map_err(|err| StoreError::CorruptData(format!("failed to serialize entries: {err}")))?;
        self.kv.set_item(ENTRY_STORAGE_KEY, &blob)?;
        Ok(())
    }
}

fn parse_entries(raw: Option<&str>) -> StoreResult<Vec<Entry>> {
    match raw {
        None => Ok(Vec::new()),
        Some("") => Ok(Vec::new()),
        Some(blob) => serde_json::from_str::<Vec<Entry>>(blob)
            .map_err(|err| StoreError::CorruptData(err.to_string())),
    }
}

fn log_mutation(event: &str, started_at: Instant, result: &StoreResult<Vec<Entry>>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(entries) => info!(
            "event={} module=store status=ok count={} duration_ms={}",
            event,
            entries.len(),
            duration_ms
        ),
        Err(err @ (StoreError::Validation(_) | StoreError::NotFound(_))) => warn!(
            "event={} module=store status=rejected duration_ms={} error_code={} error={}",
            event,
            duration_ms,
            err.code(),
            err
        ),
        Err(err) => error!(
            "event={} module=store status=error duration_ms={} error_code={} error={}",
            event,
            duration_ms,
            err.code(),
            err
        ),
    }
}
