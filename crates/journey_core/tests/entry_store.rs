use chrono::{DateTime, Duration, TimeZone, Utc};
use journey_core::{
    filter_by_day_in, Entry, EntryPatch, EntryStore, EntryUid, EntryValidationError, KeyValueStore,
    KvError, KvResult, MemoryKeyValueStore, NewEntry, StoreError, StoreEvent, ENTRY_STORAGE_KEY,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Memory backend that counts writes and can be told to fail.
#[derive(Default)]
struct InstrumentedKv {
    inner: MemoryKeyValueStore,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InstrumentedKv {
    fn seeded(raw: &str) -> Self {
        Self {
            inner: MemoryKeyValueStore::with_item(ENTRY_STORAGE_KEY, raw),
            ..Self::default()
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn raw(&self) -> Option<String> {
        self.inner.get_item(ENTRY_STORAGE_KEY).unwrap()
    }
}

impl KeyValueStore for InstrumentedKv {
    fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("keychain locked".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("disk full".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn by_uid(entries: &[Entry]) -> HashMap<EntryUid, (String, DateTime<Utc>)> {
    entries
        .iter()
        .map(|entry| (entry.uid.clone(), (entry.text.clone(), entry.date_time)))
        .collect()
}

#[test]
fn create_and_retrieve_by_day() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    store
        .append(NewEntry::new("hello", at(2024, 1, 5, 10)))
        .unwrap();

    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "hello");

    assert_eq!(filter_by_day_in(&entries, &at(2024, 1, 5, 0)).len(), 1);
    assert!(filter_by_day_in(&entries, &at(2024, 1, 6, 0)).is_empty());
}

#[test]
fn appended_uids_are_pairwise_distinct() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    for index in 0..50 {
        store
            .append(NewEntry::new(format!("entry {index}"), at(2024, 2, 1, 9)))
            .unwrap();
    }

    let uids = store
        .load()
        .unwrap()
        .into_iter()
        .map(|entry| entry.uid)
        .collect::<HashSet<_>>();
    assert_eq!(uids.len(), 50);
}

#[test]
fn empty_or_blank_text_is_rejected_without_touching_storage() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    store.append(NewEntry::new("kept", at(2024, 1, 1, 8))).unwrap();
    let before = kv.raw();

    for text in ["", "   ", "\n\t"] {
        let err = store.append(NewEntry::new(text, at(2024, 1, 1, 9))).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "text {text:?}");
    }

    assert_eq!(kv.writes(), 1);
    assert_eq!(kv.raw(), before);
}

#[test]
fn append_trims_text() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let entries = store
        .append(NewEntry::new("  long walk \n", at(2024, 1, 1, 8)))
        .unwrap();
    assert_eq!(entries[0].text, "long walk");
}

#[test]
fn edit_preserves_uid() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let created = store.append(NewEntry::new("hi", at(2024, 1, 5, 10))).unwrap();
    let uid = created[0].uid.clone();

    store.update(&uid, &EntryPatch::text("bye")).unwrap();

    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, uid);
    assert_eq!(entries[0].text, "bye");
    assert_eq!(entries[0].date_time, at(2024, 1, 5, 10));
}

#[test]
fn partial_patch_changes_only_provided_fields() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let uid = store.append(NewEntry::new("hi", at(2024, 1, 5, 10))).unwrap()[0]
        .uid
        .clone();

    store
        .update(&uid, &EntryPatch::date_time(at(2024, 1, 4, 22)))
        .unwrap();

    let entry = store.get(&uid).unwrap().unwrap();
    assert_eq!(entry.text, "hi");
    assert_eq!(entry.date_time, at(2024, 1, 4, 22));
}

#[test]
fn update_rejects_missing_uid_and_blank_text() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    let uid = store.append(NewEntry::new("hi", at(2024, 1, 5, 10))).unwrap()[0]
        .uid
        .clone();

    let missing = EntryUid::new("nope");
    let err = store.update(&missing, &EntryPatch::text("x")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if *id == missing));

    let err = store.update(&uid, &EntryPatch::text("  ")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(kv.writes(), 1);
    assert_eq!(store.get(&uid).unwrap().unwrap().text, "hi");
}

#[test]
fn unchanged_update_skips_write() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    let uid = store.append(NewEntry::new("same", at(2024, 1, 5, 10))).unwrap()[0]
        .uid
        .clone();

    store.update(&uid, &EntryPatch::text(" same ")).unwrap();
    store.update(&uid, &EntryPatch::default()).unwrap();
    assert_eq!(kv.writes(), 1);
}

#[test]
fn remove_is_idempotent() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    store.append(NewEntry::new("a", at(2024, 1, 5, 10))).unwrap();
    let uid = store.append(NewEntry::new("b", at(2024, 1, 5, 11))).unwrap()[1]
        .uid
        .clone();

    let once = store.remove(&uid).unwrap();
    let twice = store.remove(&uid).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once.len(), 1);
    assert_eq!(kv.writes(), 3);
}

#[test]
fn removing_from_empty_store_is_a_no_op() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);

    let entries = store.remove(&EntryUid::new("nonexistent")).unwrap();

    assert!(entries.is_empty());
    assert!(store.load().unwrap().is_empty());
    assert_eq!(kv.writes(), 0);
}

#[test]
fn load_reflects_net_effect_of_mutations() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let mut expected = HashMap::new();

    for (index, text) in ["one", "two", "three", "four"].iter().enumerate() {
        let entries = store
            .append(NewEntry::new(*text, at(2024, 3, 1, index as u32)))
            .unwrap();
        let created = entries.last().unwrap();
        expected.insert(created.uid.clone(), (created.text.clone(), created.date_time));
    }
    let uids = expected.keys().cloned().collect::<Vec<_>>();

    store.update(&uids[0], &EntryPatch::text("edited")).unwrap();
    expected.get_mut(&uids[0]).unwrap().0 = "edited".to_string();

    store.remove(&uids[1]).unwrap();
    expected.remove(&uids[1]);

    store
        .update(&uids[2], &EntryPatch::date_time(at(2023, 12, 31, 23)))
        .unwrap();
    expected.get_mut(&uids[2]).unwrap().1 = at(2023, 12, 31, 23);

    assert_eq!(by_uid(&store.load().unwrap()), expected);
}

#[test]
fn corrupt_blob_is_reported_and_never_overwritten() {
    let kv = InstrumentedKv::seeded("definitely not json");
    let store = EntryStore::new(&kv);

    assert!(matches!(store.load(), Err(StoreError::CorruptData(_))));
    assert!(matches!(
        store.append(NewEntry::new("new", at(2024, 1, 1, 1))),
        Err(StoreError::CorruptData(_))
    ));
    assert!(matches!(
        store.remove(&EntryUid::new("x")),
        Err(StoreError::CorruptData(_))
    ));

    assert_eq!(kv.writes(), 0);
    assert_eq!(kv.raw().as_deref(), Some("definitely not json"));
}

#[test]
fn unstorable_years_are_rejected_and_journal_stays_usable() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    let uid = store.append(NewEntry::new("kept", at(2024, 1, 5, 10))).unwrap()[0]
        .uid
        .clone();
    let far_future = at(10000, 1, 1, 0);
    let before_year_zero = at(-1, 6, 1, 0);

    for value in [far_future, before_year_zero] {
        let err = store.append(NewEntry::new("too far", value)).unwrap_err();
        assert!(
            matches!(err, StoreError::Validation(EntryValidationError::DateOutOfRange(_))),
            "{value}"
        );
        let err = store.update(&uid, &EntryPatch::date_time(value)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{value}");
    }

    assert_eq!(kv.writes(), 1);
    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date_time, at(2024, 1, 5, 10));
    store.append(NewEntry::new("still writable", at(2024, 1, 6, 9))).unwrap();
}

#[test]
fn returned_snapshots_match_what_load_reads_back() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let events = store.subscribe();
    let precise = at(2024, 1, 5, 10) + Duration::nanoseconds(123_456_789);

    let appended = store.append(NewEntry::new("precise", precise)).unwrap();
    assert_eq!(appended, store.load().unwrap());
    assert_eq!(
        appended[0].date_time,
        at(2024, 1, 5, 10) + Duration::milliseconds(123)
    );

    let later = precise + Duration::microseconds(2_500_001);
    let updated = store
        .update(&appended[0].uid, &EntryPatch::date_time(later))
        .unwrap();
    assert_eq!(updated, store.load().unwrap());

    let received = events.try_iter().collect::<Vec<_>>();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].entries(), appended.as_slice());
    assert_eq!(received[1].entries(), updated.as_slice());
}

#[test]
fn patch_within_the_same_millisecond_is_unchanged() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    let entries = store.append(NewEntry::new("a", at(2024, 1, 5, 10))).unwrap();

    let jitter = at(2024, 1, 5, 10) + Duration::microseconds(400);
    store
        .update(&entries[0].uid, &EntryPatch::date_time(jitter))
        .unwrap();
    assert_eq!(kv.writes(), 1);
}

#[test]
fn storage_failures_surface_unchanged() {
    let kv = InstrumentedKv::default();
    let store = EntryStore::new(&kv);
    store.append(NewEntry::new("a", at(2024, 1, 5, 10))).unwrap();

    kv.fail_writes.store(true, Ordering::SeqCst);
    let err = store
        .append(NewEntry::new("b", at(2024, 1, 5, 11)))
        .unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(KvError::Unavailable(_))));
    kv.fail_writes.store(false, Ordering::SeqCst);
    assert_eq!(store.load().unwrap().len(), 1);

    kv.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(
        store.load(),
        Err(StoreError::StorageUnavailable(_))
    ));
    assert!(matches!(
        store.remove(&EntryUid::new("a")),
        Err(StoreError::StorageUnavailable(_))
    ));
    assert_eq!(kv.writes(), 1);
}

#[test]
fn reads_legacy_blob_written_by_the_mobile_app() {
    let raw = r#"[
        {"uid":"lq2x9k1abc","text":"first","dateTime":"2024-01-05T10:00:00.000Z"},
        {"uid":"lq2xa0zzzz","text":"second","dateTime":"2024-01-05T12:30:15.250Z"}
    ]"#;
    let store = EntryStore::new(MemoryKeyValueStore::with_item(ENTRY_STORAGE_KEY, raw));

    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].uid.as_str(), "lq2x9k1abc");

    let updated = store
        .update(&EntryUid::new("lq2xa0zzzz"), &EntryPatch::text("second, edited"))
        .unwrap();
    assert_eq!(updated[1].text, "second, edited");
}

#[test]
fn subscribers_see_each_successful_mutation_in_order() {
    let store = EntryStore::new(MemoryKeyValueStore::new());
    let events = store.subscribe();

    let uid = store.append(NewEntry::new("a", at(2024, 1, 5, 10))).unwrap()[0]
        .uid
        .clone();
    store.update(&uid, &EntryPatch::text("b")).unwrap();
    assert!(store.append(NewEntry::new(" ", at(2024, 1, 5, 10))).is_err());
    store.remove(&EntryUid::new("absent")).unwrap();
    store.remove(&uid).unwrap();

    let received = events.try_iter().collect::<Vec<_>>();
    assert_eq!(received.len(), 3);
    assert!(matches!(&received[0], StoreEvent::Appended { entries, .. } if entries.len() == 1));
    assert!(matches!(&received[1], StoreEvent::Updated { entries, .. } if entries[0].text == "b"));
    assert!(matches!(&received[2], StoreEvent::Removed { entries, .. } if entries.is_empty()));
    assert!(received.iter().all(|event| *event.uid() == uid));
}

#[test]
fn concurrent_appends_lose_no_writes() {
    let store = Arc::new(EntryStore::new(MemoryKeyValueStore::new()));
    let handles = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for index in 0..10 {
                    store
                        .append(NewEntry::new(
                            format!("worker {worker} entry {index}"),
                            at(2024, 1, 5, 10),
                        ))
                        .unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.load().unwrap().len(), 80);
}
