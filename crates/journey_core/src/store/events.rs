//! Change notifications published by `EntryStore`.

use crate::model::entry::{Entry, EntryUid};
use log::warn;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// One successful mutation together with the collection it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Appended { uid: EntryUid, entries: Vec<Entry> },
    Updated { uid: EntryUid, entries: Vec<Entry> },
    Removed { uid: EntryUid, entries: Vec<Entry> },
}

impl StoreEvent {
    pub fn uid(&self) -> &EntryUid {
        match self {
            Self::Appended { uid, .. } | Self::Updated { uid, .. } | Self::Removed { uid, .. } => {
                uid
            }
        }
    }

    /// Full collection snapshot after the mutation.
    pub fn entries(&self) -> &[Entry] {
        match self {
            Self::Appended { entries, .. }
            | Self::Updated { entries, .. }
            | Self::Removed { entries, .. } => entries,
        }
    }
}

/// Fan-out list of subscriber channels.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Mutex<Vec<Sender<StoreEvent>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = channel();
        match self.senders.lock() {
            Ok(mut senders) => senders.push(tx),
            Err(_) => warn!("event=store_subscribe module=store status=error error_code=lock_poisoned"),
        }
        rx
    }

    /// Sends `event` to every live subscriber and prunes closed channels.
    pub(crate) fn publish(&self, event: StoreEvent) {
        let Ok(mut senders) = self.senders.lock() else {
            warn!("event=store_publish module=store status=error error_code=lock_poisoned");
            return;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.lock().map(|senders| senders.len()).unwrap_or(0)
    }
}
