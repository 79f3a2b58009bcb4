use std::sync::{Mutex, PoisonError};

use aeropoints_core::{AirportVisit, CoreResult, FlightSearchRecord, KeyValueStorage, StorageError};
use aeropoints_shared::HistoryEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, warn};

const EVENT_CAPACITY: usize = 32;

/// An item kept in a bounded, most-recent-first history.
pub trait HistoryEntry: Serialize + DeserializeOwned + Clone {
    /// True when `other` describes the same thing and should be replaced.
    fn same_entry(&self, other: &Self) -> bool;

    fn timestamp(&self) -> i64;

    fn validate(&self) -> CoreResult<()>;
}

impl HistoryEntry for FlightSearchRecord {
    fn same_entry(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn validate(&self) -> CoreResult<()> {
        FlightSearchRecord::validate(self)
    }
}

impl HistoryEntry for AirportVisit {
    fn same_entry(&self, other: &Self) -> bool {
        self.code == other.code && self.role == other.role
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn validate(&self) -> CoreResult<()> {
        AirportVisit::validate(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// An equal entry already existed and was moved to the front.
    pub refreshed: bool,
    pub evicted: usize,
    /// False when the backend rejected the write; the entry is then lost.
    pub persisted: bool,
}

/// A bounded list of entries stored as one JSON array under a single key.
///
/// Storage failures are logged and read as an empty list. A payload that
/// fails to decode or validate is dropped whole and the key removed.
pub struct HistoryLog<S> {
    storage: S,
    key: String,
    max_entries: usize,
    events: broadcast::Sender<HistoryEvent>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> HistoryLog<S> {
    pub fn new(storage: S, key: impl Into<String>, max_entries: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            key: key.into(),
            max_entries: max_entries.max(1),
            events,
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Having no subscribers is fine.
    pub fn publish(&self, event: HistoryEvent) {
        let _ = self.events.send(event);
    }

    /// Current entries, most recent first.
    pub fn load<T: HistoryEntry>(&self) -> Vec<T> {
        let result = self
            .storage
            .get(&self.key)
            .and_then(|raw| raw.map(|raw| decode::<T>(&raw)).transpose());

        match result {
            Ok(Some(mut items)) => {
                // Stable, so equal timestamps keep their stored order
                items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
                items.truncate(self.max_entries);
                items
            }
            Ok(None) => Vec::new(),
            Err(StorageError::Corrupted(reason)) => {
                self.discard(&reason);
                Vec::new()
            }
            Err(e) => {
                warn!("History '{}' unreadable, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Put the entry built by `make` at the front, dropping any equal entry
    /// and trimming to the bound. `make` receives the newest stored timestamp.
    pub fn insert_with<T, F>(&self, make: F) -> (T, InsertOutcome)
    where
        T: HistoryEntry,
        F: FnOnce(Option<i64>) -> T,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut items: Vec<T> = self.load();
        let entry = make(items.first().map(|newest| newest.timestamp()));

        let before = items.len();
        items.retain(|existing| !existing.same_entry(&entry));
        let refreshed = items.len() < before;

        items.insert(0, entry.clone());
        let evicted = items.len().saturating_sub(self.max_entries);
        items.truncate(self.max_entries);

        let persisted = self.persist(&items);
        (entry, InsertOutcome { refreshed, evicted, persisted })
    }

    /// Returns false when the backend could not remove the key.
    pub fn clear(&self) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.storage.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to clear history '{}': {}", self.key, e);
                false
            }
        }
    }

    fn persist<T: HistoryEntry>(&self, items: &[T]) -> bool {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode history '{}': {}", self.key, e);
                return false;
            }
        };
        match self.storage.set(&self.key, &payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist history '{}': {}", self.key, e);
                false
            }
        }
    }

    fn discard(&self, reason: &str) {
        warn!("Discarding corrupted history '{}': {}", self.key, reason);
        if let Err(e) = self.storage.remove(&self.key) {
            warn!("Failed to remove corrupted history '{}': {}", self.key, e);
        }
        self.publish(HistoryEvent::HistoryDiscarded { key: self.key.clone() });
    }
}

fn decode<T: HistoryEntry>(raw: &str) -> Result<Vec<T>, StorageError> {
    let items: Vec<T> = serde_json::from_str(raw).map_err(|e| StorageError::Corrupted(e.to_string()))?;
    for item in &items {
        item.validate()
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;
    }
    Ok(items)
}
