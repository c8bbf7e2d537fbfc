use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::{CalendarEvent, EventPatch, generate_id};
use crate::storage::{KeyValueStore, StorageError};

pub const DEFAULT_STORAGE_KEY: &str = "calendarEvents";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stored events are not valid JSON: {0}")]
    StorageParse(#[source] serde_json::Error),
    #[error("Failed to persist events: {0}")]
    Persistence(#[from] StorageError),
    #[error("Failed to serialize events: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Event with id '{0}' already exists")]
    DuplicateId(String),
    #[error("Event has no id")]
    MissingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&[CalendarEvent])>;

/// Owns the event list and mirrors it to a [`KeyValueStore`] after every
/// mutation. Readers get slices; only the mutators below change the list.
pub struct EventStore<S: KeyValueStore> {
    storage: S,
    key: String,
    events: Vec<CalendarEvent>,
    revision: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> EventStore<S> {
    /// Loads whatever is stored under the default key. Unreadable or
    /// malformed data is logged and replaced by an empty list.
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let events = match read_events(&storage, &key) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Discarding stored events under '{}': {}", key, e);
                Vec::new()
            }
        };

        let mut store = Self::from_parts(storage, key, events);
        if store.assign_missing_ids() > 0
            && let Err(e) = store.save_to_storage()
        {
            tracing::warn!("Could not write back re-keyed events: {}", e);
        }
        store
    }

    /// Like [`EventStore::open`], but read and parse failures are returned
    /// so the caller can pick its own fallback.
    pub fn open_strict(storage: S) -> Result<Self, StoreError> {
        Self::open_strict_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn open_strict_with_key(storage: S, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let events = read_events(&storage, &key)?;

        let mut store = Self::from_parts(storage, key, events);
        if store.assign_missing_ids() > 0 {
            store.save_to_storage()?;
        }
        Ok(store)
    }

    fn from_parts(storage: S, key: String, events: Vec<CalendarEvent>) -> Self {
        tracing::debug!("Loaded {} events from '{}'", events.len(), key);
        Self {
            storage,
            key,
            events,
            revision: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    fn assign_missing_ids(&mut self) -> usize {
        let mut assigned = 0;
        for event in self.events.iter_mut().filter(|e| !e.has_id()) {
            event.id = generate_id();
            assigned += 1;
        }
        if assigned > 0 {
            tracing::info!("Assigned ids to {} stored events", assigned);
        }
        assigned
    }

    /// Appends `event`. Ids must be present and unique within the store.
    pub fn add_event(&mut self, event: CalendarEvent) -> Result<(), StoreError> {
        if !event.has_id() {
            return Err(StoreError::MissingId);
        }
        if self.events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::DuplicateId(event.id));
        }

        tracing::debug!("Adding event {} ({})", event.id, event.title);
        self.events.push(event);
        self.commit()
    }

    /// Merges `patch` into the first event with the same id. Returns
    /// `false` without touching storage when no event matches.
    pub fn update_event(&mut self, patch: EventPatch) -> Result<bool, StoreError> {
        let Some(event) = self.events.iter_mut().find(|e| e.id == patch.id) else {
            tracing::debug!("No event {} to update", patch.id);
            return Ok(false);
        };

        patch.apply_to(event);
        tracing::debug!("Updated event {}", patch.id);
        self.commit()?;
        Ok(true)
    }

    /// Removes every event carrying `id` and returns how many went away.
    pub fn delete_event(&mut self, id: &str) -> Result<usize, StoreError> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        let removed = before - self.events.len();

        tracing::debug!("Deleted {} events with id {}", removed, id);
        self.commit()?;
        Ok(removed)
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn get_event(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        self.events.iter().filter(|e| e.starts_on(date)).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Bumped on every in-memory mutation, for consumers that poll.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Registers `callback` to receive the full list after each mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[CalendarEvent]) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    // Memory is already updated here; a failed write is reported but not
    // rolled back.
    fn commit(&mut self) -> Result<(), StoreError> {
        self.revision += 1;
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.events);
        }
        self.save_to_storage()
    }

    fn save_to_storage(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.events).map_err(StoreError::Serialization)?;
        self.storage.set(&self.key, &json).map_err(|e| {
            tracing::warn!("Failed to write {} events to '{}': {}", self.events.len(), self.key, e);
            StoreError::from(e)
        })
    }
}

// Only a value that is not a JSON array is a parse error. Records are
// converted one by one so a malformed entry does not cost the rest.
fn read_events<S: KeyValueStore>(storage: &S, key: &str) -> Result<Vec<CalendarEvent>, StoreError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    let records: Vec<serde_json::Value> =
        serde_json::from_str(&raw).map_err(StoreError::StorageParse)?;

    let events = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Skipping stored event #{} under '{}': {}", index, key, e);
                None
            }
        })
        .collect();
    Ok(events)
}
