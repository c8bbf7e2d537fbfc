pub mod calendar;
pub mod helpers;
pub mod storage;
pub mod store;

pub use calendar::{CalendarEvent, EventPatch, PopupElement, Position, Size, Viewport};
pub use helpers::{PopupLayout, adjust_position, adjust_position_with, format_date, format_time};
pub use storage::{KeyValueStore, MemoryStorage, SqliteStorage, StorageError};
pub use store::{DEFAULT_STORAGE_KEY, EventStore, StoreError, SubscriptionId};
