//! Event source and notification sink seams
//!
//! The scanner only reads events and writes notification requests; both
//! sides are traits so the backing store can be swapped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use famcal_core::{CalendarStore, Event, NewNotification};

/// Read access to the event store
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Look up a single event regardless of its status
    async fn fetch_event_by_id(&self, event_id: &str) -> famcal_core::Result<Option<Event>>;

    /// Confirmed events of `family_id` starting in `[from, until)`, by start time
    async fn fetch_confirmed_events(
        &self,
        family_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> famcal_core::Result<Vec<Event>>;
}

/// Write access to the notification store
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Store a notification request.
    ///
    /// Returns false when a notification with the same dedup key already exists.
    async fn insert_notification(&self, notification: &NewNotification) -> famcal_core::Result<bool>;
}

/// [`EventSource`] and [`NotificationSink`] over a shared [`CalendarStore`]
#[derive(Clone)]
pub struct SqliteBackend {
    store: Arc<Mutex<CalendarStore>>,
}

impl SqliteBackend {
    pub fn new(store: CalendarStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Open a file-backed store
    pub fn open(db_path: &str) -> famcal_core::Result<Self> {
        Ok(Self::new(CalendarStore::new(db_path)?))
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> famcal_core::Result<Self> {
        Ok(Self::new(CalendarStore::in_memory()?))
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<CalendarStore>> {
        Arc::clone(&self.store)
    }

    pub fn event_source(&self) -> Arc<dyn EventSource> {
        Arc::new(self.clone())
    }

    pub fn notification_sink(&self) -> Arc<dyn NotificationSink> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl EventSource for SqliteBackend {
    async fn fetch_event_by_id(&self, event_id: &str) -> famcal_core::Result<Option<Event>> {
        let store = self.store.lock().await;
        store.get_event(event_id)
    }

    async fn fetch_confirmed_events(
        &self,
        family_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> famcal_core::Result<Vec<Event>> {
        let store = self.store.lock().await;
        store.list_confirmed_events(family_id, from, until)
    }
}

#[async_trait]
impl NotificationSink for SqliteBackend {
    async fn insert_notification(&self, notification: &NewNotification) -> famcal_core::Result<bool> {
        let store = self.store.lock().await;
        store.insert_notification(notification)
    }
}
