//! Calendar persistence using SQLite

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::event::{Event, EventStatus};
use crate::notification::{NewNotification, Notification, NotificationPayload, NotificationStatus};
use crate::{Error, Result};

const EVENT_COLUMNS: &str = "e.id, e.calendar_id, c.family_id, e.title, e.start_ms, e.end_ms, \
     e.creator_id, e.status";

/// SQLite-based store for families, calendars, events and notifications
pub struct CalendarStore {
    conn: Connection,
}

impl CalendarStore {
    /// Open (or create) a store at the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening calendar database at: {}", db_path);
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        info!("CalendarStore initialized successfully");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS families (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS calendars (
                id TEXT PRIMARY KEY,
                family_id TEXT NOT NULL REFERENCES families(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                calendar_id TEXT NOT NULL REFERENCES calendars(id),
                creator_id TEXT NOT NULL,
                title TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'confirmed',
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS event_attendees (
                event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                member_id TEXT NOT NULL,
                PRIMARY KEY (event_id, member_id)
            );
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                channel TEXT NOT NULL,
                status TEXT NOT NULL,
                dedup_key TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_ms);
            CREATE INDEX IF NOT EXISTS idx_calendars_family_id ON calendars(family_id);
            CREATE INDEX IF NOT EXISTS idx_notifications_member_id ON notifications(member_id);",
        )?;
        Ok(())
    }

    /// Insert or replace a family
    pub fn upsert_family(&self, id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO families (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert or replace a calendar owned by `family_id`
    pub fn upsert_calendar(&self, id: &str, family_id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO calendars (id, family_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, family_id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert or replace an event together with its attendee list.
    ///
    /// `event.family_id` is ignored; the family always comes from the
    /// owning calendar.
    pub fn upsert_event(&mut self, event: &Event) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO events
                (id, calendar_id, creator_id, title, start_ms, end_ms, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.id,
                event.calendar_id,
                event.creator_id,
                event.title,
                event.start.timestamp_millis(),
                event.end.timestamp_millis(),
                event.status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.execute(
            "DELETE FROM event_attendees WHERE event_id = ?1",
            params![event.id],
        )?;
        for member_id in &event.attendees {
            tx.execute(
                "INSERT OR IGNORE INTO event_attendees (event_id, member_id) VALUES (?1, ?2)",
                params![event.id, member_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Load an event by ID, whatever its status
    pub fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let sql = format!(
            "SELECT {} FROM events e JOIN calendars c ON c.id = e.calendar_id WHERE e.id = ?1",
            EVENT_COLUMNS
        );
        let event = self
            .conn
            .query_row(&sql, params![id], row_to_event)
            .optional()?;

        match event {
            Some(mut event) => {
                event.attendees = self.attendees_of(&event.id)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// List confirmed events of a family whose start lies in `[from, until)`,
    /// ordered by start time.
    pub fn list_confirmed_events(
        &self,
        family_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events e JOIN calendars c ON c.id = e.calendar_id
             WHERE c.family_id = ?1 AND e.status = 'confirmed'
               AND e.start_ms >= ?2 AND e.start_ms < ?3
             ORDER BY e.start_ms ASC, e.id ASC",
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![family_id, from.timestamp_millis(), until.timestamp_millis()],
            row_to_event,
        )?;

        let mut events = Vec::new();
        for row in rows {
            let mut event = row?;
            event.attendees = self.attendees_of(&event.id)?;
            events.push(event);
        }
        debug!(family = %family_id, count = events.len(), "Loaded confirmed events");
        Ok(events)
    }

    fn attendees_of(&self, event_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT member_id FROM event_attendees WHERE event_id = ?1 ORDER BY rowid",
        )?;
        let members = stmt
            .query_map(params![event_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Insert a notification unless one with the same dedup key exists.
    ///
    /// Returns true when a new row was written.
    pub fn insert_notification(&self, notification: &NewNotification) -> Result<bool> {
        let payload_json = serde_json::to_string(&notification.payload)?;
        let affected = self.conn.execute(
            "INSERT OR IGNORE INTO notifications
                (id, member_id, payload, channel, status, dedup_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                notification.member_id,
                payload_json,
                notification.channel,
                notification.status.as_str(),
                notification.dedup_key,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// List notifications addressed to a member, oldest first
    pub fn list_notifications(&self, member_id: &str) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, member_id, payload, channel, status, dedup_key, created_at
             FROM notifications WHERE member_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![member_id], row_to_notification)?;

        let mut result = Vec::new();
        for notification in rows {
            result.push(notification?);
        }
        Ok(result)
    }

    /// Count all stored notifications
    pub fn count_notifications(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn millis_to_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn conversion_error(idx: usize, err: Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.to_string().into())
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let status: String = row.get(7)?;
    let status = status
        .parse::<EventStatus>()
        .map_err(|e| conversion_error(7, e))?;

    Ok(Event {
        id: row.get(0)?,
        calendar_id: row.get(1)?,
        family_id: row.get(2)?,
        title: row.get(3)?,
        start: millis_to_datetime(row, 4)?,
        end: millis_to_datetime(row, 5)?,
        creator_id: row.get(6)?,
        attendees: Vec::new(),
        status,
    })
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let payload_json: String = row.get(2)?;
    let payload: NotificationPayload =
        serde_json::from_str(&payload_json).map_err(|e| conversion_error(2, Error::from(e)))?;

    let status: String = row.get(4)?;
    let status = status
        .parse::<NotificationStatus>()
        .map_err(|e| conversion_error(4, e))?;

    let created_at_str: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| conversion_error(6, Error::InvalidData(e.to_string())))?
        .with_timezone(&Utc);

    Ok(Notification {
        id: row.get(0)?,
        member_id: row.get(1)?,
        payload,
        channel: row.get(3)?,
        status,
        dedup_key: row.get(5)?,
        created_at,
    })
}
