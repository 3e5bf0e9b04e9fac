//! famcal-core: Family calendar core library
//!
//! Shared event and notification models, configuration loading, and the
//! SQLite-backed calendar store used by the conflict scanner and its
//! trigger surfaces.

pub mod config;
pub mod error;
pub mod event;
pub mod notification;
pub mod store;

pub use config::{ApiConfig, Config, DatabaseConfig, ScannerConfig, SchedulerConfig};
pub use error::{Error, Result};
pub use event::{Event, EventStatus};
pub use notification::{
    ConflictPayload, NewNotification, Notification, NotificationPayload, NotificationStatus,
};
pub use store::CalendarStore;
