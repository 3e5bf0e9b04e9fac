//! Notification model

mod types;

pub use types::{
    ConflictPayload, NewNotification, Notification, NotificationPayload, NotificationStatus,
};
