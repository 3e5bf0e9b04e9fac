//! Notification type definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Delivery status of a stored notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Queued,
    Sent,
    Failed,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "read" => Ok(Self::Read),
            other => Err(Error::InvalidData(format!(
                "unknown notification status: {}",
                other
            ))),
        }
    }
}

/// Body of a scheduling-conflict notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPayload {
    pub event_a_id: String,
    pub event_a_title: String,
    pub event_b_id: String,
    pub event_b_title: String,
    pub overlap_minutes: i64,
}

/// Notification payload, tagged by `type` in its JSON form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    Conflict(ConflictPayload),
}

/// A notification insertion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient member
    pub member_id: String,
    pub payload: NotificationPayload,
    /// Delivery channel (e.g. "push")
    pub channel: String,
    pub status: NotificationStatus,
    /// Rows sharing a dedup key are written once
    pub dedup_key: String,
}

impl NewNotification {
    /// Build a queued conflict notification for `member_id`.
    ///
    /// The dedup key is derived from the member and the event pair as it
    /// appears in the payload, so callers must pass the pair already ordered.
    pub fn conflict(
        member_id: impl Into<String>,
        payload: ConflictPayload,
        channel: impl Into<String>,
    ) -> Self {
        let member_id = member_id.into();
        let dedup_key = length_prefixed_key(
            "conflict",
            &[
                member_id.as_str(),
                payload.event_a_id.as_str(),
                payload.event_b_id.as_str(),
            ],
        );
        Self {
            member_id,
            payload: NotificationPayload::Conflict(payload),
            channel: channel.into(),
            status: NotificationStatus::Queued,
            dedup_key,
        }
    }
}

/// Join `parts` under `kind`, each prefixed with its byte length.
///
/// Ids are opaque and may contain the separator, so the length prefix
/// keeps distinct part lists from producing the same key.
fn length_prefixed_key(kind: &str, parts: &[&str]) -> String {
    let mut key = kind.to_string();
    for part in parts {
        key.push_str(&format!(":{}:{}", part.len(), part));
    }
    key
}

/// A stored notification row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub member_id: String,
    pub payload: NotificationPayload,
    pub channel: String,
    pub status: NotificationStatus,
    pub dedup_key: String,
    pub created_at: DateTime<Utc>,
}
