//! Event type definitions

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Event lifecycle status as stored in the `events` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::InvalidData(format!("unknown event status: {}", other))),
        }
    }
}

/// A family calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable event identifier
    pub id: String,
    /// Owning calendar
    pub calendar_id: String,
    /// Family the owning calendar belongs to (resolved on read)
    #[serde(default)]
    pub family_id: Option<String>,
    /// Display title
    pub title: String,
    /// Start instant
    pub start: DateTime<Utc>,
    /// End instant
    pub end: DateTime<Utc>,
    /// Member who created the event
    pub creator_id: String,
    /// Attending member identifiers
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Lifecycle status
    #[serde(default)]
    pub status: EventStatus,
}

impl Event {
    /// Create a new confirmed event with no attendees
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            family_id: None,
            title: title.into(),
            start,
            end,
            creator_id: creator_id.into(),
            attendees: Vec::new(),
            status: EventStatus::Confirmed,
        }
    }

    /// Add an attendee
    pub fn with_attendee(mut self, member_id: impl Into<String>) -> Self {
        self.attendees.push(member_id.into());
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Members involved in the event: the creator plus every attendee.
    ///
    /// A creator who is also listed as an attendee appears once.
    pub fn involved_members(&self) -> BTreeSet<&str> {
        std::iter::once(self.creator_id.as_str())
            .chain(self.attendees.iter().map(String::as_str))
            .collect()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == EventStatus::Confirmed
    }
}
