//! Scan request, conflict and result types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use famcal_core::{ConflictPayload, Event};

use crate::error::{ConflictError, Result};
use crate::overlap::Overlap;

/// A conflict scan request, as accepted by the trigger surfaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Scan the family owning this event
    #[serde(default)]
    pub event_id: Option<String>,
    /// Scan this family
    #[serde(default)]
    pub family_id: Option<String>,
    /// Lookahead in hours
    #[serde(default)]
    pub check_window_hours: Option<i64>,
}

impl ScanRequest {
    pub fn for_family(family_id: impl Into<String>) -> Self {
        Self {
            family_id: Some(family_id.into()),
            ..Default::default()
        }
    }

    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Default::default()
        }
    }

    pub fn with_window_hours(mut self, hours: i64) -> Self {
        self.check_window_hours = Some(hours);
        self
    }

    /// Resolve the scoping mode. An event id takes precedence over a family id.
    pub fn scope(&self) -> Result<ScanScope> {
        let event_id = self.event_id.as_deref().filter(|id| !id.trim().is_empty());
        let family_id = self.family_id.as_deref().filter(|id| !id.trim().is_empty());

        match (event_id, family_id) {
            (Some(event_id), _) => Ok(ScanScope::Event(event_id.to_string())),
            (None, Some(family_id)) => Ok(ScanScope::Family(family_id.to_string())),
            (None, None) => Err(ConflictError::InvalidRequest(
                "one of event_id or family_id is required".to_string(),
            )),
        }
    }
}

/// What a scan covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScanScope {
    /// The family that owns this event
    Event(String),
    Family(String),
}

impl fmt::Display for ScanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(id) => write!(f, "event:{}", id),
            Self::Family(id) => write!(f, "family:{}", id),
        }
    }
}

/// Order-independent identity of an event pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// Two overlapping confirmed events and the members they both involve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The event with the lexicographically smaller id
    pub event_a: String,
    pub event_a_title: String,
    pub event_b: String,
    pub event_b_title: String,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
    pub overlap_minutes: i64,
    /// Members involved in both events, sorted
    pub members_affected: Vec<String>,
}

impl Conflict {
    /// Build a conflict from two events and their overlap.
    ///
    /// Affected members are the intersection of the two events' involved
    /// members.
    pub fn new(a: &Event, b: &Event, overlap: Overlap) -> Self {
        let (a, b) = if a.id <= b.id { (a, b) } else { (b, a) };
        let members_a = a.involved_members();
        let members_b = b.involved_members();
        let members_affected = members_a
            .intersection(&members_b)
            .map(|m| m.to_string())
            .collect();

        Self {
            event_a: a.id.clone(),
            event_a_title: a.title.clone(),
            event_b: b.id.clone(),
            event_b_title: b.title.clone(),
            overlap_start: overlap.start,
            overlap_end: overlap.end,
            overlap_minutes: overlap.minutes(),
            members_affected,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.event_a, &self.event_b)
    }

    /// Notification body shared by every affected member
    pub fn payload(&self) -> ConflictPayload {
        ConflictPayload {
            event_a_id: self.event_a.clone(),
            event_a_title: self.event_a_title.clone(),
            event_b_id: self.event_b.clone(),
            event_b_title: self.event_b_title.clone(),
            overlap_minutes: self.overlap_minutes,
        }
    }
}

/// How a single notification write ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Queued,
    /// An identical notification was already stored by an earlier scan
    Duplicate,
    Failed { reason: String },
}

/// Result of one notification write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub member_id: String,
    pub pair_key: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Aggregate of all notification writes of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub queued: usize,
    pub duplicates: usize,
    /// Writes that failed; the scan still succeeds
    pub failed: Vec<NotificationOutcome>,
}

impl NotificationSummary {
    pub fn from_outcomes(outcomes: Vec<NotificationOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Queued => summary.queued += 1,
                OutcomeStatus::Duplicate => summary.duplicates += 1,
                OutcomeStatus::Failed { .. } => summary.failed.push(outcome),
            }
        }
        summary
    }

    pub fn attempted(&self) -> usize {
        self.queued + self.duplicates + self.failed.len()
    }
}

/// Successful scan result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub ok: bool,
    pub scope: ScanScope,
    pub family_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub events_scanned: usize,
    pub conflicts_found: usize,
    pub conflicts: Vec<Conflict>,
    pub notifications: NotificationSummary,
}
