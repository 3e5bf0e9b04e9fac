//! Conflict scanner
//!
//! Loads the confirmed events of a family that start inside the lookahead
//! window, detects overlapping pairs per involved member, and queues one
//! conflict notification per affected member and pair.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use famcal_core::config::{DEFAULT_WINDOW_HOURS, ScannerConfig};
use famcal_core::{Event, NewNotification};

use crate::error::{ConflictError, Result};
use crate::index::MemberIndex;
use crate::overlap::Overlap;
use crate::source::{EventSource, NotificationSink};
use crate::types::{
    Conflict, NotificationOutcome, NotificationSummary, OutcomeStatus, PairKey, ScanRequest,
    ScanResult, ScanScope,
};

/// Largest accepted lookahead: one leap year
const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// Detect every overlapping event pair that shares at least one member.
///
/// Each unordered pair is reported once no matter how many members it
/// shares. Pairs whose overlap rounds to zero minutes are dropped. The
/// result is ordered by overlap start, then by event ids.
pub fn detect_conflicts(events: &[Event]) -> Vec<Conflict> {
    let index = MemberIndex::build(events);
    let mut seen: HashSet<PairKey> = HashSet::new();
    let mut conflicts = Vec::new();

    for (member, member_events) in index.iter() {
        for (i, a) in member_events.iter().enumerate() {
            for b in &member_events[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                let Some(overlap) = Overlap::of_events(a, b) else {
                    continue;
                };
                if overlap.minutes() <= 0 {
                    continue;
                }
                if !seen.insert(PairKey::new(&a.id, &b.id)) {
                    continue;
                }

                debug!(
                    member = %member,
                    event_a = %a.id,
                    event_b = %b.id,
                    minutes = overlap.minutes(),
                    "Overlap detected"
                );
                conflicts.push(Conflict::new(a, b, overlap));
            }
        }
    }

    conflicts.sort_by(|x, y| {
        x.overlap_start
            .cmp(&y.overlap_start)
            .then_with(|| x.event_a.cmp(&y.event_a))
            .then_with(|| x.event_b.cmp(&y.event_b))
    });
    conflicts
}

/// Scans a family's upcoming events for scheduling conflicts
#[derive(Clone)]
pub struct ConflictScanner {
    events: Arc<dyn EventSource>,
    notifications: Arc<dyn NotificationSink>,
    default_window_hours: i64,
    channel: String,
    notify: bool,
}

impl ConflictScanner {
    pub fn new(events: Arc<dyn EventSource>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            events,
            notifications,
            default_window_hours: DEFAULT_WINDOW_HOURS,
            channel: "push".to_string(),
            notify: true,
        }
    }

    /// Create a scanner using the configured window and notification channel
    pub fn from_config(
        config: &ScannerConfig,
        events: Arc<dyn EventSource>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::new(events, notifications)
            .with_default_window_hours(config.default_window_hours)
            .with_channel(config.notification_channel.clone())
    }

    pub fn with_default_window_hours(mut self, hours: i64) -> Self {
        if hours > 0 {
            self.default_window_hours = hours.min(MAX_WINDOW_HOURS);
        }
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Enable or disable notification writes (disabled = dry run)
    pub fn with_notifications(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    /// Scan relative to the current time
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanResult> {
        self.scan_at(request, Utc::now()).await
    }

    /// Scan relative to an explicit `now`
    pub async fn scan_at(&self, request: &ScanRequest, now: DateTime<Utc>) -> Result<ScanResult> {
        self.scan_with_cancel(request, now, &CancellationToken::new())
            .await
    }

    /// Scan relative to `now`, stopping before any notification is written
    /// once `cancel` fires.
    pub async fn scan_with_cancel(
        &self,
        request: &ScanRequest,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<ScanResult> {
        // Event id wins over family id; neither is an invalid request
        let scope = request.scope()?;
        let family_given = request
            .family_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if matches!(scope, ScanScope::Event(_)) && family_given {
            warn!(scope = %scope, "Both event_id and family_id given, using event_id");
        }

        // Lookahead window [now, now + h)
        let window_hours = self.window_hours(request.check_window_hours);
        let window_start = now;
        let window_end = now + Duration::hours(window_hours);

        let family_id = self.resolve_family(&scope).await?;
        info!(
            scope = %scope,
            family = %family_id,
            window_hours,
            "Starting conflict scan"
        );

        let mut events = self
            .events
            .fetch_confirmed_events(&family_id, window_start, window_end)
            .await
            .map_err(|e| {
                error!(family = %family_id, "Failed to fetch events: {}", e);
                ConflictError::Fetch(e.to_string())
            })?;

        // Sources other than the SQLite store may hand back cancelled events
        let fetched = events.len();
        events.retain(Event::is_confirmed);
        if events.len() < fetched {
            warn!(
                family = %family_id,
                dropped = fetched - events.len(),
                "Event source returned non-confirmed events"
            );
        }

        if cancel.is_cancelled() {
            info!(family = %family_id, "Conflict scan cancelled after fetch");
            return Err(ConflictError::Cancelled);
        }

        // Detection is pure; nothing is written until every pair is known
        let conflicts = detect_conflicts(&events);

        if cancel.is_cancelled() {
            info!(family = %family_id, "Conflict scan cancelled before notifying");
            return Err(ConflictError::Cancelled);
        }

        let notifications = if self.notify {
            NotificationSummary::from_outcomes(self.dispatch(&conflicts).await)
        } else {
            NotificationSummary::default()
        };

        info!(
            family = %family_id,
            events = events.len(),
            conflicts = conflicts.len(),
            queued = notifications.queued,
            duplicates = notifications.duplicates,
            failed = notifications.failed.len(),
            "Conflict scan complete"
        );

        Ok(ScanResult {
            ok: true,
            scope,
            family_id,
            window_start,
            window_end,
            events_scanned: events.len(),
            conflicts_found: conflicts.len(),
            conflicts,
            notifications,
        })
    }

    fn window_hours(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(hours) if hours > 0 && hours <= MAX_WINDOW_HOURS => hours,
            Some(hours) => {
                warn!(
                    requested = hours,
                    fallback = self.default_window_hours,
                    "Window out of range, using default"
                );
                self.default_window_hours
            }
            None => self.default_window_hours,
        }
    }

    async fn resolve_family(&self, scope: &ScanScope) -> Result<String> {
        match scope {
            ScanScope::Family(family_id) => Ok(family_id.clone()),
            ScanScope::Event(event_id) => {
                let event = self
                    .events
                    .fetch_event_by_id(event_id)
                    .await
                    .map_err(|e| ConflictError::Fetch(e.to_string()))?
                    .ok_or_else(|| ConflictError::NotFound(event_id.clone()))?;

                event.family_id.ok_or_else(|| {
                    ConflictError::NotFound(format!("family of event {}", event_id))
                })
            }
        }
    }

    /// Write one notification per affected member of every conflict.
    ///
    /// Writes run concurrently and never abort each other; each reports
    /// its own outcome.
    async fn dispatch(&self, conflicts: &[Conflict]) -> Vec<NotificationOutcome> {
        // One request per (pair, affected member)
        let requests: Vec<(String, NewNotification)> = conflicts
            .iter()
            .flat_map(|conflict| {
                let pair_key = conflict.pair_key().to_string();
                let payload = conflict.payload();
                conflict.members_affected.iter().map(move |member_id| {
                    (
                        pair_key.clone(),
                        NewNotification::conflict(member_id.clone(), payload.clone(), &self.channel),
                    )
                })
            })
            .collect();

        let writes = requests.into_iter().map(|(pair_key, notification)| async move {
            let status = match self.notifications.insert_notification(&notification).await {
                Ok(true) => OutcomeStatus::Queued,
                Ok(false) => OutcomeStatus::Duplicate,
                Err(e) => {
                    let err = ConflictError::NotificationWrite(e.to_string());
                    warn!(
                        member = %notification.member_id,
                        pair = %pair_key,
                        "{}",
                        err
                    );
                    OutcomeStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            NotificationOutcome {
                member_id: notification.member_id,
                pair_key,
                status,
            }
        });

        join_all(writes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SqliteBackend;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use famcal_core::EventStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>, creator: &str, attendees: &[&str]) -> Event {
        attendees.iter().fold(
            Event::new(id, "cal-1", format!("Event {}", id), start, end, creator),
            |event, member| event.with_attendee(*member),
        )
    }

    async fn backend_with(events: &[Event]) -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        {
            let store = backend.store();
            let mut store = store.lock().await;
            store.upsert_family("fam-1", "Smiths").unwrap();
            store.upsert_family("fam-2", "Joneses").unwrap();
            store.upsert_calendar("cal-1", "fam-1", "Family").unwrap();
            store.upsert_calendar("cal-2", "fam-2", "Family").unwrap();
            for event in events {
                store.upsert_event(event).unwrap();
            }
        }
        backend
    }

    fn scanner(backend: &SqliteBackend) -> ConflictScanner {
        ConflictScanner::new(backend.event_source(), backend.notification_sink())
    }

    async fn notification_count(backend: &SqliteBackend) -> usize {
        backend.store().lock().await.count_notifications().unwrap()
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        async fn fetch_event_by_id(&self, _event_id: &str) -> famcal_core::Result<Option<Event>> {
            Err(famcal_core::Error::Other("connection reset".to_string()))
        }

        async fn fetch_confirmed_events(
            &self,
            _family_id: &str,
            _from: DateTime<Utc>,
            _until: DateTime<Utc>,
        ) -> famcal_core::Result<Vec<Event>> {
            Err(famcal_core::Error::Other("connection reset".to_string()))
        }
    }

    /// Returns a fixed event list whatever the query
    struct StaticSource {
        events: Vec<Event>,
    }

    #[async_trait]
    impl EventSource for StaticSource {
        async fn fetch_event_by_id(&self, event_id: &str) -> famcal_core::Result<Option<Event>> {
            Ok(self.events.iter().find(|e| e.id == event_id).cloned())
        }

        async fn fetch_confirmed_events(
            &self,
            _family_id: &str,
            _from: DateTime<Utc>,
            _until: DateTime<Utc>,
        ) -> famcal_core::Result<Vec<Event>> {
            Ok(self.events.clone())
        }
    }

    /// Fails writes addressed to one member and accepts everything else
    struct FlakySink {
        failing_member: String,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn insert_notification(&self, notification: &NewNotification) -> famcal_core::Result<bool> {
            if notification.member_id == self.failing_member {
                Err(famcal_core::Error::Other("write timeout".to_string()))
            } else {
                Ok(true)
            }
        }
    }

    #[test]
    fn test_touching_intervals_no_conflict() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(11, 0), at(12, 0), "m1", &[]),
        ];
        assert!(detect_conflicts(&events).is_empty());
    }

    #[test]
    fn test_minimal_overlap_detected() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 59), at(11, 30), "m1", &[]),
        ];
        let conflicts = detect_conflicts(&events);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].overlap_minutes, 1);
    }

    #[test]
    fn test_shared_members_reported_once() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "x", &["y"]),
            event("e2", at(10, 30), at(11, 30), "y", &["x"]),
        ];
        let conflicts = detect_conflicts(&events);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].members_affected, vec!["x", "y"]);
    }

    #[test]
    fn test_single_event_never_self_conflicts() {
        let events = vec![event("e1", at(10, 0), at(11, 0), "m1", &["m1", "m2"])];
        assert!(detect_conflicts(&events).is_empty());
    }

    #[test]
    fn test_unrelated_member_not_affected() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "x", &[]),
            event("e2", at(10, 30), at(11, 30), "x", &[]),
            event("e3", at(10, 15), at(10, 45), "z", &[]),
            event("e4", at(15, 0), at(16, 0), "z", &["x"]),
        ];
        let conflicts = detect_conflicts(&events);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].event_a, "e1");
        assert_eq!(conflicts[0].event_b, "e2");
        assert_eq!(conflicts[0].members_affected, vec!["x"]);
    }

    #[test]
    fn test_overlap_without_shared_member_ignored() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 0), at(11, 0), "m2", &[]),
        ];
        assert!(detect_conflicts(&events).is_empty());
    }

    #[test]
    fn test_sub_half_minute_overlap_dropped() {
        let events = vec![
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event(
                "e2",
                at(11, 0) - Duration::seconds(20),
                at(12, 0),
                "m1",
                &[],
            ),
        ];
        assert!(detect_conflicts(&events).is_empty());
    }

    #[test]
    fn test_conflicts_sorted_by_overlap_start() {
        let events = vec![
            event("e1", at(9, 0), at(12, 0), "m1", &[]),
            event("e2", at(11, 0), at(11, 30), "m1", &[]),
            event("e3", at(9, 30), at(10, 0), "m1", &[]),
        ];
        let conflicts = detect_conflicts(&events);
        let pairs: Vec<(&str, &str)> = conflicts
            .iter()
            .map(|c| (c.event_a.as_str(), c.event_b.as_str()))
            .collect();
        assert_eq!(pairs, vec![("e1", "e3"), ("e1", "e2")]);
    }

    #[tokio::test]
    async fn test_end_to_end_example() {
        let e1 = event("e1", at(14, 0), at(15, 0), "m1", &[]);
        let e2 = event("e2", at(14, 30), at(15, 30), "m2", &["m1"]);
        let backend = backend_with(&[e1, e2]).await;

        let result = scanner(&backend)
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.family_id, "fam-1");
        assert_eq!(result.events_scanned, 2);
        assert_eq!(result.conflicts_found, 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.event_a, "e1");
        assert_eq!(conflict.event_b, "e2");
        assert_eq!(conflict.overlap_minutes, 30);
        assert_eq!(conflict.members_affected, vec!["m1"]);

        assert_eq!(result.notifications.queued, 1);
        let store = backend.store();
        let store = store.lock().await;
        assert_eq!(store.list_notifications("m1").unwrap().len(), 1);
        assert!(store.list_notifications("m2").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_by_event_uses_owning_family() {
        let backend = backend_with(&[
            event("e1", at(14, 0), at(15, 0), "m1", &[]),
            event("e2", at(14, 30), at(15, 30), "m1", &[]),
            Event::new("o1", "cal-2", "Other", at(14, 0), at(15, 0), "m1"),
        ])
        .await;

        let result = scanner(&backend)
            .scan_at(&ScanRequest::for_event("e2"), now())
            .await
            .unwrap();

        assert_eq!(result.scope, ScanScope::Event("e2".to_string()));
        assert_eq!(result.family_id, "fam-1");
        assert_eq!(result.events_scanned, 2);
        assert_eq!(result.conflicts_found, 1);
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let backend = backend_with(&[]).await;
        let err = scanner(&backend)
            .scan_at(&ScanRequest::for_event("missing"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ConflictError::NotFound(_)));
        assert_eq!(notification_count(&backend).await, 0);
    }

    #[tokio::test]
    async fn test_missing_scope_is_invalid() {
        let backend = backend_with(&[]).await;
        let err = scanner(&backend)
            .scan_at(&ScanRequest::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ConflictError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_window_boundaries() {
        let window_end = now() + Duration::hours(24);
        let backend = backend_with(&[
            event("at-now", now(), now() + Duration::hours(2), "m1", &[]),
            event("inside", now() + Duration::hours(1), now() + Duration::hours(3), "m1", &[]),
            event("at-end", window_end, window_end + Duration::hours(1), "m1", &[]),
            event("late", window_end - Duration::minutes(1), window_end + Duration::hours(1), "m1", &[]),
            event("started", now() - Duration::hours(1), now() + Duration::hours(5), "m1", &[]),
        ])
        .await;

        let result = scanner(&backend)
            .scan_at(&ScanRequest::for_family("fam-1").with_window_hours(24), now())
            .await
            .unwrap();

        assert_eq!(result.window_end, window_end);
        assert_eq!(result.events_scanned, 3);
        assert_eq!(result.conflicts_found, 1);
        assert_eq!(result.conflicts[0].event_a, "at-now");
        assert_eq!(result.conflicts[0].event_b, "inside");
        assert_eq!(result.conflicts[0].overlap_minutes, 60);
    }

    #[tokio::test]
    async fn test_cancelled_events_excluded() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 30), at(11, 30), "m1", &[]).with_status(EventStatus::Cancelled),
        ])
        .await;

        let result = scanner(&backend)
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();
        assert_eq!(result.events_scanned, 1);
        assert_eq!(result.conflicts_found, 0);
    }

    #[tokio::test]
    async fn test_non_confirmed_events_from_source_ignored() {
        let backend = backend_with(&[]).await;
        let source = StaticSource {
            events: vec![
                event("e1", at(10, 0), at(11, 0), "m1", &[]),
                event("e2", at(10, 30), at(11, 30), "m1", &[]).with_status(EventStatus::Cancelled),
            ],
        };
        let scanner = ConflictScanner::new(Arc::new(source), backend.notification_sink());

        let result = scanner
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();
        assert_eq!(result.events_scanned, 1);
        assert_eq!(result.conflicts_found, 0);
        assert_eq!(notification_count(&backend).await, 0);
    }

    #[tokio::test]
    async fn test_colon_bearing_ids_each_notified() {
        // Member "a:b" on (c, d) and member "a" on (b:c, d) must not share a key
        let backend = backend_with(&[
            event("c", at(10, 0), at(11, 0), "a:b", &[]),
            event("d", at(10, 30), at(11, 30), "a:b", &["a"]),
            event("b:c", at(10, 15), at(10, 45), "a", &[]),
        ])
        .await;

        let result = scanner(&backend)
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();

        assert_eq!(result.conflicts_found, 2);
        assert_eq!(result.notifications.queued, 2);
        assert_eq!(result.notifications.duplicates, 0);
        assert_eq!(notification_count(&backend).await, 2);
    }

    #[tokio::test]
    async fn test_rescan_is_deterministic_and_idempotent() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "x", &["y"]),
            event("e2", at(10, 30), at(11, 30), "y", &["x"]),
            event("e3", at(10, 45), at(12, 0), "x", &[]),
        ])
        .await;
        let scanner = scanner(&backend);
        let request = ScanRequest::for_family("fam-1");

        let first = scanner.scan_at(&request, now()).await.unwrap();
        let second = scanner.scan_at(&request, now()).await.unwrap();

        assert_eq!(first.conflicts, second.conflicts);
        assert_eq!(first.conflicts_found, 3);
        // e1/e2 -> x, y; e1/e3 -> x; e2/e3 -> x
        assert_eq!(first.notifications.queued, 4);
        assert_eq!(second.notifications.queued, 0);
        assert_eq!(second.notifications.duplicates, 4);
        assert_eq!(notification_count(&backend).await, 4);
    }

    #[tokio::test]
    async fn test_write_failures_collected_not_fatal() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "x", &["y"]),
            event("e2", at(10, 30), at(11, 30), "y", &["x"]),
        ])
        .await;
        let sink = Arc::new(FlakySink {
            failing_member: "x".to_string(),
        });
        let scanner = ConflictScanner::new(backend.event_source(), sink);

        let result = scanner
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.conflicts_found, 1);
        assert_eq!(result.notifications.queued, 1);
        assert_eq!(result.notifications.failed.len(), 1);
        let failed = &result.notifications.failed[0];
        assert_eq!(failed.member_id, "x");
        assert_eq!(failed.pair_key, "e1:e2");
        assert!(matches!(failed.status, OutcomeStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let backend = backend_with(&[]).await;
        let scanner = ConflictScanner::new(Arc::new(FailingSource), backend.notification_sink());

        let err = scanner
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ConflictError::Fetch(_)));

        let err = scanner
            .scan_at(&ScanRequest::for_event("e1"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ConflictError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_cancelled_scan_writes_nothing() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 30), at(11, 30), "m1", &[]),
        ])
        .await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = scanner(&backend)
            .scan_with_cancel(&ScanRequest::for_family("fam-1"), now(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ConflictError::Cancelled));
        assert_eq!(notification_count(&backend).await, 0);
    }

    #[tokio::test]
    async fn test_dry_run_skips_notifications() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 30), at(11, 30), "m1", &[]),
        ])
        .await;

        let result = scanner(&backend)
            .with_notifications(false)
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();
        assert_eq!(result.conflicts_found, 1);
        assert_eq!(result.notifications.attempted(), 0);
        assert_eq!(notification_count(&backend).await, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_window_falls_back_to_default() {
        let backend = backend_with(&[]).await;
        let scanner = scanner(&backend).with_default_window_hours(48);

        let result = scanner
            .scan_at(&ScanRequest::for_family("fam-1").with_window_hours(-5), now())
            .await
            .unwrap();
        assert_eq!(result.window_end, now() + Duration::hours(48));

        let result = scanner
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();
        assert_eq!(result.window_end, now() + Duration::hours(48));
    }

    #[tokio::test]
    async fn test_channel_from_config() {
        let backend = backend_with(&[
            event("e1", at(10, 0), at(11, 0), "m1", &[]),
            event("e2", at(10, 30), at(11, 30), "m1", &[]),
        ])
        .await;
        let config = ScannerConfig {
            default_window_hours: 24,
            notification_channel: "email".to_string(),
        };
        let scanner =
            ConflictScanner::from_config(&config, backend.event_source(), backend.notification_sink());

        scanner
            .scan_at(&ScanRequest::for_family("fam-1"), now())
            .await
            .unwrap();

        let store = backend.store();
        let store = store.lock().await;
        let stored = store.list_notifications("m1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].channel, "email");
    }
}
