//! famcal-conflict: Scheduling-conflict detection for family calendars
//!
//! Given a family (or one event of that family) and a lookahead window, the
//! [`ConflictScanner`] loads the confirmed events starting in the window,
//! indexes them per involved member, finds every overlapping pair once, and
//! queues one notification per affected member.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use famcal_conflict::{ConflictScanner, ScanRequest, SqliteBackend};
//!
//! let backend = SqliteBackend::open("data/famcal.db")?;
//! let scanner = ConflictScanner::new(backend.event_source(), backend.notification_sink());
//!
//! let result = scanner.scan(&ScanRequest::for_family("fam-1")).await?;
//! println!("{} conflicts", result.conflicts_found);
//! ```

pub mod error;
pub mod index;
pub mod overlap;
pub mod scanner;
pub mod source;
pub mod types;

pub use error::{ConflictError, Result};
pub use index::MemberIndex;
pub use overlap::Overlap;
pub use scanner::{ConflictScanner, detect_conflicts};
pub use source::{EventSource, NotificationSink, SqliteBackend};
pub use types::{
    Conflict, NotificationOutcome, NotificationSummary, OutcomeStatus, PairKey, ScanRequest,
    ScanResult, ScanScope,
};
