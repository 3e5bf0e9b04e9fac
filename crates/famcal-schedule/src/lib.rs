//! Scheduled conflict scans
//!
//! Runs conflict scans for configured families on cron schedules.

mod config;
mod error;
mod scheduler;

pub use config::{ScanSchedule, ScheduleConfig};
pub use error::{Result, ScheduleError};
pub use scheduler::{Scheduler, SchedulerHandle};
