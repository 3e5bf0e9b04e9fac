//! Scheduler
//!
//! Runs conflict scans on cron schedules until told to stop.

use std::time::Duration;

use chrono::Utc;
use cron::Schedule as CronSchedule;
use famcal_conflict::{ConflictScanner, ScanResult};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ScanSchedule, ScheduleConfig};

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop all schedule loops and wait for them to finish.
    ///
    /// A scan still in flight is cancelled before it writes notifications.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Cron-driven conflict scan runner
pub struct Scheduler {
    config: ScheduleConfig,
    scanner: ConflictScanner,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig, scanner: ConflictScanner) -> Self {
        Self {
            config,
            scanner,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with the rest of the process
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Spawn one loop per enabled schedule
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            let enabled = self.config.enabled_schedules();
            info!(
                "Scheduler started ({} of {} schedules enabled)",
                enabled.len(),
                self.config.schedules.len()
            );

            // One loop per schedule, each with its own shutdown receiver
            let mut task_handles = Vec::with_capacity(enabled.len());
            for schedule in enabled {
                let schedule = schedule.clone();
                let scanner = self.scanner.clone();
                let cancel = self.cancel.clone();
                let mut rx = shutdown_rx.resubscribe();

                task_handles.push(tokio::spawn(async move {
                    run_schedule(schedule, scanner, cancel, &mut rx).await;
                }));
            }
            drop(shutdown_rx);

            // Wait for every loop to exit
            for handle in task_handles {
                let _ = handle.await;
            }

            info!("Scheduler stopped");
        });

        SchedulerHandle {
            shutdown_tx,
            cancel,
            handle,
        }
    }
}

async fn run_schedule(
    schedule: ScanSchedule,
    scanner: ConflictScanner,
    cancel: CancellationToken,
    shutdown_rx: &mut broadcast::Receiver<()>,
) {
    // Parse the cron expression
    let cron = match parse_cron(&schedule.cron) {
        Ok(cron) => cron,
        Err(e) => {
            error!(schedule = %schedule.name, "Cron parse error: {}", e);
            return;
        }
    };

    info!(
        schedule = %schedule.name,
        cron = %schedule.cron,
        family = %schedule.family_id,
        "Schedule loop started"
    );

    loop {
        // Next run time
        let now = Utc::now();
        let Some(next) = cron.upcoming(Utc).next() else {
            warn!(schedule = %schedule.name, "No upcoming run time, stopping");
            break;
        };

        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(
            schedule = %schedule.name,
            next = %next.format("%Y-%m-%d %H:%M:%S"),
            "Waiting for next run"
        );

        // Sleep until the run time unless shutdown comes first
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match run_scan(&schedule, &scanner, &cancel).await {
                    Ok(result) => info!(
                        schedule = %schedule.name,
                        family = %result.family_id,
                        events = result.events_scanned,
                        conflicts = result.conflicts_found,
                        queued = result.notifications.queued,
                        "Scheduled scan finished"
                    ),
                    Err(e) => error!(schedule = %schedule.name, "Scheduled scan failed: {}", e),
                }
            }
            _ = shutdown_rx.recv() => {
                info!(schedule = %schedule.name, "Shutdown requested");
                break;
            }
            _ = cancel.cancelled() => {
                info!(schedule = %schedule.name, "Cancelled");
                break;
            }
        }
    }
}

async fn run_scan(
    schedule: &ScanSchedule,
    scanner: &ConflictScanner,
    cancel: &CancellationToken,
) -> famcal_conflict::Result<ScanResult> {
    info!(schedule = %schedule.name, "Running scheduled scan");
    scanner
        .scan_with_cancel(&schedule.scan_request(), Utc::now(), cancel)
        .await
}

fn parse_cron(expr: &str) -> Result<CronSchedule, cron::error::Error> {
    // Six fields, seconds first: "0 0 2 * * *" = daily at 02:00 UTC
    expr.parse::<CronSchedule>()
}
