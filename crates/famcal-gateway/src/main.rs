//! famcal: family calendar conflict scanner
//!
//! Usage:
//!   famcal                                  - Start server mode (HTTP API + scheduler)
//!   famcal --scan-family <id> [--window <hours>] [--dry-run]
//!                                           - Run one scan and print the result
//!   famcal --help                           - Show help

use anyhow::{Context, bail};
use famcal_conflict::{ConflictScanner, ScanRequest, SqliteBackend};
use famcal_core::Config;
use famcal_schedule::{ScheduleConfig, Scheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Server mode (HTTP API + scheduler)
    Server,
    /// One-off scan of a family
    Scan {
        family_id: String,
        window_hours: Option<i64>,
        dry_run: bool,
    },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("famcal {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().context("Config error")?;

    tracing::info!("Starting famcal...");
    tracing::info!("Database: {}", config.database.db_path);

    // Open the calendar store and build the scanner
    let backend = SqliteBackend::open(&config.database.db_path)
        .context("Failed to open calendar database")?;
    let scanner = ConflictScanner::from_config(
        &config.scanner,
        backend.event_source(),
        backend.notification_sink(),
    );

    match mode {
        RunMode::Scan {
            family_id,
            window_hours,
            dry_run,
        } => run_scan(scanner, family_id, window_hours, dry_run).await,
        RunMode::Server => run_server(config, scanner).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut family_id = None;
    let mut window_hours = None;
    let mut dry_run = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--scan-family" | "-f" => {
                family_id = Some(args.next().context("--scan-family requires a family id")?);
            }
            "--window" | "-w" => {
                let value = args.next().context("--window requires a number of hours")?;
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid --window value: {}", value))?;
                window_hours = Some(hours);
            }
            "--dry-run" | "-n" => dry_run = true,
            other => bail!("Unknown argument: {} (see --help)", other),
        }
    }

    match family_id {
        Some(family_id) => Ok(RunMode::Scan {
            family_id,
            window_hours,
            dry_run,
        }),
        None if window_hours.is_some() || dry_run => {
            bail!("--window and --dry-run require --scan-family")
        }
        None => Ok(RunMode::Server),
    }
}

fn print_help() {
    println!("famcal - family calendar conflict scanner");
    println!();
    println!("Usage:");
    println!("  famcal                        Start server mode (HTTP API + scheduler)");
    println!("  famcal --scan-family <id>     Scan one family and print the result");
    println!("         [--window <hours>]     Lookahead window (default: SCAN_WINDOW_HOURS)");
    println!("         [--dry-run]            Detect conflicts without writing notifications");
    println!("  famcal --help                 Show this help message");
    println!("  famcal --version              Show version");
    println!();
    println!("Environment Variables:");
    println!("  API_PORT                HTTP API port (default: 3000)");
    println!("  API_ALLOWED_ORIGINS     Comma-separated CORS origins (default: any)");
    println!("  DB_PATH                 SQLite database path (default: data/famcal.db)");
    println!("  SCAN_WINDOW_HOURS       Default lookahead in hours (default: 168)");
    println!("  NOTIFICATION_CHANNEL    Channel for conflict notifications (default: push)");
    println!("  SCHEDULE_ENABLED        Run scheduled scans (default: true)");
    println!("  SCHEDULE_CONFIG_PATH    Path to schedule file (default: schedule.toml)");
}

/// Run one scan and print it as JSON
async fn run_scan(
    scanner: ConflictScanner,
    family_id: String,
    window_hours: Option<i64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let scanner = scanner.with_notifications(!dry_run);
    let request = ScanRequest {
        event_id: None,
        family_id: Some(family_id),
        check_window_hours: window_hours,
    };

    let result = scanner.scan(&request).await.context("Scan failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Run server mode (HTTP API + scheduler)
async fn run_server(config: Config, scanner: ConflictScanner) -> anyhow::Result<()> {
    // Shared by the HTTP API and the scheduler
    let shutdown = CancellationToken::new();

    // Start scheduled scans if enabled
    let scheduler_handle = if config.scheduler.enabled {
        let schedule_config = load_schedules(&config)?;
        if schedule_config.schedules.is_empty() {
            tracing::info!("No schedules configured, scheduler idle");
            None
        } else {
            Some(
                Scheduler::new(schedule_config, scanner.clone())
                    .with_cancellation(shutdown.clone())
                    .start(),
            )
        }
    } else {
        tracing::info!("Scheduler is disabled");
        None
    };

    // Start HTTP API server
    let api_port = config.api.port;
    let api_shutdown = shutdown.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = famcal_api::start_server(config, scanner, api_shutdown).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });
    tracing::info!("HTTP API server started on port {}", api_port);

    tracing::info!("famcal initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    // Cancel in-flight scans, then wait for the loops and the server
    shutdown.cancel();
    if let Some(handle) = scheduler_handle {
        handle.stop().await;
    }
    if let Err(e) = api_handle.await {
        tracing::warn!("HTTP API task ended abnormally: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn load_schedules(config: &Config) -> anyhow::Result<ScheduleConfig> {
    match &config.scheduler.config_path {
        Some(path) => {
            tracing::info!("Loading schedules from: {}", path);
            ScheduleConfig::from_file(path)
                .with_context(|| format!("Failed to load schedule file {}", path))
        }
        None => ScheduleConfig::load_default().context("Failed to load schedule file"),
    }
}
