//! famcal-api: HTTP trigger surface for conflict scans
//!
//! Exposes the conflict scanner over HTTP so a backend job, a database
//! webhook, or the mobile app can request a scan.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, app, start_server};
