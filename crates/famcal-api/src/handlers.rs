//! HTTP API handlers
//!
//! Request handlers for conflict scans and health checks.

use axum::{Json, body::Bytes, extract::State};
use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use famcal_conflict::{ScanRequest, ScanResult};

use crate::Result;
use crate::error::ApiError;
use crate::server::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Conflict scan endpoint
///
/// Accepts `{ event_id?, family_id?, check_window_hours? }`. The body is read
/// leniently: unparseable JSON or mistyped fields fall back to defaults, and
/// a request that ends up without a scope is rejected by the scanner.
pub async fn conflict_alerts(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ScanResult>> {
    let request = parse_scan_request(&body);
    debug!("Conflict scan request: {:?}", request);

    // Shutdown cancels the scan before any notification is written
    match state
        .scanner
        .scan_with_cancel(&request, Utc::now(), &state.shutdown)
        .await
    {
        Ok(result) => {
            info!(
                family = %result.family_id,
                conflicts = result.conflicts_found,
                "Conflict scan served"
            );
            Ok(Json(result))
        }
        Err(e) => {
            // Client mistakes are expected traffic; only 5xx are errors
            let err = ApiError::from(e);
            if err.status_code().is_server_error() {
                error!("Conflict scan failed: {}", err);
            } else {
                info!("Conflict scan rejected: {}", err);
            }
            Err(err)
        }
    }
}

/// Read a scan request, ignoring anything that does not fit
pub fn parse_scan_request(body: &[u8]) -> ScanRequest {
    // Empty body: no scope, rejected downstream
    if body.iter().all(u8::is_ascii_whitespace) {
        return ScanRequest::default();
    }

    let value: JsonValue = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable scan payload, using defaults: {}", e);
            return ScanRequest::default();
        }
    };

    let Some(object) = value.as_object() else {
        warn!("Scan payload is not a JSON object, using defaults");
        return ScanRequest::default();
    };

    // Ids must be strings; anything else is dropped
    let string_field = |name: &str| match object.get(name) {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(field = name, "Ignoring non-string value: {}", other);
            None
        }
    };

    // Hours may arrive as a number or a numeric string
    let check_window_hours = match object.get("check_window_hours") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        Some(other) => {
            warn!("Ignoring invalid check_window_hours: {}", other);
            None
        }
    };

    ScanRequest {
        event_id: string_field("event_id"),
        family_id: string_field("family_id"),
        check_window_hours,
    }
}
