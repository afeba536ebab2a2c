//! Request handlers.
//!
//! Each handler returns a literal or trivially computed JSON body. Failures
//! surface as [`ApiError`], which renders the JSON error shape.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::logs;
use super::models::{
    ActionResponse, Health, LogEntry, Status, StationUpdate, SystemMetrics, API_VERSION,
};
use super::state::SharedState;
use crate::config::StationConfig;
use crate::error::Error;
use crate::hardware::HardwareStatus;
use crate::process;

/// Routes listed by `GET /`.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/status", "Station and host status"),
    ("GET", "/api/config", "Current station configuration"),
    ("POST", "/api/config", "Update station configuration"),
    ("GET", "/api/logs?lines=N", "Most recent log entries"),
    ("POST", "/api/restart", "Restart the beacon service"),
    ("GET", "/api/health", "Liveness check"),
];

/// Query string of `GET /api/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    /// Requested entry count, parsed leniently.
    pub lines: Option<String>,
}

/// `GET /`
pub async fn index() -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path, description)| {
            json!({ "method": method, "path": path, "description": description })
        })
        .collect();

    Json(json!({
        "name": "Leeds APRS Pi API",
        "version": API_VERSION,
        "endpoints": endpoints,
    }))
}

/// Device presence and host load, read off the async workers.
async fn sample_host(state: &SharedState) -> Result<(HardwareStatus, SystemMetrics), Error> {
    let state = Arc::clone(state);
    let sample =
        tokio::task::spawn_blocking(move || (state.probe().probe(), state.metrics().sample()))
            .await?;
    Ok(sample)
}

/// Device presence alone, read off the async workers.
async fn sample_hardware(state: &SharedState) -> Result<HardwareStatus, Error> {
    let state = Arc::clone(state);
    Ok(tokio::task::spawn_blocking(move || state.probe().probe()).await?)
}

/// `GET /api/status`
///
/// # Errors
///
/// Returns 500 if sampling the host fails.
pub async fn status(State(state): State<SharedState>) -> Result<Json<Status>, ApiError> {
    let station = state.station();
    let uptime = state.uptime_secs();
    let (hardware, metrics) = sample_host(&state).await?;

    Ok(Json(Status {
        aprs: true,
        gps: hardware.gps_device,
        callsign: station.callsign,
        uptime,
        packets_sent: uptime / u64::from(station.beacon_interval.max(1)),
        packets_received: 0,
        hardware,
        metrics,
        timestamp: Utc::now(),
    }))
}

/// `GET /api/config`
pub async fn get_config(State(state): State<SharedState>) -> Json<StationConfig> {
    Json(state.station())
}

/// `POST /api/config`
///
/// # Errors
///
/// Rejects unparsable bodies with the extractor's status and invalid
/// settings with 400.
pub async fn update_config(
    State(state): State<SharedState>,
    payload: Result<Json<StationUpdate>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(update) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected config update body");
        ApiError::new(rejection.status(), rejection.body_text())
    })?;

    let station = update.apply(&state.station());
    station.validate()?;
    state.set_station(station.clone());

    info!(
        callsign = %station.callsign,
        interval = station.beacon_interval,
        "station configuration updated"
    );
    Ok(Json(
        ActionResponse::success("Configuration updated").with_config(station),
    ))
}

/// `GET /api/logs?lines=N`
///
/// # Errors
///
/// Returns 500 if the configured log file exists but cannot be read.
pub async fn recent_logs(
    State(state): State<SharedState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    // An unparsable query string counts as no query
    let query = query.map_or_else(
        |rejection| {
            debug!(error = %rejection.body_text(), "ignoring logs query");
            LogsQuery::default()
        },
        |Query(query)| query,
    );
    let lines = logs::parse_lines(query.lines.as_deref());

    if let Some(path) = state.config().server.log_file.as_deref() {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = %path.display(), lines, "tailing log file");
            return Ok(Json(logs::tail_file(path, lines).await?));
        }
        debug!(path = %path.display(), "log file missing, serving demo entries");
    }

    let hardware = sample_hardware(&state).await?;
    Ok(Json(logs::demo_entries(
        Utc::now(),
        &state.station().callsign,
        hardware,
        lines,
    )))
}

/// `POST /api/restart`
///
/// # Errors
///
/// Returns 500 if the configured restart command cannot run, times out or
/// exits unsuccessfully.
pub async fn restart(State(state): State<SharedState>) -> Result<Json<ActionResponse>, ApiError> {
    let count = state.record_restart();

    match state.config().server.restart_command.split_first() {
        Some((program, args)) => {
            let command = process::describe(program, args);
            info!(%command, count, "running restart command");

            let output = process::run(program, args, None, state.config().restart_timeout()).await?;
            if !output.success() {
                let detail = match output.stderr.trim() {
                    "" => format!("exit code {:?}", output.code),
                    stderr => stderr.to_string(),
                };
                return Err(Error::restart_failed(command, detail).into());
            }
        }
        None => info!(count, "restart requested (simulated)"),
    }

    Ok(Json(ActionResponse::success("Restart initiated")))
}

/// `GET /api/health`
pub async fn health() -> Json<Health> {
    Json(Health::now())
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HardwareConfig};
    use crate::api::AppState;
    use tempfile::TempDir;

    fn state_with_gps(dir: &TempDir) -> SharedState {
        let gps = dir.path().join("ttyACM0");
        std::fs::write(&gps, "").unwrap();
        let mut config = Config::default();
        config.hardware = HardwareConfig {
            usb_devices_dir: dir.path().join("usb"),
            gps_device_paths: vec![gps],
            sound_cards_file: dir.path().join("cards"),
        };
        AppState::new(config)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_sample_host_on_single_thread_runtime() {
        let dir = TempDir::new().unwrap();
        let state = state_with_gps(&dir);

        let (hardware, metrics) = sample_host(&state).await.unwrap();
        assert!(hardware.gps_device);
        assert!(!hardware.rtl_sdr);
        assert!((0.0..=100.0).contains(&metrics.memory_usage));

        let hardware = sample_hardware(&state).await.unwrap();
        assert!(hardware.gps_device);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_status_reports_sampled_hardware() {
        let dir = TempDir::new().unwrap();
        let state = state_with_gps(&dir);

        let Json(status) = status(State(state)).await.unwrap();
        assert!(status.gps);
        assert!(status.hardware.gps_device);
        assert_eq!(status.callsign, "N0CALL");
    }
}
