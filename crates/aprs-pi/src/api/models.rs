//! JSON bodies served by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StationConfig;
use crate::hardware::HardwareStatus;

/// Literal version string reported by `/api/health` and `/`.
pub const API_VERSION: &str = "1.1.0";

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// The beacon service is running.
    pub aprs: bool,
    /// A GPS fix source is available.
    pub gps: bool,
    /// Configured station callsign.
    pub callsign: String,
    /// Seconds since the server started.
    pub uptime: u64,
    /// Beacons sent since start.
    pub packets_sent: u64,
    /// Packets heard since start.
    pub packets_received: u64,
    /// Device presence.
    pub hardware: HardwareStatus,
    /// Host load.
    pub metrics: SystemMetrics,
    /// When this status was produced.
    pub timestamp: DateTime<Utc>,
}

/// Host CPU and memory usage in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Global CPU usage.
    pub cpu_usage: f32,
    /// Used share of physical memory.
    pub memory_usage: f32,
}

/// Partial station settings accepted by `POST /api/config`.
///
/// Absent (or `null`) fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationUpdate {
    /// New callsign.
    pub callsign: Option<String>,
    /// New latitude.
    pub latitude: Option<f64>,
    /// New longitude.
    pub longitude: Option<f64>,
    /// New beacon comment.
    pub beacon_message: Option<String>,
    /// New beacon interval in seconds.
    pub beacon_interval: Option<u32>,
}

impl StationUpdate {
    /// Overlay this update on `current`, normalizing the result.
    #[must_use]
    pub fn apply(self, current: &StationConfig) -> StationConfig {
        let mut station = StationConfig {
            callsign: self.callsign.unwrap_or_else(|| current.callsign.clone()),
            latitude: self.latitude.unwrap_or(current.latitude),
            longitude: self.longitude.unwrap_or(current.longitude),
            beacon_message: self
                .beacon_message
                .unwrap_or_else(|| current.beacon_message.clone()),
            beacon_interval: self.beacon_interval.unwrap_or(current.beacon_interval),
        };
        station.normalize();
        station
    }
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something looks wrong.
    Warning,
    /// Something failed.
    Error,
}

/// One entry of `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Severity.
    pub level: LogLevel,
    /// Log text.
    pub message: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Always `healthy` while the server answers.
    pub status: String,
    /// When the check was answered.
    pub timestamp: DateTime<Utc>,
    /// API version literal.
    pub version: String,
}

impl Health {
    /// A healthy answer stamped now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            version: API_VERSION.to_string(),
        }
    }
}

/// Success body for state-changing requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Always `success`.
    pub status: String,
    /// What happened.
    pub message: String,
    /// The resulting station config, for config updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<StationConfig>,
}

impl ActionResponse {
    /// A success body with a message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            config: None,
        }
    }

    /// Attach the updated station config.
    #[must_use]
    pub fn with_config(mut self, config: StationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_update_apply_partial() {
        let current = StationConfig::default();
        let update = StationUpdate {
            callsign: Some(" g0test-9 ".to_string()),
            beacon_interval: Some(900),
            ..StationUpdate::default()
        };

        let merged = update.apply(&current);
        assert_eq!(merged.callsign, "G0TEST-9");
        assert_eq!(merged.beacon_interval, 900);
        assert_eq!(merged.latitude, current.latitude);
        assert_eq!(merged.beacon_message, current.beacon_message);
    }

    #[test]
    fn test_station_update_deserialize_with_nulls() {
        let update: StationUpdate =
            serde_json::from_str(r#"{"latitude": null, "longitude": -2.0}"#).unwrap();
        assert!(update.latitude.is_none());
        assert_eq!(update.longitude, Some(-2.0));
    }

    #[test]
    fn test_log_level_serialize() {
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), "\"info\"");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_health_now() {
        let health = Health::now();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, API_VERSION);
    }

    #[test]
    fn test_action_response_skips_missing_config() {
        let json = serde_json::to_value(ActionResponse::success("Restart initiated")).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("config").is_none());

        let json = serde_json::to_value(
            ActionResponse::success("Configuration updated").with_config(StationConfig::default()),
        )
        .unwrap();
        assert_eq!(json["config"]["callsign"], "N0CALL");
    }

    #[test]
    fn test_status_field_names() {
        let status = Status {
            aprs: true,
            gps: false,
            callsign: "G0TEST".to_string(),
            uptime: 3600,
            packets_sent: 6,
            packets_received: 0,
            hardware: HardwareStatus::default(),
            metrics: SystemMetrics {
                cpu_usage: 25.0,
                memory_usage: 60.0,
            },
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&status).unwrap();
        for key in [
            "aprs",
            "gps",
            "callsign",
            "uptime",
            "packets_sent",
            "packets_received",
            "hardware",
            "metrics",
            "timestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["metrics"]["cpu_usage"], 25.0);
    }
}
