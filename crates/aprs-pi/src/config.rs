//! Configuration management for aprs-pi.
//!
//! Configuration is loaded with figment from defaults, an optional TOML file
//! and the environment. The station section doubles as the payload served by
//! `GET /api/config`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "aprs-pi";

/// Prefix for fully-qualified environment overrides.
const ENV_PREFIX: &str = "APRS_PI_";

/// Station variables read unprefixed, as set by the docker-compose deployment.
const STATION_ENV_VARS: &[&str] = &[
    "CALLSIGN",
    "LAT",
    "LON",
    "BEACON_MESSAGE",
    "BEACON_INTERVAL",
];

/// Shortest beacon interval we accept, in seconds.
pub const MIN_BEACON_INTERVAL: u32 = 60;

/// Longest APRS position comment.
pub const MAX_BEACON_MESSAGE_LEN: usize = 43;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables prefixed with `APRS_PI_` (`__` nests sections)
/// 2. Station variables `CALLSIGN`, `LAT`, `LON`, `BEACON_MESSAGE`, `BEACON_INTERVAL`
/// 3. TOML config file at `~/.config/aprs-pi/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API server configuration.
    pub server: ServerConfig,
    /// Station (beacon) configuration.
    pub station: StationConfig,
    /// Hardware probe configuration.
    pub hardware: HardwareConfig,
    /// Project check configuration.
    pub checks: ChecksConfig,
}

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Log file tailed by `GET /api/logs`. Demo entries are served when unset
    /// or missing.
    pub log_file: Option<PathBuf>,
    /// Program and arguments run by `POST /api/restart`. Empty means the
    /// restart is only simulated.
    pub restart_command: Vec<String>,
    /// Seconds to wait for the restart command.
    pub restart_timeout_secs: u64,
}

/// Beacon station settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Station callsign, optionally with an SSID suffix.
    pub callsign: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Position comment sent with each beacon.
    pub beacon_message: String,
    /// Seconds between beacons.
    pub beacon_interval: u32,
}

/// Where the hardware probe looks for devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// sysfs directory listing USB devices.
    pub usb_devices_dir: PathBuf,
    /// Serial device nodes a GPS receiver may appear on.
    pub gps_device_paths: Vec<PathBuf>,
    /// ALSA card listing.
    pub sound_cards_file: PathBuf,
}

/// Settings for the project check harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Documents that must exist at the project root.
    pub required_docs: Vec<String>,
    /// Minimum trimmed length of each required document.
    pub min_doc_length: usize,
    /// Variables docker-compose.yml must mention.
    pub essential_env_vars: Vec<String>,
    /// Files under `config/` that must be regular files when present.
    pub config_files: Vec<String>,
    /// Timeout for docker-compose and health-check runs, in seconds.
    pub command_timeout_secs: u64,
    /// Timeout for each per-script syntax check, in seconds.
    pub script_timeout_secs: u64,
    /// Timeout for the docker build dry run, in seconds.
    pub docker_build_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            log_file: None,
            restart_command: Vec::new(),
            restart_timeout_secs: 30,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            callsign: "N0CALL".to_string(),
            latitude: 53.8008,
            longitude: -1.5491,
            beacon_message: "Leeds APRS Pi Station".to_string(),
            beacon_interval: 600,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            usb_devices_dir: PathBuf::from("/sys/bus/usb/devices"),
            gps_device_paths: vec![
                PathBuf::from("/dev/ttyACM0"),
                PathBuf::from("/dev/ttyUSB0"),
                PathBuf::from("/dev/serial0"),
            ],
            sound_cards_file: PathBuf::from("/proc/asound/cards"),
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            required_docs: [
                "README.md",
                "SETUP_GUIDE.md",
                "API_DOCUMENTATION.md",
                "CONTRIBUTING.md",
                "PROJECT_DOCUMENTATION.md",
            ]
            .map(String::from)
            .to_vec(),
            min_doc_length: 100,
            essential_env_vars: ["CALLSIGN", "APRS_PASS", "LAT", "LON"]
                .map(String::from)
                .to_vec(),
            config_files: ["direwolf.conf", "beacon.conf"].map(String::from).to_vec(),
            command_timeout_secs: 30,
            script_timeout_secs: 10,
            docker_build_timeout_secs: 60,
        }
    }
}

fn callsign_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]{1,6}(-[A-Za-z0-9]{1,2})?$").expect("callsign pattern is valid")
    })
}

impl StationConfig {
    /// Trim and uppercase the callsign, the form it is beaconed in.
    pub fn normalize(&mut self) {
        self.callsign = self.callsign.trim().to_uppercase();
    }

    /// Validate the station settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !callsign_pattern().is_match(&self.callsign) {
            return Err(Error::validation(format!(
                "callsign '{}' must be 1-6 letters or digits with an optional -SSID",
                self.callsign
            )));
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::validation(format!(
                "latitude {} must be between -90 and 90",
                self.latitude
            )));
        }

        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::validation(format!(
                "longitude {} must be between -180 and 180",
                self.longitude
            )));
        }

        if self.beacon_interval < MIN_BEACON_INTERVAL {
            return Err(Error::validation(format!(
                "beacon_interval must be at least {MIN_BEACON_INTERVAL} seconds"
            )));
        }

        if self.beacon_message.chars().count() > MAX_BEACON_MESSAGE_LEN {
            return Err(Error::validation(format!(
                "beacon_message must be at most {MAX_BEACON_MESSAGE_LEN} characters"
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let mut config: Config = Self::figment(&config_file).extract()?;
        config.station.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist.
    ///
    /// Unlike [`Config::load_from`], a missing file is an error rather than
    /// a fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if `path` is not a file, or any
    /// error from [`Config::load_from`].
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::load_from(Some(path.to_path_buf()))
    }

    /// Build the layered figment for a config file.
    #[must_use]
    pub fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::raw().only(STATION_ENV_VARS).map(station_env_key))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.station.validate()?;

        if self.server.bind.trim().is_empty() {
            return Err(Error::validation("server.bind must not be empty"));
        }

        if self.server.restart_timeout_secs == 0 {
            return Err(Error::validation(
                "server.restart_timeout_secs must be greater than 0",
            ));
        }

        if self.checks.command_timeout_secs == 0
            || self.checks.script_timeout_secs == 0
            || self.checks.docker_build_timeout_secs == 0
        {
            return Err(Error::validation("check timeouts must be greater than 0"));
        }

        Ok(())
    }

    /// The socket address string the server binds.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Get the restart command timeout as a Duration.
    #[must_use]
    pub fn restart_timeout(&self) -> Duration {
        Duration::from_secs(self.server.restart_timeout_secs)
    }
}

/// Map an unprefixed station variable to its key in the `station` section.
fn station_env_key(key: &figment::value::UncasedStr) -> Uncased<'_> {
    let field = match key.as_str().to_ascii_uppercase().as_str() {
        "LAT" => "latitude",
        "LON" => "longitude",
        "BEACON_MESSAGE" => "beacon_message",
        "BEACON_INTERVAL" => "beacon_interval",
        _ => "callsign",
    };
    format!("station.{field}").into()
}
