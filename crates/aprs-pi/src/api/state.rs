//! State shared by the request handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::config::{Config, StationConfig};
use crate::hardware::HardwareProbe;

use super::metrics::MetricsSampler;

/// Handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Everything the handlers read or update.
///
/// Locks are held only for a copy or a swap, never across an `.await`.
#[derive(Debug)]
pub struct AppState {
    config: Config,
    station: RwLock<StationConfig>,
    started: Instant,
    probe: HardwareProbe,
    metrics: MetricsSampler,
    restarts: AtomicU64,
}

impl AppState {
    /// Build state from loaded configuration, starting the uptime clock.
    #[must_use]
    pub fn new(config: Config) -> SharedState {
        Arc::new(Self {
            station: RwLock::new(config.station.clone()),
            probe: HardwareProbe::new(config.hardware.clone()),
            config,
            started: Instant::now(),
            metrics: MetricsSampler::new(),
            restarts: AtomicU64::new(0),
        })
    }

    /// Configuration the server was started with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current station settings.
    #[must_use]
    pub fn station(&self) -> StationConfig {
        self.station
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the station settings.
    pub fn set_station(&self, station: StationConfig) {
        *self.station.write().unwrap_or_else(PoisonError::into_inner) = station;
    }

    /// Whole seconds since the server started.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Device presence probe.
    #[must_use]
    pub fn probe(&self) -> &HardwareProbe {
        &self.probe
    }

    /// CPU and memory sampler.
    #[must_use]
    pub fn metrics(&self) -> &MetricsSampler {
        &self.metrics
    }

    /// Count a restart request, returning the new total.
    pub fn record_restart(&self) -> u64 {
        self.restarts.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Restart requests served so far.
    #[must_use]
    pub fn restart_count(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }
}
