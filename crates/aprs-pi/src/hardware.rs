//! Device presence probe.
//!
//! Reports whether the radio, GPS and audio hardware the station expects is
//! plugged in. Nothing here opens or drives a device; it only looks for the
//! nodes the kernel exposes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::HardwareConfig;

/// USB vendor/product pairs of RTL2832U receivers.
const RTL_SDR_IDS: &[(&str, &str)] = &[("0bda", "2838"), ("0bda", "2832")];

/// Presence flags served under `hardware` in `GET /api/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareStatus {
    /// An RTL-SDR dongle is attached.
    pub rtl_sdr: bool,
    /// A GPS serial device node exists.
    pub gps_device: bool,
    /// ALSA reports at least one sound card.
    pub audio_device: bool,
}

/// Looks for station hardware at the configured locations.
///
/// Probing does blocking file system reads; async callers run it on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct HardwareProbe {
    config: HardwareConfig,
}

impl HardwareProbe {
    /// Create a probe over the given locations.
    #[must_use]
    pub fn new(config: HardwareConfig) -> Self {
        Self { config }
    }

    /// Check every device.
    #[must_use]
    pub fn probe(&self) -> HardwareStatus {
        let status = HardwareStatus {
            rtl_sdr: self.rtl_sdr_present(),
            gps_device: self.gps_present(),
            audio_device: self.audio_present(),
        };
        trace!(?status, "hardware probe");
        status
    }

    /// Whether any USB device matches a known RTL-SDR id.
    #[must_use]
    pub fn rtl_sdr_present(&self) -> bool {
        let Ok(entries) = fs::read_dir(&self.config.usb_devices_dir) else {
            return false;
        };

        entries.filter_map(std::result::Result::ok).any(|entry| {
            let dir = entry.path();
            match (read_id(&dir, "idVendor"), read_id(&dir, "idProduct")) {
                (Some(vendor), Some(product)) => RTL_SDR_IDS
                    .iter()
                    .any(|(v, p)| vendor.eq_ignore_ascii_case(v) && product.eq_ignore_ascii_case(p)),
                _ => false,
            }
        })
    }

    /// Whether any configured GPS device node exists.
    #[must_use]
    pub fn gps_present(&self) -> bool {
        self.config.gps_device_paths.iter().any(|p| p.exists())
    }

    /// Whether the ALSA card list names at least one card.
    #[must_use]
    pub fn audio_present(&self) -> bool {
        fs::read_to_string(&self.config.sound_cards_file)
            .map(|cards| {
                let cards = cards.trim();
                !cards.is_empty() && !cards.contains("no soundcards")
            })
            .unwrap_or(false)
    }
}

fn read_id(dir: &Path, file: &str) -> Option<String> {
    fs::read_to_string(dir.join(file))
        .ok()
        .map(|s| s.trim().to_string())
}
