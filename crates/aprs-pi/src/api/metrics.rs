//! Host CPU and memory sampling.

use std::sync::{Mutex, PoisonError};

use sysinfo::System;

use super::models::SystemMetrics;

/// Keeps a `sysinfo` handle between requests so CPU usage is measured over
/// the interval since the previous sample.
pub struct MetricsSampler {
    system: Mutex<System>,
}

impl std::fmt::Debug for MetricsSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSampler").finish_non_exhaustive()
    }
}

impl Default for MetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSampler {
    /// Create a sampler and take the baseline reading.
    #[must_use]
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }

    /// Refresh and read current usage, rounded to one decimal place.
    ///
    /// Blocks on `sysinfo` and the sampler lock.
    pub fn sample(&self) -> SystemMetrics {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_cpu_usage();
        system.refresh_memory();

        SystemMetrics {
            cpu_usage: round1(system.global_cpu_usage()),
            memory_usage: round1(percent(system.used_memory(), system.total_memory())),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}

fn round1(value: f32) -> f32 {
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert!((percent(50, 200) - 25.0).abs() < f32::EPSILON);
        assert!(percent(1, 0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_round1() {
        assert!((round1(12.345) - 12.3).abs() < 1e-4);
        assert!((round1(150.0) - 100.0).abs() < f32::EPSILON);
        assert!(round1(-1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sample_in_range() {
        let sampler = MetricsSampler::new();
        let metrics = sampler.sample();
        assert!((0.0..=100.0).contains(&metrics.cpu_usage));
        assert!((0.0..=100.0).contains(&metrics.memory_usage));
    }
}
