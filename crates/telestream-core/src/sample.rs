//! Telemetry sample value type and the numeric helpers shared by its producers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One synthetic system-metric reading.
///
/// Serialized as a flat object with camelCase keys:
/// `{"timestamp":…,"cpuLoad":…,"memLoad":…,"netUp":…,"netDown":…}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// CPU load percentage, never below 1.0.
    pub cpu_load: f64,
    /// Memory load percentage, never below 5.0.
    pub mem_load: f64,
    /// Upstream throughput, two decimal places.
    pub net_up: f64,
    /// Downstream throughput, two decimal places.
    pub net_down: f64,
}

/// Round half-up to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0 + 0.5).floor() / 100.0
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
