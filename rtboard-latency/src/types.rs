//! Latency Measurement Types

use serde::{Deserialize, Serialize};

/// Real-time tier assigned from the worst observed scheduling latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    /// Worst case at or under 10 µs
    HardRealTime,
    /// Worst case at or under 100 µs
    SoftRealTime,
    /// Worst case at or under 1000 µs
    NearRealTime,
    /// Worse than 1 ms
    NonRealTime,
    /// No maximum latency was observed
    Unknown,
}

impl LatencyClass {
    /// Classify a maximum latency in microseconds. Boundaries are
    /// inclusive: 10 µs is still hard real-time.
    pub fn from_max_latency(max_us: Option<u64>) -> Self {
        match max_us {
            None => LatencyClass::Unknown,
            Some(max) if max <= 10 => LatencyClass::HardRealTime,
            Some(max) if max <= 100 => LatencyClass::SoftRealTime,
            Some(max) if max <= 1000 => LatencyClass::NearRealTime,
            Some(_) => LatencyClass::NonRealTime,
        }
    }

    /// Human label used by the board renderer.
    pub fn label(self) -> &'static str {
        match self {
            LatencyClass::HardRealTime => "Hard Real-Time",
            LatencyClass::SoftRealTime => "Soft Real-Time",
            LatencyClass::NearRealTime => "Near Real-Time",
            LatencyClass::NonRealTime => "Non Real-Time",
            LatencyClass::Unknown => "Unknown",
        }
    }

    /// Star rating for the board.
    pub fn stars(self) -> &'static str {
        match self {
            LatencyClass::HardRealTime => "*****",
            LatencyClass::SoftRealTime => "****",
            LatencyClass::NearRealTime => "***",
            LatencyClass::NonRealTime => "**",
            LatencyClass::Unknown => "*",
        }
    }
}

/// One cyclic-probe measurement, created once per probe invocation and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMeasurement {
    /// Best observed wake-up latency in microseconds
    pub min_us: Option<u64>,
    /// Mean wake-up latency in microseconds
    pub avg_us: Option<u64>,
    /// Worst observed wake-up latency in microseconds
    pub max_us: Option<u64>,
    /// max − min, when both are present
    pub jitter_us: Option<u64>,
    /// Probe duration in seconds
    pub duration_s: f64,
    /// Tier assigned from `max_us`
    pub classification: LatencyClass,
    /// True when the numbers came from the simulation fallback rather
    /// than a real probe run
    pub simulated: bool,
}

impl LatencyMeasurement {
    /// Build a measurement from parsed latency figures, deriving jitter
    /// and the classification.
    pub fn from_latencies(
        min_us: Option<u64>,
        avg_us: Option<u64>,
        max_us: Option<u64>,
        duration_s: f64,
        simulated: bool,
    ) -> Self {
        let jitter_us = match (min_us, max_us) {
            (Some(min), Some(max)) => Some(max.saturating_sub(min)),
            _ => None,
        };
        Self {
            min_us,
            avg_us,
            max_us,
            jitter_us,
            duration_s,
            classification: LatencyClass::from_max_latency(max_us),
            simulated,
        }
    }
}
