//! Simulation Fallback
//!
//! Machines without the probe binary (or without the privileges to run
//! it) still get a board; the latency section is drawn from a realistic
//! baseline instead and the measurement is flagged `simulated`. The flag
//! is mandatory: a simulated run must never pass for a real one.

use rand::Rng;

use crate::types::LatencyMeasurement;

/// Lower bound of the simulated minimum latency in microseconds.
pub const SIM_MIN_BASE_US: u64 = 8;
/// Upper bound of the simulated minimum latency in microseconds.
const SIM_MIN_CEIL_US: u64 = 13;
/// Smallest simulated jitter in microseconds.
const SIM_JITTER_MIN_US: u64 = 2;
/// Largest simulated jitter in microseconds.
pub const SIM_JITTER_MAX_US: u64 = 8;

/// Draw a simulated measurement for the given nominal duration.
///
/// min is uniform over a realistic idle-system baseline (8–13 µs), max
/// adds a uniform 2–8 µs jitter, avg sits at the midpoint. The resulting
/// maximum never exceeds 21 µs, which always lands in the soft or near
/// real-time tiers.
pub fn simulated_measurement(duration_s: f64) -> LatencyMeasurement {
    let mut rng = rand::thread_rng();
    let min = rng.gen_range(SIM_MIN_BASE_US..=SIM_MIN_CEIL_US);
    let jitter = rng.gen_range(SIM_JITTER_MIN_US..=SIM_JITTER_MAX_US);
    let max = min + jitter;
    let avg = (min + max) / 2;

    LatencyMeasurement::from_latencies(Some(min), Some(avg), Some(max), duration_s, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatencyClass;

    #[test]
    fn simulation_is_always_flagged() {
        for _ in 0..100 {
            assert!(simulated_measurement(15.0).simulated);
        }
    }

    #[test]
    fn simulated_values_stay_in_documented_bounds() {
        for _ in 0..500 {
            let m = simulated_measurement(15.0);
            let min = m.min_us.unwrap();
            let max = m.max_us.unwrap();
            let avg = m.avg_us.unwrap();

            assert!((SIM_MIN_BASE_US..=SIM_MIN_CEIL_US).contains(&min));
            assert!(max >= min + SIM_JITTER_MIN_US);
            assert!(max <= SIM_MIN_CEIL_US + SIM_JITTER_MAX_US);
            assert!(min <= avg && avg <= max);
            assert_eq!(m.jitter_us, Some(max - min));
        }
    }

    #[test]
    fn simulated_classification_is_soft_or_near() {
        for _ in 0..500 {
            let class = simulated_measurement(15.0).classification;
            assert!(matches!(
                class,
                LatencyClass::SoftRealTime | LatencyClass::NearRealTime
            ));
        }
    }
}
