//! Synthetic telemetry sample generator.
//!
//! Each call draws fresh values from an owned pseudo-random source:
//!
//! | field      | distribution                    |
//! |------------|---------------------------------|
//! | `cpu_load` | `max(1, 20 + N(0,1) * 12)`      |
//! | `mem_load` | `max(5, 40 + N(0,1) * 18)`      |
//! | `net_up`   | `round2(U[0,1) * 6)`            |
//! | `net_down` | `round2(U[0,1) * 10)`           |
//!
//! The lower bounds are clamps, not rejection sampling.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sample::{TelemetrySample, round2, unix_ms_now};

const CPU_MEAN: f64 = 20.0;
const CPU_STD: f64 = 12.0;
const CPU_FLOOR: f64 = 1.0;

const MEM_MEAN: f64 = 40.0;
const MEM_STD: f64 = 18.0;
const MEM_FLOOR: f64 = 5.0;

const NET_UP_SCALE: f64 = 6.0;
const NET_DOWN_SCALE: f64 = 10.0;

/// Produces one [`TelemetrySample`] per call.
pub struct SampleGenerator {
    rng: StdRng,
    last_timestamp: u64,
}

impl SampleGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Create a generator with a fixed seed. Two generators with the same seed
    /// produce the same load and network values.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            last_timestamp: 0,
        }
    }

    /// Draw the next sample.
    ///
    /// Timestamps never go backwards, even if the wall clock does.
    pub fn next_sample(&mut self) -> TelemetrySample {
        let timestamp = unix_ms_now().max(self.last_timestamp);
        self.last_timestamp = timestamp;

        let cpu_load = (CPU_MEAN + sample_standard_normal(&mut self.rng) * CPU_STD).max(CPU_FLOOR);
        let mem_load = (MEM_MEAN + sample_standard_normal(&mut self.rng) * MEM_STD).max(MEM_FLOOR);
        let net_up = round2(self.rng.random::<f64>() * NET_UP_SCALE);
        let net_down = round2(self.rng.random::<f64>() * NET_DOWN_SCALE);

        TelemetrySample {
            timestamp,
            cpu_load,
            mem_load,
            net_up,
            net_down,
        }
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_standard_normal(rng: &mut impl Rng) -> f64 {
    let u1 = rng.random::<f64>().clamp(f64::MIN_POSITIVE, 1.0);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
