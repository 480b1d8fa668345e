//! Time sources for beat timing.
//!
//! The detector measures inter-beat intervals in seconds. Live devices are
//! timed against the monotonic wall clock; recordings and tests derive time
//! from the sample index so results do not depend on playback speed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::{ClockMode, SampleRate};

/// Source of sample timestamps in seconds
///
/// `now` is read once per sample; `advance` is called after the sample has
/// been processed.
pub trait Clock: Send {
    fn now(&self) -> f64;

    fn advance(&mut self) {}
}

/// Seconds elapsed since construction, from [`Instant`]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Time derived from sample count: sample `n` is at `n / sample_rate`
pub struct SampleClock {
    period_secs: f64,
    sample_index: u64,
}

impl SampleClock {
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            period_secs: sample_rate.period_secs(),
            sample_index: 0,
        }
    }

    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }
}

impl Clock for SampleClock {
    fn now(&self) -> f64 {
        self.sample_index as f64 * self.period_secs
    }

    fn advance(&mut self) {
        self.sample_index += 1;
    }
}

/// Externally driven clock
///
/// Clones share the same time, so a test (or a transport that carries its
/// own timestamps) can keep a handle and set the time while the processor
/// owns another. The value is stored as `f64` bits.
#[derive(Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(secs: f64) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(secs.to_bits())),
        }
    }

    pub fn set(&self, secs: f64) {
        self.secs.store(secs.to_bits(), Ordering::Relaxed);
    }

    pub fn advance_by(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.secs.load(Ordering::Relaxed))
    }
}

/// Build the clock selected by configuration
pub fn create_clock(mode: ClockMode, sample_rate: SampleRate) -> Box<dyn Clock> {
    match mode {
        ClockMode::Sample => Box::new(SampleClock::new(sample_rate)),
        ClockMode::Wall => Box::new(MonotonicClock::new()),
    }
}
