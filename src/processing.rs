use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::signal_processing::{Detection, LeadOffDetector, PeakDetector, Smoother};
use crate::source::SampleRecord;

/// Where a displayed rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    /// Computed by the device from its own R-to-R measurement
    Hardware,
    /// Computed by the local peak detector
    Detector,
}

/// A new rate to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUpdate {
    pub bpm: u32,
    /// Median interval; hardware rates carry none
    pub interval_ms: Option<u32>,
    pub origin: RateOrigin,
}

/// Result of processing one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutput {
    /// Time assigned to the sample in seconds
    pub timestamp: f64,
    pub smoothed: f64,
    /// Local detector decision (always computed)
    pub detection: Detection,
    /// Electrode disconnected or signal railed
    pub lead_off: bool,
    /// Rate to display for this cycle, if any
    pub update: Option<RateUpdate>,
}

/// Streaming pipeline: raw sample -> smoother -> peak detector
///
/// Each call processes one record to completion. When the device supplies
/// its own rate, that rate is displayed and the local result is discarded,
/// but the detector still consumes the sample so its window and beat timing
/// stay current. While the leads are off no rate is displayed at all.
pub struct EcgProcessor {
    smoother: Smoother,
    detector: PeakDetector,
    lead_off: LeadOffDetector,
    clock: Box<dyn Clock>,
}

impl EcgProcessor {
    pub fn new(config: &MonitorConfig, clock: Box<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let detector = PeakDetector::new(&config.detector, clock.now());
        // A railed sample affects smoothed output for one smoothing window and
        // candidate decisions for one segment after that
        let hold = config.smoothing.window_size + config.detector.segment_size;
        Ok(Self {
            smoother: Smoother::new(config.smoothing.window_size),
            detector,
            lead_off: LeadOffDetector::new(&config.lead_off, hold),
            clock,
        })
    }

    pub fn process(&mut self, record: &SampleRecord) -> CycleOutput {
        let now = self.clock.now();
        let lead_off = self.lead_off.update(record.raw);
        let smoothed = self.smoother.process(record.raw);
        let detection = self.detector.process(smoothed, now);
        self.clock.advance();

        let update = if lead_off {
            None
        } else {
            rate_update(record, &detection)
        };

        CycleOutput {
            timestamp: now,
            smoothed,
            detection,
            lead_off,
            update,
        }
    }

    pub fn detector(&self) -> &PeakDetector {
        &self.detector
    }

    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    pub fn lead_off(&self) -> &LeadOffDetector {
        &self.lead_off
    }
}

/// Hardware rate when the device supplied one, else the detector's
fn rate_update(record: &SampleRecord, detection: &Detection) -> Option<RateUpdate> {
    match record.valid_hardware_rate() {
        Some(bpm) => Some(RateUpdate {
            bpm,
            interval_ms: None,
            origin: RateOrigin::Hardware,
        }),
        None => detection.rate().map(|rate| RateUpdate {
            bpm: rate.bpm,
            interval_ms: Some(rate.interval_ms),
            origin: RateOrigin::Detector,
        }),
    }
}
