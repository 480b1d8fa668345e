//! Configuration for the ECG monitor.
//!
//! All parameters are fixed once the pipeline is built. Defaults match the
//! acquisition front end (128 samples/s) and the detector tuning described on
//! [`DetectorConfig`]. A TOML file may override any subset of fields:
//!
//! ```toml
//! [smoothing]
//! window_size = 7
//!
//! [detector]
//! threshold_fraction = 0.65
//! rate_bounds = { min_bpm = 30, max_bpm = 220 }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{MonitorError, Result};

/// System-wide monitor configuration
///
/// # Example
/// ```
/// use ecgmon::config::MonitorConfig;
///
/// let mut config = MonitorConfig::default();
/// config.smoothing.window_size = 8;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Raw sample smoothing
    pub smoothing: SmoothingConfig,
    /// Beat detection and rate estimation
    pub detector: DetectorConfig,
    /// Sample source timing
    pub source: SourceConfig,
    /// Electrode disconnect detection
    pub lead_off: LeadOffConfig,
}

/// Moving average configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of raw samples averaged per smoothed sample
    pub window_size: usize,
}

/// Peak detector configuration
///
/// Candidate peaks must be the maximum of the most recent `segment_size`
/// samples and exceed `avg + threshold_fraction * (max - avg)` of that
/// segment. Timing then decides: beyond `short_refractory_secs` a candidate
/// is always a beat, between the two cutoffs it must reach
/// `premature_height_ratio` of the previous beat's amplitude, and within
/// `long_refractory_secs` it is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Capacity of the smoothed-sample window (also the display window)
    pub window_size: usize,
    /// Samples required before any decision is made
    pub min_samples: usize,
    /// Length of the recent segment used for the dynamic threshold
    pub segment_size: usize,
    /// Fraction of the segment's max-over-average excursion a peak must exceed
    pub threshold_fraction: f64,
    /// Absolute refractory period in seconds
    pub long_refractory_secs: f64,
    /// End of the relative refractory period in seconds
    pub short_refractory_secs: f64,
    /// Minimum height of a premature beat relative to the previous beat
    pub premature_height_ratio: f64,
    /// Number of inter-beat intervals kept for the median
    pub interval_history: usize,
    /// Number of reported rates kept
    pub rate_history: usize,
    /// Rates outside these (exclusive) bounds are not reported
    pub rate_bounds: RateBounds,
}

/// Exclusive plausibility bounds for a reported heart rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateBounds {
    pub min_bpm: u32,
    pub max_bpm: u32,
}

impl RateBounds {
    /// Whether `bpm` lies strictly between the bounds
    pub fn contains(&self, bpm: u32) -> bool {
        self.min_bpm < bpm && bpm < self.max_bpm
    }
}

/// Lead-off (railed signal) detection
///
/// Raw samples beyond `rail_limit` in magnitude mean an electrode is off and
/// the front end has saturated. No rate is displayed until the signal has
/// been clean long enough to clear the smoothing and detection buffers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeadOffConfig {
    pub enabled: bool,
    /// Largest raw magnitude still treated as a connected lead (ADC counts)
    pub rail_limit: u32,
}

/// How timestamps are assigned to incoming samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClockMode {
    /// Derive time from the sample count and sample rate (recordings)
    Sample,
    /// Read the monotonic wall clock on arrival (live devices)
    Wall,
}

/// Sample source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Nominal sample rate in Hz
    pub sample_rate: SampleRate,
    /// Timestamp source
    pub clock: ClockMode,
    /// Capacity of the reader thread hand-off channel
    pub channel_capacity: usize,
}

/// Sample rate specification
///
/// # Parsing formats
/// - `128` or `128hz` - rate in Hz
/// - `7.8125ms` - sample period in milliseconds
///
/// # Example
/// ```
/// use ecgmon::config::SampleRate;
///
/// let rate: SampleRate = "7.8125ms".parse().unwrap();
/// assert!((rate.as_hz() - 128.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "f64")]
pub struct SampleRate(f64);

impl SampleRate {
    pub fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    pub fn as_hz(&self) -> f64 {
        self.0
    }

    pub fn period_secs(&self) -> f64 {
        1.0 / self.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        // MAX30003 ECG output rate with the 32768 Hz master clock
        Self::from_hz(128.0)
    }
}

impl TryFrom<f64> for SampleRate {
    type Error = String;

    fn try_from(hz: f64) -> std::result::Result<Self, Self::Error> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(format!("sample rate must be positive, got {}", hz));
        }
        Ok(Self(hz))
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}hz", self.0)
    }
}

impl FromStr for SampleRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid period: {}", s))?;
            if !ms.is_finite() || ms <= 0.0 {
                return Err(format!("period must be positive, got {}", s));
            }
            return Self::try_from(1000.0 / ms);
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid sample rate: {}", s))?;
        Self::try_from(hz)
    }
}

impl MonitorConfig {
    /// Load a configuration from a TOML file, filling unspecified fields
    /// with defaults. The result is validated.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter consistency
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;

        let hz = self.source.sample_rate.as_hz();
        if !hz.is_finite() || hz <= 0.0 {
            return Err(config_error(format!("sample rate must be positive, got {}", hz)));
        }

        if self.smoothing.window_size == 0 {
            return Err(config_error("smoothing window must be at least 1"));
        }
        if d.segment_size == 0 || d.interval_history == 0 || d.rate_history == 0 {
            return Err(config_error(
                "segment size and history capacities must be at least 1",
            ));
        }
        if d.segment_size > d.min_samples {
            return Err(config_error(format!(
                "segment size {} exceeds warm-up length {}",
                d.segment_size, d.min_samples
            )));
        }
        if d.min_samples > d.window_size {
            return Err(config_error(format!(
                "warm-up length {} exceeds window size {}",
                d.min_samples, d.window_size
            )));
        }
        if !(d.threshold_fraction > 0.0 && d.threshold_fraction <= 1.0) {
            return Err(config_error("threshold fraction must be in (0, 1]"));
        }
        if !(d.premature_height_ratio > 0.0 && d.premature_height_ratio <= 1.0) {
            return Err(config_error("premature height ratio must be in (0, 1]"));
        }
        if !(d.long_refractory_secs > 0.0 && d.long_refractory_secs < d.short_refractory_secs) {
            return Err(config_error(
                "long refractory cutoff must be positive and below the short cutoff",
            ));
        }
        if d.rate_bounds.min_bpm >= d.rate_bounds.max_bpm {
            return Err(config_error("minimum rate must be below maximum rate"));
        }
        if self.lead_off.enabled && self.lead_off.rail_limit == 0 {
            return Err(config_error("lead-off rail limit must be positive"));
        }
        if self.source.channel_capacity == 0 {
            return Err(config_error("channel capacity must be at least 1"));
        }
        Ok(())
    }
}

fn config_error(msg: impl Into<String>) -> MonitorError {
    MonitorError::Config(msg.into())
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window_size: 5 }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            min_samples: 100,
            segment_size: 50,
            threshold_fraction: 0.7,
            long_refractory_secs: 0.30,
            short_refractory_secs: 0.42,
            premature_height_ratio: 0.85,
            interval_history: 5,
            rate_history: 10,
            rate_bounds: RateBounds::default(),
        }
    }
}

impl Default for RateBounds {
    fn default() -> Self {
        Self {
            min_bpm: 40,
            max_bpm: 200,
        }
    }
}

impl Default for LeadOffConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rail_limit: 35000,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            clock: ClockMode::Sample,
            channel_capacity: 1024,
        }
    }
}
