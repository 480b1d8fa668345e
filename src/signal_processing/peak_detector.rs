use super::TrailingBuffer;
use super::math::{interval_to_bpm, interval_to_millis, upper_median};
use crate::config::DetectorConfig;

/// A registered heartbeat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Time of the peak in seconds
    pub timestamp: f64,
    /// Smoothed amplitude at the peak
    pub amplitude: f64,
    /// Seconds since the previous registered beat
    pub interval: f64,
}

/// Rate reported for a confirmed beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRate {
    /// Beats per minute from the median interval
    pub bpm: u32,
    /// Median inter-beat interval in milliseconds
    pub interval_ms: u32,
}

/// Which timing rule admitted a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatKind {
    /// Outside the relative refractory period
    Normal,
    /// Inside the relative refractory period but tall enough
    Premature,
}

/// Outcome of feeding one smoothed sample to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    /// Window holds fewer samples than the warm-up length
    WarmingUp,
    /// Sample is not the dominant maximum of the recent segment
    NoCandidate,
    /// Candidate within the absolute refractory period
    Refractory,
    /// Candidate within the relative refractory period but too small
    PrematureRejected,
    /// Beat registered; `rate` is `None` when the plausibility gate
    /// suppressed the computed rate
    Beat {
        event: BeatEvent,
        kind: BeatKind,
        rate: Option<HeartRate>,
    },
}

impl Detection {
    /// Reported rate, if this sample produced one
    pub fn rate(&self) -> Option<HeartRate> {
        match self {
            Detection::Beat { rate, .. } => *rate,
            _ => None,
        }
    }

    pub fn is_beat(&self) -> bool {
        matches!(self, Detection::Beat { .. })
    }
}

/// Adaptive-threshold R-peak detector with median rate estimation
///
/// Keeps a trailing window of smoothed samples. A sample is a candidate when
/// it is the maximum of the most recent segment and exceeds a threshold set
/// between the segment's average and maximum, so detection follows baseline
/// drift and gain changes. Candidates are then gated by time since the last
/// beat (absolute and relative refractory periods, with a height test for
/// premature beats). Reported rates come from the upper median of recent
/// intervals.
pub struct PeakDetector {
    config: DetectorConfig,
    window: TrailingBuffer<f64>,
    last_beat_timestamp: f64,
    last_beat_amplitude: f64,
    last_beat: Option<BeatEvent>,
    recent_intervals: TrailingBuffer<f64>,
    recent_rates: TrailingBuffer<u32>,
}

impl PeakDetector {
    /// Create a detector whose interval timing starts at `start_time`
    ///
    /// The first beat's interval is measured from `start_time`.
    pub fn new(config: &DetectorConfig, start_time: f64) -> Self {
        Self {
            window: TrailingBuffer::new(config.window_size),
            last_beat_timestamp: start_time,
            last_beat_amplitude: 0.0,
            last_beat: None,
            recent_intervals: TrailingBuffer::new(config.interval_history),
            recent_rates: TrailingBuffer::new(config.rate_history),
            config: config.clone(),
        }
    }

    /// Process the next smoothed sample observed at time `now` (seconds)
    pub fn process(&mut self, sample: f64, now: f64) -> Detection {
        self.window.push(sample);

        if self.window.len() < self.config.min_samples {
            return Detection::WarmingUp;
        }

        if !self.is_candidate(sample) {
            return Detection::NoCandidate;
        }

        let time_diff = now - self.last_beat_timestamp;

        if time_diff > self.config.short_refractory_secs {
            self.register_beat(now, sample, time_diff, BeatKind::Normal)
        } else if time_diff <= self.config.long_refractory_secs {
            log::trace!("Candidate {:.1} in refractory period ({:.3}s)", sample, time_diff);
            Detection::Refractory
        } else if sample > self.last_beat_amplitude * self.config.premature_height_ratio {
            self.register_beat(now, sample, time_diff, BeatKind::Premature)
        } else {
            log::trace!(
                "Early candidate {:.1} below {:.0}% of previous beat {:.1}",
                sample,
                self.config.premature_height_ratio * 100.0,
                self.last_beat_amplitude
            );
            Detection::PrematureRejected
        }
    }

    /// Convenience wrapper returning only the reported rate
    pub fn detect(&mut self, sample: f64, now: f64) -> Option<HeartRate> {
        self.process(sample, now).rate()
    }

    fn is_candidate(&self, sample: f64) -> bool {
        let segment_len = self.config.segment_size.min(self.window.len());
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for value in self.window.latest(segment_len) {
            max = max.max(value);
            sum += value;
        }
        let avg = sum / segment_len as f64;
        let threshold = avg + self.config.threshold_fraction * (max - avg);

        sample == max && sample > threshold
    }

    fn register_beat(
        &mut self,
        now: f64,
        amplitude: f64,
        interval: f64,
        kind: BeatKind,
    ) -> Detection {
        self.last_beat_timestamp = now;
        self.last_beat_amplitude = amplitude;

        let event = BeatEvent {
            timestamp: now,
            amplitude,
            interval,
        };
        self.last_beat = Some(event);

        self.recent_intervals.push(interval);
        let rate = upper_median(self.recent_intervals.iter()).and_then(|median_rr| {
            let bpm = interval_to_bpm(median_rr);
            if self.config.rate_bounds.contains(bpm) {
                Some(HeartRate {
                    bpm,
                    interval_ms: interval_to_millis(median_rr),
                })
            } else {
                log::debug!(
                    "Suppressed implausible rate {} bpm (median interval {:.3}s)",
                    bpm,
                    median_rr
                );
                None
            }
        });

        if let Some(rate) = rate {
            self.recent_rates.push(rate.bpm);
        }

        log::debug!(
            "{:?} beat at {:.3}s, amplitude {:.1}, interval {:.3}s",
            kind,
            now,
            amplitude,
            interval
        );

        Detection::Beat { event, kind, rate }
    }

    /// Smoothed samples currently held, oldest first
    pub fn window(&self) -> &TrailingBuffer<f64> {
        &self.window
    }

    /// Most recently registered beat
    pub fn last_beat(&self) -> Option<&BeatEvent> {
        self.last_beat.as_ref()
    }

    /// Time of the last registered beat (or of construction)
    pub fn last_beat_timestamp(&self) -> f64 {
        self.last_beat_timestamp
    }

    pub fn recent_intervals(&self) -> &TrailingBuffer<f64> {
        &self.recent_intervals
    }

    /// Rates that passed the plausibility gate, oldest first
    pub fn recent_rates(&self) -> &TrailingBuffer<u32> {
        &self.recent_rates
    }
}
