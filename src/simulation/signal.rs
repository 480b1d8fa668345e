use std::f64::consts::PI;

/// One Gaussian component of a heartbeat, relative to the R peak
#[derive(Debug, Clone, Copy)]
struct Wave {
    offset_secs: f64,
    width_secs: f64,
    amplitude: f64,
}

const fn wave(offset_secs: f64, width_secs: f64, amplitude: f64) -> Wave {
    Wave {
        offset_secs,
        width_secs,
        amplitude,
    }
}

/// P, Q, R, S and T waves with R normalized to 1.0
const PQRST: [Wave; 5] = [
    wave(-0.20, 0.025, 0.12),
    wave(-0.03, 0.010, -0.10),
    wave(0.0, 0.012, 1.0),
    wave(0.03, 0.010, -0.20),
    wave(0.30, 0.040, 0.30),
];

/// Parameters for a synthetic single-lead ECG
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct EcgSignalConfig {
    /// Sinus rate in beats per minute
    pub bpm: f64,
    /// Output sample rate in Hz
    pub sample_rate: f64,
    /// R-peak height in ADC counts
    pub gain: f64,
    /// Baseline offset in ADC counts
    pub offset: f64,
    /// Time of the first R peak in seconds
    pub first_beat_secs: f64,
    /// Insert a premature beat after every Nth sinus beat
    pub premature_every: Option<usize>,
    /// Premature beat timing as a fraction of the sinus interval
    pub premature_coupling: f64,
    /// Premature beat height relative to a sinus beat
    pub premature_amplitude: f64,
    /// Interval during which an electrode is disconnected
    pub lead_off: Option<LeadOffWindow>,
}

/// Electrode disconnect in a synthetic recording
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct LeadOffWindow {
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Positive full scale of the 18-bit front end, where a floating input settles
pub const RAIL_VALUE: i32 = (1 << 17) - 1;

impl Default for EcgSignalConfig {
    fn default() -> Self {
        Self {
            bpm: 75.0,
            sample_rate: 128.0,
            gain: 2000.0,
            offset: 0.0,
            first_beat_secs: 0.5,
            premature_every: None,
            premature_coupling: 0.45,
            premature_amplitude: 1.0,
            lead_off: None,
        }
    }
}

/// A beat in the synthetic rhythm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBeat {
    pub time_secs: f64,
    pub scale: f64,
    pub premature: bool,
}

impl EcgSignalConfig {
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_premature_beats(mut self, every: usize, coupling: f64) -> Self {
        self.premature_every = Some(every);
        self.premature_coupling = coupling;
        self
    }

    pub fn with_lead_off(mut self, start_secs: f64, duration_secs: f64) -> Self {
        self.lead_off = Some(LeadOffWindow {
            start_secs,
            duration_secs,
        });
        self
    }

    pub fn rr_interval_secs(&self) -> f64 {
        60.0 / self.bpm
    }

    /// R-peak times for `duration_secs` of signal
    pub fn beat_schedule(&self, duration_secs: f64) -> Vec<ScheduledBeat> {
        let rr = self.rr_interval_secs();
        let mut beats = Vec::new();
        let mut index = 0;
        loop {
            let time_secs = self.first_beat_secs + index as f64 * rr;
            if time_secs >= duration_secs {
                break;
            }
            beats.push(ScheduledBeat {
                time_secs,
                scale: 1.0,
                premature: false,
            });

            if let Some(every) = self.premature_every
                && every > 0
                && (index + 1) % every == 0
            {
                let early = time_secs + self.premature_coupling * rr;
                if early < duration_secs {
                    beats.push(ScheduledBeat {
                        time_secs: early,
                        scale: self.premature_amplitude,
                        premature: true,
                    });
                }
            }
            index += 1;
        }
        beats
    }
}

/// Generate a synthetic ECG in ADC counts
pub fn generate_ecg(config: &EcgSignalConfig, duration_secs: f64) -> Vec<f64> {
    let num_samples = (duration_secs * config.sample_rate) as usize;
    let mut samples = vec![config.offset; num_samples];

    for beat in config.beat_schedule(duration_secs) {
        for wave in PQRST {
            let center = beat.time_secs + wave.offset_secs;
            let amplitude = wave.amplitude * beat.scale * config.gain;
            let reach = 5.0 * wave.width_secs;
            let start = ((center - reach) * config.sample_rate).floor().max(0.0) as usize;
            let end = (((center + reach) * config.sample_rate).ceil() as usize).min(num_samples);

            for (i, sample) in samples.iter_mut().enumerate().take(end).skip(start) {
                let t = i as f64 / config.sample_rate;
                let z = (t - center) / wave.width_secs;
                *sample += amplitude * (-0.5 * z * z).exp();
            }
        }
    }

    samples
}

/// Pure sinusoid; with `-cos` phase the first trough is at t = 0
pub fn generate_sinusoid(
    frequency_hz: f64,
    sample_rate: f64,
    duration_secs: f64,
    amplitude: f64,
) -> Vec<f64> {
    let num_samples = (duration_secs * sample_rate) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            -amplitude * (2.0 * PI * frequency_hz * t).cos()
        })
        .collect()
}

/// Round to integer ADC counts
pub fn quantize(samples: &[f64]) -> Vec<i32> {
    samples.iter().map(|&s| s.round() as i32).collect()
}

/// Pin samples inside the lead-off window to the rail
pub fn apply_lead_off(samples: &mut [i32], config: &EcgSignalConfig) {
    let Some(window) = config.lead_off else {
        return;
    };
    let start = (window.start_secs * config.sample_rate).round().max(0.0) as usize;
    let len = (window.duration_secs * config.sample_rate).round().max(0.0) as usize;
    let end = start.saturating_add(len).min(samples.len());
    if start < end {
        samples[start..end].fill(RAIL_VALUE);
    }
}
