use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Interference added to a synthetic ECG
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    /// Gaussian white noise standard deviation in ADC counts
    pub white_std: f64,
    pub baseline_wander: Option<BaselineWanderConfig>,
    pub mains: Option<MainsConfig>,
}

/// Slow baseline drift (respiration, electrode motion)
#[derive(Clone, Debug, serde::Deserialize)]
pub struct BaselineWanderConfig {
    pub amplitude: f64,
    pub frequency_hz: f64,
}

/// Power-line pickup
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MainsConfig {
    pub amplitude: f64,
    pub frequency_hz: f64,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_white_noise(mut self, std: f64) -> Self {
        self.white_std = std;
        self
    }

    pub fn with_baseline_wander(mut self, amplitude: f64, frequency_hz: f64) -> Self {
        self.baseline_wander = Some(BaselineWanderConfig {
            amplitude,
            frequency_hz,
        });
        self
    }

    pub fn with_mains(mut self, amplitude: f64, frequency_hz: f64) -> Self {
        self.mains = Some(MainsConfig {
            amplitude,
            frequency_hz,
        });
        self
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

fn add_tone(
    signal: &mut [f64],
    sample_rate: f64,
    amplitude: f64,
    frequency_hz: f64,
    phase: f64,
) {
    for (i, sample) in signal.iter_mut().enumerate() {
        let t = i as f64 / sample_rate;
        *sample += amplitude * (2.0 * PI * frequency_hz * t + phase).sin();
    }
}

/// Apply the configured interference in place
pub fn apply_noise(signal: &mut [f64], sample_rate: f64, config: &NoiseConfig) {
    let mut rng = create_rng(config.seed);

    if let Some(wander) = &config.baseline_wander {
        let phase = rng.random::<f64>() * 2.0 * PI;
        add_tone(signal, sample_rate, wander.amplitude, wander.frequency_hz, phase);
    }

    if let Some(mains) = &config.mains {
        let phase = rng.random::<f64>() * 2.0 * PI;
        add_tone(signal, sample_rate, mains.amplitude, mains.frequency_hz, phase);
    }

    if config.white_std > 0.0
        && let Ok(normal) = Normal::new(0.0, config.white_std)
    {
        for sample in signal.iter_mut() {
            *sample += normal.sample(&mut rng);
        }
    }
}
