mod noise;
mod signal;

pub use noise::{BaselineWanderConfig, MainsConfig, NoiseConfig, apply_noise};
pub use signal::{
    EcgSignalConfig, LeadOffWindow, RAIL_VALUE, ScheduledBeat, apply_lead_off, generate_ecg,
    generate_sinusoid, quantize,
};

/// Synthetic ECG with interference, as integer ADC samples
pub fn generate_noisy_ecg(
    signal: &EcgSignalConfig,
    noise: &NoiseConfig,
    duration_secs: f64,
) -> Vec<i32> {
    let mut samples = generate_ecg(signal, duration_secs);
    apply_noise(&mut samples, signal.sample_rate, noise);
    let mut samples = quantize(&samples);
    apply_lead_off(&mut samples, signal);
    samples
}
