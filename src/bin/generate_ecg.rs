use anyhow::{Context, Result};
use clap::Parser;
use ecgmon::save_wav;
use ecgmon::simulation::{EcgSignalConfig, LeadOffWindow, NoiseConfig, generate_noisy_ecg};
use ecgmon::source::SampleRecord;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_ecg")]
#[command(about = "Generate a synthetic ECG in the device line protocol or as WAV")]
struct Args {
    /// TOML file with [signal] and [noise] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (.wav for a recording, anything else for line protocol);
    /// standard output if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Signal duration in seconds
    #[arg(short, long, default_value_t = 30.0)]
    duration: f64,

    /// Heart rate in beats per minute (CLI override)
    #[arg(long)]
    bpm: Option<f64>,

    /// Sample rate in Hz (CLI override)
    #[arg(long)]
    sample_rate: Option<f64>,

    /// White noise standard deviation in ADC counts (CLI override)
    #[arg(long)]
    noise: Option<f64>,

    /// Insert a premature beat after every Nth beat
    #[arg(long)]
    premature_every: Option<usize>,

    /// Disconnect the electrode for a span, as START:DURATION in seconds
    #[arg(long, value_parser = parse_lead_off)]
    lead_off: Option<LeadOffWindow>,

    /// Seed for reproducible noise
    #[arg(short, long)]
    seed: Option<u64>,

    /// Append the true rate as a hardware field (H:) on every line
    #[arg(long)]
    hardware_rate: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    signal: EcgSignalConfig,
    noise: NoiseConfig,
}

fn parse_lead_off(s: &str) -> std::result::Result<LeadOffWindow, String> {
    let (start, duration) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:DURATION, got {:?}", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite() && *x >= 0.0)
            .ok_or_else(|| format!("invalid seconds: {:?}", v))
    };
    Ok(LeadOffWindow {
        start_secs: parse(start)?,
        duration_secs: parse(duration)?,
    })
}

fn load_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let TomlConfig {
        mut signal,
        mut noise,
    } = match &args.config {
        Some(path) => load_config(path)?,
        None => TomlConfig::default(),
    };

    if let Some(bpm) = args.bpm {
        signal.bpm = bpm;
    }
    if let Some(rate) = args.sample_rate {
        signal.sample_rate = rate;
    }
    if let Some(std) = args.noise {
        noise.white_std = std;
    }
    if let Some(every) = args.premature_every {
        signal.premature_every = Some(every);
    }
    if let Some(window) = args.lead_off {
        signal.lead_off = Some(window);
    }
    if let Some(seed) = args.seed {
        noise.seed = Some(seed);
    }

    if signal.bpm <= 0.0 || signal.sample_rate <= 0.0 || args.duration <= 0.0 {
        anyhow::bail!("bpm, sample rate and duration must be positive");
    }

    let samples = generate_noisy_ecg(&signal, &noise, args.duration);
    log::info!(
        "Generated {} samples at {} Hz, {} bpm",
        samples.len(),
        signal.sample_rate,
        signal.bpm
    );

    match &args.output {
        Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav")) => {
            save_wav(path, &samples, signal.sample_rate.round() as u32)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_lines(BufWriter::new(file), &samples, &args, &signal)?;
        }
        None => write_lines(io::stdout().lock(), &samples, &args, &signal)?,
    }

    Ok(())
}

fn write_lines<W: Write>(
    mut out: W,
    samples: &[i32],
    args: &Args,
    signal: &EcgSignalConfig,
) -> Result<()> {
    let hardware_rate = signal.bpm.round() as i32;
    for &raw in samples {
        let record = if args.hardware_rate {
            SampleRecord::with_hardware_rate(raw, hardware_rate)
        } else {
            SampleRecord::new(raw)
        };
        writeln!(out, "{}", record)?;
    }
    out.flush()?;
    Ok(())
}
