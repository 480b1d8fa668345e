use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{RecvTimeoutError, unbounded};
use rolling_stats::Stats;

use ecgmon::clock::create_clock;
use ecgmon::config::{ClockMode, MonitorConfig, SampleRate};
use ecgmon::monitor::{Monitor, SharedSnapshot, SourceStats};
use ecgmon::output::{OutputFormat, RateOutput, create_formatter};
use ecgmon::processing::{EcgProcessor, RateOrigin};
use ecgmon::source::{ChannelSource, LineSource, SampleSource, WavFileSource};

#[derive(Parser, Debug)]
#[command(name = "ecgmon")]
#[command(about = "Smooth a raw ECG stream and report heart rate", long_about = None)]
struct Args {
    /// Input: line-protocol capture, serial device node, or .wav recording
    /// (omit or "-" for standard input)
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Timestamp source: sample (recordings) or wall (live devices)
    #[arg(long, value_enum)]
    clock: Option<ClockMode>,

    /// Sample rate (e.g., "128", "250hz", "4ms")
    #[arg(long)]
    sample_rate: Option<SampleRate>,

    /// Moving average window in samples
    #[arg(long)]
    smoothing: Option<usize>,

    /// Peak threshold fraction between segment average and maximum
    #[arg(long)]
    threshold: Option<f64>,

    /// Raw magnitude above which the leads count as off (0 disables)
    #[arg(long)]
    rail_limit: Option<u32>,

    /// WAV channel to read
    #[arg(long, default_value_t = 0)]
    channel: u16,

    /// Seconds between status lines on stderr (0 disables)
    #[arg(long, default_value_t = 0.0)]
    status_interval: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(clock) = args.clock {
        config.source.clock = clock;
    }
    if let Some(rate) = args.sample_rate {
        config.source.sample_rate = rate;
    }
    if let Some(window) = args.smoothing {
        config.smoothing.window_size = window;
    }
    if let Some(threshold) = args.threshold {
        config.detector.threshold_fraction = threshold;
    }
    if let Some(limit) = args.rail_limit {
        config.lead_off.enabled = limit > 0;
        config.lead_off.rail_limit = limit;
    }

    let source = open_source(args.input.as_deref(), args.channel, &config)?;
    if args.sample_rate.is_none()
        && let Some(rate) = source.sample_rate()
    {
        config.source.sample_rate = rate;
    }
    config.validate().context("Invalid configuration")?;

    log::info!(
        "Sample rate {}, clock {:?}, smoothing {} samples, threshold {:.2}",
        config.source.sample_rate,
        config.source.clock,
        config.smoothing.window_size,
        config.detector.threshold_fraction
    );

    let clock = create_clock(config.source.clock, config.source.sample_rate);
    let processor = EcgProcessor::new(&config, clock)?;
    let mut monitor = Monitor::new(source, processor);
    let snapshot = monitor.snapshot();

    let (tx, rx) = unbounded::<RateOutput>();
    let producer = thread::Builder::new()
        .name("ecg-pipeline".to_string())
        .spawn(move || {
            monitor.run(|output, update| {
                // Receiver gone means the consumer is shutting down
                let _ = tx.send(RateOutput::new(output.timestamp, update));
            })
        })
        .context("Failed to start pipeline thread")?;

    let formatter = create_formatter(args.format, args.verbose > 0);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(header) = formatter.header() {
        writeln!(out, "{}", header)?;
    }

    let status_interval = if args.status_interval > 0.0 {
        Duration::from_secs_f64(args.status_interval)
    } else {
        Duration::from_secs(3600)
    };

    let mut detector_stats: Stats<f32> = Stats::new();
    loop {
        match rx.recv_timeout(status_interval) {
            Ok(rate) => {
                if rate.origin == RateOrigin::Detector {
                    detector_stats.update(rate.bpm as f32);
                }
                writeln!(out, "{}", formatter.format(&rate))?;
            }
            Err(RecvTimeoutError::Timeout) => {
                if args.status_interval > 0.0 {
                    print_status(&snapshot);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    out.flush()?;

    let stats = producer
        .join()
        .map_err(|_| anyhow::anyhow!("Pipeline thread panicked"))??;
    print_summary(&stats, &detector_stats, &snapshot);

    Ok(())
}

fn open_source(
    input: Option<&Path>,
    channel: u16,
    config: &MonitorConfig,
) -> Result<Box<dyn SampleSource>> {
    match input {
        None => stdin_source(config),
        Some(path) if path == Path::new("-") => stdin_source(config),
        Some(path) if is_wav(path) => Ok(Box::new(
            WavFileSource::new(path, channel)
                .with_context(|| format!("Failed to open recording {}", path.display()))?,
        )),
        Some(path) => Ok(Box::new(
            LineSource::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?,
        )),
    }
}

fn stdin_source(config: &MonitorConfig) -> Result<Box<dyn SampleSource>> {
    let reader = BufReader::new(io::stdin());
    Ok(Box::new(ChannelSource::spawn(
        reader,
        config.source.channel_capacity,
    )?))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn print_status(snapshot: &SharedSnapshot) {
    let latest = snapshot.latest();
    let bpm = latest.bpm.map_or("-".to_string(), |b| b.to_string());
    let rr = latest.interval_ms.map_or("-".to_string(), |ms| ms.to_string());
    let (lo, hi) = latest
        .waveform
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let lead = if latest.lead_off { "  LEAD OFF" } else { "" };
    eprintln!(
        "samples: {}  beats: {}  BPM: {}  RR: {} ms  range: [{:.0}, {:.0}]{}",
        latest.samples_processed, latest.beats_detected, bpm, rr, lo, hi, lead
    );
}

fn print_summary(stats: &SourceStats, detector_stats: &Stats<f32>, snapshot: &SharedSnapshot) {
    let latest = snapshot.latest();
    eprintln!(
        "Processed {} records ({} skipped, {} malformed), {} beats detected",
        stats.records, stats.skipped, stats.malformed, latest.beats_detected
    );
    if detector_stats.count > 0 {
        eprintln!(
            "Detector BPM: mean {:.1}, std {:.1}, min {:.0}, max {:.0} over {} reports",
            detector_stats.mean,
            detector_stats.std_dev,
            detector_stats.min,
            detector_stats.max,
            detector_stats.count
        );
    }
}
