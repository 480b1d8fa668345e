use ecgmon::config::DetectorConfig;
use ecgmon::signal_processing::{BeatKind, Detection, PeakDetector};
use ecgmon::simulation::{NoiseConfig, apply_noise, generate_sinusoid};

const SAMPLE_RATE: f64 = 250.0;

/// Sinusoid riding on a negative ADC baseline, as a signed front end
/// delivers it. A crest 0.30 s after the trigger sample then stays below
/// the premature height ratio instead of sitting on the refractory cutoff.
fn sinusoid_on_baseline(frequency_hz: f64, duration_secs: f64, amplitude: f64) -> Vec<f64> {
    generate_sinusoid(frequency_hz, SAMPLE_RATE, duration_secs, amplitude)
        .into_iter()
        .map(|s| s - 20.0 * amplitude)
        .collect()
}

#[test]
fn test_sinusoid_at_75_bpm() {
    // 0.8 s period, 10 s at 250 Hz
    let signal = sinusoid_on_baseline(1.25, 10.0, 100.0);
    let mut detector = PeakDetector::new(&DetectorConfig::default(), 0.0);

    let mut reports = Vec::new();
    for (i, &sample) in signal.iter().enumerate() {
        let t = i as f64 / SAMPLE_RATE;
        if let Some(rate) = detector.detect(sample, t) {
            reports.push((t, rate));
        }
    }

    // The first intervals are measured from detector start; once the median
    // history is dominated by real beats every report must match the rhythm
    let settled: Vec<_> = reports.iter().filter(|(t, _)| *t > 3.0).collect();
    assert!(
        settled.len() >= 8,
        "Expected a report per beat, got {}",
        settled.len()
    );
    for (t, rate) in settled {
        assert!(
            (rate.bpm as i64 - 75).abs() <= 2,
            "BPM {} at {:.3}s not within 2 of 75",
            rate.bpm,
            t
        );
        assert!(
            (rate.interval_ms as i64 - 800).abs() <= 10,
            "Interval {} ms at {:.3}s not within 10 of 800",
            rate.interval_ms,
            t
        );
    }
}

#[test]
fn test_no_beats_closer_than_absolute_refractory() {
    let config = DetectorConfig::default();
    let mut detector = PeakDetector::new(&config, 0.0);

    // Spikes at irregular, often physiologically impossible spacings
    let gaps = [0.12, 0.25, 0.31, 0.05, 0.36, 0.5, 0.2, 0.301, 0.44, 0.15];
    let mut signal = vec![0.0; (20.0 * SAMPLE_RATE) as usize];
    let mut t = 1.0;
    let mut k = 0;
    while t < 19.5 {
        let idx = (t * SAMPLE_RATE) as usize;
        signal[idx] = 1000.0 + 40.0 * (k % 5) as f64;
        t += gaps[k % gaps.len()];
        k += 1;
    }
    let noise = NoiseConfig::default().with_seed(3).with_white_noise(20.0);
    apply_noise(&mut signal, SAMPLE_RATE, &noise);

    let mut beats = Vec::new();
    for (i, &sample) in signal.iter().enumerate() {
        let now = i as f64 / SAMPLE_RATE;
        if let Detection::Beat { event, .. } = detector.process(sample, now) {
            beats.push(event.timestamp);
        }
    }

    assert!(beats.len() > 10, "Only {} beats detected", beats.len());
    for pair in beats.windows(2) {
        assert!(
            pair[1] - pair[0] > config.long_refractory_secs,
            "Beats at {:.3}s and {:.3}s are closer than {}s",
            pair[0],
            pair[1],
            config.long_refractory_secs
        );
    }
}

#[test]
fn test_premature_path_requires_comparable_height() {
    let mut detector = PeakDetector::new(&DetectorConfig::default(), 0.0);
    let mut now = 0.0;
    let mut feed = |detector: &mut PeakDetector, value: f64, secs: f64| {
        now += secs;
        detector.process(value, now)
    };

    for _ in 0..150 {
        feed(&mut detector, 0.0, 0.004);
    }
    // 1.0 s after start
    assert!(feed(&mut detector, 100.0, 0.4).is_beat());

    // Baseline pushes the beat out of the recent segment
    for _ in 0..60 {
        feed(&mut detector, 0.0, 0.0);
    }
    // Small bump 0.35 s later: rejected, like a T wave
    assert_eq!(feed(&mut detector, 60.0, 0.35), Detection::PrematureRejected);

    for _ in 0..60 {
        feed(&mut detector, 0.0, 0.0);
    }
    // Tall early beat 0.38 s after the last beat: admitted
    match feed(&mut detector, 95.0, 0.03) {
        Detection::Beat { kind, .. } => assert_eq!(kind, BeatKind::Premature),
        other => panic!("Expected premature beat, got {:?}", other),
    }
}

#[test]
fn test_amplitude_changes_do_not_stop_detection() {
    // Same rhythm at three very different gains
    let mut detector = PeakDetector::new(&DetectorConfig::default(), 0.0);
    let mut signal = Vec::new();
    for gain in [1.0, 50.0, 0.02] {
        signal.extend(sinusoid_on_baseline(1.0, 6.0, gain));
    }

    let mut beat_times = Vec::new();
    for (i, &sample) in signal.iter().enumerate() {
        let now = i as f64 / SAMPLE_RATE;
        if detector.process(sample, now).is_beat() {
            beat_times.push(now);
        }
    }

    for segment in 0..3 {
        let start = segment as f64 * 6.0;
        let count = beat_times
            .iter()
            .filter(|&&t| t >= start + 1.0 && t < start + 6.0)
            .count();
        assert!(
            (4..=6).contains(&count),
            "Segment {} detected {} beats",
            segment,
            count
        );
    }
}
