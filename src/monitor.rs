//! Producer loop and the snapshot shared with display consumers.
//!
//! The producer owns the source and the processor. After every record it
//! publishes a complete, immutable [`MonitorSnapshot`]; consumers on other
//! threads take the latest one by cloning an `Arc`. A reader may see a
//! snapshot that is a few samples old, never a partially updated one.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::processing::{CycleOutput, EcgProcessor, RateOrigin, RateUpdate};
use crate::source::{SampleSource, SourceEvent};

/// Everything a display needs at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorSnapshot {
    /// Smoothed samples in the detector window, oldest first
    pub waveform: Vec<f64>,
    /// Most recently displayed rate
    pub bpm: Option<u32>,
    /// Most recently confirmed interval in milliseconds
    pub interval_ms: Option<u32>,
    pub rate_origin: Option<RateOrigin>,
    /// Electrode disconnected or signal railed; `bpm` is stale while set
    pub lead_off: bool,
    pub samples_processed: u64,
    pub beats_detected: u64,
}

/// Single-writer, many-reader handle to the latest snapshot
#[derive(Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Arc<MonitorSnapshot>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot
    pub fn latest(&self) -> Arc<MonitorSnapshot> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // Writers only swap a pointer, so a poisoned lock still holds
            // a complete snapshot
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, snapshot: MonitorSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.inner.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

/// Counts of what the source delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub records: u64,
    pub skipped: u64,
    pub malformed: u64,
}

/// Outcome of one [`Monitor::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Processed(CycleOutput),
    /// Skipped or malformed input
    Ignored,
    Exhausted,
}

/// Drives a source through the processor until the source is exhausted
pub struct Monitor<S> {
    source: S,
    processor: EcgProcessor,
    shared: SharedSnapshot,
    state: MonitorSnapshot,
    stats: SourceStats,
}

impl<S: SampleSource> Monitor<S> {
    pub fn new(source: S, processor: EcgProcessor) -> Self {
        Self {
            source,
            processor,
            shared: SharedSnapshot::new(),
            state: MonitorSnapshot::default(),
            stats: SourceStats::default(),
        }
    }

    /// Handle for consumers; may be cloned and sent to other threads
    pub fn snapshot(&self) -> SharedSnapshot {
        self.shared.clone()
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    pub fn processor(&self) -> &EcgProcessor {
        &self.processor
    }

    /// Process one unit of input from the source
    pub fn step(&mut self) -> Result<Step> {
        let Some(event) = self.source.next_event()? else {
            return Ok(Step::Exhausted);
        };

        let record = match event {
            SourceEvent::Record(record) => record,
            SourceEvent::Skipped => {
                self.stats.skipped += 1;
                return Ok(Step::Ignored);
            }
            SourceEvent::Malformed(err) => {
                self.stats.malformed += 1;
                log::warn!("Dropping malformed record: {}", err);
                return Ok(Step::Ignored);
            }
        };

        self.stats.records += 1;
        let output = self.processor.process(&record);
        self.apply(&output);
        Ok(Step::Processed(output))
    }

    /// Run until the source is exhausted, calling `on_update` for every
    /// displayed rate change
    pub fn run<F>(&mut self, mut on_update: F) -> Result<SourceStats>
    where
        F: FnMut(&CycleOutput, &RateUpdate),
    {
        loop {
            match self.step()? {
                Step::Processed(output) => {
                    if let Some(update) = &output.update {
                        on_update(&output, update);
                    }
                }
                Step::Ignored => {}
                Step::Exhausted => break,
            }
        }

        log::info!(
            "Source exhausted: {} records, {} skipped, {} malformed",
            self.stats.records,
            self.stats.skipped,
            self.stats.malformed
        );
        Ok(self.stats)
    }

    fn apply(&mut self, output: &CycleOutput) {
        if output.lead_off != self.state.lead_off {
            if output.lead_off {
                log::warn!("Lead off or signal railed at {:.3}s", output.timestamp);
            } else {
                log::info!("Signal restored at {:.3}s", output.timestamp);
            }
        }
        self.state.lead_off = output.lead_off;
        self.state.samples_processed += 1;
        if output.detection.is_beat() {
            self.state.beats_detected += 1;
        }
        if let Some(update) = output.update {
            self.state.bpm = Some(update.bpm);
            if update.interval_ms.is_some() {
                self.state.interval_ms = update.interval_ms;
            }
            self.state.rate_origin = Some(update.origin);
        }

        let mut snapshot = self.state.clone();
        snapshot.waveform = self.processor.detector().window().to_vec();
        self.shared.publish(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SampleClock;
    use crate::config::{MonitorConfig, SampleRate};
    use crate::source::{LineSource, RecordSource, SampleRecord};
    use std::io::Cursor;

    fn processor() -> EcgProcessor {
        let config = MonitorConfig::default();
        let clock = SampleClock::new(SampleRate::from_hz(128.0));
        EcgProcessor::new(&config, Box::new(clock)).unwrap()
    }

    #[test]
    fn test_counts_and_stops_on_exhaustion() {
        let input = "hello\nE:1\nE:x\nE:2,H:66\n\nE:3\n";
        let source = LineSource::new(Cursor::new(input));
        let mut monitor = Monitor::new(source, processor());

        let mut updates = Vec::new();
        let stats = monitor.run(|_, update| updates.push(*update)).unwrap();

        assert_eq!(
            stats,
            SourceStats {
                records: 3,
                skipped: 2,
                malformed: 1,
            }
        );
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].bpm, 66);
        assert_eq!(updates[0].origin, RateOrigin::Hardware);

        let snapshot = monitor.snapshot().latest();
        assert_eq!(snapshot.samples_processed, 3);
        assert_eq!(snapshot.waveform, vec![1.0, 2.0, 3.0]);
        assert_eq!(snapshot.bpm, Some(66));
        assert_eq!(snapshot.interval_ms, None);
    }

    #[test]
    fn test_malformed_record_is_not_an_error() {
        let source = LineSource::new(Cursor::new("E:12x\nE:5\n"));
        let mut monitor = Monitor::new(source, processor());

        assert_eq!(monitor.step().unwrap(), Step::Ignored);
        assert!(matches!(monitor.step().unwrap(), Step::Processed(_)));
        assert_eq!(monitor.step().unwrap(), Step::Exhausted);
        assert_eq!(monitor.stats().malformed, 1);
    }

    #[test]
    fn test_snapshot_window_is_bounded() {
        let records = (0..2000).map(|i| SampleRecord::new(i % 7));
        let mut monitor = Monitor::new(RecordSource::new(records), processor());
        let shared = monitor.snapshot();

        monitor.run(|_, _| {}).unwrap();

        let snapshot = shared.latest();
        assert_eq!(snapshot.waveform.len(), 500);
        assert_eq!(snapshot.samples_processed, 2000);
    }

    #[test]
    fn test_consumer_reads_from_another_thread() {
        let records = (0..1000).map(|i| SampleRecord::new(i % 50));
        let mut monitor = Monitor::new(RecordSource::new(records), processor());
        let shared = monitor.snapshot();

        let reader = std::thread::spawn(move || {
            let mut last_seen = 0;
            for _ in 0..200 {
                let snapshot = shared.latest();
                assert!(snapshot.samples_processed >= last_seen);
                assert_eq!(
                    snapshot.waveform.len() as u64,
                    snapshot.samples_processed.min(500)
                );
                last_seen = snapshot.samples_processed;
                std::thread::yield_now();
            }
        });

        monitor.run(|_, _| {}).unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn test_snapshot_reports_lead_off() {
        let record = |raw| SampleRecord::with_hardware_rate(raw, 70);
        let mut records: Vec<_> = (0..200).map(|i| record(i % 9)).collect();
        records.extend(std::iter::repeat_n(record(-131072), 20));
        records.extend((0..60).map(|i| record(i % 9)));
        let mut monitor = Monitor::new(RecordSource::new(records), processor());
        let shared = monitor.snapshot();

        let mut flagged = 0;
        let mut updates = 0;
        while let Step::Processed(output) = monitor.step().unwrap() {
            let snapshot = shared.latest();
            assert_eq!(snapshot.lead_off, output.lead_off);
            if snapshot.lead_off {
                flagged += 1;
                assert_eq!(output.update, None);
            }
            if output.update.is_some() {
                updates += 1;
            }
        }

        // 20 railed samples plus a hold of 5 + 50
        assert_eq!(flagged, 75);
        assert_eq!(updates, 200 + 5);
        let snapshot = shared.latest();
        assert!(!snapshot.lead_off);
        assert_eq!(snapshot.bpm, Some(70));
    }
}
