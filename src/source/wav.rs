use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::WavReader;

use super::{SampleRecord, SampleSource, SourceEvent};
use crate::config::SampleRate;
use crate::error::{MonitorError, Result};

/// Plays back an integer PCM WAV recording of raw ECG samples
///
/// Multi-channel files are read from `channel`; other channels are ignored.
pub struct WavFileSource {
    samples: Vec<i32>,
    position: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, channel: u16) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int {
            return Err(MonitorError::Recording(
                "expected integer PCM samples".to_string(),
            ));
        }
        if channel >= spec.channels {
            return Err(MonitorError::Recording(format!(
                "channel {} requested but file has {} channel(s)",
                channel, spec.channels
            )));
        }

        let samples = Self::read_channel(reader, spec.channels, channel)?;
        log::info!(
            "Loaded {} samples at {} Hz from {}",
            samples.len(),
            spec.sample_rate,
            path.as_ref().display()
        );

        Ok(Self {
            samples,
            position: 0,
            sample_rate: spec.sample_rate,
        })
    }

    fn read_channel(
        mut reader: WavReader<BufReader<File>>,
        channels: u16,
        channel: u16,
    ) -> Result<Vec<i32>> {
        let samples = reader
            .samples::<i32>()
            .skip(channel as usize)
            .step_by(channels as usize)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for WavFileSource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        let Some(&raw) = self.samples.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(SourceEvent::Record(SampleRecord::new(raw))))
    }

    fn sample_rate(&self) -> Option<SampleRate> {
        Some(SampleRate::from_hz(f64::from(self.sample_rate)))
    }
}
