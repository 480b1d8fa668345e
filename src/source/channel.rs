use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, bounded};

use super::{SampleSource, SourceEvent, parse_line};
use crate::error::Result;

/// Source fed by a dedicated reader thread
///
/// The reader thread blocks on input and hands complete lines over a bounded
/// channel, so a slow consumer applies backpressure instead of growing memory.
/// The source is exhausted when the reader reaches end of input.
pub struct ChannelSource {
    rx: Receiver<std::io::Result<String>>,
    _reader: JoinHandle<()>,
}

impl ChannelSource {
    /// Spawn a thread reading lines from `reader`
    pub fn spawn<R>(reader: R, capacity: usize) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = bounded(capacity.max(1));
        let handle = thread::Builder::new()
            .name("ecg-reader".to_string())
            .spawn(move || {
                let mut reader = reader;
                let mut buf = Vec::with_capacity(64);
                loop {
                    buf.clear();
                    let line = match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        // Serial glitches become replacement characters and
                        // are classified by the parser like any other line
                        Ok(_) => Ok(String::from_utf8_lossy(&buf).into_owned()),
                        Err(err) => Err(err),
                    };
                    let failed = line.is_err();
                    if tx.send(line).is_err() {
                        log::debug!("Line receiver dropped");
                        return;
                    }
                    if failed {
                        return;
                    }
                }
                log::info!("Input closed");
            })?;

        Ok(Self {
            rx,
            _reader: handle,
        })
    }
}

impl SampleSource for ChannelSource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        match self.rx.recv() {
            Ok(line) => Ok(Some(parse_line(&line?))),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SampleClock;
    use crate::config::{MonitorConfig, SampleRate};
    use crate::monitor::{Monitor, SourceStats};
    use crate::processing::EcgProcessor;
    use crate::source::SampleRecord;
    use std::io::Cursor;

    #[test]
    fn test_lines_cross_thread() {
        let input = "E:1\nE:2,H:70\nboot\n";
        let mut source = ChannelSource::spawn(Cursor::new(input), 1).unwrap();

        assert_eq!(
            source.next_event().unwrap(),
            Some(SourceEvent::Record(SampleRecord::new(1)))
        );
        assert_eq!(
            source.next_event().unwrap(),
            Some(SourceEvent::Record(SampleRecord::with_hardware_rate(2, 70)))
        );
        assert_eq!(source.next_event().unwrap(), Some(SourceEvent::Skipped));
        assert_eq!(source.next_event().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_does_not_stop_the_stream() {
        let mut input = b"E:1\n\xffE:2\nE:\xfe3\n".to_vec();
        for i in 0..1000 {
            input.extend_from_slice(format!("E:{}\n", i).as_bytes());
        }
        let source = ChannelSource::spawn(Cursor::new(input), 4).unwrap();

        let config = MonitorConfig::default();
        let clock = SampleClock::new(SampleRate::default());
        let processor = EcgProcessor::new(&config, Box::new(clock)).unwrap();
        let mut monitor = Monitor::new(source, processor);
        let stats = monitor.run(|_, _| {}).unwrap();

        assert_eq!(
            stats,
            SourceStats {
                records: 1001,
                skipped: 1,
                malformed: 1,
            }
        );
    }

    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device unplugged"))
        }
    }

    #[test]
    fn test_read_error_is_fatal() {
        let reader = std::io::BufReader::new(FailingReader);
        let mut source = ChannelSource::spawn(reader, 4).unwrap();

        assert!(source.next_event().is_err());
        assert_eq!(source.next_event().unwrap(), None);
    }
}
