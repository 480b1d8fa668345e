use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{SampleSource, SourceEvent, parse_line};
use crate::error::Result;

/// Reads the device line protocol from any buffered reader
///
/// Works for recorded logs and for a serial device node that has already
/// been configured. Invalid UTF-8 is replaced rather than treated as an
/// error.
pub struct LineSource<R> {
    reader: R,
    line: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(64),
            line_number: 0,
        }
    }

    /// Number of lines read so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl LineSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send> SampleSource for LineSource<R> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let text = String::from_utf8_lossy(&self.line);
        let event = parse_line(&text);
        if let SourceEvent::Malformed(ref err) = event {
            log::trace!("Line {}: {}", self.line_number, err);
        }
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleRecord;
    use std::io::Cursor;

    #[test]
    fn test_reads_until_exhausted() {
        let input: &[u8] = b"Connected\nE:10\nE:20,H:61\nE:bad\n\xffE:30\nE:40";
        let mut source = LineSource::new(Cursor::new(input.to_vec()));

        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }

        assert_eq!(events.len(), 6);
        assert_eq!(events[0], SourceEvent::Skipped);
        assert_eq!(events[1], SourceEvent::Record(SampleRecord::new(10)));
        assert_eq!(
            events[2],
            SourceEvent::Record(SampleRecord::with_hardware_rate(20, 61))
        );
        assert!(matches!(events[3], SourceEvent::Malformed(_)));
        // Replacement character in front of the tag makes it a non-data line
        assert_eq!(events[4], SourceEvent::Skipped);
        assert_eq!(events[5], SourceEvent::Record(SampleRecord::new(40)));
        assert_eq!(source.line_number(), 6);
    }
}
