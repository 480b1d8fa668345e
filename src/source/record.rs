use std::fmt;
use std::ops::RangeInclusive;

use crate::error::RecordError;

/// Rates the front end can derive from an R-to-R interval it accepts,
/// 200 ms < RR < 3000 ms
const DEVICE_RATE_RANGE: RangeInclusive<u32> = 20..=299;

/// One sample from the acquisition device
///
/// `hardware_rate` is the device's own R-to-R derived heart rate when it
/// reports one; zero means "not available".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRecord {
    pub raw: i32,
    pub hardware_rate: Option<i32>,
}

impl SampleRecord {
    pub fn new(raw: i32) -> Self {
        Self {
            raw,
            hardware_rate: None,
        }
    }

    pub fn with_hardware_rate(raw: i32, hardware_rate: i32) -> Self {
        Self {
            raw,
            hardware_rate: Some(hardware_rate),
        }
    }

    /// Hardware rate if the device computed a usable one
    pub fn valid_hardware_rate(&self) -> Option<u32> {
        self.hardware_rate
            .and_then(|hr| u32::try_from(hr).ok())
            .filter(|hr| DEVICE_RATE_RANGE.contains(hr))
    }
}

/// Formats in the device line protocol: `E:<raw>` or `E:<raw>,H:<rate>`
impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hardware_rate {
            Some(hr) => write!(f, "E:{},H:{}", self.raw, hr),
            None => write!(f, "E:{}", self.raw),
        }
    }
}

/// Classification of one unit of source input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A well-formed sample
    Record(SampleRecord),
    /// Input that carries no sample (status chatter, blank lines)
    Skipped,
    /// A data line that could not be decoded
    Malformed(RecordError),
}

/// Decode one line of the device protocol
///
/// Data lines start with `E:`; further comma-separated fields may follow,
/// of which only `H:<rate>` is interpreted. Anything else is skipped.
pub fn parse_line(line: &str) -> SourceEvent {
    let line = line.trim();
    let Some(body) = line.strip_prefix("E:") else {
        return SourceEvent::Skipped;
    };

    let mut fields = body.split(',');
    let sample = fields.next().unwrap_or_default().trim();
    if sample.is_empty() {
        return SourceEvent::Malformed(RecordError::MissingSample(line.to_string()));
    }
    let raw = match sample.parse::<i32>() {
        Ok(raw) => raw,
        Err(_) => return SourceEvent::Malformed(RecordError::InvalidSample(sample.to_string())),
    };

    let mut record = SampleRecord::new(raw);
    for field in fields {
        if let Some((_, value)) = field.split_once("H:") {
            let value = value.trim();
            match value.parse::<i32>() {
                Ok(hr) => record.hardware_rate = Some(hr),
                Err(_) => {
                    return SourceEvent::Malformed(RecordError::InvalidHardwareRate(
                        value.to_string(),
                    ));
                }
            }
        }
    }

    SourceEvent::Record(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_only() {
        assert_eq!(parse_line("E:1234\r\n"), SourceEvent::Record(SampleRecord::new(1234)));
        assert_eq!(parse_line("E:-87"), SourceEvent::Record(SampleRecord::new(-87)));
    }

    #[test]
    fn test_parse_with_hardware_rate() {
        let event = parse_line("E:512,H:72");
        assert_eq!(event, SourceEvent::Record(SampleRecord::with_hardware_rate(512, 72)));

        let SourceEvent::Record(record) = parse_line("E:512,H:0") else {
            panic!("expected record");
        };
        assert_eq!(record.hardware_rate, Some(0));
        assert_eq!(record.valid_hardware_rate(), None);
    }

    #[test]
    fn test_hardware_rate_outside_device_range_ignored() {
        let rate = |hr| SampleRecord::with_hardware_rate(0, hr).valid_hardware_rate();
        assert_eq!(rate(-5), None);
        assert_eq!(rate(19), None);
        assert_eq!(rate(20), Some(20));
        assert_eq!(rate(299), Some(299));
        assert_eq!(rate(300), None);
        assert_eq!(SampleRecord::new(0).valid_hardware_rate(), None);
    }

    #[test]
    fn test_status_lines_skipped() {
        assert_eq!(parse_line("ECG 3 FIFO Reset Complete."), SourceEvent::Skipped);
        assert_eq!(parse_line(""), SourceEvent::Skipped);
    }

    #[test]
    fn test_malformed_lines_classified() {
        assert_eq!(
            parse_line("E:"),
            SourceEvent::Malformed(RecordError::MissingSample("E:".into()))
        );
        assert_eq!(
            parse_line("E:12x"),
            SourceEvent::Malformed(RecordError::InvalidSample("12x".into()))
        );
        assert_eq!(
            parse_line("E:12,H:fast"),
            SourceEvent::Malformed(RecordError::InvalidHardwareRate("fast".into()))
        );
    }

    #[test]
    fn test_display_matches_protocol() {
        let record = SampleRecord::with_hardware_rate(-40, 65);
        assert_eq!(record.to_string(), "E:-40,H:65");
        assert_eq!(parse_line(&record.to_string()), SourceEvent::Record(record));
    }
}
