mod csv;
mod json;
mod text;

use chrono::Utc;

use crate::processing::{RateOrigin, RateUpdate};

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One displayed rate change
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RateOutput {
    /// Sample time in seconds since the stream started
    pub time_secs: f64,
    pub bpm: u32,
    pub interval_ms: Option<u32>,
    pub origin: RateOrigin,
}

impl RateOutput {
    pub fn new(time_secs: f64, update: &RateUpdate) -> Self {
        Self {
            time_secs,
            bpm: update.bpm,
            interval_ms: update.interval_ms,
            origin: update.origin,
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, output: &RateOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(origin: RateOrigin, interval_ms: Option<u32>) -> RateOutput {
        RateOutput {
            time_secs: 12.5,
            bpm: 74,
            interval_ms,
            origin,
        }
    }

    #[test]
    fn test_text_format() {
        let plain = TextFormatter::new(false);
        assert_eq!(
            plain.format(&sample(RateOrigin::Detector, Some(811))),
            "BPM: 74  RR: 811 ms"
        );
        assert_eq!(plain.format(&sample(RateOrigin::Hardware, None)), "BPM: 74  RR: - ms");

        let verbose = TextFormatter::new(true);
        assert_eq!(
            verbose.format(&sample(RateOrigin::Hardware, None)),
            "[    12.500s] BPM:  74  RR:    - ms (hardware)"
        );
    }

    #[test]
    fn test_csv_format() {
        let formatter = CsvFormatter;
        let line = formatter.format(&sample(RateOrigin::Detector, Some(811)));
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(&fields[1..], ["12.500", "74", "811", "detector"]);
        assert_eq!(
            formatter.header().map(|h| h.split(',').count()),
            Some(fields.len())
        );
    }

    #[test]
    fn test_json_format() {
        let line = JsonFormatter.format(&sample(RateOrigin::Hardware, None));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["bpm"], 74);
        assert_eq!(value["interval_ms"], serde_json::Value::Null);
        assert_eq!(value["origin"], "hardware");
        assert!(value["ts"].is_string());
    }
}
