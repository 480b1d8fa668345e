use super::{Formatter, RateOutput, iso8601_timestamp};
use crate::processing::RateOrigin;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &RateOutput) -> String {
        let rr = output
            .interval_ms
            .map_or(String::new(), |ms| ms.to_string());
        let origin = match output.origin {
            RateOrigin::Hardware => "hardware",
            RateOrigin::Detector => "detector",
        };
        format!(
            "{},{:.3},{},{},{}",
            iso8601_timestamp(),
            output.time_secs,
            output.bpm,
            rr,
            origin
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,time_secs,bpm,interval_ms,origin")
    }
}
