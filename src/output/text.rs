use super::{Formatter, RateOutput};
use crate::processing::RateOrigin;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &RateOutput) -> String {
        let rr = output
            .interval_ms
            .map_or("-".to_string(), |ms| ms.to_string());
        if self.verbose {
            let origin = match output.origin {
                RateOrigin::Hardware => "hardware",
                RateOrigin::Detector => "detector",
            };
            format!(
                "[{:>10.3}s] BPM: {:>3}  RR: {:>4} ms ({})",
                output.time_secs, output.bpm, rr, origin
            )
        } else {
            format!("BPM: {}  RR: {} ms", output.bpm, rr)
        }
    }
}
