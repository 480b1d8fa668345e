pub mod buffer;
pub mod lead_off;
pub mod math;
pub mod moving_average;
pub mod peak_detector;

pub use buffer::TrailingBuffer;
pub use lead_off::LeadOffDetector;
pub use math::{interval_to_bpm, interval_to_millis, upper_median};
pub use moving_average::Smoother;
pub use peak_detector::{BeatEvent, BeatKind, Detection, HeartRate, PeakDetector};
