pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod source;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use wav::save_wav;
