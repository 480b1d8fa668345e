use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported recording: {0}")]
    Recording(String),
}

/// Why a data line from the acquisition device could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing sample value in {0:?}")]
    MissingSample(String),

    #[error("invalid sample value {0:?}")]
    InvalidSample(String),

    #[error("invalid hardware rate {0:?}")]
    InvalidHardwareRate(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
