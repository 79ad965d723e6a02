//! Error types shared across the pipeline

use thiserror::Error;

use crate::muxer::Priority;

/// Failure reported by an LED device sink
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Device went away (unplugged, socket closed)
    #[error("device disconnected")]
    Disconnected,
    /// Device could not accept the frame right now
    #[error("device busy")]
    Busy,
    /// Transport-level failure
    #[error("device i/o error: {0}")]
    Io(&'static str),
}

/// Invalid or unknown configuration value
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Smoothing config id is not registered
    #[error("unknown smoothing config id {0}")]
    UnknownSmoothingConfig(u32),
    /// Unrecognized image-to-LED mapping type string
    #[error("unknown image to led mapping type")]
    UnknownMappingType,
    /// Unrecognized black border detection mode string
    #[error("unknown black border detection mode")]
    UnknownBorderMode,
    /// Unrecognized smoothing type string
    #[error("unknown smoothing type")]
    UnknownSmoothingKind,
    /// Value outside of its accepted range
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

/// Rejected priority muxer request
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxerError {
    /// Priority belongs to the reserved window
    #[error("priority {0} is reserved")]
    ReservedPriority(Priority),
    /// Priority has no registration
    #[error("priority {0} is not registered")]
    NotRegistered(Priority),
}
