//! Custom error types for the photostim library.
//!
//! This module defines the primary error type, `PhotostimError`, used across
//! the crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different failure classes: transport timeouts,
//! malformed protocol frames, register-map misses, and inference gaps.
//!
//! Codec- and transport-level failures are caught at the stage reading
//! collector boundary and converted into "field unavailable"; nothing in this
//! taxonomy is fatal to the process.

use std::time::Duration;

use thiserror::Error;

use crate::units::matrix::UnitKind;

/// Convenience alias for results using the library error type.
pub type Result<T> = std::result::Result<T, PhotostimError>;

#[derive(Error, Debug)]
pub enum PhotostimError {
    /// No reply bytes arrived within the round-trip deadline.
    #[error("Transport timeout after {0:?}")]
    TransportTimeout(Duration),

    /// A reply frame had the wrong length, markers, or payload characters.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The register map has no block for the requested stage.
    #[error("No register mapped for stage {0} (stages are numbered 1-5)")]
    UnknownRegister(u8),

    /// The inference engine could not produce any entry for a unit kind.
    #[error("Insufficient data to produce a value for {0:?}")]
    InsufficientData(UnitKind),

    /// Plate geometry values violate the physical invariant.
    #[error("Invalid plate geometry: {0}")]
    InvalidGeometry(String),

    /// A requested FIRE current exceeds the device's configured maximum.
    #[error("Cannot fire at {requested_ma} mA: device maximum is {max_ma} mA")]
    FireCurrentExceedsLimit { requested_ma: u16, max_ma: u16 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Semantic errors in the configuration that pass parsing but are
    /// logically incorrect, caught during the validation step.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "instrument_serial")]
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("Serial support not enabled. Rebuild with --features instrument_serial")]
    SerialFeatureDisabled,
}
