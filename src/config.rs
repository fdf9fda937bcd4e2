//! Layered runtime configuration.
//!
//! Values come from `config/default.toml`, an optional override file named in
//! `PHOTOSTIM_CONFIG`, and finally `PHOTOSTIM_*` environment variables, later
//! layers winning. Every field has a serde default so an empty file is a
//! valid configuration.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};
use crate::geometry::GeometryRevision;
use crate::protocol::DecodeMode;

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port device name, e.g. "/dev/ttyUSB0" or "COM3".
    pub port: String,
    pub baud_rate: u32,
    /// Overall round-trip deadline per register access.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Settle delay between consecutive register reads.
    #[serde(with = "humantime_serde")]
    pub read_pacing: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 19_200,
            read_timeout: Duration::from_secs(1),
            read_pacing: crate::collector::DEFAULT_READ_PACING,
        }
    }
}

/// Top-level settings for the controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub serial: SerialSettings,
    /// How reply payloads are interpreted.
    pub decode_mode: DecodeMode,
    /// Which plate schematic revision to calculate irradiance with.
    pub geometry: GeometryRevision,
}

impl Settings {
    /// Load the layered configuration.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("PHOTOSTIM_CONFIG") {
            builder = builder.add_source(File::with_name(&path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("PHOTOSTIM").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the hardware cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(PhotostimError::Configuration(
                "serial.port must not be empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(PhotostimError::Configuration(
                "serial.baud_rate must be positive".to_string(),
            ));
        }
        if self.serial.read_timeout.is_zero() {
            return Err(PhotostimError::Configuration(
                "serial.read_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_instrument() {
        let s = Settings::default();
        assert_eq!(s.serial.baud_rate, 19_200);
        assert_eq!(s.serial.read_timeout, Duration::from_secs(1));
        assert_eq!(s.serial.read_pacing, Duration::from_millis(100));
        assert_eq!(s.decode_mode, DecodeMode::Unsigned);
        assert_eq!(s.geometry, GeometryRevision::RevB);
        s.validate().unwrap();
    }

    #[test]
    fn toml_round_trip_with_humantime_durations() {
        let toml = r#"
            decode_mode = "signed16"
            geometry = "rev_a"

            [serial]
            port = "COM3"
            baud_rate = 19200
            read_timeout = "2s"
            read_pacing = "50ms"
        "#;
        let s: Settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(s.serial.port, "COM3");
        assert_eq!(s.serial.read_timeout, Duration::from_secs(2));
        assert_eq!(s.serial.read_pacing, Duration::from_millis(50));
        assert_eq!(s.decode_mode, DecodeMode::Signed16);
        assert_eq!(s.geometry, GeometryRevision::RevA);
    }

    #[test]
    fn empty_port_fails_validation() {
        let mut s = Settings::default();
        s.serial.port.clear();
        assert!(matches!(
            s.validate(),
            Err(PhotostimError::Configuration(_))
        ));
    }
}
