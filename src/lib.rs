//! Control and measurement library for a 5-stage 96-well photostimulation
//! plate controller.
//!
//! The crate splits into three layers:
//!
//! - **wire**: [`protocol`] implements the `*`-framed ASCII-hex register
//!   protocol, and [`transport`] moves frames over RS-232 (or a mock).
//! - **acquisition**: [`collector`] polls each stage's register block into
//!   [`reading::StageReading`]s, and [`device`] covers identity readout and
//!   the arm/fire sequences.
//! - **interpretation**: [`units`] turns raw readings plus [`geometry`] into
//!   a provenance-tracked [`units::matrix::UnitMatrix`], estimating through
//!   LED efficiency models when the device gives only a drive current.
//!
//! On real hardware the transport is `transport::SerialTransport` (behind the
//! default `instrument_serial` feature); the same pipeline runs against the
//! in-memory mock:
//!
//! ```
//! use photostim::collector::StageReadingCollector;
//! use photostim::geometry::PlateGeometry;
//! use photostim::protocol::DecodeMode;
//! use photostim::transport::{mock::MockDevice, CommandPort};
//! use photostim::units::inference::analyze_all_stages;
//! use std::time::Duration;
//!
//! let port = CommandPort::new(MockDevice::new(), DecodeMode::Unsigned);
//! let mut collector = StageReadingCollector::new(port).with_read_pacing(Duration::ZERO);
//! let readings = collector.collect_all();
//! let analysis = analyze_all_stages(&readings, &PlateGeometry::rev_b());
//! println!("{:?}", analysis.classification.led_type);
//! ```

pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod geometry;
pub mod protocol;
pub mod reading;
pub mod transport;
pub mod units;

pub use collector::StageReadingCollector;
pub use config::Settings;
pub use error::{PhotostimError, Result};
pub use geometry::{GeometryRevision, PlateGeometry};
pub use reading::StageReading;
pub use transport::{CommandPort, Transport};
pub use units::inference::{analyze_all_stages, infer_units, UnitAnalysis};
pub use units::matrix::{Confidence, Source, UnitKind, UnitMatrix};
