//! Raw per-stage readings as reported by the device.

use serde::{Deserialize, Serialize};

use crate::protocol::registers::Stage;
use crate::units::{PerUnits, TotalUnits};

/// One poll of a stage's six readable registers.
///
/// Every field is `Option` so that a failed register read stays
/// distinguishable from a measured zero: `None` means "could not read", and
/// downstream inference leaves the corresponding matrix entries empty instead
/// of fabricating zeros. Immutable after the collector assembles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReading {
    pub stage: Stage,
    /// Total reading at the device's declared fixed-point scale (raw / 10).
    /// Despite the name this may hold power, irradiance, or current depending
    /// on `total_units`.
    pub total_power: Option<f64>,
    /// Unit classification for `total_power`.
    pub total_units: Option<TotalUnits>,
    /// Per-well reading at the device scale (raw / 10).
    pub per_power: Option<f64>,
    /// Unit classification for `per_power`.
    pub per_units: Option<PerUnits>,
    /// Configured FIRE current in mA.
    pub fire_current_ma: Option<u32>,
    /// Configured ARM current in mA.
    pub arm_current_ma: Option<u32>,
}

impl StageReading {
    /// An all-unavailable reading for a stage (every register read failed).
    pub fn empty(stage: Stage) -> Self {
        Self {
            stage,
            total_power: None,
            total_units: None,
            per_power: None,
            per_units: None,
            fire_current_ma: None,
            arm_current_ma: None,
        }
    }

    /// True when no register on this stage produced data.
    pub fn is_empty(&self) -> bool {
        self.total_power.is_none()
            && self.total_units.is_none()
            && self.per_power.is_none()
            && self.per_units.is_none()
            && self.fire_current_ma.is_none()
            && self.arm_current_ma.is_none()
    }
}
