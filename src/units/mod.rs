//! Unit semantics and the inference engine.
//!
//! The device stores one small integer per stage ("unit index") saying which
//! physical unit a raw reading should be interpreted as. The reference
//! implementation dispatched on substrings of the human-readable labels
//! ("is 'mW TOTAL' in this string"); here the integer index is the single
//! source of truth, decoded once into a closed enum, and the label is derived
//! purely for display.

pub mod classifier;
pub mod efficiency;
pub mod inference;
pub mod matrix;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit classification of a stage's TOTAL reading (device index 0..=6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalUnits {
    /// 0: W total radiant power.
    RadiantPowerW,
    /// 1: mW total radiant power.
    RadiantPowerMw,
    /// 2: W/cm² total irradiance.
    IrradianceWPerCm2,
    /// 3: mW/cm² total irradiance.
    IrradianceMwPerCm2,
    /// 4: blank (stage not configured).
    Blank,
    /// 5: A total current.
    CurrentA,
    /// 6: mA total current.
    CurrentMa,
    /// Any other index the firmware may report.
    Unknown(u16),
}

impl TotalUnits {
    /// Decode the device's total-units index.
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => TotalUnits::RadiantPowerW,
            1 => TotalUnits::RadiantPowerMw,
            2 => TotalUnits::IrradianceWPerCm2,
            3 => TotalUnits::IrradianceMwPerCm2,
            4 => TotalUnits::Blank,
            5 => TotalUnits::CurrentA,
            6 => TotalUnits::CurrentMa,
            other => TotalUnits::Unknown(other),
        }
    }

    /// The firmware's display label, reproduced exactly.
    pub fn label(&self) -> &'static str {
        match self {
            TotalUnits::RadiantPowerW => "W TOTAL RADIANT POWER",
            TotalUnits::RadiantPowerMw => "mW TOTAL RADIANT POWER",
            TotalUnits::IrradianceWPerCm2 => "W/cm² TOTAL IRRADIANCE",
            TotalUnits::IrradianceMwPerCm2 => "mW/cm² TOTAL IRRADIANCE",
            TotalUnits::Blank => "",
            TotalUnits::CurrentA => "A TOTAL CURRENT",
            TotalUnits::CurrentMa => "mA TOTAL CURRENT",
            TotalUnits::Unknown(_) => "UNKNOWN UNITS",
        }
    }
}

impl fmt::Display for TotalUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit classification of a stage's PER-WELL reading (device index 0..=9).
///
/// The firmware overloads this slot: indices 2/3 relabel it as total radiant
/// power, and index 5 (plain "mW/cm²") expresses TOTAL irradiance through the
/// per-well register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerUnits {
    /// 0: W per well.
    PowerWPerWell,
    /// 1: mW per well.
    PowerMwPerWell,
    /// 2: W total radiant power (display alias, not a per-well quantity).
    RadiantPowerW,
    /// 3: mW total radiant power (display alias, not a per-well quantity).
    RadiantPowerMw,
    /// 4: mW/cm² per well.
    IrradianceMwPerCm2PerWell,
    /// 5: plain mW/cm²; the device uses this to show total irradiance here.
    IrradianceMwPerCm2,
    /// 6: J/s.
    JoulesPerSecond,
    /// 7: blank (stage not configured).
    Blank,
    /// 8: A per well.
    CurrentAPerWell,
    /// 9: mA per well.
    CurrentMaPerWell,
    /// Any other index the firmware may report.
    Unknown(u16),
}

impl PerUnits {
    /// Decode the device's per-units index.
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => PerUnits::PowerWPerWell,
            1 => PerUnits::PowerMwPerWell,
            2 => PerUnits::RadiantPowerW,
            3 => PerUnits::RadiantPowerMw,
            4 => PerUnits::IrradianceMwPerCm2PerWell,
            5 => PerUnits::IrradianceMwPerCm2,
            6 => PerUnits::JoulesPerSecond,
            7 => PerUnits::Blank,
            8 => PerUnits::CurrentAPerWell,
            9 => PerUnits::CurrentMaPerWell,
            other => PerUnits::Unknown(other),
        }
    }

    /// The firmware's display label, reproduced exactly.
    pub fn label(&self) -> &'static str {
        match self {
            PerUnits::PowerWPerWell => "W PER WELL",
            PerUnits::PowerMwPerWell => "mW PER WELL",
            PerUnits::RadiantPowerW => "W TOTAL RADIANT POWER",
            PerUnits::RadiantPowerMw => "mW TOTAL RADIANT POWER",
            PerUnits::IrradianceMwPerCm2PerWell => "mW/cm² PER WELL",
            PerUnits::IrradianceMwPerCm2 => "mW/cm²",
            PerUnits::JoulesPerSecond => "J/s",
            PerUnits::Blank => "",
            PerUnits::CurrentAPerWell => "A PER WELL",
            PerUnits::CurrentMaPerWell => "mA PER WELL",
            PerUnits::Unknown(_) => "UNKNOWN UNITS",
        }
    }
}

impl fmt::Display for PerUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
