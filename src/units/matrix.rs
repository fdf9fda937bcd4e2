//! The unit matrix: every representable unit alongside how we know it.
//!
//! Inference never overwrites: the first writer of a slot wins, and later,
//! lower-priority passes only fill slots that are still empty. Each filled
//! slot carries its provenance so a consumer can decide whether a number was
//! measured, converted, or guessed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};

/// Every unit the matrix can express for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    TotalPowerW,
    TotalPowerMw,
    PerPowerW,
    PerPowerMw,
    TotalIrradianceWPerCm2,
    TotalIrradianceMwPerCm2,
    PerWellIrradianceWPerCm2,
    PerWellIrradianceMwPerCm2,
    TotalCurrentA,
    TotalCurrentMa,
    PerCurrentA,
    PerCurrentMa,
}

impl UnitKind {
    /// All kinds, in matrix slot order.
    pub const ALL: [UnitKind; 12] = [
        UnitKind::TotalPowerW,
        UnitKind::TotalPowerMw,
        UnitKind::PerPowerW,
        UnitKind::PerPowerMw,
        UnitKind::TotalIrradianceWPerCm2,
        UnitKind::TotalIrradianceMwPerCm2,
        UnitKind::PerWellIrradianceWPerCm2,
        UnitKind::PerWellIrradianceMwPerCm2,
        UnitKind::TotalCurrentA,
        UnitKind::TotalCurrentMa,
        UnitKind::PerCurrentA,
        UnitKind::PerCurrentMa,
    ];

    fn index(self) -> usize {
        match self {
            UnitKind::TotalPowerW => 0,
            UnitKind::TotalPowerMw => 1,
            UnitKind::PerPowerW => 2,
            UnitKind::PerPowerMw => 3,
            UnitKind::TotalIrradianceWPerCm2 => 4,
            UnitKind::TotalIrradianceMwPerCm2 => 5,
            UnitKind::PerWellIrradianceWPerCm2 => 6,
            UnitKind::PerWellIrradianceMwPerCm2 => 7,
            UnitKind::TotalCurrentA => 8,
            UnitKind::TotalCurrentMa => 9,
            UnitKind::PerCurrentA => 10,
            UnitKind::PerCurrentMa => 11,
        }
    }

    /// Display unit (the quantity label lives in the kind name itself).
    pub fn unit_symbol(self) -> &'static str {
        match self {
            UnitKind::TotalPowerW | UnitKind::PerPowerW => "W",
            UnitKind::TotalPowerMw | UnitKind::PerPowerMw => "mW",
            UnitKind::TotalIrradianceWPerCm2 | UnitKind::PerWellIrradianceWPerCm2 => "W/cm²",
            UnitKind::TotalIrradianceMwPerCm2 | UnitKind::PerWellIrradianceMwPerCm2 => "mW/cm²",
            UnitKind::TotalCurrentA | UnitKind::PerCurrentA => "A",
            UnitKind::TotalCurrentMa | UnitKind::PerCurrentMa => "mA",
        }
    }
}

/// How much to trust a matrix entry.
///
/// The ordering is the whole point: `overall_confidence` takes a max over
/// the matrix, and inference passes attach decreasing levels as they move
/// from measurement to estimation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::None => "none",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very high",
        };
        f.write_str(s)
    }
}

/// Provenance of a matrix entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Slot never filled.
    #[default]
    None,
    /// The device reported exactly this unit.
    DeviceDirect,
    /// Taken from the device's FIRE current setting.
    DeviceCurrent,
    /// Pure scale conversion of a sibling entry (W <-> mW, A <-> mA).
    ConvertedUnit,
    /// Power recovered from a directly reported irradiance and the plate area.
    CalculatedFromIrradiance,
    /// Total derived by multiplying a per-well value by the well count.
    CalculatedFromPerWell,
    /// Per-well derived by dividing a total by the well count.
    CalculatedFromTotal,
    /// Irradiance derived by dividing a power by an area.
    CalculatedFromPower,
    /// Power estimated from drive current through an LED efficiency curve.
    EstimatedFromCurrent { efficiency_mw_per_ma: f64 },
    /// Current estimated from power through an LED efficiency curve.
    EstimatedFromPower { efficiency_mw_per_ma: f64 },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::None => write!(f, "none"),
            Source::DeviceDirect => write!(f, "DeviceDirect"),
            Source::DeviceCurrent => write!(f, "DeviceCurrent"),
            Source::ConvertedUnit => write!(f, "ConvertedUnit"),
            Source::CalculatedFromIrradiance => write!(f, "CalculatedFromIrradiance"),
            Source::CalculatedFromPerWell => write!(f, "CalculatedFromPerWell"),
            Source::CalculatedFromTotal => write!(f, "CalculatedFromTotal"),
            Source::CalculatedFromPower => write!(f, "CalculatedFromPower"),
            Source::EstimatedFromCurrent {
                efficiency_mw_per_ma,
            } => write!(f, "EstimatedFromCurrent (eff={:.2})", efficiency_mw_per_ma),
            Source::EstimatedFromPower {
                efficiency_mw_per_ma,
            } => write!(f, "EstimatedFromPower (eff={:.2})", efficiency_mw_per_ma),
        }
    }
}

/// One slot of the matrix: a value plus how and how firmly we know it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitMatrixEntry {
    pub value: Option<f64>,
    pub source: Source,
    pub confidence: Confidence,
}

/// Per-stage table of every unit representation with provenance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitMatrix {
    entries: [UnitMatrixEntry; 12],
}

impl UnitMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: UnitKind) -> &UnitMatrixEntry {
        &self.entries[kind.index()]
    }

    /// The value for a kind, if the slot has been filled.
    pub fn value(&self, kind: UnitKind) -> Option<f64> {
        self.entries[kind.index()].value
    }

    /// The value for a kind, or [`PhotostimError::InsufficientData`].
    pub fn require(&self, kind: UnitKind) -> Result<f64> {
        self.value(kind)
            .ok_or(PhotostimError::InsufficientData(kind))
    }

    /// Fill a slot, unless an earlier (higher-priority) pass already did.
    pub fn fill(&mut self, kind: UnitKind, value: f64, source: Source, confidence: Confidence) {
        let entry = &mut self.entries[kind.index()];
        if entry.value.is_none() {
            *entry = UnitMatrixEntry {
                value: Some(value),
                source,
                confidence,
            };
        }
    }

    /// Iterate filled slots only.
    pub fn iter(&self) -> impl Iterator<Item = (UnitKind, &UnitMatrixEntry)> {
        UnitKind::ALL
            .iter()
            .map(move |&kind| (kind, self.get(kind)))
            .filter(|(_, entry)| entry.value.is_some())
    }

    /// Best confidence across the matrix (`Confidence::None` when empty).
    pub fn overall_confidence(&self) -> Confidence {
        self.entries
            .iter()
            .map(|e| e.confidence)
            .max()
            .unwrap_or_default()
    }
}
