//! Unit inference: turn one stage's raw readings into a filled unit matrix.
//!
//! Passes run in strict priority order and only ever fill empty slots, so a
//! directly measured value can never be shadowed by a derived or estimated
//! one:
//!
//! 1. direct classification from the device's unit indices,
//! 2. drive current from the FIRE current register,
//! 3. total <-> per-well cross completion,
//! 4. irradiance from power and plate geometry,
//! 5. power estimated from current through the LED efficiency model,
//! 6. current estimated from power through the same model,
//!
//! with cross completion re-run at reduced confidence after each estimation
//! pass.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::PlateGeometry;
use crate::reading::StageReading;
use crate::units::classifier::{classify_led_type, LedClassification};
use crate::units::efficiency::{efficiency_mw_per_ma, LedType};
use crate::units::matrix::{Confidence, Source, UnitKind, UnitMatrix};
use crate::units::{PerUnits, TotalUnits};

/// Reference drive current for the power -> current estimate, mA.
///
/// When estimating current we do not yet know the current the efficiency
/// model wants as input, so the curve is sampled at a mid-range operating
/// point instead.
const REFERENCE_CURRENT_MA: f64 = 500.0;

/// The inference result for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAnalysis {
    pub matrix: UnitMatrix,
    pub overall_confidence: Confidence,
    /// The LED model the estimation passes used.
    pub led_type: LedType,
}

/// A whole plate analyzed at once: the LED classification the stages voted
/// for, and each stage re-inferred under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateAnalysis {
    pub classification: LedClassification,
    pub stages: Vec<UnitAnalysis>,
}

/// Fill every unit slot derivable from one stage's readings.
pub fn infer_units(
    reading: &StageReading,
    geometry: &PlateGeometry,
    led_type: LedType,
) -> UnitAnalysis {
    let mut matrix = UnitMatrix::new();

    classify_total(&mut matrix, reading, geometry);
    classify_per(&mut matrix, reading, geometry);
    apply_fire_current(&mut matrix, reading, geometry);
    complete_cross(&mut matrix, geometry, Confidence::High);
    estimate_power_from_current(&mut matrix, led_type);
    complete_cross(&mut matrix, geometry, Confidence::Medium);
    estimate_current_from_power(&mut matrix, geometry, led_type);

    let overall_confidence = matrix.overall_confidence();
    debug!(
        "stage {}: inferred {} unit slot(s), overall confidence {}",
        reading.stage,
        matrix.iter().count(),
        overall_confidence
    );

    UnitAnalysis {
        matrix,
        overall_confidence,
        led_type,
    }
}

/// Classify the plate's LED family from every stage, then re-infer each
/// stage under the winning model.
pub fn analyze_all_stages(readings: &[StageReading], geometry: &PlateGeometry) -> PlateAnalysis {
    let classification = classify_led_type(readings, geometry);
    let stages = readings
        .iter()
        .map(|r| infer_units(r, geometry, classification.led_type))
        .collect();
    PlateAnalysis {
        classification,
        stages,
    }
}

/// Fill a W/mW (or A/mA) sibling pair: the anchor slot directly, the other
/// as a scale conversion one confidence step below.
fn fill_scaled_pair(
    matrix: &mut UnitMatrix,
    anchor: UnitKind,
    anchor_value: f64,
    sibling: UnitKind,
    sibling_value: f64,
    source: Source,
    confidence: Confidence,
) {
    matrix.fill(anchor, anchor_value, source, confidence);
    matrix.fill(sibling, sibling_value, Source::ConvertedUnit, Confidence::High);
}

/// Pass 1a: the TOTAL reading under its device-reported unit index.
fn classify_total(matrix: &mut UnitMatrix, reading: &StageReading, geometry: &PlateGeometry) {
    let (value, units) = match (reading.total_power, reading.total_units) {
        (Some(v), Some(u)) => (v, u),
        _ => return,
    };

    match units {
        TotalUnits::RadiantPowerW => fill_scaled_pair(
            matrix,
            UnitKind::TotalPowerW,
            value,
            UnitKind::TotalPowerMw,
            value * 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        TotalUnits::RadiantPowerMw => fill_scaled_pair(
            matrix,
            UnitKind::TotalPowerMw,
            value,
            UnitKind::TotalPowerW,
            value / 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        TotalUnits::IrradianceWPerCm2 => {
            fill_scaled_pair(
                matrix,
                UnitKind::TotalIrradianceWPerCm2,
                value,
                UnitKind::TotalIrradianceMwPerCm2,
                value * 1000.0,
                Source::DeviceDirect,
                Confidence::VeryHigh,
            );
            // A direct irradiance pins down total power through the plate area
            let power_w = value * geometry.total_area_cm2;
            fill_scaled_pair(
                matrix,
                UnitKind::TotalPowerW,
                power_w,
                UnitKind::TotalPowerMw,
                power_w * 1000.0,
                Source::CalculatedFromIrradiance,
                Confidence::High,
            );
        }
        TotalUnits::IrradianceMwPerCm2 => {
            fill_scaled_pair(
                matrix,
                UnitKind::TotalIrradianceMwPerCm2,
                value,
                UnitKind::TotalIrradianceWPerCm2,
                value / 1000.0,
                Source::DeviceDirect,
                Confidence::VeryHigh,
            );
            let power_mw = value * geometry.total_area_cm2;
            fill_scaled_pair(
                matrix,
                UnitKind::TotalPowerMw,
                power_mw,
                UnitKind::TotalPowerW,
                power_mw / 1000.0,
                Source::CalculatedFromIrradiance,
                Confidence::High,
            );
        }
        TotalUnits::CurrentA => fill_scaled_pair(
            matrix,
            UnitKind::TotalCurrentA,
            value,
            UnitKind::TotalCurrentMa,
            value * 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        TotalUnits::CurrentMa => fill_scaled_pair(
            matrix,
            UnitKind::TotalCurrentMa,
            value,
            UnitKind::TotalCurrentA,
            value / 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        TotalUnits::Blank | TotalUnits::Unknown(_) => {}
    }
}

/// Pass 1b: the PER-WELL reading under its device-reported unit index.
fn classify_per(matrix: &mut UnitMatrix, reading: &StageReading, geometry: &PlateGeometry) {
    let (value, units) = match (reading.per_power, reading.per_units) {
        (Some(v), Some(u)) => (v, u),
        _ => return,
    };

    match units {
        PerUnits::PowerWPerWell => fill_scaled_pair(
            matrix,
            UnitKind::PerPowerW,
            value,
            UnitKind::PerPowerMw,
            value * 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        PerUnits::PowerMwPerWell => fill_scaled_pair(
            matrix,
            UnitKind::PerPowerMw,
            value,
            UnitKind::PerPowerW,
            value / 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        PerUnits::IrradianceMwPerCm2PerWell => {
            fill_scaled_pair(
                matrix,
                UnitKind::PerWellIrradianceMwPerCm2,
                value,
                UnitKind::PerWellIrradianceWPerCm2,
                value / 1000.0,
                Source::DeviceDirect,
                Confidence::VeryHigh,
            );
            let power_mw = value * geometry.well_area_cm2;
            fill_scaled_pair(
                matrix,
                UnitKind::PerPowerMw,
                power_mw,
                UnitKind::PerPowerW,
                power_mw / 1000.0,
                Source::CalculatedFromIrradiance,
                Confidence::High,
            );
        }
        // Firmware quirk: the bare "mW/cm²" label in the per-well slot is a
        // TOTAL irradiance readout. Unlike a directly reported total
        // irradiance this fills the irradiance pair only; total power is left
        // to the later passes (or the current estimate).
        PerUnits::IrradianceMwPerCm2 => fill_scaled_pair(
            matrix,
            UnitKind::TotalIrradianceMwPerCm2,
            value,
            UnitKind::TotalIrradianceWPerCm2,
            value / 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        PerUnits::CurrentAPerWell => fill_scaled_pair(
            matrix,
            UnitKind::PerCurrentA,
            value,
            UnitKind::PerCurrentMa,
            value * 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        PerUnits::CurrentMaPerWell => fill_scaled_pair(
            matrix,
            UnitKind::PerCurrentMa,
            value,
            UnitKind::PerCurrentA,
            value / 1000.0,
            Source::DeviceDirect,
            Confidence::VeryHigh,
        ),
        // Indices 2/3 relabel the slot as total power on the front panel but
        // the register still holds a per-well number, so neither slot is
        // trustworthy. J/s and blank carry no unit information either.
        PerUnits::RadiantPowerW
        | PerUnits::RadiantPowerMw
        | PerUnits::JoulesPerSecond
        | PerUnits::Blank
        | PerUnits::Unknown(_) => {}
    }
}

/// Pass 2: a positive FIRE current is a measured total drive current.
fn apply_fire_current(matrix: &mut UnitMatrix, reading: &StageReading, geometry: &PlateGeometry) {
    let fire_ma = match reading.fire_current_ma {
        Some(ma) if ma > 0 => f64::from(ma),
        _ => return,
    };

    fill_scaled_pair(
        matrix,
        UnitKind::TotalCurrentMa,
        fire_ma,
        UnitKind::TotalCurrentA,
        fire_ma / 1000.0,
        Source::DeviceCurrent,
        Confidence::High,
    );

    let per_ma = fire_ma / f64::from(geometry.well_count);
    matrix.fill(
        UnitKind::PerCurrentMa,
        per_ma,
        Source::CalculatedFromTotal,
        Confidence::Medium,
    );
    matrix.fill(
        UnitKind::PerCurrentA,
        per_ma / 1000.0,
        Source::CalculatedFromTotal,
        Confidence::Medium,
    );
}

/// Passes 3 and 4: propagate power between total and per-well, and derive
/// irradiance from power, at the given confidence.
///
/// Run once at `High` after the measurement passes and again at `Medium`
/// after estimation, so derived values inherit the trust of what fed them.
fn complete_cross(matrix: &mut UnitMatrix, geometry: &PlateGeometry, confidence: Confidence) {
    let wells = f64::from(geometry.well_count);

    // total power from per-well power
    if let Some(per_mw) = matrix.value(UnitKind::PerPowerMw) {
        let total_mw = per_mw * wells;
        matrix.fill(
            UnitKind::TotalPowerMw,
            total_mw,
            Source::CalculatedFromPerWell,
            confidence,
        );
        matrix.fill(
            UnitKind::TotalPowerW,
            total_mw / 1000.0,
            Source::CalculatedFromPerWell,
            confidence,
        );
    }

    // per-well power from total power
    if let Some(total_mw) = matrix.value(UnitKind::TotalPowerMw) {
        let per_mw = total_mw / wells;
        matrix.fill(
            UnitKind::PerPowerMw,
            per_mw,
            Source::CalculatedFromTotal,
            confidence,
        );
        matrix.fill(
            UnitKind::PerPowerW,
            per_mw / 1000.0,
            Source::CalculatedFromTotal,
            confidence,
        );
    }

    // irradiance from power over the respective area
    if let Some(total_mw) = matrix.value(UnitKind::TotalPowerMw) {
        let irr_mw = total_mw / geometry.total_area_cm2;
        matrix.fill(
            UnitKind::TotalIrradianceMwPerCm2,
            irr_mw,
            Source::CalculatedFromPower,
            confidence,
        );
        matrix.fill(
            UnitKind::TotalIrradianceWPerCm2,
            irr_mw / 1000.0,
            Source::CalculatedFromPower,
            confidence,
        );
    }
    if let Some(per_mw) = matrix.value(UnitKind::PerPowerMw) {
        let irr_mw = per_mw / geometry.well_area_cm2;
        matrix.fill(
            UnitKind::PerWellIrradianceMwPerCm2,
            irr_mw,
            Source::CalculatedFromPower,
            confidence,
        );
        matrix.fill(
            UnitKind::PerWellIrradianceWPerCm2,
            irr_mw / 1000.0,
            Source::CalculatedFromPower,
            confidence,
        );
    }
}

/// Pass 5: no power anywhere, but a known drive current.
fn estimate_power_from_current(matrix: &mut UnitMatrix, led_type: LedType) {
    if matrix.value(UnitKind::TotalPowerMw).is_some() {
        return;
    }
    let ma = match matrix.value(UnitKind::TotalCurrentMa) {
        Some(ma) => ma,
        None => return,
    };

    let eff = efficiency_mw_per_ma(led_type, ma);
    let est_mw = ma * eff;
    debug!(
        "estimating total power from {:.0} mA at {:.2} mW/mA ({:?})",
        ma, eff, led_type
    );
    let source = Source::EstimatedFromCurrent {
        efficiency_mw_per_ma: eff,
    };
    matrix.fill(UnitKind::TotalPowerMw, est_mw, source, Confidence::Medium);
    matrix.fill(
        UnitKind::TotalPowerW,
        est_mw / 1000.0,
        source,
        Confidence::Medium,
    );
}

/// Pass 6: no current anywhere, but a known power.
fn estimate_current_from_power(
    matrix: &mut UnitMatrix,
    geometry: &PlateGeometry,
    led_type: LedType,
) {
    if matrix.value(UnitKind::TotalCurrentMa).is_some() {
        return;
    }
    let mw = match matrix.value(UnitKind::TotalPowerMw) {
        Some(mw) => mw,
        None => return,
    };

    let eff = efficiency_mw_per_ma(led_type, REFERENCE_CURRENT_MA);
    let est_ma = mw / eff;
    let source = Source::EstimatedFromPower {
        efficiency_mw_per_ma: eff,
    };
    matrix.fill(UnitKind::TotalCurrentMa, est_ma, source, Confidence::Medium);
    matrix.fill(
        UnitKind::TotalCurrentA,
        est_ma / 1000.0,
        source,
        Confidence::Medium,
    );

    let per_ma = est_ma / f64::from(geometry.well_count);
    matrix.fill(
        UnitKind::PerCurrentMa,
        per_ma,
        Source::CalculatedFromTotal,
        Confidence::Medium,
    );
    matrix.fill(
        UnitKind::PerCurrentA,
        per_ma / 1000.0,
        Source::CalculatedFromTotal,
        Confidence::Medium,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::registers::Stage;

    fn reading(stage: u8) -> StageReading {
        StageReading::empty(Stage::new(stage).unwrap())
    }

    fn geometry() -> PlateGeometry {
        PlateGeometry::rev_b()
    }

    #[test]
    fn direct_irradiance_back_computes_total_power() {
        let mut r = reading(1);
        r.total_power = Some(125.8);
        r.total_units = Some(TotalUnits::IrradianceMwPerCm2);

        let analysis = infer_units(&r, &geometry(), LedType::Generic);
        let m = &analysis.matrix;

        let irr = m.get(UnitKind::TotalIrradianceMwPerCm2);
        assert_eq!(irr.value, Some(125.8));
        assert_eq!(irr.source, Source::DeviceDirect);
        assert_eq!(irr.confidence, Confidence::VeryHigh);

        let power = m.get(UnitKind::TotalPowerMw);
        let expected_mw = 125.8 * geometry().total_area_cm2;
        assert!((power.value.unwrap() - expected_mw).abs() < 0.5);
        assert!((power.value.unwrap() - 16955.0).abs() < 10.0);
        assert_eq!(power.source, Source::CalculatedFromIrradiance);
        assert_eq!(power.confidence, Confidence::High);

        assert_eq!(analysis.overall_confidence, Confidence::VeryHigh);
    }

    #[test]
    fn fire_current_alone_yields_estimated_power() {
        let mut r = reading(1);
        r.fire_current_ma = Some(405);

        let analysis = infer_units(&r, &geometry(), LedType::Generic);
        let m = &analysis.matrix;

        let current = m.get(UnitKind::TotalCurrentMa);
        assert_eq!(current.value, Some(405.0));
        assert_eq!(current.source, Source::DeviceCurrent);
        assert_eq!(current.confidence, Confidence::High);

        // 405 mA falls in the generic 200..500 band at 0.5 mW/mA
        let power = m.get(UnitKind::TotalPowerMw);
        assert!((power.value.unwrap() - 202.5).abs() < 1e-9);
        assert_eq!(power.confidence, Confidence::Medium);
        assert!(power.source.to_string().contains("EstimatedFromCurrent"));
    }

    #[test]
    fn direct_power_beats_cross_completion() {
        let mut r = reading(2);
        r.total_power = Some(500.0);
        r.total_units = Some(TotalUnits::RadiantPowerMw);
        r.per_power = Some(9.9);
        r.per_units = Some(PerUnits::PowerMwPerWell);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        // Both totals and per-well are device readings; neither is derived
        // from the other even though they disagree slightly.
        assert_eq!(m.get(UnitKind::TotalPowerMw).source, Source::DeviceDirect);
        assert_eq!(m.get(UnitKind::PerPowerMw).source, Source::DeviceDirect);
        assert_eq!(m.value(UnitKind::TotalPowerMw), Some(500.0));
        assert_eq!(m.value(UnitKind::PerPowerMw), Some(9.9));
    }

    #[test]
    fn per_well_power_completes_the_totals() {
        let mut r = reading(3);
        r.per_power = Some(10.0);
        r.per_units = Some(PerUnits::PowerMwPerWell);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        let total = m.get(UnitKind::TotalPowerMw);
        assert_eq!(total.value, Some(960.0));
        assert_eq!(total.source, Source::CalculatedFromPerWell);
        assert_eq!(total.confidence, Confidence::High);

        let irr = m.get(UnitKind::PerWellIrradianceMwPerCm2);
        assert!((irr.value.unwrap() - 10.0 / geometry().well_area_cm2).abs() < 1e-9);
        assert_eq!(irr.source, Source::CalculatedFromPower);
    }

    #[test]
    fn bare_irradiance_label_in_per_slot_is_total() {
        let mut r = reading(1);
        r.per_power = Some(50.0);
        r.per_units = Some(PerUnits::IrradianceMwPerCm2);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        assert_eq!(m.value(UnitKind::TotalIrradianceMwPerCm2), Some(50.0));
        assert_eq!(
            m.get(UnitKind::TotalIrradianceMwPerCm2).source,
            Source::DeviceDirect
        );
        // The quirk fills only the irradiance pair; with no current to
        // estimate from, power stays empty.
        assert_eq!(m.value(UnitKind::TotalPowerMw), None);
        assert_eq!(m.value(UnitKind::PerWellIrradianceMwPerCm2), None);
    }

    #[test]
    fn bare_irradiance_leaves_power_to_the_current_estimate() {
        let mut r = reading(1);
        r.per_power = Some(50.0);
        r.per_units = Some(PerUnits::IrradianceMwPerCm2);
        r.fire_current_ma = Some(405);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        // Total power comes from the 405 mA estimate (0.5 mW/mA), not from
        // irradiance x area
        let power = m.get(UnitKind::TotalPowerMw);
        assert!((power.value.unwrap() - 202.5).abs() < 1e-9);
        assert_eq!(power.confidence, Confidence::Medium);
        assert!(power.source.to_string().contains("EstimatedFromCurrent"));
        // The directly reported total irradiance is untouched by the estimate
        assert_eq!(m.value(UnitKind::TotalIrradianceMwPerCm2), Some(50.0));
        assert_eq!(
            m.get(UnitKind::TotalIrradianceMwPerCm2).confidence,
            Confidence::VeryHigh
        );
    }

    #[test]
    fn total_power_alias_in_per_slot_is_ignored() {
        let mut r = reading(4);
        r.per_power = Some(123.0);
        r.per_units = Some(PerUnits::RadiantPowerMw);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        assert_eq!(m.iter().count(), 0);
    }

    #[test]
    fn power_estimates_current_at_reference_point() {
        let mut r = reading(5);
        r.total_power = Some(350.0);
        r.total_units = Some(TotalUnits::RadiantPowerMw);

        let m = infer_units(&r, &geometry(), LedType::Generic).matrix;
        let current = m.get(UnitKind::TotalCurrentMa);
        // generic curve at the 500 mA reference point is 0.4 mW/mA
        assert!((current.value.unwrap() - 350.0 / 0.4).abs() < 1e-9);
        assert_eq!(current.confidence, Confidence::Medium);
        assert!(current.source.to_string().contains("EstimatedFromPower"));
        assert!(m.value(UnitKind::PerCurrentMa).is_some());
    }

    #[test]
    fn empty_reading_yields_empty_matrix() {
        let analysis = infer_units(&reading(1), &geometry(), LedType::Generic);
        assert_eq!(analysis.matrix.iter().count(), 0);
        assert_eq!(analysis.overall_confidence, Confidence::None);
    }

    #[test]
    fn zero_fire_current_is_not_a_measurement() {
        let mut r = reading(1);
        r.fire_current_ma = Some(0);
        let analysis = infer_units(&r, &geometry(), LedType::Generic);
        assert_eq!(analysis.matrix.iter().count(), 0);
    }
}
