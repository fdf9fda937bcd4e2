//! LED family classification from observed drive currents and powers.
//!
//! Every stage that reports both a positive FIRE current and a positive
//! power-like total reading contributes one measured efficiency sample. The
//! averaged efficiency selects the LED family, with a high-drive override for
//! hardware that is unambiguously in high-power territory regardless of how
//! efficient it looks.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::PlateGeometry;
use crate::reading::StageReading;
use crate::units::efficiency::LedType;
use crate::units::matrix::Confidence;
use crate::units::TotalUnits;

/// Average efficiency above this is high-power hardware, mW/mA.
const HIGH_POWER_EFFICIENCY_MW_PER_MA: f64 = 0.8;

/// Average efficiency below this is UV hardware, mW/mA.
const UV_EFFICIENCY_MW_PER_MA: f64 = 0.3;

/// Drive current above this forces the high-power classification, mA.
const HIGH_POWER_CURRENT_MA: f64 = 500.0;

/// Plate-wide power density above this forces high-power, mW/cm².
const HIGH_POWER_DENSITY_MW_PER_CM2: f64 = 50.0;

/// The outcome of classifying a plate's LED family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedClassification {
    pub led_type: LedType,
    /// Mean measured efficiency across qualifying stages; `None` when no
    /// stage qualified and the type is a pure default.
    pub avg_efficiency_mw_per_ma: Option<f64>,
    pub avg_current_ma: f64,
    /// Sum of stage powers over the plate area, mW/cm².
    pub power_density_mw_cm2: f64,
    pub confidence: Confidence,
    /// Stages that contributed an efficiency sample.
    pub sample_count: usize,
}

/// Total power in mW, if this reading's units express a power we can scale.
fn total_power_mw(reading: &StageReading, geometry: &PlateGeometry) -> Option<f64> {
    let power = reading.total_power.filter(|p| *p > 0.0)?;
    match reading.total_units? {
        TotalUnits::RadiantPowerMw => Some(power),
        TotalUnits::RadiantPowerW => Some(power * 1000.0),
        TotalUnits::IrradianceMwPerCm2 => Some(power * geometry.total_area_cm2),
        _ => None,
    }
}

/// Classify the plate's LED family from a set of stage readings.
pub fn classify_led_type(readings: &[StageReading], geometry: &PlateGeometry) -> LedClassification {
    let mut efficiencies = Vec::new();
    let mut currents = Vec::new();
    let mut total_power_sum_mw = 0.0;

    for reading in readings {
        let ma = match reading.fire_current_ma {
            Some(ma) if ma > 0 => f64::from(ma),
            _ => continue,
        };
        let mw = match total_power_mw(reading, geometry) {
            Some(mw) => mw,
            None => continue,
        };
        efficiencies.push(mw / ma);
        currents.push(ma);
        total_power_sum_mw += mw;
    }

    let sample_count = efficiencies.len();
    let power_density_mw_cm2 = total_power_sum_mw / geometry.total_area_cm2;

    if sample_count == 0 {
        debug!("no stage qualified for LED classification; defaulting to generic");
        return LedClassification {
            led_type: LedType::Generic,
            avg_efficiency_mw_per_ma: None,
            avg_current_ma: 0.0,
            power_density_mw_cm2,
            confidence: Confidence::Low,
            sample_count: 0,
        };
    }

    let avg_efficiency = efficiencies.iter().sum::<f64>() / sample_count as f64;
    let avg_current_ma = currents.iter().sum::<f64>() / sample_count as f64;

    let mut led_type = if avg_efficiency > HIGH_POWER_EFFICIENCY_MW_PER_MA {
        LedType::HighPower
    } else if avg_efficiency < UV_EFFICIENCY_MW_PER_MA {
        LedType::Uv
    } else {
        LedType::Generic
    };

    // Heavy drive or dense output upgrades an inconclusive generic verdict
    // to high-power; a UV verdict from the efficiency data stands.
    if led_type == LedType::Generic
        && (avg_current_ma > HIGH_POWER_CURRENT_MA
            || power_density_mw_cm2 > HIGH_POWER_DENSITY_MW_PER_CM2)
    {
        led_type = LedType::HighPower;
    }

    let confidence = match sample_count {
        0 | 1 => Confidence::Low,
        2 => Confidence::Medium,
        _ => Confidence::High,
    };

    debug!(
        "classified {:?} from {} sample(s): avg eff {:.2} mW/mA, avg drive {:.0} mA, density {:.1} mW/cm²",
        led_type, sample_count, avg_efficiency, avg_current_ma, power_density_mw_cm2
    );

    LedClassification {
        led_type,
        avg_efficiency_mw_per_ma: Some(avg_efficiency),
        avg_current_ma,
        power_density_mw_cm2,
        confidence,
        sample_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::registers::Stage;

    fn sample(stage: u8, fire_ma: u32, power: f64, units: TotalUnits) -> StageReading {
        let mut r = StageReading::empty(Stage::new(stage).unwrap());
        r.fire_current_ma = Some(fire_ma);
        r.total_power = Some(power);
        r.total_units = Some(units);
        r
    }

    fn geometry() -> PlateGeometry {
        PlateGeometry::rev_b()
    }

    #[test]
    fn no_samples_defaults_to_generic_with_no_efficiency() {
        let c = classify_led_type(&[], &geometry());
        assert_eq!(c.led_type, LedType::Generic);
        assert_eq!(c.avg_efficiency_mw_per_ma, None);
        assert_eq!(c.sample_count, 0);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn uv_efficiency_classifies_uv() {
        // 40 mW at 200 mA = 0.2 mW/mA, below the UV threshold
        let readings = vec![
            sample(1, 200, 40.0, TotalUnits::RadiantPowerMw),
            sample(2, 200, 40.0, TotalUnits::RadiantPowerMw),
            sample(3, 200, 40.0, TotalUnits::RadiantPowerMw),
        ];
        let c = classify_led_type(&readings, &geometry());
        assert_eq!(c.led_type, LedType::Uv);
        assert_eq!(c.confidence, Confidence::High);
        assert!((c.avg_efficiency_mw_per_ma.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn high_efficiency_classifies_high_power() {
        let readings = vec![
            sample(1, 100, 100.0, TotalUnits::RadiantPowerMw),
            sample(2, 100, 100.0, TotalUnits::RadiantPowerMw),
        ];
        let c = classify_led_type(&readings, &geometry());
        assert_eq!(c.led_type, LedType::HighPower);
        assert_eq!(c.confidence, Confidence::Medium);
    }

    #[test]
    fn heavy_drive_upgrades_generic_to_high_power() {
        // 0.5 mW/mA is an inconclusive generic verdict; 600 mA average drive
        // upgrades it
        let readings = vec![sample(1, 600, 300.0, TotalUnits::RadiantPowerMw)];
        let c = classify_led_type(&readings, &geometry());
        assert_eq!(c.led_type, LedType::HighPower);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn uv_verdict_survives_heavy_drive() {
        // 0.2 mW/mA says UV; the high-drive upgrade only applies to generic
        let readings = vec![sample(1, 600, 120.0, TotalUnits::RadiantPowerMw)];
        let c = classify_led_type(&readings, &geometry());
        assert_eq!(c.led_type, LedType::Uv);
    }

    #[test]
    fn watt_and_irradiance_units_scale_into_mw() {
        // 0.05 W = 50 mW at 100 mA -> 0.5 mW/mA
        let w = sample(1, 100, 0.05, TotalUnits::RadiantPowerW);
        let c = classify_led_type(std::slice::from_ref(&w), &geometry());
        assert!((c.avg_efficiency_mw_per_ma.unwrap() - 0.5).abs() < 1e-9);

        // irradiance scales through the plate area
        let irr = sample(1, 1000, 0.5, TotalUnits::IrradianceMwPerCm2);
        let c = classify_led_type(std::slice::from_ref(&irr), &geometry());
        let expected = 0.5 * geometry().total_area_cm2 / 1000.0;
        assert!((c.avg_efficiency_mw_per_ma.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn current_units_do_not_qualify_as_power() {
        let readings = vec![sample(1, 100, 100.0, TotalUnits::CurrentMa)];
        let c = classify_led_type(&readings, &geometry());
        assert_eq!(c.sample_count, 0);
        assert_eq!(c.avg_efficiency_mw_per_ma, None);
    }
}
