//! LED electro-optical efficiency models.
//!
//! Efficiency (mW of optical output per mA of drive) falls with drive current
//! as the die heats up. Each LED family gets a banded lookup table; bands are
//! `[low, high)` in mA and the table's base value covers anything outside the
//! listed bands.

use serde::{Deserialize, Serialize};

/// LED family the stage hardware belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedType {
    /// Mid-efficiency visible LEDs; the fallback when classification has no
    /// data.
    #[default]
    Generic,
    /// High-efficiency, high-drive emitters.
    HighPower,
    /// UV emitters, markedly less efficient across the range.
    Uv,
}

struct EfficiencyCurve {
    /// `(low_ma, high_ma, mw_per_ma)` bands, half-open on the right.
    bands: &'static [(f64, f64, f64)],
    /// Used when current falls outside every band (negative input, mostly).
    base: f64,
}

static GENERIC: EfficiencyCurve = EfficiencyCurve {
    bands: &[
        (0.0, 50.0, 0.8),
        (50.0, 200.0, 0.6),
        (200.0, 500.0, 0.5),
        (500.0, 1000.0, 0.4),
        (1000.0, f64::INFINITY, 0.3),
    ],
    base: 0.5,
};

static HIGH_POWER: EfficiencyCurve = EfficiencyCurve {
    bands: &[
        (0.0, 100.0, 1.0),
        (100.0, 300.0, 0.8),
        (300.0, 700.0, 0.7),
        (700.0, 1500.0, 0.6),
        (1500.0, f64::INFINITY, 0.5),
    ],
    base: 0.7,
};

static UV: EfficiencyCurve = EfficiencyCurve {
    bands: &[
        (0.0, 50.0, 0.4),
        (50.0, 150.0, 0.3),
        (150.0, 400.0, 0.25),
        (400.0, 800.0, 0.2),
        (800.0, f64::INFINITY, 0.15),
    ],
    base: 0.3,
};

impl LedType {
    fn curve(self) -> &'static EfficiencyCurve {
        match self {
            LedType::Generic => &GENERIC,
            LedType::HighPower => &HIGH_POWER,
            LedType::Uv => &UV,
        }
    }
}

/// Look up the modeled efficiency in mW/mA at a given drive current.
pub fn efficiency_mw_per_ma(led_type: LedType, current_ma: f64) -> f64 {
    let curve = led_type.curve();
    for &(low, high, eff) in curve.bands {
        if current_ma >= low && current_ma < high {
            return eff;
        }
    }
    curve.base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_bands() {
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, 10.0), 0.8);
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, 405.0), 0.5);
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, 2000.0), 0.3);
    }

    #[test]
    fn band_edges_are_half_open() {
        // 50 mA belongs to the second generic band, not the first
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, 50.0), 0.6);
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, 49.999), 0.8);
    }

    #[test]
    fn high_power_exceeds_uv_everywhere() {
        for ma in [5.0, 75.0, 250.0, 600.0, 1200.0, 3000.0] {
            assert!(
                efficiency_mw_per_ma(LedType::HighPower, ma)
                    > efficiency_mw_per_ma(LedType::Uv, ma)
            );
        }
    }

    #[test]
    fn out_of_range_current_uses_base() {
        assert_eq!(efficiency_mw_per_ma(LedType::Generic, -1.0), 0.5);
        assert_eq!(efficiency_mw_per_ma(LedType::HighPower, -1.0), 0.7);
        assert_eq!(efficiency_mw_per_ma(LedType::Uv, -1.0), 0.3);
    }
}
