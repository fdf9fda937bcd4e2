//! Microplate geometry used for irradiance calculations.
//!
//! The schematic revisions disagree on the well diameter (rev A documented
//! 6.5 mm, rev B's plate drawing reads "∅5.0 (96 PLACES)"). Rather than
//! silently picking one number as canonical, the geometry is an explicit
//! versioned value selected in configuration and passed into every
//! computation; nothing in the crate holds a global geometry.

use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};

/// Plate length from the schematic, mm.
pub const PLATE_LENGTH_MM: f64 = 127.75;

/// Plate width from the schematic, mm.
pub const PLATE_WIDTH_MM: f64 = 105.5;

/// Standard 96-well layout (8 x 12 grid).
pub const WELL_COUNT: u32 = 96;

/// Center-to-center well spacing, mm.
pub const WELL_SPACING_MM: f64 = 9.0;

/// Physical dimensions of the illuminated plate.
///
/// Derived once from the schematic constants and then treated as an
/// immutable value; the well areas must not exceed the plate area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateGeometry {
    pub plate_length_cm: f64,
    pub plate_width_cm: f64,
    /// Total illuminated plate area in cm².
    pub total_area_cm2: f64,
    pub well_count: u32,
    /// Single well area in cm².
    pub well_area_cm2: f64,
    pub well_diameter_mm: f64,
    pub well_spacing_mm: f64,
}

impl PlateGeometry {
    /// Build a geometry from raw schematic dimensions.
    ///
    /// Fails if the wells would not physically fit on the plate
    /// (`well_area * well_count > total_area`).
    pub fn from_dimensions(
        plate_length_mm: f64,
        plate_width_mm: f64,
        well_count: u32,
        well_diameter_mm: f64,
    ) -> Result<Self> {
        let plate_length_cm = plate_length_mm / 10.0;
        let plate_width_cm = plate_width_mm / 10.0;
        let total_area_cm2 = plate_length_cm * plate_width_cm;
        // Circle area with the diameter converted from mm to cm
        let well_area_cm2 = std::f64::consts::PI * (well_diameter_mm / 20.0).powi(2);

        if well_area_cm2 * f64::from(well_count) > total_area_cm2 {
            return Err(PhotostimError::InvalidGeometry(format!(
                "{} wells of {:.3} cm² exceed the {:.2} cm² plate",
                well_count, well_area_cm2, total_area_cm2
            )));
        }

        Ok(Self {
            plate_length_cm,
            plate_width_cm,
            total_area_cm2,
            well_count,
            well_area_cm2,
            well_diameter_mm,
            well_spacing_mm: WELL_SPACING_MM,
        })
    }

    /// Revision A geometry: the 6.5 mm "typical 96-well" diameter estimate.
    pub fn rev_a() -> Self {
        #[allow(clippy::unwrap_used)] // constants satisfy the invariant
        Self::from_dimensions(PLATE_LENGTH_MM, PLATE_WIDTH_MM, WELL_COUNT, 6.5).unwrap()
    }

    /// Revision B geometry: the 5.0 mm diameter measured off the schematic.
    /// Per-well irradiance comes out ~1.69x higher than rev A.
    pub fn rev_b() -> Self {
        #[allow(clippy::unwrap_used)] // constants satisfy the invariant
        Self::from_dimensions(PLATE_LENGTH_MM, PLATE_WIDTH_MM, WELL_COUNT, 5.0).unwrap()
    }
}

/// Which schematic revision's well diameter to calculate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryRevision {
    /// 6.5 mm wells (earlier estimate).
    RevA,
    /// 5.0 mm wells (schematic measurement).
    #[default]
    RevB,
}

impl GeometryRevision {
    pub fn geometry(self) -> PlateGeometry {
        match self {
            GeometryRevision::RevA => PlateGeometry::rev_a(),
            GeometryRevision::RevB => PlateGeometry::rev_b(),
        }
    }
}
