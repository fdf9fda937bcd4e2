//! Static register map for the instrument.
//!
//! Every readable value lives at a 2-hex-digit register address. The five
//! stage blocks are laid out with a fixed stride of 8 registers: stage 1's
//! total-power register is `7b`, stage 2's is `83`, and so on. Collapsing the
//! per-stage addresses into this table removes an entire class of copy-paste
//! bugs where one stage's read silently used another stage's register.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};

/// Number of output stages on the instrument.
pub const STAGE_COUNT: u8 = 5;

/// Register-space stride between consecutive stage blocks.
const STAGE_STRIDE: u8 = 8;

/// A 2-hex-digit device register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register(pub u8);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// Device mode register (write): 0 local, 1 standby, 2 armed, 3 fire.
pub const SET_MODE: Register = Register(0x15);

/// ARM current setting register (write).
pub const SET_ARM_CURRENT: Register = Register(0x40);

/// FIRE current setting register (write); writing it starts the exposure.
pub const SET_FIRE_CURRENT: Register = Register(0x41);

/// Remote mode state (read).
pub const READ_REMOTE_MODE: Register = Register(0x13);

/// Active ARM current (read).
pub const READ_ARM_CURRENT: Register = Register(0x20);

/// Active FIRE current (read).
pub const READ_FIRE_CURRENT: Register = Register(0x21);

/// Firmware version (read). The device reports the minor version only; the
/// major version is always 1.
pub const FIRMWARE_VERSION: Register = Register(0x02);

/// Model number registers, one ASCII character each.
pub const MODEL_NUMBER: [Register; 8] = [
    Register(0x6c),
    Register(0x6d),
    Register(0x6e),
    Register(0x6f),
    Register(0x70),
    Register(0x71),
    Register(0x72),
    Register(0x73),
];

/// Serial number registers, one ASCII character each.
pub const SERIAL_NUMBER: [Register; 12] = [
    Register(0x60),
    Register(0x61),
    Register(0x62),
    Register(0x63),
    Register(0x64),
    Register(0x65),
    Register(0x66),
    Register(0x67),
    Register(0x68),
    Register(0x69),
    Register(0x6a),
    Register(0x6b),
];

/// Wavelength label registers, one ASCII character each. These are scattered
/// through register space rather than forming a contiguous block.
pub const WAVELENGTH: [Register; 5] = [
    Register(0x76),
    Register(0x81),
    Register(0x82),
    Register(0x89),
    Register(0x8a),
];

/// One of the five independently configured output channels.
///
/// Construction is validated; an out-of-range stage number is an error at the
/// register map, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stage(u8);

impl Stage {
    /// Create a stage handle for stage numbers 1 through 5.
    pub fn new(number: u8) -> Result<Self> {
        if (1..=STAGE_COUNT).contains(&number) {
            Ok(Stage(number))
        } else {
            Err(PhotostimError::UnknownRegister(number))
        }
    }

    /// The 1-based stage number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// All five stages in order.
    pub fn all() -> impl Iterator<Item = Stage> {
        (1..=STAGE_COUNT).map(Stage)
    }
}

impl TryFrom<u8> for Stage {
    type Error = PhotostimError;

    fn try_from(number: u8) -> Result<Self> {
        Stage::new(number)
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.number()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.0)
    }
}

/// A readable quantity within one stage's register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageQuantity {
    /// Total radiant output, raw fixed-point (value / 10).
    TotalPower,
    /// Per-well output, raw fixed-point (value / 10).
    PerPower,
    /// Unit index for the total reading (0..=6).
    TotalUnitsIndex,
    /// Unit index for the per-well reading (0..=9).
    PerUnitsIndex,
    /// Configured FIRE current in mA.
    FireCurrent,
    /// Configured ARM current in mA.
    ArmCurrent,
}

impl StageQuantity {
    /// Stage 1's register for this quantity; later stages add the stride.
    fn base(self) -> u8 {
        match self {
            StageQuantity::TotalPower => 0x7b,
            StageQuantity::PerPower => 0x7c,
            StageQuantity::TotalUnitsIndex => 0x7d,
            StageQuantity::PerUnitsIndex => 0x7e,
            StageQuantity::FireCurrent => 0x78,
            StageQuantity::ArmCurrent => 0x77,
        }
    }

    /// The six quantities in the order the collector reads them.
    pub const READ_ORDER: [StageQuantity; 6] = [
        StageQuantity::TotalPower,
        StageQuantity::PerPower,
        StageQuantity::TotalUnitsIndex,
        StageQuantity::PerUnitsIndex,
        StageQuantity::FireCurrent,
        StageQuantity::ArmCurrent,
    ];
}

/// Look up the register for a (stage, quantity) pair. Stage validity is
/// enforced at [`Stage::new`], so the lookup itself cannot miss.
pub fn stage_register(stage: Stage, quantity: StageQuantity) -> Register {
    let offset = (stage.number() - 1) * STAGE_STRIDE;
    Register(quantity.base() + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_one_block_matches_documented_map() {
        let s1 = Stage::new(1).unwrap();
        assert_eq!(stage_register(s1, StageQuantity::TotalPower), Register(0x7b));
        assert_eq!(stage_register(s1, StageQuantity::PerPower), Register(0x7c));
        assert_eq!(stage_register(s1, StageQuantity::TotalUnitsIndex), Register(0x7d));
        assert_eq!(stage_register(s1, StageQuantity::PerUnitsIndex), Register(0x7e));
        assert_eq!(stage_register(s1, StageQuantity::FireCurrent), Register(0x78));
        assert_eq!(stage_register(s1, StageQuantity::ArmCurrent), Register(0x77));
    }

    #[test]
    fn stage_blocks_advance_by_stride_of_eight() {
        for quantity in StageQuantity::READ_ORDER {
            let base = stage_register(Stage::new(1).unwrap(), quantity).0;
            for stage in Stage::all() {
                let reg = stage_register(stage, quantity);
                assert_eq!(reg.0, base + (stage.number() - 1) * 8);
            }
        }
    }

    #[test]
    fn stage_five_block_matches_documented_map() {
        let s5 = Stage::new(5).unwrap();
        assert_eq!(stage_register(s5, StageQuantity::TotalPower), Register(0x9b));
        assert_eq!(stage_register(s5, StageQuantity::FireCurrent), Register(0x98));
        assert_eq!(stage_register(s5, StageQuantity::ArmCurrent), Register(0x97));
    }

    #[test]
    fn invalid_stage_is_an_error_not_a_default() {
        assert!(matches!(Stage::new(0), Err(PhotostimError::UnknownRegister(0))));
        assert!(matches!(Stage::new(6), Err(PhotostimError::UnknownRegister(6))));
    }

    #[test]
    fn register_displays_as_two_hex_digits() {
        assert_eq!(Register(0x7b).to_string(), "7b");
        assert_eq!(Register(0x02).to_string(), "02");
    }
}
