//! Identity readout: firmware version, model, serial and wavelength labels.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::registers::{
    Register, FIRMWARE_VERSION, MODEL_NUMBER, SERIAL_NUMBER, WAVELENGTH,
};
use crate::transport::{CommandPort, Transport};

/// Static identity of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// "1.<minor>"; the register only stores the minor version.
    pub firmware_version: String,
    pub model_number: String,
    pub serial_number: String,
    /// Output wavelength label, e.g. "470nm".
    pub wavelength: String,
}

/// Read a string stored one ASCII character per register.
///
/// A zero register terminates the string early; values outside the printable
/// ASCII range are skipped rather than failing the whole readout, since
/// unprogrammed label registers on older firmware hold junk.
fn read_string<T: Transport>(port: &mut CommandPort<T>, registers: &[Register]) -> Result<String> {
    let mut out = String::new();
    for &register in registers {
        let value = port.query(register, 0)?;
        match value {
            0 => break,
            0x20..=0x7e => out.push(value as u8 as char),
            _ => continue,
        }
    }
    Ok(out.trim().to_string())
}

/// Read the complete device identity block.
pub fn read_device_info<T: Transport>(port: &mut CommandPort<T>) -> Result<DeviceInfo> {
    let minor = port.query(FIRMWARE_VERSION, 0)?;
    let firmware_version = format!("1.{}", minor);
    let model_number = read_string(port, &MODEL_NUMBER)?;
    let serial_number = read_string(port, &SERIAL_NUMBER)?;
    let wavelength = read_string(port, &WAVELENGTH)?;

    let device_info = DeviceInfo {
        firmware_version,
        model_number,
        serial_number,
        wavelength,
    };
    info!(
        "connected to model '{}' serial '{}' firmware {}",
        device_info.model_number, device_info.serial_number, device_info.firmware_version
    );
    Ok(device_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DecodeMode;
    use crate::transport::mock::MockDevice;

    #[test]
    fn assembles_identity_strings() {
        let mut dev = MockDevice::new();
        dev.set_register(FIRMWARE_VERSION, 21);
        for (reg, ch) in MODEL_NUMBER.iter().zip(b"CTR-96  ".iter()) {
            dev.set_register(*reg, u16::from(*ch));
        }
        for (reg, ch) in SERIAL_NUMBER.iter().zip(b"000123".iter()) {
            dev.set_register(*reg, u16::from(*ch));
        }
        for (reg, ch) in WAVELENGTH.iter().zip(b"470nm".iter()) {
            dev.set_register(*reg, u16::from(*ch));
        }

        let mut port = CommandPort::new(dev, DecodeMode::Unsigned);
        let info = read_device_info(&mut port).unwrap();
        assert_eq!(info.firmware_version, "1.21");
        assert_eq!(info.model_number, "CTR-96");
        assert_eq!(info.serial_number, "000123");
        assert_eq!(info.wavelength, "470nm");
    }

    #[test]
    fn zero_register_terminates_a_string() {
        let mut dev = MockDevice::new();
        dev.set_register(SERIAL_NUMBER[0], u16::from(b'A'))
            .set_register(SERIAL_NUMBER[1], u16::from(b'B'));
        // registers 2.. unprogrammed -> read as 0 and stop the string

        let mut port = CommandPort::new(dev, DecodeMode::Unsigned);
        let info = read_device_info(&mut port).unwrap();
        assert_eq!(info.serial_number, "AB");
    }

    #[test]
    fn non_printable_characters_are_skipped() {
        let mut dev = MockDevice::new();
        dev.set_register(MODEL_NUMBER[0], u16::from(b'X'))
            .set_register(MODEL_NUMBER[1], 0xffff)
            .set_register(MODEL_NUMBER[2], u16::from(b'Y'));

        let mut port = CommandPort::new(dev, DecodeMode::Unsigned);
        let info = read_device_info(&mut port).unwrap();
        assert_eq!(info.model_number, "XY");
    }
}
