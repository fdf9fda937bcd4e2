//! Mode control and the arm/fire sequences.
//!
//! The instrument powers its LEDs the moment the FIRE current register is
//! written while in fire mode, so sequence order matters: mode first, current
//! second, and always drop back to standby before releasing the device.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};
use crate::protocol::registers::{
    stage_register, Stage, StageQuantity, READ_ARM_CURRENT, READ_FIRE_CURRENT, READ_REMOTE_MODE,
    SET_ARM_CURRENT, SET_FIRE_CURRENT, SET_MODE,
};
use crate::transport::{CommandPort, Transport};

/// Operating mode of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Front-panel control; remote commands are ignored.
    Local = 0,
    /// Remote control, output off.
    Standby = 1,
    /// Remote control, ARM current applied.
    Armed = 2,
    /// Remote control, FIRE current drives the output.
    Fire = 3,
}

impl DeviceMode {
    fn from_register(value: i32) -> Result<Self> {
        match value {
            0 => Ok(DeviceMode::Local),
            1 => Ok(DeviceMode::Standby),
            2 => Ok(DeviceMode::Armed),
            3 => Ok(DeviceMode::Fire),
            other => Err(PhotostimError::MalformedFrame(format!(
                "mode register holds unknown value {}",
                other
            ))),
        }
    }
}

/// Switch the controller's operating mode.
pub fn set_mode<T: Transport>(port: &mut CommandPort<T>, mode: DeviceMode) -> Result<()> {
    port.query(SET_MODE, mode as u16)?;
    info!("device mode set to {:?}", mode);
    Ok(())
}

/// Read the controller's current operating mode.
pub fn current_mode<T: Transport>(port: &mut CommandPort<T>) -> Result<DeviceMode> {
    DeviceMode::from_register(port.query(READ_REMOTE_MODE, 0)?)
}

/// Read the active ARM current, mA.
pub fn arm_current_ma<T: Transport>(port: &mut CommandPort<T>) -> Result<i32> {
    port.query(READ_ARM_CURRENT, 0)
}

/// Read the active FIRE current, mA.
pub fn fire_current_ma<T: Transport>(port: &mut CommandPort<T>) -> Result<i32> {
    port.query(READ_FIRE_CURRENT, 0)
}

/// Arm the device: apply an ARM current and enter armed mode.
pub fn arm<T: Transport>(port: &mut CommandPort<T>, arm_current_ma: u16) -> Result<()> {
    port.query(SET_ARM_CURRENT, arm_current_ma)?;
    set_mode(port, DeviceMode::Armed)
}

/// Fire one stage at its own configured current.
///
/// Reads the stage's FIRE current setting, enters fire mode, then writes that
/// current to the active register to start the exposure.
pub fn fire_stage<T: Transport>(port: &mut CommandPort<T>, stage: Stage) -> Result<()> {
    let current = port.query(stage_register(stage, StageQuantity::FireCurrent), 0)?;
    if current <= 0 {
        warn!("{} has no FIRE current configured; not firing", stage);
        return Ok(());
    }
    set_mode(port, DeviceMode::Fire)?;
    port.query(SET_FIRE_CURRENT, current as u16)?;
    info!("{} firing at {} mA", stage, current);
    Ok(())
}

/// Fire at an explicit current, bounded by the hardware maximum.
///
/// Stage 5 carries the highest configured drive; its FIRE current setting is
/// the device's ceiling. A request above it is refused outright, with no
/// writes issued.
pub fn fire_with_current<T: Transport>(port: &mut CommandPort<T>, current_ma: u16) -> Result<()> {
    #[allow(clippy::unwrap_used)] // 5 is always a valid stage number
    let max_stage = Stage::new(5).unwrap();
    let max_ma = port.query(stage_register(max_stage, StageQuantity::FireCurrent), 0)?;

    if max_ma > 0 && i32::from(current_ma) > max_ma {
        return Err(PhotostimError::FireCurrentExceedsLimit {
            requested_ma: current_ma,
            max_ma: max_ma as u16,
        });
    }

    set_mode(port, DeviceMode::Fire)?;
    port.query(SET_FIRE_CURRENT, current_ma)?;
    info!("firing at {} mA", current_ma);
    Ok(())
}

/// Stop the output but stay under remote control.
pub fn turn_off<T: Transport>(port: &mut CommandPort<T>) -> Result<()> {
    set_mode(port, DeviceMode::Standby)
}

/// End a session: output off, then hand control back to the front panel.
pub fn shutdown<T: Transport>(port: &mut CommandPort<T>) -> Result<()> {
    set_mode(port, DeviceMode::Standby)?;
    set_mode(port, DeviceMode::Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::registers::Register;
    use crate::protocol::DecodeMode;
    use crate::transport::mock::MockDevice;

    fn port(dev: MockDevice) -> CommandPort<MockDevice> {
        CommandPort::new(dev, DecodeMode::Unsigned)
    }

    #[test]
    fn fire_stage_sequences_mode_then_current() {
        let mut dev = MockDevice::new();
        dev.set_register(Register(0x88), 405); // stage 3 FIRE current
        let mut port = port(dev);

        fire_stage(&mut port, Stage::new(3).unwrap()).unwrap();

        let dev = port.into_inner();
        assert_eq!(dev.writes_to(SET_MODE), vec![3]);
        assert_eq!(dev.writes_to(SET_FIRE_CURRENT), vec![405]);
        // The mode write happened before the current write
        let registers: Vec<u8> = dev
            .requests
            .iter()
            .filter(|(_, v)| *v != 0)
            .map(|(r, _)| *r)
            .collect();
        assert_eq!(registers, vec![SET_MODE.0, SET_FIRE_CURRENT.0]);
    }

    #[test]
    fn fire_stage_refuses_unconfigured_stage() {
        let mut port = port(MockDevice::new());
        fire_stage(&mut port, Stage::new(1).unwrap()).unwrap();
        let dev = port.into_inner();
        assert!(dev.writes_to(SET_MODE).is_empty());
        assert!(dev.writes_to(SET_FIRE_CURRENT).is_empty());
    }

    #[test]
    fn over_limit_current_is_refused_without_firing() {
        let mut dev = MockDevice::new();
        dev.set_register(Register(0x98), 800); // stage 5 FIRE current
        let mut port = port(dev);

        let err = fire_with_current(&mut port, 1200).unwrap_err();
        assert!(matches!(
            err,
            PhotostimError::FireCurrentExceedsLimit {
                requested_ma: 1200,
                max_ma: 800,
            }
        ));
        // Refusal happens before any mode or current write
        let dev = port.into_inner();
        assert!(dev.writes_to(SET_MODE).is_empty());
        assert!(dev.writes_to(SET_FIRE_CURRENT).is_empty());
    }

    #[test]
    fn current_within_limit_passes_through() {
        let mut dev = MockDevice::new();
        dev.set_register(Register(0x98), 800);
        let mut port = port(dev);

        fire_with_current(&mut port, 500).unwrap();
        assert_eq!(port.into_inner().writes_to(SET_FIRE_CURRENT), vec![500]);
    }

    #[test]
    fn shutdown_goes_standby_then_local() {
        let mut port = port(MockDevice::new());
        shutdown(&mut port).unwrap();
        assert_eq!(port.into_inner().writes_to(SET_MODE), vec![1, 0]);
    }

    #[test]
    fn mode_register_round_trip() {
        let mut dev = MockDevice::new();
        dev.set_register(READ_REMOTE_MODE, 2);
        let mut port = port(dev);
        assert_eq!(current_mode(&mut port).unwrap(), DeviceMode::Armed);
    }

    #[test]
    fn unknown_mode_value_is_an_error() {
        let mut dev = MockDevice::new();
        dev.set_register(READ_REMOTE_MODE, 9);
        let mut port = port(dev);
        assert!(current_mode(&mut port).is_err());
    }
}
