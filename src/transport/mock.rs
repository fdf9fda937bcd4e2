//! Mock transports for tests and offline development.
//!
//! [`MockDevice`] emulates the instrument's register file well enough to
//! exercise the collector and device operations without hardware;
//! [`LoopbackTransport`] echoes each request's value field back in a
//! well-formed reply, which is exactly what the frame round-trip property
//! needs.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{PhotostimError, Result};
use crate::protocol::registers::Register;
use crate::protocol::{checksum, CMD_START, RESPONSE_END};

use super::Transport;

/// Build a well-formed reply frame carrying `value`.
pub fn well_formed_reply(value: u16) -> Vec<u8> {
    let payload = format!("{:04x}", value);
    let mut frame = vec![CMD_START];
    frame.extend_from_slice(payload.as_bytes());
    frame.extend_from_slice(checksum(payload.as_bytes()).as_bytes());
    frame.push(RESPONSE_END);
    frame
}

/// Parse the register and value fields out of a request frame.
fn parse_request(request: &[u8]) -> Option<(u8, u16)> {
    if request.len() < 10 || request[0] != CMD_START || *request.last()? != b'\r' {
        return None;
    }
    let text = std::str::from_utf8(&request[1..7]).ok()?;
    let register = u8::from_str_radix(&text[..2], 16).ok()?;
    let value = u16::from_str_radix(&text[2..6], 16).ok()?;
    Some((register, value))
}

/// Scripted per-register behavior of a [`MockDevice`].
enum RegisterBehavior {
    /// Respond with this value.
    Value(u16),
    /// Respond with exactly these raw bytes (for malformed-reply tests).
    Raw(Vec<u8>),
    /// Never respond; the round trip times out.
    Silent,
}

/// In-memory register file emulating one instrument.
///
/// Reads return the stored value (0 for unprogrammed registers, like real
/// firmware); writes store the value and echo it back. Individual registers
/// can be scripted to answer garbage or go silent to exercise the failure
/// paths.
#[derive(Default)]
pub struct MockDevice {
    registers: HashMap<u8, RegisterBehavior>,
    /// Every (register, value) pair received, in order.
    pub requests: Vec<(u8, u16)>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program a register with a value.
    pub fn set_register(&mut self, register: Register, value: u16) -> &mut Self {
        self.registers
            .insert(register.0, RegisterBehavior::Value(value));
        self
    }

    /// Make a register answer with raw bytes instead of a valid frame.
    pub fn set_raw_reply(&mut self, register: Register, raw: &[u8]) -> &mut Self {
        self.registers
            .insert(register.0, RegisterBehavior::Raw(raw.to_vec()));
        self
    }

    /// Make a register never answer.
    pub fn set_silent(&mut self, register: Register) -> &mut Self {
        self.registers.insert(register.0, RegisterBehavior::Silent);
        self
    }

    /// Values written to a register, in order.
    pub fn writes_to(&self, register: Register) -> Vec<u16> {
        self.requests
            .iter()
            .filter(|(r, _)| *r == register.0)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Transport for MockDevice {
    fn roundtrip(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        let (register, value) = parse_request(request).ok_or_else(|| {
            PhotostimError::MalformedFrame("mock device received a malformed request".into())
        })?;
        self.requests.push((register, value));

        match self.registers.get(&register) {
            Some(RegisterBehavior::Raw(raw)) => Ok(raw.clone()),
            Some(RegisterBehavior::Silent) => {
                Err(PhotostimError::TransportTimeout(Duration::from_millis(0)))
            }
            Some(RegisterBehavior::Value(stored)) => {
                if value != 0 {
                    // Treat a non-zero request value as a write.
                    self.registers
                        .insert(register, RegisterBehavior::Value(value));
                    Ok(well_formed_reply(value))
                } else {
                    Ok(well_formed_reply(*stored))
                }
            }
            None => {
                if value != 0 {
                    self.registers
                        .insert(register, RegisterBehavior::Value(value));
                }
                Ok(well_formed_reply(value))
            }
        }
    }
}

/// Transport that reflects each request's value field back as the reply
/// payload.
#[derive(Default)]
pub struct LoopbackTransport {
    _private: (),
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for LoopbackTransport {
    fn roundtrip(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        let (_, value) = parse_request(request).ok_or_else(|| {
            PhotostimError::MalformedFrame("loopback received a malformed request".into())
        })?;
        Ok(well_formed_reply(value))
    }
}
