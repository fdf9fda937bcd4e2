//! Wire-level command/response frame codec.
//!
//! The instrument speaks a fixed-width ASCII protocol over RS-232:
//!
//! - Request: `'*' || register(2 hex) || value(4 hex, zero-padded) || checksum(2 hex) || '\r'`
//! - Reply:   `'*' || payload(4 hex) || checksum(2 hex) || '^'`, minimum 7 bytes
//!
//! The checksum is the arithmetic sum of the byte values of the register+value
//! (or payload) characters, modulo 256, rendered as two lowercase hex digits.
//! Only hex digits and the two markers appear on the wire, so no escaping is
//! needed.
//!
//! Two historically divergent decode conventions exist for replies: a plain
//! unsigned hex parse, and a variant that applies a 16-bit two's-complement
//! fixup (payloads above 32767 become negative). Neither convention verified
//! the reply checksum and this codec keeps that behavior; the convention is
//! selected per connection via [`DecodeMode`] rather than hard-coded.

pub mod registers;

use serde::{Deserialize, Serialize};

use crate::error::{PhotostimError, Result};
use registers::Register;

/// Command start marker.
pub const CMD_START: u8 = b'*';

/// Command terminator.
pub const CMD_TERMINATOR: u8 = b'\r';

/// Response end marker.
pub const RESPONSE_END: u8 = b'^';

/// Minimum valid reply length: `*` + 4 payload digits + 2 checksum digits + `^`.
pub const MIN_RESPONSE_LEN: usize = 7;

/// Reply payload interpretation.
///
/// Firmware revisions disagree on whether the 16-bit payload is unsigned or
/// two's-complement signed. The right choice depends on the device revision,
/// so it is part of the connection configuration instead of being baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Plain hex parse: payload is 0..=65535.
    #[default]
    Unsigned,
    /// Payloads above 32767 are negative (value - 65536).
    Signed16,
}

/// Compute the protocol checksum over an ASCII string: byte sum mod 256,
/// formatted as exactly two lowercase hex digits.
pub fn checksum(data: &[u8]) -> String {
    let total: u32 = data.iter().map(|&b| u32::from(b)).sum();
    format!("{:02x}", total % 256)
}

/// Build a complete request frame for a register and 16-bit value.
///
/// All fields are fixed width; the value is zero-padded to 4 lowercase hex
/// digits and the checksum covers the register+value characters only.
pub fn encode_frame(register: Register, value: u16) -> Vec<u8> {
    let body = format!("{}{:04x}", register, value);
    let mut frame = Vec::with_capacity(2 + body.len() + 2);
    frame.push(CMD_START);
    frame.extend_from_slice(body.as_bytes());
    frame.extend_from_slice(checksum(body.as_bytes()).as_bytes());
    frame.push(CMD_TERMINATOR);
    frame
}

/// Parse a reply frame and return its payload value.
///
/// A valid reply is at least [`MIN_RESPONSE_LEN`] bytes, starts with `*` and
/// ends with `^` (trailing CR/LF from chatty firmware is tolerated). The reply
/// checksum is NOT verified against the payload; the reference controllers
/// never did, and a device in the field may ship either convention.
///
/// Returns a [`PhotostimError::MalformedFrame`] if the shape is wrong; callers
/// at the collector boundary convert that into a "field unavailable" sentinel
/// rather than treating it as a measured zero.
pub fn decode_frame(raw: &[u8], mode: DecodeMode) -> Result<i32> {
    // One protocol variant appends '\r' after the '^' terminator.
    let end = raw
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let frame = &raw[..end];

    if frame.len() < MIN_RESPONSE_LEN {
        return Err(PhotostimError::MalformedFrame(format!(
            "reply too short: {} bytes (minimum {})",
            frame.len(),
            MIN_RESPONSE_LEN
        )));
    }
    if frame[0] != CMD_START {
        return Err(PhotostimError::MalformedFrame(format!(
            "reply does not start with '*': 0x{:02x}",
            frame[0]
        )));
    }
    if frame[frame.len() - 1] != RESPONSE_END {
        return Err(PhotostimError::MalformedFrame(format!(
            "reply does not end with '^': 0x{:02x}",
            frame[frame.len() - 1]
        )));
    }

    let payload = std::str::from_utf8(&frame[1..5])
        .map_err(|_| PhotostimError::MalformedFrame("payload is not ASCII".into()))?;
    let value = u16::from_str_radix(payload, 16).map_err(|_| {
        PhotostimError::MalformedFrame(format!("payload is not hex: {:?}", payload))
    })?;

    Ok(match mode {
        DecodeMode::Unsigned => i32::from(value),
        DecodeMode::Signed16 => i32::from(value as i16),
    })
}
