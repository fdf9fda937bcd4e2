//! Byte-stream transport to the instrument.
//!
//! The controller is strictly synchronous: every register access is one
//! write-then-read round trip on a single exclusively-owned handle, bounded by
//! a fixed read deadline. There is no cancellation primitive beyond the
//! timeout; a stuck device produces one timeout per register, serialized.
//!
//! The reference implementation kept an implicitly-global serial handle shared
//! by every free function. Here the handle is an explicit [`Transport`]
//! capability object passed into whatever owns the connection; no ambient
//! state.

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial;

use log::{debug, trace};

use crate::error::Result;
use crate::protocol::registers::Register;
use crate::protocol::{self, DecodeMode};

#[cfg(feature = "instrument_serial")]
pub use serial::SerialTransport;

/// A synchronous request/response byte channel to the instrument.
///
/// `roundtrip` writes one complete request frame and returns the raw reply
/// bytes up to and including the `^` terminator. Implementations must bound
/// the read with a deadline and return
/// [`PhotostimError::TransportTimeout`](crate::PhotostimError::TransportTimeout)
/// when it elapses.
pub trait Transport {
    /// Send one request frame and collect the raw reply.
    fn roundtrip(&mut self, request: &[u8]) -> Result<Vec<u8>>;
}

/// A [`Transport`] paired with the frame codec and a decode convention.
///
/// This is the single place where register-level queries turn into wire
/// frames. Everything above it (collector, device info, device control) works
/// in terms of registers and integer values.
pub struct CommandPort<T: Transport> {
    transport: T,
    decode_mode: DecodeMode,
}

impl<T: Transport> CommandPort<T> {
    pub fn new(transport: T, decode_mode: DecodeMode) -> Self {
        Self {
            transport,
            decode_mode,
        }
    }

    /// The decode convention this port applies to replies.
    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    /// One register round trip: encode, send, decode the reply payload.
    ///
    /// Reads pass `value = 0`; writes carry the value to store. The device
    /// answers every frame, including writes.
    pub fn query(&mut self, register: Register, value: u16) -> Result<i32> {
        let frame = protocol::encode_frame(register, value);
        trace!("-> {}", String::from_utf8_lossy(&frame).trim_end());
        let reply = self.transport.roundtrip(&frame)?;
        trace!("<- {}", String::from_utf8_lossy(&reply));
        let decoded = protocol::decode_frame(&reply, self.decode_mode)?;
        debug!("register {} = {}", register, decoded);
        Ok(decoded)
    }

    /// Release the underlying transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}
