//! RS-232 serial transport built on the `serialport` crate.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use log::{debug, info};
use serialport::SerialPort;

use crate::error::{PhotostimError, Result};
use crate::protocol::RESPONSE_END;

use super::Transport;

/// Default instrument baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Default round-trip read deadline.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Blocking serial transport owning one port handle.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate.
    ///
    /// The port-level timeout is kept short so the read loop can poll against
    /// the overall round-trip deadline, mirroring how the reply terminator is
    /// scanned byte by byte.
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        info!("Serial port '{}' opened at {} baud", port_name, baud_rate);
        Ok(Self { port, read_timeout })
    }

    /// Wrap an already-open port (used by tests with a pseudo-terminal).
    pub fn from_port(port: Box<dyn SerialPort>, read_timeout: Duration) -> Self {
        Self { port, read_timeout }
    }
}

impl Transport for SerialTransport {
    fn roundtrip(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        self.port.write_all(request)?;
        self.port.flush()?;

        let deadline = Instant::now() + self.read_timeout;
        let mut reply = Vec::new();
        let mut buffer = [0u8; 1];

        loop {
            if Instant::now() > deadline {
                debug!(
                    "round trip timed out with {} reply byte(s) buffered",
                    reply.len()
                );
                return Err(PhotostimError::TransportTimeout(self.read_timeout));
            }

            match self.port.read(&mut buffer) {
                Ok(0) => continue,
                Ok(_) => {
                    reply.push(buffer[0]);
                    if buffer[0] == RESPONSE_END {
                        return Ok(reply);
                    }
                }
                // Port-level timeout is shorter than the overall deadline
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(PhotostimError::Io(e)),
            }
        }
    }
}
