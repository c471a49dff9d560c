//! Real [`SerialPort`] implementation over the `serialport` crate.
//!
//! The timeout contract in spec section 5 ("`read_byte` returns within
//! `T + ε` of the deadline") is implemented as a monotonic-clock
//! deadline checked between reads, per-call: every [`RealSerialPort::read_byte`]
//! recomputes the remaining time until `deadline` and re-arms the
//! underlying OS read timeout to match, rather than relying on a
//! signal-driven alarm.

use std::{io, time::Instant};

use linklayer_core::port::{ReadOutcome, SerialPort};
use thiserror::Error;

/// A poll window used while waiting indefinitely (`deadline = None`).
/// Re-armed in a loop so an indefinite wait never actually blocks the
/// OS call forever, keeping the port responsive to being dropped.
const INDEFINITE_POLL_WINDOW: std::time::Duration = std::time::Duration::from_secs(3600);

/// Failure to open the underlying device.
#[derive(Debug, Error)]
#[error("failed to open serial port {device:?} at {baud} baud: {source}")]
pub struct OpenError {
    device: String,
    baud: u32,
    #[source]
    source: serialport::Error,
}

/// A real serial port, opened in raw (non-canonical) blocking mode.
pub struct RealSerialPort {
    port: Box<dyn serialport::SerialPort>,
}

impl RealSerialPort {
    /// Opens `device` at `baud`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] if the device cannot be opened (permission
    /// denied, no such device, already in use by another process).
    pub fn open(device: &str, baud: u32) -> Result<Self, OpenError> {
        let port = serialport::new(device, baud)
            .timeout(INDEFINITE_POLL_WINDOW)
            .open()
            .map_err(|source| OpenError { device: device.to_string(), baud, source })?;
        tracing::info!(device, baud, "serial port opened");
        Ok(Self { port })
    }
}

fn to_io_error(err: serialport::Error) -> io::Error {
    io::Error::other(err)
}

impl SerialPort for RealSerialPort {
    type Instant = Instant;

    fn read_byte(&mut self, deadline: Option<Self::Instant>) -> io::Result<ReadOutcome> {
        let mut byte = [0u8; 1];

        match deadline {
            None => loop {
                self.port.set_timeout(INDEFINITE_POLL_WINDOW).map_err(to_io_error)?;
                match io::Read::read_exact(&mut self.port, &mut byte) {
                    Ok(()) => return Ok(ReadOutcome::Byte(byte[0])),
                    Err(err) if err.kind() == io::ErrorKind::TimedOut => continue,
                    Err(err) => return Err(err),
                }
            },
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(ReadOutcome::Timeout);
                }
                self.port.set_timeout(remaining).map_err(to_io_error)?;
                match io::Read::read_exact(&mut self.port, &mut byte) {
                    Ok(()) => Ok(ReadOutcome::Byte(byte[0])),
                    Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(ReadOutcome::Timeout),
                    Err(err) => Err(err),
                }
            },
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write_all(&mut self.port, buf)?;
        Ok(buf.len())
    }
}
