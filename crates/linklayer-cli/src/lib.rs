//! Shared error type for the `llt-tx` and `llt-rx` binaries.
//!
//! Aggregates the three failure domains a CLI run can hit — opening the
//! local file, opening the serial port, and driving the link/packetizer
//! — into one type so `main` has a single `Result` to match on and a
//! single place to decide the process exit code, in the manner of
//! `lockframe-server::error::ServerError` wrapping its driver's error.

use linklayer_core::LinkError;
use linklayer_serial::OpenError;
use linklayer_xfer::XferError;
use thiserror::Error;

/// Errors surfaced by the transmitter and receiver binaries.
#[derive(Error, Debug)]
pub enum CliError {
    /// The local file to send, or to write the transfer into, could not
    /// be opened.
    #[error("local file error: {0}")]
    File(#[from] std::io::Error),

    /// The serial device could not be opened.
    #[error(transparent)]
    Open(#[from] OpenError),

    /// `open` or `close` on the link session failed, outside of a
    /// packetizer call.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The packetizer driving the link session failed.
    #[error(transparent)]
    Xfer(#[from] XferError),
}
