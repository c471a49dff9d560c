//! Packetizer-level error taxonomy.

use std::io;

use linklayer_core::LinkError;
use thiserror::Error;

/// Errors raised while packetizing or driving a file transfer.
#[derive(Error, Debug)]
pub enum XferError {
    /// The link session itself failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Reading from or writing to the local file failed.
    #[error("local file I/O failed: {0}")]
    FileIo(#[from] io::Error),

    /// A packet was shorter than its declared fields require.
    #[error("packet too short: {len} bytes")]
    PacketTooShort {
        /// Length of the packet that was rejected.
        len: usize,
    },

    /// The leading kind byte wasn't `Start` (`0x02`), `Data` (`0x01`), or
    /// `End` (`0x03`).
    #[error("unrecognized packet kind {0:#04x}")]
    UnknownKind(u8),

    /// The control packet's TLV tags didn't match the fixed layout this
    /// implementation expects (size tag `0x00`, name tag `0x01`).
    #[error("malformed control packet: {0}")]
    MalformedControl(&'static str),

    /// `filename` is too long to fit the one-byte length prefix.
    #[error("filename of {len} bytes exceeds the 255-byte limit")]
    FilenameTooLong {
        /// Length that was rejected.
        len: usize,
    },

    /// A `Data` packet arrived before any `Start` control packet.
    #[error("data packet received before Start control packet")]
    DataBeforeStart,

    /// A second `Start` control packet arrived within one transfer.
    #[error("Start control packet received twice in one transfer")]
    DuplicateStart,
}
