//! Framing-level error taxonomy.

use thiserror::Error;

/// Errors produced while encoding or decoding frames.
///
/// These are local to a single frame: the caller (the receiver automaton,
/// or the session driving it) decides how to recover. None of these are
/// ever raised by [`crate::stuffing`], which is total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// The buffer passed to a convenience decoder was shorter than any
    /// valid frame.
    #[error("frame too short: {len} bytes")]
    FrameTooShort {
        /// Length of the buffer that was rejected.
        len: usize,
    },

    /// The frame was not bracketed by `FLAG` bytes where expected.
    #[error("missing frame delimiter")]
    MissingDelimiter,

    /// Header checksum (BCC1 = Address XOR Control) did not match.
    #[error("header checksum mismatch: address {address:#04x} control {control:#04x}")]
    BadHeaderChecksum {
        /// Address byte as received.
        address: u8,
        /// Control byte as received.
        control: u8,
    },

    /// Control byte did not correspond to any known frame variant.
    #[error("unrecognized control byte {0:#04x}")]
    UnknownControl(u8),

    /// Payload checksum (BCC2) did not match the trailing byte.
    #[error("payload checksum mismatch")]
    BadPayloadChecksum,

    /// Caller attempted to encode a payload larger than `MAX_PAYLOAD`.
    #[error("payload of {len} bytes exceeds the {max}-byte contract limit")]
    PayloadTooLarge {
        /// Length that was rejected.
        len: usize,
        /// Contract limit (`MAX_PAYLOAD`).
        max: usize,
    },
}
