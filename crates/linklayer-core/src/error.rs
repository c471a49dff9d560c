//! Session-level error taxonomy.
//!
//! Framing-level errors ([`linklayer_proto::ProtoError`]) are local to a
//! single frame and never escape the session: the receive loop in
//! [`crate::session`] absorbs a bad checksum by sending `REJ` and
//! continuing, absorbing a bad header by letting the automaton
//! resynchronize. What does escape to the caller is coarser: the link
//! either made progress or it didn't.

use std::io;

use linklayer_proto::ProtoError;
use thiserror::Error;

/// Errors surfaced by [`crate::session::LinkSession`].
#[derive(Error, Debug)]
pub enum LinkError {
    /// The serial port adapter failed.
    #[error("serial port I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The retry budget was exhausted waiting for an acknowledgement.
    #[error("retry budget exhausted waiting for a response")]
    LinkTimeout,

    /// The peer never answered the connection request within the retry
    /// budget.
    #[error("peer did not respond to the connection request within the retry budget")]
    ConnectRefused,

    /// The peer sent `Disc` outside of `close`; the caller must now
    /// drive a close of its own.
    #[error("peer initiated disconnect")]
    PeerDisconnected,

    /// The caller violated the link's contract (oversized payload, or a
    /// read buffer too small to hold the delivered payload).
    #[error("contract violation: {len} exceeds the {max} limit")]
    ContractViolation {
        /// Size that was rejected.
        len: usize,
        /// Limit that was exceeded.
        max: usize,
    },

    /// A framing-level error reached the session boundary. In practice
    /// this can only be [`ProtoError::PayloadTooLarge`], since every
    /// other `ProtoError` variant is handled locally by the receive
    /// loop before it would propagate this far.
    #[error(transparent)]
    Protocol(#[from] ProtoError),
}

impl LinkError {
    /// Whether this error means the session cannot continue and must be
    /// abandoned, as opposed to `PeerDisconnected`, which the caller is
    /// expected to handle by driving a close.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PeerDisconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_disconnect_is_not_fatal() {
        assert!(!LinkError::PeerDisconnected.is_fatal());
    }

    #[test]
    fn every_other_kind_is_fatal() {
        assert!(LinkError::LinkTimeout.is_fatal());
        assert!(LinkError::ConnectRefused.is_fatal());
        assert!(LinkError::ContractViolation { len: 1001, max: 1000 }.is_fatal());
        assert!(LinkError::Io(io::Error::other("broken pipe")).is_fatal());
    }
}
