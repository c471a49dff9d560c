//! Application-layer packetizer built on top of `linklayer-core`.
//!
//! Wraps a [`linklayer_core::LinkSession`] with a file transfer
//! protocol: a `Start` control packet announces the filename and size,
//! a run of `Data` packets carries the bytes, and an `End` control
//! packet closes the transfer. None of this layer's framing
//! participates in retransmission; that is entirely the link session's
//! job.

pub mod error;
pub mod packet;
pub mod receive;
pub mod transmit;

pub use error::XferError;
pub use packet::{ControlKind, ControlPacket, DataPacket};
pub use receive::{receive_file, TransferSummary};
pub use transmit::send_file;
