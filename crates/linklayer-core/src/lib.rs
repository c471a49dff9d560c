//! Link session: the receiver automaton, stop-and-wait ARQ, and
//! statistics.
//!
//! This crate owns the protocol's only stateful, I/O-driving pieces.
//! Encoding and decoding individual frames is [`linklayer_proto`]'s job;
//! this crate sequences those frames over a [`port::SerialPort`] to
//! implement a reliable link on top of an unreliable byte stream.

pub mod automaton;
pub mod error;
pub mod port;
pub mod session;
pub mod statistics;

pub use error::LinkError;
pub use session::{LinkSession, ReadOutcome, Role};
pub use statistics::Statistics;
