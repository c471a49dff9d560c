//! Wire format for the link-layer protocol.
//!
//! This crate is pure and I/O-free: it only knows how to turn protocol
//! values into bytes and back. Everything here is total (no panics) and
//! deterministic, which is what makes [`stuffing`] and [`frame`] cheap to
//! property-test.

pub mod constants;
pub mod error;
pub mod frame;
pub mod stuffing;

pub use error::ProtoError;
pub use frame::Frame;
