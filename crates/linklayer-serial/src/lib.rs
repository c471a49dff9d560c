//! Real serial port and clock adapters for the link-layer protocol.
//!
//! Implements [`linklayer_core::port::SerialPort`] and
//! [`linklayer_core::port::Clock`] against actual hardware, via the
//! `serialport` crate. Tests should reach for `linklayer-harness`
//! instead.

pub mod clock;
pub mod port;

pub use clock::SystemClock;
pub use port::{OpenError, RealSerialPort};
