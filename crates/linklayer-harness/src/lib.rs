//! Deterministic, in-memory test harness for the link-layer protocol.
//!
//! Provides a simulated [`SerialPort`](linklayer_core::port::SerialPort)
//! pair (with pluggable byte-level fault injection) and a wall-clock
//! [`Clock`](linklayer_core::port::Clock), so integration tests can run
//! a transmitter and a receiver against each other without any real
//! hardware.

pub mod clock;
pub mod sim_port;

pub use clock::RealClock;
pub use sim_port::{Chaos, SimSerialPort, loopback_pair};
