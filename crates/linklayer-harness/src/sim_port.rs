//! Simulated loopback serial port with pluggable fault injection.
//!
//! [`loopback_pair`] returns two [`SimSerialPort`] endpoints connected by
//! a pair of byte channels, one per direction, so a transmitter and a
//! receiver can each run on their own thread and exercise
//! [`linklayer_core::session::LinkSession`] exactly as they would over a
//! real cable. [`Chaos`] controls what happens to bytes in flight:
//! dropped, bit-flipped, duplicated, or delayed, all driven by a seeded
//! RNG so a failing scenario reproduces from its seed.

use std::{
    io,
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

use linklayer_core::port::{ReadOutcome, SerialPort};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fault-injection knobs applied to bytes written in one direction.
#[derive(Debug, Clone, Copy)]
pub struct Chaos {
    /// Probability a byte is silently dropped before reaching the peer.
    pub drop_probability: f64,
    /// Probability a byte has one random bit flipped in transit.
    pub corrupt_probability: f64,
    /// Probability a byte is delivered twice.
    pub duplicate_probability: f64,
    /// Extra delay applied before every byte is sent.
    pub extra_latency: Duration,
    /// Drops exactly the byte at this absolute offset in the direction's
    /// stream (0-indexed, counting every byte ever passed to
    /// `write_bytes` on this endpoint), once. Scripted rather than
    /// probabilistic, for reproducing a specific scenario such as "the
    /// first `UA` is lost" without fighting a seeded RNG for the right
    /// seed.
    pub drop_once_at: Option<u64>,
    /// Flips the low bit of exactly the byte at this absolute offset in
    /// the direction's stream, once. Scripted counterpart to
    /// `corrupt_probability`, for reproducing "a single bit flips in
    /// this specific frame" scenarios deterministically.
    pub flip_once_at: Option<u64>,
}

impl Chaos {
    /// A clean link: nothing is dropped, corrupted, duplicated, or
    /// delayed.
    #[must_use]
    pub fn none() -> Self {
        Self {
            drop_probability: 0.0,
            corrupt_probability: 0.0,
            duplicate_probability: 0.0,
            extra_latency: Duration::ZERO,
            drop_once_at: None,
            flip_once_at: None,
        }
    }
}

impl Default for Chaos {
    fn default() -> Self {
        Self::none()
    }
}

/// One endpoint of a simulated, in-memory serial cable.
pub struct SimSerialPort {
    inbound: mpsc::Receiver<u8>,
    outbound: mpsc::Sender<u8>,
    chaos: Chaos,
    rng: ChaCha8Rng,
    written: u64,
}

/// Builds a connected pair of endpoints, `a` and `b`. Bytes `a` writes
/// pass through `chaos_a_to_b` before `b` can read them, and vice versa.
/// `seed` makes fault injection on both directions reproducible.
#[must_use]
pub fn loopback_pair(seed: u64, chaos_a_to_b: Chaos, chaos_b_to_a: Chaos) -> (SimSerialPort, SimSerialPort) {
    let (tx_a_to_b, rx_a_to_b) = mpsc::channel();
    let (tx_b_to_a, rx_b_to_a) = mpsc::channel();

    let a = SimSerialPort {
        inbound: rx_b_to_a,
        outbound: tx_a_to_b,
        chaos: chaos_a_to_b,
        rng: ChaCha8Rng::seed_from_u64(seed),
        written: 0,
    };
    let b = SimSerialPort {
        inbound: rx_a_to_b,
        outbound: tx_b_to_a,
        chaos: chaos_b_to_a,
        rng: ChaCha8Rng::seed_from_u64(seed ^ 0xA5A5_A5A5_A5A5_A5A5),
        written: 0,
    };
    (a, b)
}

impl SerialPort for SimSerialPort {
    type Instant = Instant;

    fn read_byte(&mut self, deadline: Option<Self::Instant>) -> io::Result<ReadOutcome> {
        let outcome = match deadline {
            None => self.inbound.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                self.inbound.recv_timeout(remaining)
            },
        };

        match outcome {
            Ok(byte) => Ok(ReadOutcome::Byte(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(ReadOutcome::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated peer disconnected"))
            },
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            let offset = self.written;
            self.written += 1;

            if self.chaos.extra_latency > Duration::ZERO {
                std::thread::sleep(self.chaos.extra_latency);
            }

            if self.chaos.drop_once_at == Some(offset) {
                self.chaos.drop_once_at = None;
                tracing::debug!(byte, offset, "chaos: scripted drop");
                continue;
            }

            if self.chaos.drop_probability > 0.0
                && self.rng.gen_bool(self.chaos.drop_probability)
            {
                tracing::debug!(byte, "chaos: dropped byte");
                continue;
            }

            let byte = if self.chaos.flip_once_at == Some(offset) {
                self.chaos.flip_once_at = None;
                let flipped = byte ^ 0x01;
                tracing::debug!(byte, flipped, offset, "chaos: scripted bit flip");
                flipped
            } else {
                byte
            };

            let delivered = if self.chaos.corrupt_probability > 0.0
                && self.rng.gen_bool(self.chaos.corrupt_probability)
            {
                let bit = self.rng.gen_range(0..8u8);
                let flipped = byte ^ (1 << bit);
                tracing::debug!(byte, flipped, "chaos: corrupted byte");
                flipped
            } else {
                byte
            };

            // A disconnected peer just drops further bytes on the floor;
            // write_bytes still reports success because a real transmitter
            // cannot observe that at this layer either.
            let _ = self.outbound.send(delivered);

            if self.chaos.duplicate_probability > 0.0
                && self.rng.gen_bool(self.chaos.duplicate_probability)
            {
                tracing::debug!(byte = delivered, "chaos: duplicated byte");
                let _ = self.outbound.send(delivered);
            }
        }
        Ok(buf.len())
    }
}
