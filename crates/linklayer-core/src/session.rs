//! Link session: stop-and-wait ARQ over a byte-granular serial port.
//!
//! [`LinkSession`] owns the serial port exclusively for its whole
//! lifetime (acquired in [`LinkSession::open`], released in
//! [`LinkSession::close`] on every exit path) and drives a single
//! [`crate::automaton::Automaton`] instance per frame it waits for.
//! There is exactly one frame in flight at a time; sequence numbers are
//! single bits, toggled on each accepted transfer.
//!
//! Generic over [`SerialPort`] and [`Clock`] so that `linklayer-serial`'s
//! real adapter and `linklayer-harness`'s simulated one are
//! interchangeable, and so tests can drive the session with a virtual
//! clock instead of wall time.

use std::time::Duration;

use linklayer_proto::{
    constants::{
        ADDR_RECEIVER, ADDR_TRANSMITTER, C_DISC, C_SET, C_UA, MAX_PAYLOAD, c_rej, c_rr, next_of_rr,
        seq_of_info, seq_of_rej,
    },
    frame::{bcc2, encode_info, encode_supervision},
    stuffing::destuff,
};

use crate::{
    automaton::{Automaton, AutomatonEvent, RawFrame},
    error::LinkError,
    port::{Clock, ReadOutcome as PortReadOutcome, SerialPort},
    statistics::Statistics,
};

/// Which end of the link this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initiates the connection and drives writes.
    Transmitter,
    /// Accepts the connection and drives reads.
    Receiver,
}

/// Outcome of a successful [`LinkSession::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `len` payload bytes were written to the caller's buffer.
    Delivered(usize),
    /// The peer sent `Disc`; the caller should now drive `close`.
    PeerDisconnected,
}

/// A stop-and-wait ARQ session over a serial port.
pub struct LinkSession<P, C>
where
    P: SerialPort,
    C: Clock<Instant = P::Instant>,
{
    port: P,
    clock: C,
    role: Role,
    retries: u32,
    timeout: Duration,
    tx_seq: u8,
    rx_expected: u8,
    stats: Statistics,
}

impl<P, C> LinkSession<P, C>
where
    P: SerialPort,
    C: Clock<Instant = P::Instant>,
{
    /// Establishes the connection.
    ///
    /// A transmitter sends `Set` up to `retries + 1` times, waiting
    /// `timeout` for `UA` after each attempt. A receiver waits
    /// indefinitely for `Set` and then replies with `UA`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::ConnectRefused`] if a transmitter exhausts
    /// its retry budget without an answer, or [`LinkError::Io`] on a
    /// port failure.
    pub fn open(
        mut port: P,
        clock: C,
        role: Role,
        retries: u32,
        timeout: Duration,
    ) -> Result<Self, LinkError> {
        let mut stats = Statistics::new();

        match role {
            Role::Transmitter => {
                let mut attempts_left = retries + 1;
                loop {
                    if attempts_left == 0 {
                        return Err(LinkError::ConnectRefused);
                    }
                    attempts_left -= 1;

                    let wire = encode_supervision(ADDR_TRANSMITTER, C_SET);
                    port.write_bytes(&wire)?;
                    stats.frames_sent += 1;

                    let deadline = Some(clock.deadline_after(timeout));
                    match Self::read_frame(&mut port, &mut stats, ADDR_RECEIVER, deadline)? {
                        Some(frame) if frame.ctrl == C_UA => break,
                        _ => {
                            stats.retransmissions += 1;
                            tracing::warn!("no UA within timeout, retrying Set");
                        },
                    }
                }
            },
            Role::Receiver => {
                loop {
                    if let Some(frame) =
                        Self::read_frame(&mut port, &mut stats, ADDR_TRANSMITTER, None)?
                    {
                        if frame.ctrl == C_SET {
                            break;
                        }
                    }
                }
                let wire = encode_supervision(ADDR_RECEIVER, C_UA);
                port.write_bytes(&wire)?;
                stats.frames_sent += 1;
            },
        }

        tracing::info!(role = ?role, "link session opened");
        Ok(Self { port, clock, role, retries, timeout, tx_seq: 0, rx_expected: 0, stats })
    }

    /// Current link statistics.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Sends `payload` and waits for it to be acknowledged.
    ///
    /// # Errors
    ///
    /// - [`LinkError::ContractViolation`] if `payload.len() >
    ///   MAX_PAYLOAD`, without touching the wire.
    /// - [`LinkError::LinkTimeout`] if the retry budget is exhausted.
    /// - [`LinkError::Io`] on a port failure.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize, LinkError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(LinkError::ContractViolation { len: payload.len(), max: MAX_PAYLOAD });
        }

        let wire = encode_info(self.tx_seq, payload)?;
        let mut attempts_left = self.retries + 1;

        loop {
            if attempts_left == 0 {
                return Err(LinkError::LinkTimeout);
            }
            attempts_left -= 1;

            self.port.write_bytes(&wire)?;
            self.stats.frames_sent += 1;

            let deadline = Some(self.clock.deadline_after(self.timeout));
            let Some(frame) = self.recv_frame(ADDR_RECEIVER, deadline)? else {
                self.stats.retransmissions += 1;
                tracing::warn!(tx_seq = self.tx_seq, "write timed out, retransmitting");
                continue;
            };

            if let Some(next) = next_of_rr(frame.ctrl) {
                if next != self.tx_seq {
                    self.stats.frames_accepted += 1;
                    self.stats.mark_transmission_start();
                    self.stats.payload_bytes += payload.len() as u64;
                    self.tx_seq = 1 - self.tx_seq;
                    return Ok(wire.len());
                }
                tracing::debug!(tx_seq = self.tx_seq, "duplicate ack, retransmitting");
                self.stats.retransmissions += 1;
            } else if let Some(n) = seq_of_rej(frame.ctrl) {
                if n == self.tx_seq {
                    self.stats.frames_rejected += 1;
                    tracing::warn!(tx_seq = self.tx_seq, "peer rejected frame, retransmitting");
                }
                self.stats.retransmissions += 1;
            } else {
                tracing::debug!(ctrl = frame.ctrl, "ignoring unrelated frame while awaiting ack");
                self.stats.retransmissions += 1;
            }
        }
    }

    /// Blocks until a data frame is delivered or the peer disconnects.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::ContractViolation`] if the delivered payload
    /// is larger than `buffer`, or [`LinkError::Io`] on a port failure.
    /// Never times out: this call blocks until a valid data frame, a
    /// `Disc`, or a hard I/O error.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome, LinkError> {
        loop {
            let Some(frame) = self.recv_frame(ADDR_TRANSMITTER, None)? else {
                // `deadline = None` never times out; a `None` here would
                // mean the port lied about blocking indefinitely. Treat
                // it as spurious and keep listening rather than panic.
                continue;
            };

            if frame.ctrl == C_DISC {
                return Ok(ReadOutcome::PeerDisconnected);
            }

            if frame.ctrl == C_SET {
                // The peer is re-requesting the connection, which only
                // happens if our original `UA` never reached it. Re-ack
                // rather than silently drop it, so a lost first `UA`
                // doesn't strand the transmitter retrying forever.
                tracing::debug!("duplicate Set seen post-connect, re-acking");
                self.send_supervision(ADDR_RECEIVER, C_UA)?;
                continue;
            }

            let Some(seq) = seq_of_info(frame.ctrl) else {
                tracing::debug!(ctrl = frame.ctrl, "ignoring non-info frame while reading");
                continue;
            };

            let destuffed = destuff(&frame.payload);
            let split_at = destuffed.len().saturating_sub(1);
            let (payload, trailer) = destuffed.split_at(split_at);
            let received_bcc2 = trailer.first().copied().unwrap_or(0);

            if bcc2(payload) != received_bcc2 {
                self.stats.frames_rejected += 1;
                self.send_supervision(ADDR_RECEIVER, c_rej(seq))?;
                tracing::warn!(seq, "bad payload checksum, sending REJ");
                continue;
            }

            if seq == self.rx_expected {
                if payload.len() > buffer.len() {
                    return Err(LinkError::ContractViolation {
                        len: payload.len(),
                        max: buffer.len(),
                    });
                }
                buffer[..payload.len()].copy_from_slice(payload);
                self.send_supervision(ADDR_RECEIVER, c_rr(1 - seq))?;
                self.rx_expected = 1 - seq;
                self.stats.frames_accepted += 1;
                self.stats.mark_transmission_start();
                self.stats.payload_bytes += payload.len() as u64;
                return Ok(ReadOutcome::Delivered(payload.len()));
            }

            tracing::debug!(seq, "duplicate info frame, re-acking without delivering");
            self.send_supervision(ADDR_RECEIVER, c_rr(self.rx_expected))?;
        }
    }

    /// Tears down the connection.
    ///
    /// Releases the serial port regardless of the outcome. If
    /// `show_stats` is set, [`Statistics::report`] is emitted even when
    /// teardown itself fails.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::LinkTimeout`] if the three-way teardown
    /// doesn't complete within the retry budget, or [`LinkError::Io`] on
    /// a port failure.
    pub fn close(mut self, show_stats: bool) -> Result<(), LinkError> {
        let result = match self.role {
            Role::Transmitter => self.close_as_transmitter(),
            Role::Receiver => self.close_as_receiver(),
        };

        if show_stats {
            self.stats.report();
        }
        tracing::info!(role = ?self.role, ok = result.is_ok(), "link session closed");
        result
    }

    fn close_as_transmitter(&mut self) -> Result<(), LinkError> {
        self.send_supervision(ADDR_TRANSMITTER, C_DISC)?;
        let mut attempts_left = self.retries + 1;
        loop {
            if attempts_left == 0 {
                return Err(LinkError::LinkTimeout);
            }
            attempts_left -= 1;

            let deadline = Some(self.clock.deadline_after(self.timeout));
            match self.recv_frame(ADDR_RECEIVER, deadline)? {
                Some(frame) if frame.ctrl == C_DISC => {
                    self.send_supervision(ADDR_TRANSMITTER, C_UA)?;
                    return Ok(());
                },
                _ => {
                    self.stats.retransmissions += 1;
                    self.send_supervision(ADDR_TRANSMITTER, C_DISC)?;
                },
            }
        }
    }

    fn close_as_receiver(&mut self) -> Result<(), LinkError> {
        loop {
            if let Some(frame) = self.recv_frame(ADDR_TRANSMITTER, None)? {
                if frame.ctrl == C_DISC {
                    break;
                }
            }
        }
        self.send_supervision(ADDR_RECEIVER, C_DISC)?;

        let mut attempts_left = self.retries + 1;
        loop {
            if attempts_left == 0 {
                return Err(LinkError::LinkTimeout);
            }
            attempts_left -= 1;

            let deadline = Some(self.clock.deadline_after(self.timeout));
            match self.recv_frame(ADDR_TRANSMITTER, deadline)? {
                Some(frame) if frame.ctrl == C_UA => return Ok(()),
                _ => continue,
            }
        }
    }

    fn recv_frame(
        &mut self,
        expected_addr: u8,
        deadline: Option<P::Instant>,
    ) -> Result<Option<RawFrame>, LinkError> {
        Self::read_frame(&mut self.port, &mut self.stats, expected_addr, deadline)
    }

    fn send_supervision(&mut self, addr: u8, ctrl: u8) -> Result<(), LinkError> {
        let wire = encode_supervision(addr, ctrl);
        self.port.write_bytes(&wire)?;
        self.stats.frames_sent += 1;
        Ok(())
    }

    fn read_frame(
        port: &mut P,
        stats: &mut Statistics,
        expected_addr: u8,
        deadline: Option<P::Instant>,
    ) -> Result<Option<RawFrame>, LinkError> {
        let mut automaton = Automaton::new(expected_addr);
        loop {
            match port.read_byte(deadline)? {
                PortReadOutcome::Timeout => return Ok(None),
                PortReadOutcome::Byte(byte) => match automaton.feed(byte) {
                    AutomatonEvent::Continue => {},
                    AutomatonEvent::Reset => {
                        tracing::debug!("automaton resynced after a malformed header");
                    },
                    AutomatonEvent::FrameComplete(frame) => {
                        stats.frames_received += 1;
                        return Ok(Some(frame));
                    },
                },
            }
        }
    }
}
