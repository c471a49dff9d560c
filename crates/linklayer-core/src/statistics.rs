//! Link session statistics.
//!
//! Monotonic counters and wall-clock timers, mutated only by
//! [`crate::session::LinkSession`] and otherwise read-only. Treats
//! wall-clock elapsed time as authoritative rather than mixing in
//! CPU-clock timestamps.

use std::time::{Duration, Instant};

/// Counters and timers surfaced on close.
#[derive(Debug)]
pub struct Statistics {
    /// Frames written to the port, including retransmissions.
    pub frames_sent: u64,
    /// Frames whose header parsed and whose BCC1 validated.
    pub frames_received: u64,
    /// Information frames successfully delivered to the application.
    pub frames_accepted: u64,
    /// Information frames whose BCC2 failed validation.
    pub frames_rejected: u64,
    /// Retransmissions triggered by a timeout, a duplicate ack, or a
    /// `REJ`.
    pub retransmissions: u64,
    /// Total accepted payload bytes, both directions.
    pub payload_bytes: u64,
    connection_started_at: Instant,
    transmission_started_at: Option<Instant>,
}

impl Statistics {
    /// Starts a fresh record with the connection timer running.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_sent: 0,
            frames_received: 0,
            frames_accepted: 0,
            frames_rejected: 0,
            retransmissions: 0,
            payload_bytes: 0,
            connection_started_at: Instant::now(),
            transmission_started_at: None,
        }
    }

    /// Starts the transmission timer on the first data frame, if it
    /// hasn't started already.
    pub fn mark_transmission_start(&mut self) {
        self.transmission_started_at.get_or_insert_with(Instant::now);
    }

    /// Wall-clock time since the session was opened.
    #[must_use]
    pub fn connection_elapsed(&self) -> Duration {
        self.connection_started_at.elapsed()
    }

    /// Wall-clock time since the first data frame, or zero if none has
    /// been accepted yet.
    #[must_use]
    pub fn transmission_elapsed(&self) -> Duration {
        self.transmission_started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Emits a structured summary of this record.
    pub fn report(&self) {
        tracing::info!(
            frames_sent = self.frames_sent,
            frames_received = self.frames_received,
            frames_accepted = self.frames_accepted,
            frames_rejected = self.frames_rejected,
            retransmissions = self.retransmissions,
            payload_bytes = self.payload_bytes,
            connection_elapsed_s = self.connection_elapsed().as_secs_f64(),
            transmission_elapsed_s = self.transmission_elapsed().as_secs_f64(),
            "link session statistics",
        );
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = Statistics::new();
        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.frames_received, 0);
        assert_eq!(stats.frames_accepted, 0);
        assert_eq!(stats.frames_rejected, 0);
        assert_eq!(stats.retransmissions, 0);
        assert_eq!(stats.payload_bytes, 0);
    }

    #[test]
    fn transmission_elapsed_is_zero_before_any_data_frame() {
        let stats = Statistics::new();
        assert_eq!(stats.transmission_elapsed(), Duration::ZERO);
    }

    #[test]
    fn transmission_timer_only_starts_once() {
        let mut stats = Statistics::new();
        stats.mark_transmission_start();
        let first = stats.transmission_elapsed();
        stats.mark_transmission_start();
        // Re-marking must not reset the timer back to a later instant.
        assert!(stats.transmission_elapsed() >= first);
    }
}
