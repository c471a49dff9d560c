//! Wall-clock [`Clock`] implementation for tests.
//!
//! Real timeouts in the test suite are short (single-digit
//! milliseconds), so there is no need for a virtual clock the way a
//! long-running network simulation would; wall time is deterministic
//! enough at that scale.

use std::time::{Duration, Instant};

use linklayer_core::port::Clock;

/// A [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl Clock for RealClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn deadline_after(&self, timeout: Duration) -> Self::Instant {
        Instant::now() + timeout
    }
}
