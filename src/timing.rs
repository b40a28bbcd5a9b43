//! Timing primitives for the 5-baud bit-banged wake-up sequence.

use std::time::Duration;

/// Tunable delays used while bit-banging the wake-up address byte.
///
/// Threaded through [`crate::config::ConnectConfig`] rather than held in a
/// mutable global, so tests can zero both delays without touching
/// process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// One bit time at 5 baud: 1s / 5 = 200ms.
    pub baud_delay: Duration,
    /// Hold time before starting the 5-baud frame.
    pub reset_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            baud_delay: Duration::from_millis(200),
            reset_delay: Duration::from_millis(300),
        }
    }
}

impl Timing {
    /// Zeroed delays, for deterministic test harnesses.
    pub fn zero() -> Self {
        Self {
            baud_delay: Duration::ZERO,
            reset_delay: Duration::ZERO,
        }
    }
}
