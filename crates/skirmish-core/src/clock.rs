//! Cycle clock.
//!
//! The clock owns the cycle counter and the nominal period. It does not
//! sleep: the surrounding driver decides when a cycle is due and calls
//! [`CycleClock::fire`], which advances the counter and hands the new
//! cycle index to the registered [`CycleCallback`].

use std::time::Duration;

use crate::pipeline::CycleError;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Cycle counter would overflow.
    #[error("cycle counter overflow: cannot advance beyond u64::MAX")]
    CycleOverflow,

    /// Invalid clock configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Whether the driver should keep firing cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleFlow {
    /// Fire the next cycle when it is due.
    Continue,
    /// Stop driving; the world has nothing more to report.
    Stop,
}

/// Work invoked once per cycle.
pub trait CycleCallback {
    /// Handle `cycle`.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`] when the cycle could not be completed.
    fn on_cycle(&mut self, cycle: u64) -> Result<CycleFlow, CycleError>;
}

/// Monotonic cycle counter with a fixed nominal period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleClock {
    /// Last cycle fired; zero before the first.
    cycle: u64,
    period: Duration,
}

impl CycleClock {
    /// Create a clock with the given period.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `period_ms` is zero.
    pub fn new(period_ms: u64) -> Result<Self, ClockError> {
        if period_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "cycle period must be at least 1 ms".to_owned(),
            });
        }
        Ok(Self {
            cycle: 0,
            period: Duration::from_millis(period_ms),
        })
    }

    /// Advance by one cycle. Returns the new cycle index.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CycleOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.cycle = self.cycle.checked_add(1).ok_or(ClockError::CycleOverflow)?;
        Ok(self.cycle)
    }

    /// Advance and invoke `callback` for the new cycle.
    ///
    /// # Errors
    ///
    /// Propagates overflow as [`CycleError::Clock`] and any error from the
    /// callback.
    pub fn fire(&mut self, callback: &mut dyn CycleCallback) -> Result<CycleFlow, CycleError> {
        let cycle = self.advance()?;
        callback.on_cycle(cycle)
    }

    /// Last cycle fired.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Nominal time between cycles.
    pub const fn period(&self) -> Duration {
        self.period
    }
}
