//! Bounded cycle driver.
//!
//! Fires the [`CycleClock`] on a fixed `tokio` interval until the callback
//! asks to stop, the cycle limit is reached, or the shutdown future
//! resolves. Late ticks are skipped rather than bunched, so a slow cycle
//! never causes a burst of catch-up cycles.

use std::future::Future;

use chrono::{DateTime, Utc};
use skirmish_core::clock::{CycleCallback, CycleClock, CycleFlow};
use skirmish_core::pipeline::CycleError;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The callback reported nothing more to do.
    WorldExhausted,
    /// `max_cycles` cycles were fired.
    MaxCycles,
    /// The shutdown signal fired.
    Interrupted,
}

/// Outcome of a driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the run ended.
    pub reason: StopReason,
    /// Cycles fired.
    pub cycles: u64,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Log the summary.
    pub fn log(&self) {
        info!(
            reason = ?self.reason,
            cycles = self.cycles,
            started_at = %self.started_at,
            finished_at = %self.finished_at,
            elapsed_ms = self
                .finished_at
                .signed_duration_since(self.started_at)
                .num_milliseconds(),
            "Run ended"
        );
    }
}

/// Drive `callback` once per clock period.
///
/// # Errors
///
/// Returns the first [`CycleError`] raised by the clock or the callback.
pub async fn drive(
    clock: &mut CycleClock,
    callback: &mut dyn CycleCallback,
    max_cycles: Option<u64>,
    shutdown: impl Future<Output = ()>,
) -> Result<RunSummary, CycleError> {
    let started_at = Utc::now();
    let first_cycle = clock.cycle();
    let mut ticker = tokio::time::interval(clock.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(
        period_ms = u64::try_from(clock.period().as_millis()).unwrap_or(u64::MAX),
        max_cycles,
        "Cycle driver starting"
    );

    let reason = loop {
        let fired = clock.cycle().saturating_sub(first_cycle);
        if max_cycles.is_some_and(|limit| fired >= limit) {
            break StopReason::MaxCycles;
        }
        tokio::select! {
            biased;
            () = &mut shutdown => break StopReason::Interrupted,
            _ = ticker.tick() => {
                if clock.fire(callback)? == CycleFlow::Stop {
                    break StopReason::WorldExhausted;
                }
            }
        }
    };

    Ok(RunSummary {
        reason,
        cycles: clock.cycle().saturating_sub(first_cycle),
        started_at,
        finished_at: Utc::now(),
    })
}
