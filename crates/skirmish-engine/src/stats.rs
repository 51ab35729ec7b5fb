//! Per-run decision counters.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::FailureKind;

/// Counts of decision outcomes over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    /// Jobs handed to the worker.
    pub submitted: u64,
    /// Replies the service produced.
    pub successes: u64,
    /// Replies that fell back after a timeout.
    pub timeouts: u64,
    /// Replies that fell back after a connection failure.
    pub connection_failures: u64,
    /// Replies that fell back after an unusable answer.
    pub contract_violations: u64,
    /// Replies dropped because the engagement or request moved on.
    pub stale_discards: u64,
    /// Outstanding requests abandoned when the engagement ended.
    pub abandoned: u64,
    /// Submissions refused because the queue was full.
    pub queue_full: u64,
    /// Heads replaced by no-op during revalidation.
    pub overridden_heads: u64,
    /// Actions the dispatcher accepted.
    pub dispatched: u64,
    /// Actions the dispatcher rejected.
    pub dispatch_failures: u64,
}

fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}

impl DecisionStats {
    /// Count a submitted job.
    pub fn record_submitted(&mut self) {
        bump(&mut self.submitted, 1);
    }

    /// Count a reply by its outcome.
    pub fn record_outcome(&mut self, failure: Option<FailureKind>) {
        let counter = match failure {
            None => &mut self.successes,
            Some(FailureKind::Timeout) => &mut self.timeouts,
            Some(FailureKind::Connection) => &mut self.connection_failures,
            Some(FailureKind::ContractViolation) => &mut self.contract_violations,
        };
        bump(counter, 1);
    }

    /// Count a stale reply.
    pub fn record_stale(&mut self) {
        bump(&mut self.stale_discards, 1);
    }

    /// Count an abandoned request.
    pub fn record_abandoned(&mut self) {
        bump(&mut self.abandoned, 1);
    }

    /// Count a refused submission.
    pub fn record_queue_full(&mut self) {
        bump(&mut self.queue_full, 1);
    }

    /// Count a dispatched action and its overridden heads.
    pub fn record_dispatch(&mut self, overridden: usize) {
        bump(&mut self.dispatched, 1);
        bump(
            &mut self.overridden_heads,
            u64::try_from(overridden).unwrap_or(u64::MAX),
        );
    }

    /// Count an action the dispatcher rejected.
    pub fn record_dispatch_failure(&mut self) {
        bump(&mut self.dispatch_failures, 1);
    }

    /// Replies that fell back to the safe default.
    pub fn fallbacks(&self) -> u64 {
        self.timeouts
            .saturating_add(self.connection_failures)
            .saturating_add(self.contract_violations)
    }

    /// Log the counters as one JSON object.
    pub fn log_summary(&self) {
        match serde_json::to_string(self) {
            Ok(stats) => info!(fallbacks = self.fallbacks(), stats = %stats, "Decision statistics"),
            Err(e) => warn!(error = %e, "Cannot serialize decision statistics"),
        }
    }
}
