//! Request rate policy and last-line action revalidation.
//!
//! A decision computed for cycle N may be applied at cycle N+k. Before an
//! action reaches the dispatcher it is checked again against the mask of
//! the cycle it is applied on, and every head that is no longer legal is
//! replaced by its no-op.

use std::time::{Duration, Instant};

use skirmish_types::{ActionHead, ActionMask, ActionVector, EngagementId, options};

/// Throttle for outgoing decision requests.
///
/// At most one request may be outstanding, and consecutive requests are at
/// least `min_interval` apart. Time is passed in explicitly so the policy
/// can be driven by tests.
#[derive(Debug, Clone)]
pub struct RequestGate {
    min_interval: Duration,
    last_sent: Option<Instant>,
    outstanding: bool,
}

impl RequestGate {
    /// Create a gate enforcing `min_interval` between requests.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
            outstanding: false,
        }
    }

    /// Whether a new request may be sent at `now`.
    pub fn ready(&self, now: Instant) -> bool {
        if self.outstanding {
            return false;
        }
        self.last_sent
            .is_none_or(|sent| now.saturating_duration_since(sent) >= self.min_interval)
    }

    /// Record that a request was sent at `now`.
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
        self.outstanding = true;
    }

    /// Record that the outstanding request completed (or was abandoned).
    pub fn mark_complete(&mut self) {
        self.outstanding = false;
    }

    /// Whether a request is in flight.
    pub const fn is_outstanding(&self) -> bool {
        self.outstanding
    }
}

/// Result of re-checking an action against a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revalidation {
    /// The action with every illegal head set to no-op.
    pub action: ActionVector,
    /// Heads that were overridden.
    pub overridden: Vec<ActionHead>,
}

/// Replace every head of `action` that `mask` does not allow with no-op.
pub fn revalidate(action: ActionVector, mask: &ActionMask) -> Revalidation {
    let mut checked = action;
    let mut overridden = Vec::new();
    for head in ActionHead::ALL {
        let option = action.get(head);
        if option != options::NO_OP && !mask.allows(head, option) {
            checked.set(head, options::NO_OP);
            overridden.push(head);
        }
    }
    Revalidation {
        action: checked,
        overridden,
    }
}

/// An action that passed revalidation and is ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAction {
    /// Cycle the action is being applied on.
    pub cycle: u64,
    /// Engagement the decision was made for.
    pub engagement: EngagementId,
    /// Legal action.
    pub action: ActionVector,
    /// Heads replaced by no-op during revalidation.
    pub overridden: Vec<ActionHead>,
}
