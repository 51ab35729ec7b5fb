//! The duel agent: one callback per cycle.
//!
//! Each cycle the agent reads the world, runs the pipeline, settles any
//! decision replies that arrived since the last cycle, and submits a new
//! request when the rate policy allows. Replies are only applied if they
//! answer the request still outstanding for the current engagement; the
//! action is revalidated against this cycle's mask before dispatch.

use std::time::Instant;

use skirmish_core::clock::{CycleCallback, CycleFlow};
use skirmish_core::pipeline::{CycleError, CyclePipeline, CycleSnapshot};
use skirmish_core::safety::{RequestGate, Revalidation, ValidatedAction, revalidate};
use skirmish_core::world::{ActionDispatcher, WorldState};
use skirmish_types::EngagementId;
use tracing::{debug, error, info, warn};

use crate::stats::DecisionStats;
use crate::worker::{DecisionHandle, DecisionReply, RequestId, SubmitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    request: RequestId,
    engagement: EngagementId,
}

impl Outstanding {
    fn answers(&self, reply: &DecisionReply) -> bool {
        self.request == reply.request && self.engagement == reply.engagement
    }
}

/// Glue between the world, the pipeline and the decision worker.
#[derive(Debug)]
pub struct DuelAgent<W, D> {
    pipeline: CyclePipeline,
    world: W,
    dispatcher: D,
    decisions: DecisionHandle,
    gate: RequestGate,
    outstanding: Option<Outstanding>,
    stats: DecisionStats,
}

impl<W: WorldState, D: ActionDispatcher> DuelAgent<W, D> {
    /// Assemble an agent from its collaborators.
    pub fn new(
        pipeline: CyclePipeline,
        world: W,
        dispatcher: D,
        decisions: DecisionHandle,
        gate: RequestGate,
    ) -> Self {
        Self {
            pipeline,
            world,
            dispatcher,
            decisions,
            gate,
            outstanding: None,
            stats: DecisionStats::default(),
        }
    }

    /// Decision counters so far.
    pub const fn stats(&self) -> &DecisionStats {
        &self.stats
    }

    /// The pipeline, for inspecting the latest cycle.
    pub const fn pipeline(&self) -> &CyclePipeline {
        &self.pipeline
    }

    /// The dispatcher.
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Whether a decision request is in flight.
    pub const fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Tear down, closing the worker queue.
    pub fn into_parts(self) -> (W, D, DecisionStats) {
        (self.world, self.dispatcher, self.stats)
    }

    fn abandon_if_ended(&mut self, engagement: Option<EngagementId>, cycle: u64) {
        if let Some(pending) = self.outstanding {
            if engagement != Some(pending.engagement) {
                debug!(
                    cycle,
                    request = %pending.request,
                    engagement = %pending.engagement,
                    "Engagement ended, abandoning outstanding request"
                );
                self.outstanding = None;
                self.gate.mark_complete();
                self.stats.record_abandoned();
            }
        }
    }

    fn settle_replies(&mut self, snapshot: &CycleSnapshot) {
        while let Some(reply) = self.decisions.poll() {
            let accepted = self
                .outstanding
                .is_some_and(|pending| pending.answers(&reply));
            if !accepted {
                debug!(
                    cycle = snapshot.cycle,
                    request = %reply.request,
                    requested_on = reply.cycle,
                    "Discarding stale decision reply"
                );
                self.stats.record_stale();
                continue;
            }

            self.outstanding = None;
            self.gate.mark_complete();
            self.stats.record_outcome(reply.failure);

            let Revalidation { action, overridden } = revalidate(reply.action, &snapshot.mask);
            if !overridden.is_empty() {
                let heads: Vec<&str> = overridden.iter().map(|head| head.name()).collect();
                debug!(
                    cycle = snapshot.cycle,
                    requested_on = reply.cycle,
                    heads = ?heads,
                    "Heads no longer legal, replaced with no-op"
                );
            }
            let validated = ValidatedAction {
                cycle: snapshot.cycle,
                engagement: reply.engagement,
                action,
                overridden,
            };
            match self.dispatcher.dispatch(&validated) {
                Ok(()) => self.stats.record_dispatch(validated.overridden.len()),
                Err(e) => {
                    warn!(
                        cycle = snapshot.cycle,
                        request = %reply.request,
                        error = %e,
                        "Dispatch failed, dropping action"
                    );
                    self.stats.record_dispatch_failure();
                }
            }
        }
    }

    fn submit_if_ready(&mut self, snapshot: CycleSnapshot) -> CycleFlow {
        let Some(engagement) = snapshot.engagement else {
            return CycleFlow::Continue;
        };
        let now = Instant::now();
        if !self.gate.ready(now) {
            return CycleFlow::Continue;
        }

        let cycle = snapshot.cycle;
        match self.decisions.submit(
            engagement,
            cycle,
            snapshot.reward,
            snapshot.frames,
            snapshot.mask,
        ) {
            Ok(request) => {
                self.gate.mark_sent(now);
                self.outstanding = Some(Outstanding {
                    request,
                    engagement,
                });
                self.stats.record_submitted();
                debug!(cycle, request = %request, "Decision request submitted");
                CycleFlow::Continue
            }
            Err(SubmitError::Full) => {
                warn!(cycle, "Decision queue full, skipping request");
                self.stats.record_queue_full();
                CycleFlow::Continue
            }
            Err(SubmitError::Closed) => {
                error!(cycle, "Decision worker stopped, ending run");
                CycleFlow::Stop
            }
        }
    }
}

impl<W: WorldState, D: ActionDispatcher> CycleCallback for DuelAgent<W, D> {
    fn on_cycle(&mut self, cycle: u64) -> Result<CycleFlow, CycleError> {
        let Some(input) = self.world.capture(cycle)? else {
            info!(cycle, "World has no more cycles");
            return Ok(CycleFlow::Stop);
        };
        let snapshot = self.pipeline.run_cycle(cycle, &input)?;
        self.abandon_if_ended(snapshot.engagement, cycle);
        self.settle_replies(&snapshot);
        Ok(self.submit_if_ready(snapshot))
    }
}
