//! Dedicated decision worker.
//!
//! The simulation context never awaits the network. It hands an immutable
//! [`DecisionJob`] to the worker task through a bounded channel and picks
//! up [`DecisionReply`] values on later cycles. The worker owns the
//! [`DecisionClient`] outright, so no mutable state crosses the boundary.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use skirmish_types::{ActionMask, ActionVector, EngagementId, ObservationVector};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::{DecisionClient, FailureKind};

/// Monotonic identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Snapshot of everything the worker needs for one request.
#[derive(Debug, Clone)]
pub struct DecisionJob {
    /// Identifier assigned at submission.
    pub request: RequestId,
    /// Engagement the observation belongs to.
    pub engagement: EngagementId,
    /// Cycle the observation was taken on.
    pub cycle: u64,
    /// Shaped reward for the cycle, logged alongside the request.
    pub reward: f64,
    /// Stacked observation frames, oldest first.
    pub frames: Vec<ObservationVector>,
    /// Mask published with the observation.
    pub mask: ActionMask,
}

/// Answer to one [`DecisionJob`].
#[derive(Debug, Clone)]
pub struct DecisionReply {
    /// Request this answers.
    pub request: RequestId,
    /// Engagement the request was made for.
    pub engagement: EngagementId,
    /// Cycle the request was made on.
    pub cycle: u64,
    /// Selected action, or the safe default.
    pub action: ActionVector,
    /// Set when `action` is the safe default.
    pub failure: Option<FailureKind>,
    /// Time spent inside the client.
    pub latency: Duration,
    /// Wall-clock time the reply was produced.
    pub received_at: DateTime<Utc>,
}

/// Why a job could not be handed to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The job queue is full.
    #[error("decision queue is full")]
    Full,
    /// The worker has stopped.
    #[error("decision worker has stopped")]
    Closed,
}

/// Simulation-side end of the worker channels.
#[derive(Debug)]
pub struct DecisionHandle {
    jobs: mpsc::Sender<DecisionJob>,
    replies: mpsc::Receiver<DecisionReply>,
    next_request: u64,
}

impl DecisionHandle {
    /// Hand a job to the worker without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Full`] if the queue has no room and
    /// [`SubmitError::Closed`] if the worker is gone.
    pub fn submit(
        &mut self,
        engagement: EngagementId,
        cycle: u64,
        reward: f64,
        frames: Vec<ObservationVector>,
        mask: ActionMask,
    ) -> Result<RequestId, SubmitError> {
        let request = RequestId(self.next_request);
        let job = DecisionJob {
            request,
            engagement,
            cycle,
            reward,
            frames,
            mask,
        };
        match self.jobs.try_send(job) {
            Ok(()) => {
                self.next_request = self.next_request.saturating_add(1);
                Ok(request)
            }
            Err(TrySendError::Full(_)) => Err(SubmitError::Full),
            Err(TrySendError::Closed(_)) => Err(SubmitError::Closed),
        }
    }

    /// Take the next finished reply, if any, without blocking.
    pub fn poll(&mut self) -> Option<DecisionReply> {
        self.replies.try_recv().ok()
    }
}

/// Spawn the worker task on the current runtime.
///
/// The task exits once the returned handle is dropped and the queue has
/// drained.
pub fn spawn(client: DecisionClient, capacity: usize) -> (DecisionHandle, JoinHandle<()>) {
    let capacity = capacity.max(1);
    let (job_tx, job_rx) = mpsc::channel(capacity);
    let (reply_tx, reply_rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run(client, job_rx, reply_tx));
    let handle = DecisionHandle {
        jobs: job_tx,
        replies: reply_rx,
        next_request: 1,
    };
    (handle, task)
}

async fn run(
    mut client: DecisionClient,
    mut jobs: mpsc::Receiver<DecisionJob>,
    replies: mpsc::Sender<DecisionReply>,
) {
    info!(address = %client.settings().address, "Decision worker started");
    while let Some(job) = jobs.recv().await {
        debug!(request = %job.request, engagement = %job.engagement, "Decision job received");
        let started = Instant::now();
        let result = client
            .request_action(job.cycle, job.reward, job.frames, job.mask)
            .await;
        let reply = DecisionReply {
            request: job.request,
            engagement: job.engagement,
            cycle: job.cycle,
            action: result.action,
            failure: result.failure,
            latency: started.elapsed(),
            received_at: Utc::now(),
        };
        if replies.send(reply).await.is_err() {
            break;
        }
    }
    info!("Decision worker stopped");
}
