//! Line-delimited JSON decision client over TCP.
//!
//! One request is one JSON object followed by `\n`; the service answers
//! with one JSON line. The client connects lazily on first use and after
//! any failure, bounds every exchange by a deadline, and never surfaces
//! an error to its caller: a failed exchange yields the all-no-op action
//! together with a [`FailureKind`].

use std::time::Duration;

use skirmish_core::config::DecisionConfig;
use skirmish_types::{
    ActionMask, ActionVector, DecisionRequest, ObservationVector, ResponseError, fingerprint_hex,
    parse_response,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, warn};

/// Longest reply line accepted, newline included.
pub const MAX_REPLY_BYTES: u64 = 65_536;

/// Errors from a single exchange with the decision service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The exchange did not finish before its deadline.
    #[error("{phase} timed out after {after_ms} ms")]
    Timeout {
        /// Which phase ran out of time (`connect` or `request`).
        phase: &'static str,
        /// Deadline that elapsed.
        after_ms: u64,
    },

    /// The service could not be reached.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Address that was dialled.
        address: String,
        /// The underlying socket error.
        source: std::io::Error,
    },

    /// Reading or writing the socket failed.
    #[error("socket error: {source}")]
    Io {
        /// The underlying socket error.
        #[from]
        source: std::io::Error,
    },

    /// The service closed the connection before replying.
    #[error("connection closed by decision service")]
    Closed,

    /// The reply line did not end within [`MAX_REPLY_BYTES`].
    #[error("reply exceeds {limit} bytes")]
    ReplyTooLong {
        /// The byte limit.
        limit: u64,
    },

    /// The request could not be serialized.
    #[error("failed to encode request: {source}")]
    Encode {
        /// The underlying serializer error.
        #[from]
        source: serde_json::Error,
    },

    /// The reply was malformed or violated the action contract.
    #[error("invalid reply: {source}")]
    Contract {
        /// The underlying response error.
        #[from]
        source: ResponseError,
    },
}

impl ClientError {
    /// Map the error to the failure category reported with the safe default.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Connect { .. } | Self::Io { .. } | Self::Closed => FailureKind::Connection,
            Self::Encode { .. } | Self::Contract { .. } | Self::ReplyTooLong { .. } => {
                FailureKind::ContractViolation
            }
        }
    }
}

/// Why a decision fell back to the safe default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The service did not answer in time.
    Timeout,
    /// The service was unreachable or dropped the connection.
    Connection,
    /// The reply could not be used.
    ContractViolation,
}

/// Outcome of one decision request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionResult {
    /// The selected action, or all no-ops on failure.
    pub action: ActionVector,
    /// Set when `action` is the safe default.
    pub failure: Option<FailureKind>,
}

impl DecisionResult {
    /// Whether the service produced the action.
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Connection and request settings for [`DecisionClient`].
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// `host:port` of the decision service.
    pub address: String,
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
    /// Bound on one write-and-read exchange.
    pub request_timeout: Duration,
    /// Model identifier sent with every request.
    pub model: String,
    /// Ask for the arg-max action.
    pub deterministic: bool,
    /// Ask for the log-probability.
    pub return_log_prob: bool,
    /// Ask for the entropy.
    pub return_entropy: bool,
    /// Ask for the value estimate.
    pub return_value: bool,
    /// Ask for the per-head distributions.
    pub return_probs: bool,
}

impl ClientSettings {
    /// Build settings from the `decision` config section.
    pub fn from_config(config: &DecisionConfig) -> Self {
        Self {
            address: config.address(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            model: config.model.clone(),
            deterministic: config.deterministic,
            return_log_prob: config.return_log_prob,
            return_entropy: config.return_entropy,
            return_value: config.return_value,
            return_probs: config.return_probs,
        }
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Client for the external decision service.
pub struct DecisionClient {
    settings: ClientSettings,
    connection: Option<Connection>,
}

impl std::fmt::Debug for DecisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionClient")
            .field("address", &self.settings.address)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl DecisionClient {
    /// Create a client. No connection is made until the first request.
    pub const fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            connection: None,
        }
    }

    /// Current settings.
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Whether a connection is currently held open.
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Assemble a request for `frames` and `mask` using the configured
    /// model and flags.
    pub fn build_request(
        &self,
        frames: Vec<ObservationVector>,
        mask: ActionMask,
    ) -> DecisionRequest {
        DecisionRequest {
            model: self.settings.model.clone(),
            action_masks: mask,
            obs: frames,
            deterministic: self.settings.deterministic,
            return_log_prob: self.settings.return_log_prob,
            return_entropy: self.settings.return_entropy,
            return_value: self.settings.return_value,
            return_probs: self.settings.return_probs,
            contract_fingerprint: Some(fingerprint_hex()),
        }
    }

    /// Request an action for `cycle` from `frames` and `mask`.
    ///
    /// `reward` is the shaped reward of the cycle; it is logged with the
    /// request but not sent.
    pub async fn request_action(
        &mut self,
        cycle: u64,
        reward: f64,
        frames: Vec<ObservationVector>,
        mask: ActionMask,
    ) -> DecisionResult {
        debug!(cycle, reward, frames = frames.len(), "Requesting decision");
        let request = self.build_request(frames, mask);
        self.decide(&request).await
    }

    /// Send `request` and wait for the reply.
    ///
    /// Never fails: on timeout, connection failure or an unusable reply the
    /// result carries [`ActionVector::no_op`] and the failure kind. The
    /// connection is dropped on timeout, socket errors and oversized replies
    /// so the next request starts from a clean stream.
    pub async fn decide(&mut self, request: &DecisionRequest) -> DecisionResult {
        match self.exchange(request).await {
            Ok(action) => {
                debug!(address = %self.settings.address, "Decision received");
                DecisionResult {
                    action,
                    failure: None,
                }
            }
            Err(e) => {
                let kind = e.kind();
                warn!(
                    address = %self.settings.address,
                    kind = ?kind,
                    error = %e,
                    "Decision request failed, using safe default"
                );
                DecisionResult {
                    action: ActionVector::no_op(),
                    failure: Some(kind),
                }
            }
        }
    }

    async fn exchange(&mut self, request: &DecisionRequest) -> Result<ActionVector, ClientError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        if self.connection.is_none() {
            self.connection = Some(self.connect().await?);
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(ClientError::Closed);
        };

        let deadline = self.settings.request_timeout;
        match tokio::time::timeout(deadline, round_trip(connection, &line)).await {
            Err(_elapsed) => {
                self.connection = None;
                Err(ClientError::Timeout {
                    phase: "request",
                    after_ms: millis(deadline),
                })
            }
            Ok(Err(e)) => {
                self.connection = None;
                Err(e)
            }
            Ok(Ok(reply)) => Ok(parse_response(&reply)?),
        }
    }

    async fn connect(&self) -> Result<Connection, ClientError> {
        let address = &self.settings.address;
        let deadline = self.settings.connect_timeout;
        let stream = tokio::time::timeout(deadline, TcpStream::connect(address.as_str()))
            .await
            .map_err(|_elapsed| ClientError::Timeout {
                phase: "connect",
                after_ms: millis(deadline),
            })?
            .map_err(|source| ClientError::Connect {
                address: address.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        debug!(address = %address, "Connected to decision service");

        let (reader, writer) = stream.into_split();
        Ok(Connection {
            reader: BufReader::new(reader),
            writer,
        })
    }
}

async fn round_trip(connection: &mut Connection, line: &str) -> Result<String, ClientError> {
    connection.writer.write_all(line.as_bytes()).await?;
    connection.writer.flush().await?;

    let mut reply = String::new();
    let read = (&mut connection.reader)
        .take(MAX_REPLY_BYTES)
        .read_line(&mut reply)
        .await?;
    if read == 0 {
        return Err(ClientError::Closed);
    }
    if !reply.ends_with('\n') && u64::try_from(read).is_ok_and(|n| n >= MAX_REPLY_BYTES) {
        return Err(ClientError::ReplyTooLong {
            limit: MAX_REPLY_BYTES,
        });
    }
    Ok(reply)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_types::ContractError;

    #[test]
    fn failures_map_to_reported_kinds() {
        let timeout = ClientError::Timeout {
            phase: "request",
            after_ms: 400,
        };
        assert_eq!(timeout.kind(), FailureKind::Timeout);
        assert_eq!(ClientError::Closed.kind(), FailureKind::Connection);

        let contract = ClientError::from(ResponseError::from(ContractError::HeadCount {
            expected: 12,
            actual: 3,
        }));
        assert_eq!(contract.kind(), FailureKind::ContractViolation);
    }

    #[test]
    fn new_client_is_not_connected() {
        let client = DecisionClient::new(ClientSettings::from_config(&DecisionConfig::default()));
        assert!(!client.is_connected());
        assert_eq!(client.settings().address, "127.0.0.1:5557");
        assert_eq!(client.settings().request_timeout, Duration::from_millis(400));
    }
}
