//! Configuration loading and typed config structures for the Skirmish bridge.
//!
//! The canonical configuration lives in `skirmish-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default, so a missing or empty file yields a working
//! configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level bridge configuration.
///
/// Mirrors the structure of `skirmish-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkirmishConfig {
    /// Cycle cadence and run length.
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Decision service connection and request policy.
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Combat history windows.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Item catalog and opponent gear assumptions.
    #[serde(default)]
    pub loadout: LoadoutConfig,

    /// Recorded input source.
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SkirmishConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the decision service:
    /// - `DECISION_HOST` overrides `decision.host`
    /// - `DECISION_PORT` overrides `decision.port`
    /// - `DECISION_MODEL` overrides `decision.model`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.decision.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.cycle.period_ms == 0 {
            return invalid("cycle.period_ms must be at least 1");
        }
        if self.decision.request_timeout_ms == 0 {
            return invalid("decision.request_timeout_ms must be at least 1");
        }
        if self.decision.connect_timeout_ms == 0 {
            return invalid("decision.connect_timeout_ms must be at least 1");
        }
        if self.decision.frame_stack == 0 {
            return invalid("decision.frame_stack must be at least 1");
        }
        if self.decision.queue_capacity == 0 {
            return invalid("decision.queue_capacity must be at least 1");
        }
        if self.history.window_capacity == 0 {
            return invalid("history.window_capacity must be at least 1");
        }
        if let Some(expected) = &self.decision.expected_fingerprint {
            let expected = expected.trim().trim_start_matches("0x").to_ascii_lowercase();
            let actual = skirmish_types::fingerprint_hex();
            if expected != actual {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "decision.expected_fingerprint is {expected}, compiled contract is {actual}"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Cycle cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CycleConfig {
    /// Nominal milliseconds per cycle.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Stop after this many cycles. Unbounded when absent.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            max_cycles: None,
        }
    }
}

/// Decision service configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecisionConfig {
    /// Service host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Service TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Milliseconds allowed to establish a connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Milliseconds allowed for one request/response round trip.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum milliseconds between two requests.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Number of observations sent per request.
    #[serde(default = "default_frame_stack")]
    pub frame_stack: usize,

    /// Jobs the worker queue can hold.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Ask the service for its greedy action.
    #[serde(default)]
    pub deterministic: bool,

    /// Ask the service to also return the action log-probability.
    #[serde(default)]
    pub return_log_prob: bool,

    /// Ask the service to also return the policy entropy.
    #[serde(default)]
    pub return_entropy: bool,

    /// Ask the service to also return its value estimate.
    #[serde(default)]
    pub return_value: bool,

    /// Ask the service to also return per-head distributions.
    #[serde(default)]
    pub return_probs: bool,

    /// Contract fingerprint the service was trained against, as hex.
    /// Startup fails when it differs from the compiled layout.
    #[serde(default)]
    pub expected_fingerprint: Option<String>,
}

impl DecisionConfig {
    /// Override connection settings with environment variables when set.
    ///
    /// Unparseable `DECISION_PORT` values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DECISION_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("DECISION_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid DECISION_PORT"),
            }
        }
        if let Ok(val) = std::env::var("DECISION_MODEL") {
            self.model = val;
        }
    }

    /// `host:port` address of the service.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            frame_stack: default_frame_stack(),
            queue_capacity: default_queue_capacity(),
            deterministic: false,
            return_log_prob: false,
            return_entropy: false,
            return_value: false,
            return_probs: false,
            expected_fingerprint: None,
        }
    }
}

/// Combat history configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Events kept per recent window.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
        }
    }
}

/// Loadout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadoutConfig {
    /// Replacement item catalog. The embedded catalog is used when absent.
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Items assumed for opponent slots that cannot be observed.
    #[serde(default = "default_baseline_items")]
    pub baseline_items: Vec<String>,
}

impl Default for LoadoutConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            baseline_items: default_baseline_items(),
        }
    }
}

/// Replay source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayConfig {
    /// JSON-lines file of recorded cycle inputs.
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_period_ms() -> u64 {
    600
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    5557
}

fn default_model() -> String {
    "nh-default".to_owned()
}

const fn default_connect_timeout_ms() -> u64 {
    250
}

const fn default_request_timeout_ms() -> u64 {
    400
}

const fn default_min_request_interval_ms() -> u64 {
    600
}

const fn default_frame_stack() -> usize {
    1
}

const fn default_queue_capacity() -> usize {
    4
}

const fn default_window_capacity() -> usize {
    crate::history::DEFAULT_WINDOW_CAPACITY
}

fn default_baseline_items() -> Vec<String> {
    [
        "Helm of neitiznot",
        "Imbued zamorak cape",
        "Amulet of fury",
        "Ancient staff",
        "Mystic robe top",
        "Mystic robe bottom",
        "Mage's book",
        "Barrows gloves",
        "Climbing boots",
        "Ring of recoil",
    ]
    .map(str::to_owned)
    .to_vec()
}

fn default_log_level() -> String {
    "info".to_owned()
}
