//! Error types for the decision bridge binary.
//!
//! [`EngineError`] wraps every failure mode of engine startup and the
//! cycle loop so `main` can propagate them with `?`.

/// Top-level error for the decision bridge.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skirmish_core::config::ConfigError,
    },

    /// Item catalog loading failed.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: skirmish_core::catalog::CatalogError,
    },

    /// Cycle clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: skirmish_core::clock::ClockError,
    },

    /// A cycle could not be completed.
    #[error("cycle error: {source}")]
    Cycle {
        /// The underlying cycle error.
        #[from]
        source: skirmish_core::pipeline::CycleError,
    },

    /// The replay world could not be opened or read.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: skirmish_core::world::WorldError,
    },

    /// The decision worker stopped unexpectedly.
    #[error("decision worker error: {message}")]
    Worker {
        /// Description of the worker failure.
        message: String,
    },
}
