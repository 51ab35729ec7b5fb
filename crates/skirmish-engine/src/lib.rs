//! Asynchronous edge of the Skirmish decision bridge.
//!
//! - [`client`]: line-delimited JSON client for the decision service
//! - [`worker`]: the task that owns the client and the channels to it
//! - [`agent`]: the per-cycle callback tying world, pipeline and worker together
//! - [`replay`]: recorded world and logging dispatcher
//! - [`driver`]: interval-driven cycle loop
//! - [`stats`]: per-run decision counters
//! - [`error`]: top-level error type

pub mod agent;
pub mod client;
pub mod driver;
pub mod error;
pub mod replay;
pub mod stats;
pub mod worker;
