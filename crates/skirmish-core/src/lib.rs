//! Cycle pipeline, combat state, and encoders for the Skirmish decision bridge.
//!
//! This crate owns everything that runs synchronously on the simulation
//! side of a cycle: rebinding the opponent, advancing timers, folding
//! combat events into history, extracting gear features, and producing the
//! observation and action mask sent to the decision service.
//!
//! # Modules
//!
//! - [`catalog`] -- Item definitions, bonuses, and name normalization.
//! - [`clock`] -- Cycle counter and the per-cycle callback seam.
//! - [`config`] -- Configuration loading from `skirmish-config.yaml` into
//!   strongly-typed structs.
//! - [`encoder`] -- Observation vector encoding.
//! - [`frames`] -- Multi-frame observation stacking.
//! - [`history`] -- Cumulative and windowed combat statistics.
//! - [`loadout`] -- Gear feature extraction with confidence blending.
//! - [`mask`] -- Action mask construction.
//! - [`opponent`] -- [`OpponentProxy`] and its neutral and tracked sources.
//! - [`pipeline`] -- [`CyclePipeline`], the per-cycle orchestration.
//! - [`safety`] -- Request gating and action revalidation.
//! - [`timers`] -- Per-actor countdown timers.
//! - [`view`] -- The borrowed view shared by the encoder and the mask builder.
//! - [`world`] -- [`WorldState`] and [`ActionDispatcher`] collaborator traits.
//!
//! [`OpponentProxy`]: opponent::OpponentProxy
//! [`CyclePipeline`]: pipeline::CyclePipeline
//! [`WorldState`]: world::WorldState
//! [`ActionDispatcher`]: world::ActionDispatcher

pub mod catalog;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod frames;
pub mod history;
pub mod loadout;
pub mod mask;
pub mod opponent;
pub mod pipeline;
pub mod safety;
pub mod timers;
pub mod view;
pub mod world;
