//! Shared type definitions for the Skirmish decision bridge.
//!
//! This crate is the single source of truth for everything that crosses a
//! boundary: the per-cycle snapshots handed in by the host client, the
//! published observation and action contracts, and the JSON wire types
//! exchanged with the decision service.
//!
//! # Modules
//!
//! - [`ids`] -- Actor, item, and engagement identifiers
//! - [`enums`] -- Combat styles, slots, prayers, timer keys, consumables
//! - [`snapshot`] -- Actor snapshots, equipment views, combat events
//! - [`contract`] -- Observation field table and action head table
//! - [`wire`] -- Observation/mask/action values and request/response lines

pub mod contract;
pub mod enums;
pub mod ids;
pub mod snapshot;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use contract::{
    ActionHead, ContractError, HEAD_COUNT, HEAD_SIZES, OBSERVATION_SIZE, ObservationField,
    PUBLISHED_FINGERPRINT, fingerprint, fingerprint_hex, options,
};
pub use enums::{ActorRole, CombatStyle, Consumable, OverheadPrayer, PotionKind, Slot, TimerKey};
pub use ids::{ActorId, EngagementId, ItemId};
pub use snapshot::{
    ActorSnapshot, AgentSnapshot, CombatEvent, CycleInput, Equipment, HealthObservation, Position,
    Skills, SlotView, Supplies,
};
pub use wire::{
    ActionMask, ActionVector, DecisionRequest, DecisionResponse, ObservationVector, ResponseError,
    parse_response,
};
