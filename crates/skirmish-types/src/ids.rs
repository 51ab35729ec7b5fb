//! Type-safe identifier wrappers.
//!
//! Actor and item identifiers are owned by the host client and arrive as
//! plain integers; they are wrapped so they cannot be mixed up at compile
//! time. Engagement identifiers are generated here using UUID v7
//! (time-ordered) so log lines sort by engagement start.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a host-assigned integer index.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Return the raw host-assigned value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

define_index! {
    /// Host-assigned handle of a combat participant (player index).
    ActorId
}

define_index! {
    /// Host-assigned item definition identifier.
    ItemId
}

/// Unique identifier for one continuous engagement against a bound opponent.
///
/// A new engagement starts each time an opponent is engaged while no one
/// was targeted. Switching targets mid-fight keeps the engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngagementId(pub Uuid);

impl EngagementId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EngagementId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EngagementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
