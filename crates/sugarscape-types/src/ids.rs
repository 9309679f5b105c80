//! Typed identifier wrappers.
//!
//! Agents are numbered sequentially by the population registry in order of
//! creation, so an [`AgentId`] doubles as a stable index. Loans and diseases
//! are minted independently and carry UUID v7 identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a loan between two agents.
    LoanId
}

define_id! {
    /// Unique identifier for a disease instance.
    DiseaseId
}

/// Unique identifier for an agent, assigned sequentially at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    /// Return the raw sequence number.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Return the identifier as a registry slot index.
    ///
    /// Returns `None` on targets where the sequence number does not fit in
    /// a `usize`.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Build an identifier from a registry slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        u64::try_from(index).ok().map(Self)
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
