//! Society-wide parameters for the agent protocols.
//!
//! These values correspond to the `environment` section of the simulation
//! configuration. The [`SocietyParams`] struct bundles every global constant
//! the per-agent protocols consult so callers (runner, tests) can override
//! defaults.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Global constants consulted by the agent protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocietyParams {
    /// Upper bound on sugar and spice looted from a combat victim (default: 2).
    pub max_combat_loot: f64,

    /// Number of tribes tag vectors are bucketed into (default: 3).
    pub max_tribes: u32,

    /// Required length of every cultural tag vector (default: 11).
    pub tag_length: usize,

    /// Required length of every immune system vector (default: 50).
    pub immune_length: usize,

    /// Weight of the newest observation in the mean income average (default: 0.05).
    pub income_alpha: f64,
}

impl Default for SocietyParams {
    fn default() -> Self {
        Self {
            max_combat_loot: 2.0,
            max_tribes: 3,
            tag_length: 11,
            immune_length: 50,
            income_alpha: 0.05,
        }
    }
}

impl SocietyParams {
    /// Check the parameters for internal consistency.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.max_tribes == 0 {
            return Err(invalid("max_tribes must be at least 1"));
        }
        if !(self.max_combat_loot.is_finite() && self.max_combat_loot >= 0.0) {
            return Err(invalid("max_combat_loot must be finite and non-negative"));
        }
        if !(self.income_alpha.is_finite() && (0.0..=1.0).contains(&self.income_alpha)) {
            return Err(invalid("income_alpha must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> AgentError {
    AgentError::InvalidConfig {
        reason: reason.to_owned(),
    }
}
