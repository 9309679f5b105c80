//! Enumeration types for the agent society.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Biology
// ---------------------------------------------------------------------------

/// Biological sex of an agent. Reproduction requires opposite sexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Female agent.
    Female,
    /// Male agent.
    Male,
}

impl Sex {
    /// Return the opposite sex.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Female => Self::Male,
            Self::Male => Self::Female,
        }
    }
}

/// Who receives an agent's remaining sugar and spice when it dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritancePolicy {
    /// The estate is discarded.
    #[default]
    None,
    /// Split among all living children.
    Children,
    /// Split among living male children.
    Sons,
    /// Split among living female children.
    Daughters,
    /// Split among living friends.
    Friends,
}

// ---------------------------------------------------------------------------
// Decision models
// ---------------------------------------------------------------------------

/// How the ethics-weighted decision model aggregates per-agent utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthicalFramework {
    /// Mover counts positively, every other visible agent as an opportunity cost.
    #[default]
    Bentham,
    /// Only the mover's own utility counts.
    Egoistic,
    /// Only the other visible agents' utilities count.
    Altruistic,
}

/// The movement decision policy an agent is born with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// Maximize own welfare.
    #[default]
    Selfish,
    /// Re-rank welfare-valid cells by an act-utilitarian aggregate.
    EthicsWeighted {
        /// Weight applied to this agent's utility terms; zero disables the model.
        weight: f64,
        /// Which agents' terms are aggregated.
        #[serde(default)]
        framework: EthicalFramework,
        /// Take the highest aggregate even when it is not positive.
        #[serde(default)]
        top_ranked: bool,
    },
}

impl DecisionPolicy {
    /// Weight this agent contributes to any ethics aggregate it appears in.
    pub const fn ethics_weight(&self) -> f64 {
        match self {
            Self::Selfish => 0.0,
            Self::EthicsWeighted { weight, .. } => *weight,
        }
    }

    /// Whether the ethics-weighted ranking is active for this agent.
    pub fn is_ethical(&self) -> bool {
        self.ethics_weight() > 0.0
    }
}

// ---------------------------------------------------------------------------
// Grid directions
// ---------------------------------------------------------------------------

/// One of the four cardinal (von Neumann) directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward decreasing `y`.
    North,
    /// Toward increasing `x`.
    East,
    /// Toward increasing `y`.
    South,
    /// Toward decreasing `x`.
    West,
}

impl Direction {
    /// All four cardinal directions in clockwise order from north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];
}

/// One of the eight (Moore) compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    /// North.
    North,
    /// North-east.
    NorthEast,
    /// East.
    East,
    /// South-east.
    SouthEast,
    /// South.
    South,
    /// South-west.
    SouthWest,
    /// West.
    West,
    /// North-west.
    NorthWest,
}

impl Compass {
    /// All eight compass directions in clockwise order from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// The cardinal steps whose composition reaches this heading.
    ///
    /// Diagonals are reached by a vertical step followed by a horizontal one.
    pub const fn steps(self) -> (Direction, Option<Direction>) {
        match self {
            Self::North => (Direction::North, None),
            Self::NorthEast => (Direction::North, Some(Direction::East)),
            Self::East => (Direction::East, None),
            Self::SouthEast => (Direction::South, Some(Direction::East)),
            Self::South => (Direction::South, None),
            Self::SouthWest => (Direction::South, Some(Direction::West)),
            Self::West => (Direction::West, None),
            Self::NorthWest => (Direction::North, Some(Direction::West)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selfish_policy_has_zero_weight() {
        assert!(!DecisionPolicy::Selfish.is_ethical());
        let disabled = DecisionPolicy::EthicsWeighted {
            weight: 0.0,
            framework: EthicalFramework::Bentham,
            top_ranked: false,
        };
        assert!(!disabled.is_ethical());
    }

    #[test]
    fn decision_policy_deserializes_tagged() {
        let json = r#"{"model":"ethics_weighted","weight":0.5}"#;
        let policy: Result<DecisionPolicy, _> = serde_json::from_str(json);
        assert!(matches!(
            policy,
            Ok(DecisionPolicy::EthicsWeighted {
                framework: EthicalFramework::Bentham,
                top_ranked: false,
                ..
            })
        ));
    }

    #[test]
    fn diagonal_steps_compose_cardinals() {
        assert_eq!(
            Compass::SouthWest.steps(),
            (Direction::South, Some(Direction::West))
        );
        assert_eq!(Compass::East.steps(), (Direction::East, None));
    }

    #[test]
    fn opposite_sex() {
        assert_eq!(Sex::Female.opposite(), Sex::Male);
    }
}
