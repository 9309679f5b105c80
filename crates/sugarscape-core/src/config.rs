//! Configuration loading and typed config structures for the Sugarscape simulation.
//!
//! A run is described by a single YAML document with four sections:
//! `world` (seed, dimensions, run length, landscape), `environment`
//! (society-wide constants and resource rules), `agents` (initial population
//! and the ranges every seed agent's traits are drawn from), and `diseases`.
//! Every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::Deserialize;
use sugarscape_agents::SocietyParams;
use sugarscape_types::{DecisionPolicy, InheritancePolicy, TraitPenalties};
use sugarscape_world::{LandscapeConfig, ResourceRules};

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

    /// The document parsed but describes an impossible simulation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which setting is wrong and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Inclusive range a random trait value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Bounds<T> {
    /// Smallest value drawn.
    pub min: T,
    /// Largest value drawn.
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    /// A range of exactly one value.
    pub const fn fixed(value: T) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Create a range from its ends.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed, grid dimensions, run length, and landscape.
    #[serde(default)]
    pub world: WorldConfig,

    /// Society-wide constants and resource rules.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Initial population and trait ranges.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Diseases seeded at the start of the run.
    #[serde(default)]
    pub diseases: DiseasesConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::Invalid`] if a range or constant is inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML and
    /// [`ConfigError::Invalid`] if a range or constant is inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every range is ordered and every count is consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.agents;
        let float_ranges = [
            ("agents.sugar_metabolism", a.sugar_metabolism),
            ("agents.spice_metabolism", a.spice_metabolism),
            ("agents.starting_sugar", a.starting_sugar),
            ("agents.starting_spice", a.starting_spice),
            ("agents.aggression_factor", a.aggression_factor),
            ("agents.trade_factor", a.trade_factor),
            ("agents.lookahead_factor", a.lookahead_factor),
            ("agents.lending_factor", a.lending_factor),
            ("agents.fertility_factor", a.fertility_factor),
            ("agents.base_interest_rate", a.base_interest_rate),
        ];
        for (name, range) in float_ranges {
            if !(range.min.is_finite() && range.max.is_finite() && range.is_ordered()) {
                return Err(invalid(format!("{name} must be a finite, ordered range")));
            }
        }
        let int_ranges = [
            ("agents.vision", a.vision),
            ("agents.movement", a.movement),
            ("agents.female_fertility_age", a.female_fertility_age),
            ("agents.male_fertility_age", a.male_fertility_age),
            ("agents.female_infertility_age", a.female_infertility_age),
            ("agents.male_infertility_age", a.male_infertility_age),
            ("agents.loan_duration", a.loan_duration),
            ("agents.max_friends", a.max_friends),
            ("diseases.tag_length", self.diseases.tag_length),
        ];
        for (name, range) in int_ranges {
            if !range.is_ordered() {
                return Err(invalid(format!("{name} must have min <= max")));
            }
        }
        if let Some(max_age) = a.max_age
            && !max_age.is_ordered()
        {
            return Err(invalid("agents.max_age must have min <= max".to_owned()));
        }
        if a.female_infertility_age.min < a.female_fertility_age.max
            || a.male_infertility_age.min < a.male_fertility_age.max
        {
            return Err(invalid(
                "infertility ages must not precede fertility ages".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&a.female_ratio) {
            return Err(invalid("agents.female_ratio must lie in [0, 1]".to_owned()));
        }
        let cells = u64::from(self.world.width).saturating_mul(u64::from(self.world.height));
        if u64::from(a.initial_agents) > cells {
            return Err(invalid(format!(
                "{} initial agents do not fit on {cells} cells",
                a.initial_agents
            )));
        }
        let d = &self.diseases;
        if d.count > 0 {
            let immune = u32::try_from(self.environment.immune_length).unwrap_or(u32::MAX);
            if d.tag_length.min == 0 || d.tag_length.max > immune {
                return Err(invalid(format!(
                    "disease tags must be 1 to {immune} bits long"
                )));
            }
        }
        self.society_params()
            .validate()
            .map_err(|e| invalid(e.to_string()))
    }

    /// Parameters for the landscape generator.
    pub fn landscape(&self) -> LandscapeConfig {
        LandscapeConfig {
            width: self.world.width,
            height: self.world.height,
            max_sugar: self.world.max_sugar,
            max_spice: self.world.max_spice,
            peak_radius: self.world.peak_radius,
            rules: self.environment.resources,
        }
    }

    /// Society-wide constants for the agent protocols.
    pub fn society_params(&self) -> SocietyParams {
        let e = &self.environment;
        SocietyParams {
            max_combat_loot: e.max_combat_loot,
            max_tribes: e.max_tribes,
            tag_length: e.tag_length,
            immune_length: e.immune_length,
            income_alpha: e.income_alpha,
        }
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Grid width in cells.
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Grid height in cells.
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Sugar capacity at a sugar peak.
    #[serde(default = "default_peak_capacity")]
    pub max_sugar: f64,

    /// Spice capacity at a spice peak.
    #[serde(default = "default_peak_capacity")]
    pub max_spice: f64,

    /// Distance from a peak at which capacity reaches zero.
    #[serde(default = "default_peak_radius")]
    pub peak_radius: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks: default_ticks(),
            width: default_dimension(),
            height: default_dimension(),
            max_sugar: default_peak_capacity(),
            max_spice: default_peak_capacity(),
            peak_radius: default_peak_radius(),
        }
    }
}

/// Society-wide constants and resource rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvironmentConfig {
    /// Upper bound on each resource looted in combat.
    #[serde(default = "default_max_combat_loot")]
    pub max_combat_loot: f64,

    /// Number of tribes tag vectors are bucketed into.
    #[serde(default = "default_max_tribes")]
    pub max_tribes: u32,

    /// Length of every cultural tag vector.
    #[serde(default = "default_tag_length")]
    pub tag_length: usize,

    /// Length of every immune vector.
    #[serde(default = "default_immune_length")]
    pub immune_length: usize,

    /// Weight of the newest harvest in the mean income average.
    #[serde(default = "default_income_alpha")]
    pub income_alpha: f64,

    /// Regrowth and pollution rates.
    #[serde(default)]
    pub resources: ResourceRules,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_combat_loot: default_max_combat_loot(),
            max_tribes: default_max_tribes(),
            tag_length: default_tag_length(),
            immune_length: default_immune_length(),
            income_alpha: default_income_alpha(),
            resources: ResourceRules::default(),
        }
    }
}

/// Initial population and the ranges seed agents' traits are drawn from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Number of agents placed at the start.
    pub initial_agents: u32,
    /// Probability that a seed agent is female.
    pub female_ratio: f64,
    /// Sugar burned per tick.
    pub sugar_metabolism: Bounds<f64>,
    /// Spice burned per tick.
    pub spice_metabolism: Bounds<f64>,
    /// Cells seen along each cardinal ray.
    pub vision: Bounds<u32>,
    /// Cells travelled along a cardinal ray per move.
    pub movement: Bounds<u32>,
    /// Starting sugar stock.
    pub starting_sugar: Bounds<f64>,
    /// Starting spice stock.
    pub starting_spice: Bounds<f64>,
    /// Maximum age; absent means agents never die of old age.
    pub max_age: Option<Bounds<u32>>,
    /// Fertility age for females.
    pub female_fertility_age: Bounds<u32>,
    /// Fertility age for males.
    pub male_fertility_age: Bounds<u32>,
    /// Infertility age for females.
    pub female_infertility_age: Bounds<u32>,
    /// Infertility age for males.
    pub male_infertility_age: Bounds<u32>,
    /// Scales looted resources when valuing an attack.
    pub aggression_factor: Bounds<f64>,
    /// Scales the marginal rate of substitution.
    pub trade_factor: Bounds<f64>,
    /// Ticks of metabolism discounted when valuing holdings.
    pub lookahead_factor: Bounds<f64>,
    /// Scales the interest charged on loans.
    pub lending_factor: Bounds<f64>,
    /// Divides the cost of reproduction.
    pub fertility_factor: Bounds<f64>,
    /// Interest before the lending factor is applied.
    pub base_interest_rate: Bounds<f64>,
    /// Ticks until a loan falls due.
    pub loan_duration: Bounds<u32>,
    /// Size of the friend list.
    pub max_friends: Bounds<u32>,
    /// Give seed agents cultural tags.
    pub tags_enabled: bool,
    /// Give seed agents immune vectors.
    pub immune_enabled: bool,
    /// Estate distribution on death.
    pub inheritance_policy: InheritancePolicy,
    /// Movement decision model.
    pub decision_policy: DecisionPolicy,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            initial_agents: 250,
            female_ratio: 0.5,
            sugar_metabolism: Bounds::new(1.0, 4.0),
            spice_metabolism: Bounds::new(1.0, 4.0),
            vision: Bounds::new(1, 6),
            movement: Bounds::new(1, 6),
            starting_sugar: Bounds::new(10.0, 40.0),
            starting_spice: Bounds::new(10.0, 40.0),
            max_age: Some(Bounds::new(60, 100)),
            female_fertility_age: Bounds::new(12, 15),
            male_fertility_age: Bounds::new(12, 15),
            female_infertility_age: Bounds::new(40, 50),
            male_infertility_age: Bounds::new(50, 60),
            aggression_factor: Bounds::fixed(0.0),
            trade_factor: Bounds::fixed(1.0),
            lookahead_factor: Bounds::fixed(0.0),
            lending_factor: Bounds::fixed(0.0),
            fertility_factor: Bounds::fixed(1.0),
            base_interest_rate: Bounds::fixed(0.0),
            loan_duration: Bounds::fixed(0),
            max_friends: Bounds::fixed(5),
            tags_enabled: false,
            immune_enabled: false,
            inheritance_policy: InheritancePolicy::None,
            decision_policy: DecisionPolicy::Selfish,
        }
    }
}

/// Diseases seeded at the start of the run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiseasesConfig {
    /// Number of distinct diseases.
    pub count: u32,
    /// Length of each disease's tag pattern.
    pub tag_length: Bounds<u32>,
    /// Penalties every disease inflicts.
    pub penalties: TraitPenalties,
    /// Agents each disease infects at the start.
    pub initial_infections: u32,
}

impl Default for DiseasesConfig {
    fn default() -> Self {
        Self {
            count: 0,
            tag_length: Bounds::new(10, 20),
            penalties: TraitPenalties {
                sugar_metabolism: 1.0,
                spice_metabolism: 1.0,
                ..TraitPenalties::default()
            },
            initial_infections: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_ticks() -> u64 {
    200
}

const fn default_dimension() -> u32 {
    50
}

const fn default_peak_capacity() -> f64 {
    4.0
}

const fn default_peak_radius() -> f64 {
    20.0
}

const fn default_max_combat_loot() -> f64 {
    2.0
}

const fn default_max_tribes() -> u32 {
    3
}

const fn default_tag_length() -> usize {
    11
}

const fn default_immune_length() -> usize {
    50
}

const fn default_income_alpha() -> f64 {
    0.05
}
