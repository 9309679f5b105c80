//! The tick scheduler.
//!
//! A [`Simulation`] owns the society, the seeded random generator, and the
//! run length. Each tick regrows the grid, shuffles the living population,
//! and runs every agent's full turn before the next agent starts. Agents
//! born during the tick wait until the next one.
//!
//! The run ends after the configured number of ticks or as soon as the
//! population is extinct.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use sugarscape_agents::{AgentError, Society, run_agent_tick};
use sugarscape_types::Disease;
use sugarscape_world::{WorldError, create_starting_grid};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::seeding::{random_diseases, seed_infections, seed_population};

/// Errors that can occur while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// An agent protocol failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// More seed agents were requested than there are empty cells.
    #[error("{agents} agents do not fit on {cells} empty cells")]
    Crowded {
        /// Agents requested.
        agents: u32,
        /// Empty cells available.
        cells: usize,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick that was executed.
    pub tick: u64,
    /// Living agents at the end of the tick.
    pub population: u32,
    /// Children born.
    pub births: u32,
    /// Deaths from starvation.
    pub starvation_deaths: u32,
    /// Deaths from old age.
    pub old_age_deaths: u32,
    /// Deaths in combat.
    pub combat_deaths: u32,
    /// Sugar held by living agents.
    pub total_sugar: f64,
    /// Spice held by living agents.
    pub total_spice: f64,
    /// Executed trade iterations.
    pub trades: u32,
    /// Loans originated.
    pub loans: u32,
    /// Active infections across the living population.
    pub infections: u32,
    /// Gini coefficient of living agents' wealth.
    pub gini: f64,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// The configured number of ticks completed.
    MaxTicksReached,
    /// Every agent died.
    Extinction,
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: EndReason,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Number of ticks executed.
    pub total_ticks: u64,
}

/// Gini coefficient of a wealth distribution.
///
/// Zero for empty, single-valued, or all-zero distributions. Negative
/// holdings count as zero.
pub fn gini(wealth: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = wealth.iter().map(|w| w.max(0.0)).collect();
    sorted.sort_by(f64::total_cmp);
    let total: f64 = sorted.iter().sum();
    let Ok(n) = u32::try_from(sorted.len()) else {
        return 0.0;
    };
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    let n = f64::from(n);
    let mut rank = 0.0;
    let mut weighted = 0.0;
    for w in &sorted {
        rank += 1.0;
        weighted += rank * w;
    }
    ((2.0 * weighted) / (n * total) - (n + 1.0) / n).max(0.0)
}

/// A configured, seeded simulation.
#[derive(Debug)]
pub struct Simulation {
    /// Grid, population, and global constants.
    pub society: Society,
    /// Diseases seeded at the start.
    pub diseases: Vec<Disease>,
    rng: StdRng,
    max_ticks: u64,
}

impl Simulation {
    /// Build the landscape, seed the population and diseases.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the configuration is invalid or the
    /// population does not fit on the grid.
    pub fn new(config: &SimulationConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let grid = create_starting_grid(&config.landscape())?;
        let mut society = Society::new(grid, config.society_params())?;
        seed_population(&mut society, &config.agents, &mut rng)?;
        let diseases = random_diseases(&config.diseases, &mut rng);
        let infected = seed_infections(
            &mut society,
            &diseases,
            config.diseases.initial_infections,
            &mut rng,
        )?;
        info!(
            seed = config.world.seed,
            width = config.world.width,
            height = config.world.height,
            agents = society.population.living_count(),
            diseases = diseases.len(),
            infected,
            "simulation initialized"
        );
        Ok(Self {
            society,
            diseases,
            rng,
            max_ticks: config.world.ticks,
        })
    }

    /// The last tick executed, zero before the first.
    pub const fn tick(&self) -> u64 {
        self.society.tick
    }

    /// Execute one tick and summarize it.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Agent`] if an agent protocol fails.
    pub fn step(&mut self) -> Result<TickSummary, RunnerError> {
        let tick = self.society.tick.saturating_add(1);
        self.society.begin_tick(tick);
        self.society.grid.regrow();

        let mut order = self.society.population.living_ids();
        order.shuffle(&mut self.rng);
        debug!(tick, agents = order.len(), "tick started");
        for id in order {
            run_agent_tick(&mut self.society, id, &mut self.rng)?;
        }

        let summary = self.summarize();
        debug!(
            tick,
            population = summary.population,
            births = summary.births,
            deaths = summary.starvation_deaths
                .saturating_add(summary.old_age_deaths)
                .saturating_add(summary.combat_deaths),
            gini = summary.gini,
            "tick complete"
        );
        Ok(summary)
    }

    fn summarize(&self) -> TickSummary {
        let events = self.society.events;
        let living: Vec<_> = self.society.population.living().collect();
        let wealth: Vec<f64> = living.iter().map(|a| a.wealth()).collect();
        let infections: usize = living.iter().map(|a| a.infections.len()).sum();
        TickSummary {
            tick: self.society.tick,
            population: u32::try_from(living.len()).unwrap_or(u32::MAX),
            births: events.births,
            starvation_deaths: events.starvation_deaths,
            old_age_deaths: events.old_age_deaths,
            combat_deaths: events.combat_deaths,
            total_sugar: living.iter().map(|a| a.sugar).sum(),
            total_spice: living.iter().map(|a| a.spice).sum(),
            trades: events.trades,
            loans: events.loans,
            infections: u32::try_from(infections).unwrap_or(u32::MAX),
            gini: gini(&wealth),
        }
    }

    /// Run until the tick limit or extinction, calling `on_tick` after each tick.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if a tick fails.
    pub fn run(
        &mut self,
        mut on_tick: impl FnMut(&TickSummary),
    ) -> Result<SimulationResult, RunnerError> {
        info!(max_ticks = self.max_ticks, "simulation starting");
        let mut last_summary: Option<TickSummary> = None;
        let mut total_ticks: u64 = 0;

        while total_ticks < self.max_ticks {
            let summary = self.step()?;
            total_ticks = total_ticks.saturating_add(1);
            on_tick(&summary);
            let extinct = summary.population == 0;
            last_summary = Some(summary);
            if extinct {
                info!(tick = self.tick(), "all agents dead -- extinction");
                return Ok(SimulationResult {
                    end_reason: EndReason::Extinction,
                    final_summary: last_summary,
                    total_ticks,
                });
            }
        }

        info!(tick = self.tick(), "tick limit reached");
        Ok(SimulationResult {
            end_reason: EndReason::MaxTicksReached,
            final_summary: last_summary,
            total_ticks,
        })
    }
}

/// Log the outcome of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_population = result.final_summary.as_ref().map(|s| s.population),
        "simulation ended"
    );
    if let Some(summary) = &result.final_summary {
        info!(
            tick = summary.tick,
            population = summary.population,
            total_sugar = summary.total_sugar,
            total_spice = summary.total_spice,
            gini = summary.gini,
            "final tick summary"
        );
    } else {
        warn!("simulation ended with no ticks executed");
    }
}
