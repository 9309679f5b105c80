//! Engine binary for the Sugarscape simulation.
//!
//! Loads a run configuration, seeds the landscape and population, and
//! drives the tick loop until the tick limit or extinction.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the path given as the first argument, or
//!    `sugarscape.yaml` in the working directory
//! 3. Build the landscape and seed agents and diseases
//! 4. Run the simulation loop, logging a summary per tick
//! 5. Log the result

mod error;

use std::path::PathBuf;

use sugarscape_core::runner::log_simulation_end;
use sugarscape_core::{Simulation, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

const DEFAULT_CONFIG: &str = "sugarscape.yaml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sugarscape-engine starting");

    let config = load_config()?;
    info!(
        seed = config.world.seed,
        ticks = config.world.ticks,
        width = config.world.width,
        height = config.world.height,
        initial_agents = config.agents.initial_agents,
        "Configuration loaded"
    );

    run(&config)?;
    Ok(())
}

fn run(config: &SimulationConfig) -> Result<(), EngineError> {
    let mut simulation = Simulation::new(config)?;
    let result = simulation.run(|summary| {
        info!(
            tick = summary.tick,
            population = summary.population,
            births = summary.births,
            starvation_deaths = summary.starvation_deaths,
            old_age_deaths = summary.old_age_deaths,
            combat_deaths = summary.combat_deaths,
            trades = summary.trades,
            loans = summary.loans,
            infections = summary.infections,
            gini = summary.gini,
            "tick"
        );
    })?;
    log_simulation_end(&result);
    Ok(())
}

/// Load the run configuration.
///
/// A missing file is not an error: the defaults describe a complete run.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    if path.exists() {
        info!(path = %path.display(), "Loading configuration");
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}
