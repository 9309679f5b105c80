//! Initial population and disease seeding.
//!
//! Seed agents draw every trait uniformly from the configured ranges and are
//! placed on distinct random empty cells. Diseases get random tag patterns;
//! each infects a few randomly chosen agents before the first tick.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use sugarscape_agents::immune::catch_disease;
use sugarscape_agents::{Contagion, Society};
use sugarscape_types::{AgentEndowment, AgentId, Disease, DiseaseId, Position, Sex};
use tracing::{debug, info};

use crate::config::{AgentsConfig, Bounds, DiseasesConfig};
use crate::runner::RunnerError;

fn draw_f64(rng: &mut impl Rng, range: Bounds<f64>) -> f64 {
    rng.random_range(range.min..=range.max)
}

fn draw_u32(rng: &mut impl Rng, range: Bounds<u32>) -> u32 {
    rng.random_range(range.min..=range.max)
}

fn random_bits(rng: &mut impl Rng, len: usize) -> Vec<bool> {
    (0..len).map(|_| rng.random_bool(0.5)).collect()
}

/// Draw one seed agent's endowment.
pub fn random_endowment(
    config: &AgentsConfig,
    tag_length: usize,
    immune_length: usize,
    rng: &mut impl Rng,
) -> AgentEndowment {
    let sex = if rng.random_bool(config.female_ratio) {
        Sex::Female
    } else {
        Sex::Male
    };
    let (fertility, infertility) = match sex {
        Sex::Female => (config.female_fertility_age, config.female_infertility_age),
        Sex::Male => (config.male_fertility_age, config.male_infertility_age),
    };
    let fertility_age = draw_u32(rng, fertility);
    let infertility_age = draw_u32(rng, infertility).max(fertility_age);
    AgentEndowment {
        sugar_metabolism: draw_f64(rng, config.sugar_metabolism),
        spice_metabolism: draw_f64(rng, config.spice_metabolism),
        movement: draw_u32(rng, config.movement),
        vision: draw_u32(rng, config.vision),
        sugar: draw_f64(rng, config.starting_sugar),
        spice: draw_f64(rng, config.starting_spice),
        max_age: config.max_age.map(|range| draw_u32(rng, range)),
        sex,
        fertility_age,
        infertility_age,
        tags: config
            .tags_enabled
            .then(|| random_bits(rng, tag_length)),
        immune_system: config
            .immune_enabled
            .then(|| random_bits(rng, immune_length)),
        aggression_factor: draw_f64(rng, config.aggression_factor),
        trade_factor: draw_f64(rng, config.trade_factor),
        lookahead_factor: draw_f64(rng, config.lookahead_factor),
        lending_factor: draw_f64(rng, config.lending_factor),
        fertility_factor: draw_f64(rng, config.fertility_factor),
        base_interest_rate: draw_f64(rng, config.base_interest_rate),
        loan_duration: draw_u32(rng, config.loan_duration),
        max_friends: draw_u32(rng, config.max_friends),
        decision_policy: config.decision_policy,
        inheritance_policy: config.inheritance_policy,
    }
}

/// Place `config.initial_agents` seed agents on distinct random empty cells.
///
/// # Errors
///
/// Returns [`RunnerError::Crowded`] if there are fewer empty cells than
/// agents, or an agent error if an endowment is rejected.
pub fn seed_population(
    society: &mut Society,
    config: &AgentsConfig,
    rng: &mut impl Rng,
) -> Result<Vec<AgentId>, RunnerError> {
    let mut empty: Vec<Position> = society
        .grid
        .positions()
        .filter(|p| society.grid.occupant(*p).is_none())
        .collect();
    let wanted = usize::try_from(config.initial_agents).unwrap_or(usize::MAX);
    if empty.len() < wanted {
        return Err(RunnerError::Crowded {
            agents: config.initial_agents,
            cells: empty.len(),
        });
    }
    empty.shuffle(rng);

    let tick = society.tick;
    let (tag_length, immune_length) = (society.params.tag_length, society.params.immune_length);
    let mut seeded = Vec::with_capacity(wanted);
    for position in empty.into_iter().take(wanted) {
        let endowment = random_endowment(config, tag_length, immune_length, rng);
        let id = society.population.spawn(
            &mut society.grid,
            endowment,
            position,
            tick,
            &society.params,
        )?;
        seeded.push(id);
    }
    info!(agents = seeded.len(), "population seeded");
    Ok(seeded)
}

/// Create `config.count` diseases with random tag patterns.
pub fn random_diseases(config: &DiseasesConfig, rng: &mut impl Rng) -> Vec<Disease> {
    (0..config.count)
        .map(|_| {
            let len = usize::try_from(draw_u32(rng, config.tag_length)).unwrap_or(0);
            Disease {
                id: DiseaseId::new(),
                tags: random_bits(rng, len),
                penalties: config.penalties,
            }
        })
        .collect()
}

/// Infect up to `per_disease` random living agents with each disease.
///
/// Agents without an immune system, or already immune, are skipped without
/// a retry. Returns the number of infections that took hold.
pub fn seed_infections(
    society: &mut Society,
    diseases: &[Disease],
    per_disease: u32,
    rng: &mut impl Rng,
) -> Result<u32, RunnerError> {
    let living = society.population.living_ids();
    let count = usize::try_from(per_disease).unwrap_or(usize::MAX);
    let mut infected = 0_u32;
    for disease in diseases {
        for host in living.choose_multiple(rng, count) {
            let agent = society.population.require_mut(*host)?;
            if catch_disease(agent, disease) == Contagion::Infected {
                infected = infected.saturating_add(1);
                debug!(agent = %host, disease = %disease.id, "seed infection");
            }
        }
    }
    Ok(infected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sugarscape_agents::SocietyParams;
    use sugarscape_world::{Grid, ResourceRules};

    use super::*;

    fn society(width: u32, height: u32, params: SocietyParams) -> Society {
        let grid = Grid::new(width, height, ResourceRules::default()).unwrap();
        Society::new(grid, params).unwrap()
    }

    #[test]
    fn endowments_respect_ranges() {
        let config = AgentsConfig {
            tags_enabled: true,
            ..AgentsConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let e = random_endowment(&config, 11, 50, &mut rng);
            assert!((1.0..=4.0).contains(&e.sugar_metabolism));
            assert!((1..=6).contains(&e.vision));
            assert!(e.fertility_age <= e.infertility_age);
            assert_eq!(e.tags.as_ref().map(Vec::len), Some(11));
            assert!(e.immune_system.is_none());
            assert!(e.max_age.is_some_and(|age| (60..=100).contains(&age)));
        }
    }

    #[test]
    fn seeding_fills_distinct_cells() {
        let mut soc = society(4, 4, SocietyParams::default());
        let config = AgentsConfig {
            initial_agents: 16,
            ..AgentsConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let ids = seed_population(&mut soc, &config, &mut rng).unwrap();
        assert_eq!(ids.len(), 16);
        assert!(soc.grid.positions().all(|p| soc.grid.occupant(p).is_some()));
    }

    #[test]
    fn seeding_refuses_too_many_agents() {
        let mut soc = society(2, 2, SocietyParams::default());
        let config = AgentsConfig {
            initial_agents: 5,
            ..AgentsConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            seed_population(&mut soc, &config, &mut rng),
            Err(RunnerError::Crowded { agents: 5, cells: 4 })
        ));
    }

    #[test]
    fn diseases_infect_immune_agents() {
        let params = SocietyParams {
            immune_length: 8,
            ..SocietyParams::default()
        };
        let mut soc = society(5, 5, params);
        let agents = AgentsConfig {
            initial_agents: 10,
            immune_enabled: true,
            ..AgentsConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        seed_population(&mut soc, &agents, &mut rng).unwrap();

        let config = DiseasesConfig {
            count: 2,
            tag_length: Bounds::new(4, 4),
            ..DiseasesConfig::default()
        };
        let diseases = random_diseases(&config, &mut rng);
        assert_eq!(diseases.len(), 2);
        assert!(diseases.iter().all(|d| d.tags.len() == 4));

        let infected = seed_infections(&mut soc, &diseases, 3, &mut rng).unwrap();
        assert!(infected <= 6);
        let carriers: usize = soc.population.living().map(|a| a.infections.len()).sum();
        assert_eq!(carriers, usize::try_from(infected).unwrap());
    }
}
