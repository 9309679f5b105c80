//! Disease contraction, immune learning, and contagion.
//!
//! Diseases are binary patterns. A host's susceptibility is the closest
//! approximate match between the pattern and any same-length window of its
//! immune vector. While infected, the immune system corrects one mismatched
//! bit of the matched window per tick; once the window equals the pattern
//! the infection clears and the traits are rebuilt from the endowment.

use rand::Rng;
use rand::seq::SliceRandom;
use sugarscape_types::{AgentId, Disease, DiseaseId, TraitPenalties};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::society::Society;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An active infection carried by a host.
#[derive(Debug, Clone, PartialEq)]
pub struct Infection {
    /// The disease.
    pub disease: Disease,
    /// First index of the matched immune window.
    pub start: usize,
    /// Last index of the matched immune window, inclusive.
    pub end: usize,
    /// Trait deltas actually applied to the host, after clamping.
    pub applied: TraitPenalties,
}

/// The best-matching window of an immune vector for a disease pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmuneMatch {
    /// Hamming distance between the window and the pattern.
    pub distance: usize,
    /// First index of the window.
    pub start: usize,
    /// Last index of the window, inclusive.
    pub end: usize,
}

/// Result of exposing a host to a disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contagion {
    /// The host contracted the disease.
    Infected,
    /// The host has no immune system and cannot carry disease.
    NotSusceptible,
    /// The host already carries this disease instance.
    AlreadyInfected,
    /// Some window of the immune vector matches the pattern exactly.
    Immune,
    /// The pattern is empty or longer than the immune vector.
    Incompatible,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Find the first window of `immune` with minimal Hamming distance to `pattern`.
///
/// Every window `0..=immune.len() - pattern.len()` is scanned. Returns `None`
/// for an empty pattern or one longer than the immune vector.
pub fn best_match(immune: &[bool], pattern: &[bool]) -> Option<ImmuneMatch> {
    if pattern.is_empty() {
        return None;
    }
    let span = pattern.len().saturating_sub(1);
    immune
        .windows(pattern.len())
        .enumerate()
        .map(|(start, window)| ImmuneMatch {
            distance: window.iter().zip(pattern).filter(|(a, b)| a != b).count(),
            start,
            end: start.saturating_add(span),
        })
        .min_by_key(|m| m.distance)
}

/// Expose `host` to `disease`.
pub fn catch_disease(host: &mut Agent, disease: &Disease) -> Contagion {
    let Some(immune) = host.immune_system.as_deref() else {
        return Contagion::NotSusceptible;
    };
    if host.infections.iter().any(|i| i.disease.id == disease.id) {
        return Contagion::AlreadyInfected;
    }
    let Some(found) = best_match(immune, &disease.tags) else {
        return Contagion::Incompatible;
    };
    if found.distance == 0 {
        return Contagion::Immune;
    }
    let applied = apply_penalties(host, &disease.penalties);
    host.infections.push(Infection {
        disease: disease.clone(),
        start: found.start,
        end: found.end,
        applied,
    });
    debug!(agent = %host.id, disease = %disease.id, distance = found.distance, "infected");
    Contagion::Infected
}

/// Run one tick of immune learning over every infection.
///
/// Returns the diseases cleared this tick.
pub fn progress_infections(host: &mut Agent) -> Vec<DiseaseId> {
    let Some(immune) = host.immune_system.as_mut() else {
        return Vec::new();
    };
    let mut cleared = Vec::new();
    host.infections.retain(|infection| {
        let Some(window) = immune.get_mut(infection.start..=infection.end) else {
            return true;
        };
        if let Some((bit, target)) = window
            .iter_mut()
            .zip(&infection.disease.tags)
            .find(|(bit, target)| **bit != **target)
        {
            *bit = *target;
        }
        let recovered = window.iter().eq(infection.disease.tags.iter());
        if recovered {
            cleared.push(infection.disease.id);
        }
        !recovered
    });
    if !cleared.is_empty() {
        restore_traits(host);
    }
    for disease in &cleared {
        info!(agent = %host.id, %disease, "recovered");
    }
    cleared
}

// ---------------------------------------------------------------------------
// Trait adjustments
// ---------------------------------------------------------------------------

fn shift_f64(value: &mut f64, delta: f64) -> f64 {
    let before = *value;
    *value = (before + delta).max(0.0);
    *value - before
}

fn shift_u32(value: &mut u32, delta: i32) -> i32 {
    let before = i64::from(*value);
    let after = before.saturating_add(i64::from(delta)).max(0);
    *value = u32::try_from(after).unwrap_or(u32::MAX);
    i32::try_from(i64::from(*value).saturating_sub(before)).unwrap_or(0)
}

/// Add `penalties` to the host's traits, clamping each at zero, and return
/// the deltas that were actually applied.
pub fn apply_penalties(host: &mut Agent, penalties: &TraitPenalties) -> TraitPenalties {
    TraitPenalties {
        sugar_metabolism: shift_f64(&mut host.sugar_metabolism, penalties.sugar_metabolism),
        spice_metabolism: shift_f64(&mut host.spice_metabolism, penalties.spice_metabolism),
        vision: shift_u32(&mut host.vision, penalties.vision),
        movement: shift_u32(&mut host.movement, penalties.movement),
        fertility_factor: shift_f64(&mut host.fertility_factor, penalties.fertility_factor),
        aggression_factor: shift_f64(&mut host.aggression_factor, penalties.aggression_factor),
    }
}

/// Rebuild the host's physiology from its endowment, then re-apply the
/// deltas of the infections it still carries.
///
/// With no infections left the traits equal their birth values bit for bit.
pub fn restore_traits(host: &mut Agent) {
    let base = &host.endowment;
    host.sugar_metabolism = base.sugar_metabolism;
    host.spice_metabolism = base.spice_metabolism;
    host.vision = base.vision;
    host.movement = base.movement;
    host.fertility_factor = base.fertility_factor;
    host.aggression_factor = base.aggression_factor;
    let remaining: Vec<TraitPenalties> = host.infections.iter().map(|i| i.applied).collect();
    for applied in &remaining {
        shift_f64(&mut host.sugar_metabolism, applied.sugar_metabolism);
        shift_f64(&mut host.spice_metabolism, applied.spice_metabolism);
        shift_u32(&mut host.vision, applied.vision);
        shift_u32(&mut host.movement, applied.movement);
        shift_f64(&mut host.fertility_factor, applied.fertility_factor);
        shift_f64(&mut host.aggression_factor, applied.aggression_factor);
    }
}

// ---------------------------------------------------------------------------
// Per-tick protocol
// ---------------------------------------------------------------------------

/// Progress the agent's infections, then expose every adjacent agent to one
/// randomly chosen active infection each, in random order.
pub fn run_disease(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<(), AgentError> {
    let agent = society.population.require_mut(id)?;
    let cleared = progress_infections(agent);
    let carried: Vec<Disease> = agent.infections.iter().map(|i| i.disease.clone()).collect();
    let recoveries = u32::try_from(cleared.len()).unwrap_or(u32::MAX);
    society.events.recoveries = society.events.recoveries.saturating_add(recoveries);
    if carried.is_empty() {
        return Ok(());
    }

    let mut neighbors = society.neighbors_of(id)?;
    neighbors.shuffle(rng);
    for neighbor_id in neighbors {
        let Some(disease) = carried.get(rng.random_range(0..carried.len())) else {
            continue;
        };
        let neighbor = society.population.require_mut(neighbor_id)?;
        if catch_disease(neighbor, disease) == Contagion::Infected {
            society.events.infections = society.events.infections.saturating_add(1);
        }
    }
    Ok(())
}
