//! Cultural tags and tribe membership.
//!
//! A tagged agent belongs to the tribe its count of zero bits falls into.
//! Each tick it nudges its neighbors' tags toward its own one bit at a
//! time, so tribes drift and merge spatially.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sugarscape_types::AgentId;
use tracing::trace;

use crate::error::AgentError;
use crate::society::Society;

/// Zero-based tribe index derived from a tag vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tribe(pub u32);

impl core::fmt::Display for Tribe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "tribe-{}", self.0)
    }
}

/// Bucket a tag vector into one of `max_tribes` tribes by its zero count.
///
/// With `cutoff = floor(len / max_tribes)`, the tribe is the first `i` in
/// `1..=max_tribes` such that `zeroes < i * cutoff + 1`, falling back to the
/// last tribe. Returns `None` when `max_tribes` is zero.
pub fn find_tribe(tags: &[bool], max_tribes: u32) -> Option<Tribe> {
    let len = u32::try_from(tags.len()).ok()?;
    let zeroes = u32::try_from(tags.iter().filter(|bit| !**bit).count()).ok()?;
    let cutoff = len.checked_div(max_tribes)?;
    (1..=max_tribes)
        .find(|i| zeroes < i.saturating_mul(cutoff).saturating_add(1) || *i == max_tribes)
        .map(|i| Tribe(i.saturating_sub(1)))
}

/// Number of positions at which two tag vectors differ.
///
/// Positions beyond the shorter vector are ignored.
pub fn hamming_distance(a: &[bool], b: &[bool]) -> u32 {
    let differing = a.iter().zip(b).filter(|(x, y)| x != y).count();
    u32::try_from(differing).unwrap_or(u32::MAX)
}

/// Copy one random tag bit from `id` into each adjacent agent, in random order.
///
/// Each influenced neighbor's tribe is recomputed. Returns the number of
/// neighbors influenced; untagged agents neither spread nor receive tags.
pub fn spread_tags(
    society: &mut Society,
    id: AgentId,
    rng: &mut impl Rng,
) -> Result<u32, AgentError> {
    let tags = match &society.population.require(id)?.tags {
        Some(tags) if !tags.is_empty() => tags.clone(),
        _ => return Ok(0),
    };
    let mut neighbors = society.neighbors_of(id)?;
    neighbors.shuffle(rng);

    let max_tribes = society.params.max_tribes;
    let mut influenced = 0_u32;
    for neighbor_id in neighbors {
        let position = rng.random_range(0..tags.len());
        let Some(bit) = tags.get(position).copied() else {
            continue;
        };
        let neighbor = society.population.require_mut(neighbor_id)?;
        let Some(slot) = neighbor.tags.as_mut().and_then(|t| t.get_mut(position)) else {
            continue;
        };
        *slot = bit;
        neighbor.tribe = neighbor
            .tags
            .as_deref()
            .and_then(|t| find_tribe(t, max_tribes));
        influenced = influenced.saturating_add(1);
        trace!(agent = %id, neighbor = %neighbor_id, position, "tag copied");
    }
    Ok(influenced)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::agent::fixtures::endowment;
    use crate::society::fixtures::{place, society};

    #[test]
    fn four_bit_tags_two_tribes() {
        // Two zeroes against a cutoff of 2: 2 < 1*2+1, so the first tribe.
        let tags = [false, false, true, true];
        assert_eq!(find_tribe(&tags, 2), Some(Tribe(0)));
        assert_eq!(find_tribe(&tags, 2), find_tribe(&tags, 2));
    }

    #[test]
    fn zero_heavy_tags_fall_in_later_tribes() {
        assert_eq!(find_tribe(&[false; 4], 2), Some(Tribe(1)));
        assert_eq!(find_tribe(&[true; 4], 2), Some(Tribe(0)));
        assert_eq!(find_tribe(&[false; 9], 3), Some(Tribe(2)));
    }

    #[test]
    fn no_tribes_configured() {
        assert_eq!(find_tribe(&[true, false], 0), None);
    }

    #[test]
    fn hamming_counts_differences() {
        assert_eq!(hamming_distance(&[true, false, true], &[true, true, false]), 2);
        assert_eq!(hamming_distance(&[], &[]), 0);
    }

    #[test]
    fn tagging_converts_neighbor() {
        let mut soc = society(5, 5);
        soc.params.tag_length = 4;
        soc.params.max_tribes = 2;
        let mut influencer = endowment(5.0, 5.0);
        influencer.tags = Some(vec![true; 4]);
        let mut target = endowment(5.0, 5.0);
        target.tags = Some(vec![false; 4]);
        let a = place(&mut soc, influencer, 2, 2);
        let b = place(&mut soc, target, 2, 3);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            assert_eq!(spread_tags(&mut soc, a, &mut rng).unwrap(), 1);
        }
        let neighbor = soc.population.get(b).unwrap();
        assert_eq!(neighbor.tags.as_deref(), Some(&[true; 4][..]));
        assert_eq!(neighbor.tribe, Some(Tribe(0)));
    }

    #[test]
    fn untagged_agent_does_not_spread() {
        let mut soc = society(3, 3);
        let a = place(&mut soc, endowment(5.0, 5.0), 1, 1);
        place(&mut soc, endowment(5.0, 5.0), 1, 2);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(spread_tags(&mut soc, a, &mut rng).unwrap(), 0);
    }
}
