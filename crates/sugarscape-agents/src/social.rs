//! Per-agent social ledger: relationships, friendships, and loan books.
//!
//! Every agent carries one [`SocialLedger`]. Peers are referenced by
//! [`AgentId`] only; the population registry owns the agents themselves, so a
//! dead peer simply stays in the ledger as a historical reference.
//!
//! Loan records live on both sides of a relationship: the borrower files the
//! loan under its obligations, the lender under its claims. Both copies share
//! one [`LoanId`].

use std::collections::BTreeMap;

use sugarscape_types::{AgentId, Loan, LoanId};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What an agent remembers about one peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    /// Tick of the most recent interaction.
    pub last_seen: u64,
    /// Number of ticks the peer was found adjacent.
    pub visits: u32,
    /// Number of children produced together.
    pub reproduced: u32,
    /// Number of executed trade iterations.
    pub traded: u32,
    /// Number of loans between the two, in either direction.
    pub loaned: u32,
    /// The peer's marginal rate of substitution when last synced.
    pub mrs: f64,
}

impl PeerRecord {
    const fn first_meeting(tick: u64) -> Self {
        Self {
            last_seen: tick,
            visits: 1,
            reproduced: 0,
            traded: 0,
            loaned: 0,
            mrs: 0.0,
        }
    }
}

/// A friendship slot, ranked by tag similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Friend {
    /// The friend.
    pub agent: AgentId,
    /// Hamming distance between the two tag vectors.
    pub hamming_distance: u32,
}

// ---------------------------------------------------------------------------
// SocialLedger
// ---------------------------------------------------------------------------

/// Relationship record kept by a single agent.
#[derive(Debug, Clone, Default)]
pub struct SocialLedger {
    peers: BTreeMap<AgentId, PeerRecord>,
    father: Option<AgentId>,
    mother: Option<AgentId>,
    children: Vec<AgentId>,
    /// Sorted by ascending Hamming distance.
    friends: Vec<Friend>,
    /// Loans this agent owes.
    obligations: Vec<Loan>,
    /// Loans owed to this agent.
    claims: Vec<Loan>,
    von_neumann: Vec<AgentId>,
    moore: Vec<AgentId>,
}

impl SocialLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Peers
    // -------------------------------------------------------------------

    /// The record for `peer`, if it has ever been met.
    pub fn peer(&self, peer: AgentId) -> Option<&PeerRecord> {
        self.peers.get(&peer)
    }

    /// Every peer ever met, in ID order.
    pub fn known_peers(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.peers.keys().copied()
    }

    /// Whether `peer` has a ledger entry.
    pub fn knows(&self, peer: AgentId) -> bool {
        self.peers.contains_key(&peer)
    }

    /// File a first-meeting entry for `peer` unless one exists.
    pub fn meet(&mut self, peer: AgentId, tick: u64) {
        self.peers
            .entry(peer)
            .or_insert_with(|| PeerRecord::first_meeting(tick));
    }

    fn entry(&mut self, peer: AgentId, tick: u64) -> &mut PeerRecord {
        self.peers
            .entry(peer)
            .or_insert_with(|| PeerRecord::first_meeting(tick))
    }

    /// Count a visit from an already known peer, or meet it for the first time.
    pub fn record_visit(&mut self, peer: AgentId, tick: u64) {
        if let Some(record) = self.peers.get_mut(&peer) {
            record.visits = record.visits.saturating_add(1);
            record.last_seen = tick;
        } else {
            self.meet(peer, tick);
        }
    }

    /// Remember the peer's current marginal rate of substitution.
    pub fn record_mrs(&mut self, peer: AgentId, tick: u64, mrs: f64) {
        self.entry(peer, tick).mrs = mrs;
    }

    /// Add `transactions` executed trade iterations with `peer`.
    pub fn record_trades(&mut self, peer: AgentId, tick: u64, transactions: u32) {
        let record = self.entry(peer, tick);
        record.traded = record.traded.saturating_add(transactions);
        record.last_seen = tick;
    }

    /// Count a child produced with `peer`.
    pub fn record_reproduction(&mut self, peer: AgentId, tick: u64) {
        let record = self.entry(peer, tick);
        record.reproduced = record.reproduced.saturating_add(1);
        record.last_seen = tick;
    }

    /// Count a loan made to or taken from `peer`.
    pub fn record_loan(&mut self, peer: AgentId, tick: u64) {
        let record = self.entry(peer, tick);
        record.loaned = record.loaned.saturating_add(1);
    }

    // -------------------------------------------------------------------
    // Family
    // -------------------------------------------------------------------

    /// The agent's father, if born through reproduction.
    pub const fn father(&self) -> Option<AgentId> {
        self.father
    }

    /// The agent's mother, if born through reproduction.
    pub const fn mother(&self) -> Option<AgentId> {
        self.mother
    }

    /// Record both parents and file ledger entries for them.
    pub fn set_parents(&mut self, father: AgentId, mother: AgentId, tick: u64) {
        self.meet(father, tick);
        self.meet(mother, tick);
        self.father = Some(father);
        self.mother = Some(mother);
    }

    /// Children in birth order.
    pub fn children(&self) -> &[AgentId] {
        &self.children
    }

    /// Record a newborn child.
    pub fn add_child(&mut self, child: AgentId, tick: u64) {
        self.meet(child, tick);
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    // -------------------------------------------------------------------
    // Friends
    // -------------------------------------------------------------------

    /// Friends ranked by ascending tag distance.
    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// The friend with the most similar tags.
    pub fn best_friend(&self) -> Option<Friend> {
        self.friends.first().copied()
    }

    /// Offer `candidate` a friendship slot.
    ///
    /// An existing friend has its distance refreshed. A newcomer takes a free
    /// slot, or evicts the worst-ranked friend when it is strictly closer.
    /// Returns whether `candidate` is a friend afterwards.
    pub fn update_friend(&mut self, candidate: Friend, max_friends: u32) -> bool {
        let capacity = usize::try_from(max_friends).unwrap_or(usize::MAX);
        if let Some(existing) = self
            .friends
            .iter_mut()
            .find(|f| f.agent == candidate.agent)
        {
            existing.hamming_distance = candidate.hamming_distance;
        } else if self.friends.len() < capacity {
            self.friends.push(candidate);
        } else {
            let closer = self
                .friends
                .last()
                .is_some_and(|worst| worst.hamming_distance > candidate.hamming_distance);
            if !closer {
                return false;
            }
            self.friends.pop();
            self.friends.push(candidate);
        }
        self.friends.sort_by_key(|f| f.hamming_distance);
        true
    }

    // -------------------------------------------------------------------
    // Loans
    // -------------------------------------------------------------------

    /// Loans this agent owes.
    pub fn obligations(&self) -> &[Loan] {
        &self.obligations
    }

    /// Loans owed to this agent.
    pub fn claims(&self) -> &[Loan] {
        &self.claims
    }

    /// File a loan this agent has taken.
    pub fn file_obligation(&mut self, loan: Loan) {
        self.obligations.push(loan);
    }

    /// File a loan this agent has made.
    pub fn file_claim(&mut self, loan: Loan) {
        self.claims.push(loan);
    }

    /// Remove an obligation by ID, returning it if present.
    pub fn remove_obligation(&mut self, id: LoanId) -> Option<Loan> {
        let index = self.obligations.iter().position(|l| l.id == id)?;
        Some(self.obligations.remove(index))
    }

    /// Remove a claim by ID, returning it if present.
    pub fn remove_claim(&mut self, id: LoanId) -> Option<Loan> {
        let index = self.claims.iter().position(|l| l.id == id)?;
        Some(self.claims.remove(index))
    }

    /// Drop every claim whose debtor fails `is_alive`. Returns how many were dropped.
    pub fn prune_claims(&mut self, mut is_alive: impl FnMut(AgentId) -> bool) -> usize {
        let before = self.claims.len();
        self.claims.retain(|loan| is_alive(loan.debtor));
        before.saturating_sub(self.claims.len())
    }

    /// Sugar set aside each tick to service current obligations.
    pub fn sugar_debt_service(&self) -> f64 {
        self.obligations.iter().map(Loan::sugar_service_per_tick).sum()
    }

    /// Spice set aside each tick to service current obligations.
    pub fn spice_debt_service(&self) -> f64 {
        self.obligations.iter().map(Loan::spice_service_per_tick).sum()
    }

    // -------------------------------------------------------------------
    // Neighbors
    // -------------------------------------------------------------------

    /// Agents found on the four adjacent cells at the last refresh.
    pub fn von_neumann_neighbors(&self) -> &[AgentId] {
        &self.von_neumann
    }

    /// Agents found on the eight surrounding cells at the last refresh.
    pub fn moore_neighbors(&self) -> &[AgentId] {
        &self.moore
    }

    /// Replace the cached neighbor sets.
    pub fn set_neighbors(&mut self, von_neumann: Vec<AgentId>, moore: Vec<AgentId>) {
        self.von_neumann = von_neumann;
        self.moore = moore;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friend(id: u64, distance: u32) -> Friend {
        Friend {
            agent: AgentId(id),
            hamming_distance: distance,
        }
    }

    #[test]
    fn first_meeting_then_visits() {
        let mut ledger = SocialLedger::new();
        ledger.record_visit(AgentId(3), 5);
        assert_eq!(ledger.peer(AgentId(3)).map(|p| p.visits), Some(1));
        ledger.record_visit(AgentId(3), 6);
        let record = ledger.peer(AgentId(3));
        assert_eq!(record.map(|p| p.visits), Some(2));
        assert_eq!(record.map(|p| p.last_seen), Some(6));
    }

    #[test]
    fn trades_accumulate() {
        let mut ledger = SocialLedger::new();
        ledger.record_trades(AgentId(1), 2, 3);
        ledger.record_trades(AgentId(1), 4, 2);
        assert_eq!(ledger.peer(AgentId(1)).map(|p| p.traded), Some(5));
    }

    #[test]
    fn friends_stay_sorted_and_bounded() {
        let mut ledger = SocialLedger::new();
        assert!(ledger.update_friend(friend(1, 4), 2));
        assert!(ledger.update_friend(friend(2, 1), 2));
        assert_eq!(ledger.best_friend().map(|f| f.agent), Some(AgentId(2)));

        // Full list: an equal candidate does not evict.
        assert!(!ledger.update_friend(friend(3, 4), 2));
        // A strictly closer candidate evicts the worst.
        assert!(ledger.update_friend(friend(4, 0), 2));
        let ids: Vec<AgentId> = ledger.friends().iter().map(|f| f.agent).collect();
        assert_eq!(ids, vec![AgentId(4), AgentId(2)]);
    }

    #[test]
    fn existing_friend_distance_refreshed() {
        let mut ledger = SocialLedger::new();
        ledger.update_friend(friend(1, 1), 3);
        ledger.update_friend(friend(2, 2), 3);
        ledger.update_friend(friend(1, 5), 3);
        assert_eq!(ledger.friends().len(), 2);
        assert_eq!(ledger.best_friend().map(|f| f.agent), Some(AgentId(2)));
    }

    #[test]
    fn zero_capacity_never_befriends() {
        let mut ledger = SocialLedger::new();
        assert!(!ledger.update_friend(friend(1, 0), 0));
        assert!(ledger.friends().is_empty());
    }

    #[test]
    fn loans_removed_by_id() {
        let loan = Loan {
            id: LoanId::new(),
            creditor: AgentId(1),
            debtor: AgentId(2),
            sugar_principal: 2.0,
            spice_principal: 0.0,
            sugar_repayment: 4.0,
            spice_repayment: 0.0,
            duration: 4,
            origin_tick: 0,
        };
        let mut ledger = SocialLedger::new();
        ledger.file_obligation(loan.clone());
        assert!((ledger.sugar_debt_service() - 1.0).abs() < f64::EPSILON);
        assert!(ledger.remove_obligation(loan.id).is_some());
        assert!(ledger.remove_obligation(loan.id).is_none());
        assert!(ledger.obligations().is_empty());
    }
}
