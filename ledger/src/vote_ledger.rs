//! Per-delegate voter sets, updated incrementally from vote edges.
//!
//! Each delegate owns a slot with two parts:
//! - a writer mutex over the working state, which is the order and sign of
//!   the last edge applied per voter plus the current member set;
//! - the published `Arc<VoterSet>` snapshot. A membership change clears it
//!   and the next reader builds a fresh one from the working set.
//!
//! An edge costs O(log n) in the delegate's voter count. A snapshot is built
//! at most once per change, and the query reading it walks the whole set
//! anyway.
//!
//! Unrelated delegates are read and written in parallel. The delegate index
//! is read-locked while an edge is applied and write-locked only when a
//! delegate receives its first edge or the ledger is rebuilt.
//!
//! For a given (voter, delegate) pair the edge with the highest order wins.
//! Older edges are ignored as stale and an edge with an already applied
//! order is a no-op, so the fold gives the same result whatever order
//! concurrent writers reach it in.

use crate::error::LedgerError;
use crate::voter_set::VoterSet;
use dpos_store::VoteEdgeStore;
use dpos_types::{Address, PublicKey, VoteEdge, VoteSign};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Effect of applying one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The voter joined the delegate's set.
    Added,
    /// The voter left the delegate's set.
    Removed,
    /// The edge was current but did not change membership
    /// (add of a member, remove of a non-member, or a re-applied edge).
    Unchanged,
    /// A newer edge for the same pair was already applied.
    Stale,
}

impl ApplyOutcome {
    fn changed(self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Point-in-time counters for the whole ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Delegates that have received at least one edge.
    pub delegates: usize,
    /// Sum of all voter set sizes.
    pub total_votes: usize,
    /// Edges accepted by the fold, i.e. every edge that was not stale.
    pub edges_applied: u64,
}

#[derive(Default)]
struct SlotState {
    latest: HashMap<Address, (u64, VoteSign)>,
    voters: BTreeSet<Address>,
}

impl SlotState {
    fn apply(&mut self, edge: &VoteEdge) -> ApplyOutcome {
        match self.latest.get(&edge.voter) {
            Some(&(order, _)) if edge.order < order => return ApplyOutcome::Stale,
            Some(&(order, sign)) if edge.order == order => {
                if sign != edge.sign {
                    warn!(edge = %edge, "conflicting vote edges share one order, keeping the first");
                }
                return ApplyOutcome::Unchanged;
            }
            _ => {}
        }
        self.latest.insert(edge.voter.clone(), (edge.order, edge.sign));

        let changed = match edge.sign {
            VoteSign::Add => self.voters.insert(edge.voter.clone()),
            VoteSign::Remove => self.voters.remove(&edge.voter),
        };
        match (changed, edge.sign) {
            (false, _) => ApplyOutcome::Unchanged,
            (true, VoteSign::Add) => ApplyOutcome::Added,
            (true, VoteSign::Remove) => ApplyOutcome::Removed,
        }
    }
}

// Lock order: `state` before `published`.
#[derive(Default)]
struct DelegateSlot {
    state: Mutex<SlotState>,
    published: RwLock<Option<Arc<VoterSet>>>,
}

impl DelegateSlot {
    fn from_state(state: SlotState) -> Self {
        let published = Arc::new(VoterSet::from(state.voters.clone()));
        Self {
            state: Mutex::new(state),
            published: RwLock::new(Some(published)),
        }
    }

    fn snapshot(&self) -> Arc<VoterSet> {
        if let Some(set) = self.published.read().as_ref() {
            return set.clone();
        }
        let state = self.state.lock();
        let mut published = self.published.write();
        published
            .get_or_insert_with(|| Arc::new(VoterSet::from(state.voters.clone())))
            .clone()
    }

    fn len(&self) -> usize {
        self.state.lock().voters.len()
    }

    fn apply(&self, edge: &VoteEdge) -> ApplyOutcome {
        let mut state = self.state.lock();
        let outcome = state.apply(edge);
        if outcome.changed() {
            *self.published.write() = None;
        }
        outcome
    }
}

/// Owner of every delegate's voter set.
///
/// Empty at genesis. Shared by reference between the transaction pipeline
/// (the only writer) and the query service.
pub struct VoteLedger {
    slots: RwLock<HashMap<PublicKey, Arc<DelegateSlot>>>,
    edges_applied: AtomicU64,
    empty: Arc<VoterSet>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            edges_applied: AtomicU64::new(0),
            empty: Arc::new(VoterSet::new()),
        }
    }

    /// Fold one edge into the delegate's voter set.
    pub fn apply_vote_edge(&self, edge: &VoteEdge) -> ApplyOutcome {
        let existing = {
            let slots = self.slots.read();
            slots.get(&edge.delegate).map(|slot| slot.apply(edge))
        };
        let outcome = match existing {
            Some(outcome) => outcome,
            None => self
                .slots
                .write()
                .entry(edge.delegate)
                .or_default()
                .apply(edge),
        };
        if outcome != ApplyOutcome::Stale {
            self.edges_applied.fetch_add(1, Ordering::Relaxed);
        }
        debug!(edge = %edge, ?outcome, "vote edge applied");
        outcome
    }

    /// Fold a batch of edges, returning how many changed membership.
    pub fn apply_edges<'a>(&self, edges: impl IntoIterator<Item = &'a VoteEdge>) -> usize {
        edges
            .into_iter()
            .map(|edge| self.apply_vote_edge(edge))
            .filter(|o| o.changed())
            .count()
    }

    /// Current voter set snapshot for a delegate.
    ///
    /// The returned snapshot is unaffected by edges applied afterwards.
    /// Unknown delegates have an empty set.
    pub fn voters_of(&self, delegate: &PublicKey) -> Arc<VoterSet> {
        self.slots
            .read()
            .get(delegate)
            .map(|slot| slot.snapshot())
            .unwrap_or_else(|| self.empty.clone())
    }

    /// Number of voters of a delegate.
    pub fn vote_count(&self, delegate: &PublicKey) -> usize {
        self.slots.read().get(delegate).map_or(0, |slot| slot.len())
    }

    /// Delegates that have received at least one edge.
    pub fn delegate_count(&self) -> usize {
        self.slots.read().len()
    }

    pub fn edges_applied(&self) -> u64 {
        self.edges_applied.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> LedgerStats {
        let slots = self.slots.read();
        LedgerStats {
            delegates: slots.len(),
            total_votes: slots.values().map(|s| s.len()).sum(),
            edges_applied: self.edges_applied(),
        }
    }

    /// Discard all state and replay `edges` from scratch.
    ///
    /// Edges are folded into plain per-delegate sets and every snapshot is
    /// published once at the end. The delegate index stays write-locked for
    /// the whole replay: edges already applied are discarded with the old
    /// state, and writers arriving meanwhile wait and land in the new one.
    /// Meant for startup, before the node accepts writes. Snapshots handed
    /// out earlier stay valid.
    pub fn rebuild<'a>(&self, edges: impl IntoIterator<Item = &'a VoteEdge>) {
        let mut slots = self.slots.write();
        let mut states: HashMap<PublicKey, SlotState> = HashMap::new();
        let mut applied = 0u64;
        for edge in edges {
            if states.entry(edge.delegate).or_default().apply(edge) != ApplyOutcome::Stale {
                applied += 1;
            }
        }
        *slots = states
            .into_iter()
            .map(|(delegate, state)| (delegate, Arc::new(DelegateSlot::from_state(state))))
            .collect();
        self.edges_applied.store(applied, Ordering::Relaxed);
    }

    /// Rebuild from the persisted edge log. Called once at startup.
    pub fn rebuild_from_store<S: VoteEdgeStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<LedgerStats, LedgerError> {
        let edges = store.iter_edges()?;
        self.rebuild(edges.iter());
        let stats = self.stats();
        info!(
            edges = edges.len(),
            delegates = stats.delegates,
            votes = stats.total_votes,
            "vote ledger rebuilt"
        );
        Ok(stats)
    }
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self::new()
    }
}
