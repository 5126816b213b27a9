//! Vote edge log storage trait.

use crate::StoreError;
use dpos_types::VoteEdge;

/// Append-only log of committed vote edges.
///
/// The vote ledger keeps voter sets in memory and replays this log on
/// startup to rebuild them.
pub trait VoteEdgeStore {
    /// Persist an edge. Appending the same edge twice keeps a single copy.
    fn append_edge(&self, edge: &VoteEdge) -> Result<(), StoreError>;

    /// All persisted edges in ascending commit order.
    fn iter_edges(&self) -> Result<Vec<VoteEdge>, StoreError>;

    /// Number of persisted edges.
    fn edge_count(&self) -> Result<u64, StoreError>;
}
