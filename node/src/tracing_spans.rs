//! [`tracing::Span`] constructors for node operations.
//!
//! Consistent span names and fields make the node's logs easy to filter
//! and correlate.

use dpos_types::Address;
use tracing::{info_span, Span};

/// Span covering one vote transaction folded into the ledger.
pub fn vote_transaction_span(voter: &Address, order: u64, entries: usize) -> Span {
    info_span!("vote_transaction", voter = %voter, order, entries)
}

/// Span covering the genesis import.
pub fn genesis_span(accounts: usize, votes: usize) -> Span {
    info_span!("genesis", accounts, votes)
}

/// Span covering the startup replay of the vote edge log.
pub fn ledger_rebuild_span() -> Span {
    info_span!("ledger_rebuild")
}
