//! Vote ledger for the delegate voter index.
//!
//! Maintains, for every delegate public key, the set of addresses currently
//! voting for it. Sets are folded from vote edges emitted by the transaction
//! pipeline and published as immutable snapshots, so readers never observe
//! a half-applied edge.

pub mod error;
pub mod vote_ledger;
pub mod voter_set;

pub use error::LedgerError;
pub use vote_ledger::{ApplyOutcome, LedgerStats, VoteLedger};
pub use voter_set::VoterSet;
