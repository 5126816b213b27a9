//! Abstract storage traits for the voter index.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod account;
pub mod error;
pub mod vote;

pub use account::{Account, AccountStore};
pub use error::StoreError;
pub use vote::VoteEdgeStore;
