//! LMDB storage backend for the voter index.
//!
//! Implements the `dpos-store` traits on top of `heed`. Accounts, their
//! secondary indexes and the vote edge log live in named databases of one
//! environment, so an account and its index entries are always written in
//! a single transaction.

pub mod account;
pub mod environment;
pub mod error;
pub mod vote_edge;

pub use environment::{LmdbEnvironment, LmdbStore};
pub use error::LmdbError;
