//! Fundamental types for the delegate voter index.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, public keys, delegate usernames, balances and vote edges.

pub mod address;
pub mod amount;
pub mod error;
pub mod keys;
pub mod username;
pub mod vote;

pub use address::Address;
pub use amount::Balance;
pub use error::TypesError;
pub use keys::PublicKey;
pub use username::Username;
pub use vote::{VoteEdge, VoteSign};
