//! Delegate voters node.
//!
//! The node:
//! - loads configuration and an optional genesis state
//! - keeps accounts and the vote edge log in LMDB
//! - folds committed vote transactions into the in-memory vote ledger
//! - serves `GET /api/voters` and `GET /metrics` until shutdown

pub mod config;
pub mod error;
pub mod genesis;
pub mod node;
pub mod shutdown;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use genesis::{Genesis, GenesisAccount, GenesisVote};
pub use node::VotersNode;
pub use shutdown::ShutdownController;
