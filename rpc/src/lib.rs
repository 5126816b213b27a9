//! HTTP query surface of the delegate voters index.
//!
//! `GET /api/voters` takes exactly one of `address`, `publicKey` or
//! `username`, plus optional `sort`, `limit` and `offset`, and returns the
//! delegate with its current voters:
//!
//! - [`validation`] checks the raw parameters,
//! - [`resolver`] finds the delegate account,
//! - [`service`] reads the voter set from the ledger, enriches, sorts and
//!   paginates it,
//! - [`server`] exposes the service and its metrics over axum.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod resolver;
pub mod server;
pub mod service;
pub mod validation;

pub use error::RpcError;
pub use handlers::{MessageResponse, VoterEntry, VotersResponse, NO_DATA_MESSAGE};
pub use metrics::RpcMetrics;
pub use resolver::VoterResolver;
pub use server::{router, BoundRpcServer, RpcServer};
pub use service::{VoterQueryService, VotersOutcome};
pub use validation::{Identifier, Sort, SortField, SortOrder, ValidationError, Validator, VotersParams};
