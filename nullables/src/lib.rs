//! Nullable infrastructure for deterministic testing.
//!
//! Storage is abstracted behind the `dpos-store` traits. This crate provides
//! a test-friendly implementation that:
//! - Keeps everything in memory
//! - Can be told to fail, to exercise store-outage handling
//! - Counts lookups, so tests can assert that none were made
//!
//! Usage: swap the LMDB store for [`NullStore`] in tests.

pub mod store;

pub use store::NullStore;
