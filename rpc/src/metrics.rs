//! Prometheus metrics for the voters endpoint.
//!
//! [`RpcMetrics`] owns its own [`Registry`] so the `/metrics` route can
//! encode it in the Prometheus text format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,

    /// Voters queries received, valid or not.
    pub voters_queries: IntCounter,
    /// Queries rejected by parameter validation.
    pub validation_failures: IntCounter,
    /// Queries whose identifier matched no delegate.
    pub not_found: IntCounter,
    /// Queries that failed because the store was unavailable.
    pub store_failures: IntCounter,
    /// Voters present in the ledger but missing from the account store.
    pub missing_voters: IntCounter,

    /// Wall time of a voters query, in milliseconds.
    pub query_latency_ms: Histogram,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let voters_queries = register_int_counter_with_registry!(
            Opts::new("dpos_voters_queries_total", "Total voters queries received"),
            registry
        )
        .expect("failed to register voters_queries counter");

        let validation_failures = register_int_counter_with_registry!(
            Opts::new(
                "dpos_voters_validation_failures_total",
                "Voters queries rejected by parameter validation"
            ),
            registry
        )
        .expect("failed to register validation_failures counter");

        let not_found = register_int_counter_with_registry!(
            Opts::new(
                "dpos_voters_not_found_total",
                "Voters queries that matched no delegate"
            ),
            registry
        )
        .expect("failed to register not_found counter");

        let store_failures = register_int_counter_with_registry!(
            Opts::new(
                "dpos_voters_store_failures_total",
                "Voters queries that failed on an unavailable store"
            ),
            registry
        )
        .expect("failed to register store_failures counter");

        let missing_voters = register_int_counter_with_registry!(
            Opts::new(
                "dpos_voters_missing_accounts_total",
                "Voters without an account record"
            ),
            registry
        )
        .expect("failed to register missing_voters counter");

        let query_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "dpos_voters_query_latency_ms",
                "Time spent answering a voters query in milliseconds"
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
            registry
        )
        .expect("failed to register query_latency_ms histogram");

        Self {
            registry,
            voters_queries,
            validation_failures,
            not_found,
            store_failures,
            missing_voters,
            query_latency_ms,
        }
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_lists_registered_counters() {
        let metrics = RpcMetrics::new();
        metrics.voters_queries.inc();
        metrics.not_found.inc_by(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("dpos_voters_queries_total 1"));
        assert!(text.contains("dpos_voters_not_found_total 2"));
    }
}
