//! Prometheus metrics for the HTTP API.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,

    /// Reports appended to the chain.
    pub reports_accepted: IntCounter,
    /// Submissions that failed validation, upload or storage.
    pub reports_failed: IntCounter,
    pub votes_accepted: IntCounter,
    /// Votes refused because the user had already voted.
    pub duplicate_votes: IntCounter,
    /// Status changes made by the consensus policy.
    pub consensus_transitions: IntCounter,
    pub queries_served: IntCounter,

    /// Wall time of a report query, in milliseconds.
    pub query_latency_ms: Histogram,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let reports_accepted = register_int_counter_with_registry!(
            Opts::new(
                "groundtruth_reports_accepted_total",
                "Reports appended to the chain"
            ),
            registry
        )
        .expect("failed to register reports_accepted counter");

        let reports_failed = register_int_counter_with_registry!(
            Opts::new(
                "groundtruth_reports_failed_total",
                "Report submissions that were not stored"
            ),
            registry
        )
        .expect("failed to register reports_failed counter");

        let votes_accepted = register_int_counter_with_registry!(
            Opts::new("groundtruth_votes_accepted_total", "Votes recorded"),
            registry
        )
        .expect("failed to register votes_accepted counter");

        let duplicate_votes = register_int_counter_with_registry!(
            Opts::new(
                "groundtruth_duplicate_votes_total",
                "Votes rejected because the user already voted"
            ),
            registry
        )
        .expect("failed to register duplicate_votes counter");

        let consensus_transitions = register_int_counter_with_registry!(
            Opts::new(
                "groundtruth_consensus_transitions_total",
                "Report status changes made by the consensus policy"
            ),
            registry
        )
        .expect("failed to register consensus_transitions counter");

        let queries_served = register_int_counter_with_registry!(
            Opts::new("groundtruth_queries_total", "Report queries answered"),
            registry
        )
        .expect("failed to register queries_served counter");

        let query_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "groundtruth_query_latency_ms",
                "Report query time in milliseconds"
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
            registry
        )
        .expect("failed to register query_latency_ms histogram");

        Self {
            registry,
            reports_accepted,
            reports_failed,
            votes_accepted,
            duplicate_votes,
            consensus_transitions,
            queries_served,
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
    fn encodes_registered_counters() {
        let m = RpcMetrics::new();
        m.reports_accepted.inc();
        let text = m.encode().unwrap();
        assert!(text.contains("groundtruth_reports_accepted_total 1"));
        assert!(text.contains("groundtruth_query_latency_ms_bucket"));
    }
}
