//! Metrics collection and exposition.
//!
//! # Metrics
//! - `urlfetcher_calls_total` (counter): calls by verb and outcome
//! - `urlfetcher_call_duration_seconds` (histogram): time from first byte
//!   read to response written, by verb
//!
//! Outcome labels: `success`, `http_error`, `transport_error`, `unexpected`,
//! `malformed`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::wire::types::Verb;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished call.
pub fn record_call(verb: Verb, outcome: &'static str, started: Instant) {
    ::metrics::counter!(
        "urlfetcher_calls_total",
        "verb" => verb.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("urlfetcher_call_duration_seconds", "verb" => verb.as_str())
        .record(started.elapsed().as_secs_f64());
}
