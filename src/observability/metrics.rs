//! Metrics collection and exposition.
//!
//! # Metrics
//! - `negotiation_outcomes_total` (counter): negotiations by route, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is optional and serves its own listener

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::negotiation::NegotiationOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one negotiation outcome.
pub fn record_outcome(route: &str, outcome: &NegotiationOutcome) {
    counter!(
        "negotiation_outcomes_total",
        "route" => route.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);
}
