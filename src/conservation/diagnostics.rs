//! Upstream reachability and service uptime report.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::upstream::{Upstream, UpstreamClient};

/// Service version reported by diagnostics.
pub const SERVICE_VERSION: &str = "v1";

/// Diagnostics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Status line of the species API, empty if unreachable.
    pub gbif: String,
    /// Status line of the country API, empty if unreachable.
    pub restcountries: String,
    /// Service version.
    pub version: String,
    /// Whole seconds since startup.
    pub uptime: u64,
}

/// Ping both upstreams and build a report. Never fails.
#[instrument(skip_all)]
pub async fn get_diagnostics(client: &UpstreamClient, started_at: Instant) -> DiagnosticsReport {
    let (gbif, restcountries) = tokio::join!(
        ping_status(client, Upstream::Gbif),
        ping_status(client, Upstream::RestCountries),
    );

    DiagnosticsReport {
        gbif,
        restcountries,
        version: SERVICE_VERSION.to_string(),
        uptime: started_at.elapsed().as_secs(),
    }
}

async fn ping_status(client: &UpstreamClient, upstream: Upstream) -> String {
    match client.ping(upstream).await {
        Ok(status) => status,
        Err(e) => {
            warn!(%upstream, error = %e, "Upstream ping failed");
            String::new()
        }
    }
}
