//! HTTP API handlers.

use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::config::Config;
use crate::conservation::{self, DiagnosticsReport};
use crate::error::{AppError, CountryError, SpeciesError, UpstreamError};
use crate::upstream::{SpeciesRecord, UpstreamClient};

/// Response header carrying the number of records left without country metadata.
pub const METADATA_FAILURES_HEADER: &str = "x-country-metadata-failures";

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upstream API client.
    pub client: UpstreamClient,
    /// Maximum metadata lookups in flight per country listing.
    pub country_lookup_concurrency: usize,
    /// When the service started; uptime is measured from here.
    pub started_at: Instant,
}

impl AppState {
    /// Create new app state, capturing the start time.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: UpstreamClient::new(config)?,
            country_lookup_concurrency: config.country_lookup_concurrency,
            started_at: Instant::now(),
        })
    }
}

/// Handler error, rendered as a bare status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Species lookup failed.
    #[error(transparent)]
    Species(#[from] SpeciesError),

    /// Country listing failed.
    #[error(transparent)]
    Country(#[from] CountryError),
}

impl ApiError {
    /// Status code returned to the client.
    pub fn status(&self) -> StatusCode {
        let upstream = match self {
            ApiError::Species(e) => e.upstream(),
            ApiError::Country(e) => e.upstream(),
        };
        status_for(upstream)
    }
}

/// Map an upstream failure to the status a client sees.
pub fn status_for(err: &UpstreamError) -> StatusCode {
    match err {
        UpstreamError::Transport { .. } if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::Transport { .. } => StatusCode::BAD_GATEWAY,
        UpstreamError::Decode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(%status, error = %self, "Request failed");
        status.into_response()
    }
}

/// First value of a query parameter; later repeats are ignored.
pub fn first_param(params: Vec<(String, String)>, name: &str) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Species handler - taxonomy with display year.
pub async fn species(
    State(state): State<AppState>,
    Path(species_key): Path<u64>,
) -> Result<Json<SpeciesRecord>, ApiError> {
    let record = conservation::get_species(&state.client, species_key).await?;
    Ok(Json(record))
}

/// Country handler - occurrences enriched with country name and flag.
///
/// Always 200 once the occurrence search succeeds; per-record metadata
/// failures are reported in a header. Only the first `limit` is used.
pub async fn country(
    State(state): State<AppState>,
    Path(country_identifier): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = first_param(params, "limit");
    let listing = conservation::get_country_species(
        &state.client,
        &country_identifier,
        limit.as_deref(),
        state.country_lookup_concurrency,
    )
    .await?;

    let failures = listing.summary.failures().to_string();
    Ok(([(METADATA_FAILURES_HEADER, failures)], Json(listing.records)))
}

/// Diagnostics handler - always returns 200.
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsReport> {
    Json(conservation::get_diagnostics(&state.client, state.started_at).await)
}
