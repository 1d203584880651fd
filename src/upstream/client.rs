//! HTTP client for the species and country upstream APIs.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use strum::{Display, IntoStaticStr};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, UpstreamError};
use crate::metrics;

use super::types::{CountryMetadata, OccurrenceSearchResult, SpeciesRecord, YearInfo};

/// Fields requested from the country API.
const COUNTRY_FIELDS: &str = "flag;alpha2Code;name";

/// The upstream APIs this service depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Upstream {
    /// Species and occurrence API.
    #[strum(serialize = "gbif")]
    Gbif,
    /// Country metadata API.
    #[strum(serialize = "restcountries")]
    RestCountries,
}

/// Client for both upstream APIs.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Species API base URL, without trailing slash.
    gbif_url: String,
    /// Country API base URL, without trailing slash.
    rest_countries_url: String,
    /// Parsed country API base, for building escaped paths.
    rest_countries_base: Url,
}

impl UpstreamClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_millis(config.http_connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let rest_countries_url = config.rest_countries_base_url.trim_end_matches('/').to_string();
        let rest_countries_base = Url::parse(&rest_countries_url).map_err(|e| {
            AppError::InvalidConfig(format!("REST_COUNTRIES_BASE_URL is not a valid URL: {}", e))
        })?;

        Ok(Self {
            http,
            gbif_url: config.gbif_base_url.trim_end_matches('/').to_string(),
            rest_countries_url,
            rest_countries_base,
        })
    }

    /// Get the species API base URL.
    pub fn gbif_url(&self) -> &str {
        &self.gbif_url
    }

    /// Get the country API base URL.
    pub fn rest_countries_url(&self) -> &str {
        &self.rest_countries_url
    }

    fn base_url(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Gbif => &self.gbif_url,
            Upstream::RestCountries => &self.rest_countries_url,
        }
    }

    /// GET a URL and return the status and raw body.
    ///
    /// The status code is not inspected; only failures to obtain a response
    /// are errors.
    #[instrument(skip(self, upstream, query), fields(upstream = %upstream))]
    pub async fn fetch_bytes(
        &self,
        upstream: Upstream,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, Vec<u8>), UpstreamError> {
        let timer = metrics::timer_upstream(upstream);

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| transport_error(upstream, url, source))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| transport_error(upstream, url, source))?;

        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = timer.elapsed_ms(),
            "Upstream responded"
        );

        Ok((status, body.to_vec()))
    }

    /// GET a URL and decode its body as JSON, whatever the status code.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        upstream: Upstream,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let (status, body) = self.fetch_bytes(upstream, url, query).await?;

        serde_json::from_slice(&body).map_err(|source| {
            debug!(%status, error = %source, "Upstream body did not decode");
            let err = UpstreamError::Decode {
                upstream,
                url: url.to_string(),
                source,
            };
            metrics::inc_upstream_errors(upstream, err.kind());
            err
        })
    }

    /// Get the taxonomy record for a species.
    pub async fn species(&self, key: u64) -> Result<SpeciesRecord, UpstreamError> {
        let url = format!("{}/species/{}", self.gbif_url, key);
        self.fetch_json(Upstream::Gbif, &url, &[]).await
    }

    /// Get the name usage (year information) for a species.
    pub async fn species_name(&self, key: u64) -> Result<YearInfo, UpstreamError> {
        let url = format!("{}/species/{}/name", self.gbif_url, key);
        self.fetch_json(Upstream::Gbif, &url, &[]).await
    }

    /// Search occurrences in a country. An empty limit is passed through as-is.
    pub async fn occurrence_search(
        &self,
        country: &str,
        limit: &str,
    ) -> Result<OccurrenceSearchResult, UpstreamError> {
        let url = format!("{}/occurrence/search", self.gbif_url);
        self.fetch_json(Upstream::Gbif, &url, &[("country", country), ("limit", limit)])
            .await
    }

    /// URL of the metadata resource for a country code.
    ///
    /// The code is pushed as a single escaped path segment.
    pub fn country_metadata_url(&self, code: &str) -> Url {
        let mut url = self.rest_countries_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("alpha").push(code);
        }
        url.set_query(Some(&format!("fields={}", COUNTRY_FIELDS)));
        url
    }

    /// Get flag and display name for a country code.
    pub async fn country_metadata(&self, code: &str) -> Result<CountryMetadata, UpstreamError> {
        let url = self.country_metadata_url(code);
        self.fetch_json(Upstream::RestCountries, url.as_str(), &[]).await
    }

    /// GET an upstream's base URL and return its status line, e.g. "200 OK".
    #[instrument(skip(self))]
    pub async fn ping(&self, upstream: Upstream) -> Result<String, UpstreamError> {
        let url = format!("{}/", self.base_url(upstream));
        let (status, _) = self.fetch_bytes(upstream, &url, &[]).await?;
        Ok(status.to_string())
    }
}

fn transport_error(upstream: Upstream, url: &str, source: reqwest::Error) -> UpstreamError {
    warn!(%upstream, url, error = %source, "Upstream request failed");
    let err = UpstreamError::Transport {
        upstream,
        url: url.to_string(),
        source,
    };
    metrics::inc_upstream_errors(upstream, err.kind());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::with_upstreams(8080, "https://api.gbif.org/v1/", "https://restcountries.com/v2")
    }

    #[test]
    fn client_creation_trims_trailing_slash() {
        let client = UpstreamClient::new(&test_config()).unwrap();
        assert_eq!(client.gbif_url(), "https://api.gbif.org/v1");
        assert_eq!(client.rest_countries_url(), "https://restcountries.com/v2");
    }

    #[test]
    fn upstream_labels_are_stable() {
        assert_eq!(Upstream::Gbif.to_string(), "gbif");
        let label: &'static str = Upstream::RestCountries.into();
        assert_eq!(label, "restcountries");
    }

    #[test]
    fn country_metadata_url_keeps_base_path() {
        let client = UpstreamClient::new(&test_config()).unwrap();
        assert_eq!(
            client.country_metadata_url("NO").as_str(),
            "https://restcountries.com/v2/alpha/NO?fields=flag;alpha2Code;name"
        );
    }

    #[test]
    fn country_metadata_url_escapes_code() {
        let client = UpstreamClient::new(&test_config()).unwrap();
        let url = client.country_metadata_url("N/O?x");
        assert_eq!(url.path(), "/v2/alpha/N%2FO%3Fx");
        assert_eq!(url.query(), Some("fields=flag;alpha2Code;name"));
    }

    #[test]
    fn country_metadata_url_on_bare_host() {
        let config = Config::with_upstreams(8080, "http://127.0.0.1:9", "http://127.0.0.1:9/");
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.country_metadata_url("SE").path(), "/alpha/SE");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let config = Config::with_upstreams(8080, "http://127.0.0.1:9", "http://127.0.0.1:9");
        let client = UpstreamClient::new(&config).unwrap();

        let err = client.species(1).await.unwrap_err();
        assert!(err.is_transport());
    }
}
