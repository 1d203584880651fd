//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port. Required, there is no default.
    pub port: u16,

    // === Upstream APIs ===
    /// Species/occurrence API base URL.
    #[serde(default = "default_gbif_url")]
    pub gbif_base_url: String,

    /// Country metadata API base URL.
    #[serde(default = "default_rest_countries_url")]
    pub rest_countries_base_url: String,

    /// Outbound request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Outbound connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub http_connect_timeout_ms: u64,

    /// Maximum country metadata fetches in flight per request.
    #[serde(default = "default_country_lookup_concurrency")]
    pub country_lookup_concurrency: usize,

    // === Observability ===
    /// Port for the Prometheus exporter. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_gbif_url() -> String {
    "https://api.gbif.org/v1".to_string()
}

fn default_rest_countries_url() -> String {
    "https://restcountries.com/v2".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_http_connect_timeout_ms() -> u64 {
    2_000
}

fn default_country_lookup_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a config with defaults for everything but the port and the two
    /// upstream base URLs.
    pub fn with_upstreams(port: u16, gbif_base_url: &str, rest_countries_base_url: &str) -> Self {
        Self {
            port,
            gbif_base_url: gbif_base_url.to_string(),
            rest_countries_base_url: rest_countries_base_url.to_string(),
            http_timeout_ms: default_http_timeout_ms(),
            http_connect_timeout_ms: default_http_connect_timeout_ms(),
            country_lookup_concurrency: default_country_lookup_concurrency(),
            metrics_port: None,
            rust_log: default_log_level(),
            log_format: default_log_format(),
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        validate_base_url("GBIF_BASE_URL", &self.gbif_base_url)?;
        validate_base_url("REST_COUNTRIES_BASE_URL", &self.rest_countries_base_url)?;

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.http_connect_timeout_ms == 0 {
            return Err("HTTP_CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.country_lookup_concurrency == 0 {
            return Err("COUNTRY_LOOKUP_CONCURRENCY must be at least 1".to_string());
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err("LOG_FORMAT must be \"text\" or \"json\"".to_string());
        }

        Ok(())
    }

    /// Whether logs should be emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

fn validate_base_url(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} is required", name));
    }

    let parsed = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("{} must use http or https", name));
    }

    Ok(())
}
