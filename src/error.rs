//! Unified error types for the conservation service.

use thiserror::Error;

use crate::upstream::Upstream;

/// Unified error type for process-level failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics exporter installation error.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to one of the upstream APIs.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The request never produced a readable response (DNS, connect, timeout, body read).
    #[error("{upstream} request to {url} failed: {source}")]
    Transport {
        /// Which upstream was called.
        upstream: Upstream,
        /// The requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not decode into the expected shape.
    #[error("{upstream} response from {url} did not decode: {source}")]
    Decode {
        /// Which upstream was called.
        upstream: Upstream,
        /// The requested URL.
        url: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// Whether this is a transport-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Transport { .. })
    }

    /// Whether the transport failure was caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            UpstreamError::Transport { source, .. } => source.is_timeout(),
            UpstreamError::Decode { .. } => false,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Transport { .. } => "transport",
            UpstreamError::Decode { .. } => "decode",
        }
    }
}

/// Species lookup errors.
#[derive(Error, Debug)]
pub enum SpeciesError {
    /// The taxonomy record could not be obtained.
    #[error("species {key} lookup failed: {source}")]
    Taxonomy {
        /// Requested species key.
        key: u64,
        /// Upstream failure.
        #[source]
        source: UpstreamError,
    },
}

impl SpeciesError {
    /// The underlying upstream failure.
    pub fn upstream(&self) -> &UpstreamError {
        match self {
            SpeciesError::Taxonomy { source, .. } => source,
        }
    }
}

/// Country aggregation errors.
#[derive(Error, Debug)]
pub enum CountryError {
    /// The occurrence search could not be obtained.
    #[error("occurrence search for {country} failed: {source}")]
    Search {
        /// Requested country code.
        country: String,
        /// Upstream failure.
        #[source]
        source: UpstreamError,
    },
}

impl CountryError {
    /// The underlying upstream failure.
    pub fn upstream(&self) -> &UpstreamError {
        match self {
            CountryError::Search { source, .. } => source,
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> UpstreamError {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        UpstreamError::Decode {
            upstream: Upstream::Gbif,
            url: "http://localhost/species/1".to_string(),
            source,
        }
    }

    #[test]
    fn decode_error_is_not_transport() {
        let err = decode_error();
        assert!(!err.is_transport());
        assert!(!err.is_timeout());
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn decode_error_message_names_upstream_and_url() {
        let msg = decode_error().to_string();
        assert!(msg.contains("gbif"));
        assert!(msg.contains("http://localhost/species/1"));
    }

    #[test]
    fn species_error_exposes_upstream() {
        let err = SpeciesError::Taxonomy {
            key: 1,
            source: decode_error(),
        };
        assert_eq!(err.upstream().kind(), "decode");
    }
}
