//! Conservation API.
//!
//! A small HTTP service that reshapes GBIF species and occurrence data,
//! enriching occurrences with country names and flags from REST Countries.
//!
//! # Endpoints
//!
//! ```text
//! GET /conservation/v1/species/{speciesKey}
//! GET /conservation/v1/country/{countryIdentifier}?limit={n}
//! GET /conservation/v1/diag/
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`upstream`]: Upstream API client and wire types
//! - [`conservation`]: Species, country and diagnostics lookups
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod conservation;
pub mod error;
pub mod metrics;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
