//! Conservation lookups built on the upstream APIs.
//!
//! This module handles:
//! - Species taxonomy lookup with display year
//! - Per-country occurrence listing enriched with country metadata
//! - Upstream diagnostics

pub mod country;
pub mod diagnostics;
pub mod species;

pub use country::{get_country_species, CountrySpecies, EnrichmentSummary, MetadataOutcome};
pub use diagnostics::{get_diagnostics, DiagnosticsReport, SERVICE_VERSION};
pub use species::get_species;
