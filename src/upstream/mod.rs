//! Upstream API access.
//!
//! This module handles:
//! - The GBIF and REST Countries wire types
//! - The shared HTTP client that fetches and decodes them

pub mod client;
pub mod types;

pub use client::{Upstream, UpstreamClient};
pub use types::{
    CountryMetadata, OccurrenceRecord, OccurrenceSearchResult, SpeciesRecord, YearInfo,
};
