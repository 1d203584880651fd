//! Species taxonomy lookup.

use tracing::{debug, instrument, warn};

use crate::error::SpeciesError;
use crate::upstream::{SpeciesRecord, UpstreamClient, YearInfo};

/// Fetch a species' taxonomy and merge in its display year.
///
/// Only the taxonomy fetch is required. A failure to fetch or decode the name
/// usage is logged and the record is returned without a year.
#[instrument(skip(client))]
pub async fn get_species(client: &UpstreamClient, key: u64) -> Result<SpeciesRecord, SpeciesError> {
    let mut species = client
        .species(key)
        .await
        .map_err(|source| SpeciesError::Taxonomy { key, source })?;

    match client.species_name(key).await {
        Ok(info) => merge_year(&mut species, &info),
        Err(e) => warn!(error = %e, "Name usage unavailable, returning species without year"),
    }

    debug!(year = %species.year, "Species resolved");

    Ok(species)
}

/// Copy the display year onto the record. An empty year leaves it untouched.
pub fn merge_year(species: &mut SpeciesRecord, info: &YearInfo) {
    if let Some(year) = info.display_year() {
        species.year = year.to_string();
    }
}
