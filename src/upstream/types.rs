//! Wire types shared by the upstream APIs and the public endpoints.
//!
//! Upstream responses are decoded leniently: a missing field takes its zero
//! value, a field of the wrong type is a decode error.

use serde::{Deserialize, Serialize};

/// Taxonomy of a single species, merged with its display year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeciesRecord {
    /// Species key.
    #[serde(rename = "speciesKey")]
    pub key: u64,
    /// Kingdom name.
    pub kingdom: String,
    /// Phylum name.
    pub phylum: String,
    /// Order name.
    pub order: String,
    /// Family name.
    pub family: String,
    /// Genus name.
    pub genus: String,
    /// Full scientific name including authorship.
    pub scientific_name: String,
    /// Canonical name without authorship.
    pub canonical_name: String,
    /// Display year derived from the name usage resource.
    pub year: String,
}

/// Year information from the `/species/{key}/name` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YearInfo {
    /// Best-guess publication year range.
    #[serde(rename = "bracketYear", alias = "bracketyear")]
    pub bracket_year: String,
    /// Plain publication year.
    pub year: String,
}

impl YearInfo {
    /// Display year: the bracket year when present, else the plain year.
    pub fn display_year(&self) -> Option<&str> {
        if !self.bracket_year.is_empty() {
            Some(self.bracket_year.as_str())
        } else if !self.year.is_empty() {
            Some(self.year.as_str())
        } else {
            None
        }
    }
}

/// One observed occurrence of a species in a country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OccurrenceRecord {
    /// Country code reported by the occurrence.
    pub country_code: String,
    /// Country display name, empty until metadata resolves.
    pub country_name: String,
    /// Country flag URL, empty until metadata resolves.
    pub country_flag: String,
    /// Species name.
    pub species: String,
    /// Species key.
    pub species_key: u64,
}

impl OccurrenceRecord {
    /// Apply resolved country metadata. Name and flag are set together.
    pub fn apply_metadata(&mut self, metadata: CountryMetadata) {
        self.country_name = metadata.name;
        self.country_flag = metadata.flag;
    }

    /// Whether country metadata has been merged into this record.
    pub fn is_enriched(&self) -> bool {
        !self.country_name.is_empty() && !self.country_flag.is_empty()
    }
}

/// Response of `/occurrence/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OccurrenceSearchResult {
    /// Offset of the first result.
    pub offset: u64,
    /// Page size applied by the upstream.
    pub limit: u64,
    /// Whether this page is the last.
    pub end_of_records: bool,
    /// Total matching occurrences.
    pub count: u64,
    /// Occurrences in upstream order.
    pub results: Vec<OccurrenceRecord>,
    /// Facet labels.
    pub facets: Vec<String>,
}

/// Response of `/alpha/{code}` on the country API.
///
/// Name and flag are required; a body missing either does not decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMetadata {
    /// Flag image URL.
    pub flag: String,
    /// Country display name.
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    #[serde(rename = "alpha2Code", default)]
    pub alpha2_code: String,
}

impl CountryMetadata {
    /// Whether both name and flag are present.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.flag.is_empty()
    }
}
