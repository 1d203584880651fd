//! Per-country occurrence listing enriched with country metadata.
//!
//! One occurrence search is followed by one metadata lookup per result. The
//! lookups run as a bounded, ordered fan-out: outcomes come back in the same
//! order as the records and are merged by position. A failed lookup leaves
//! that record's name and flag empty; it never fails the whole listing.

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::error::{CountryError, UpstreamError};
use crate::metrics;
use crate::upstream::{CountryMetadata, OccurrenceRecord, UpstreamClient};

/// Result of one country metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutcome {
    /// Metadata decoded successfully.
    Resolved(CountryMetadata),
    /// The request never produced a response.
    FetchFailed(String),
    /// The response did not decode.
    DecodeFailed(String),
}

impl From<Result<CountryMetadata, UpstreamError>> for MetadataOutcome {
    fn from(result: Result<CountryMetadata, UpstreamError>) -> Self {
        match result {
            Ok(metadata) if metadata.is_complete() => MetadataOutcome::Resolved(metadata),
            Ok(metadata) => MetadataOutcome::DecodeFailed(format!(
                "country metadata for {:?} is missing name or flag",
                metadata.alpha2_code
            )),
            Err(e @ UpstreamError::Transport { .. }) => MetadataOutcome::FetchFailed(e.to_string()),
            Err(e @ UpstreamError::Decode { .. }) => MetadataOutcome::DecodeFailed(e.to_string()),
        }
    }
}

/// Counts of metadata lookup outcomes for one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    /// Records enriched with name and flag.
    pub resolved: usize,
    /// Records whose lookup failed at the transport level.
    pub fetch_failed: usize,
    /// Records whose lookup response did not decode.
    pub decode_failed: usize,
}

impl EnrichmentSummary {
    /// Number of records left without metadata.
    pub fn failures(&self) -> usize {
        self.fetch_failed + self.decode_failed
    }

    /// Whether every lookup succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    fn record(&mut self, outcome: &MetadataOutcome) {
        match outcome {
            MetadataOutcome::Resolved(_) => self.resolved += 1,
            MetadataOutcome::FetchFailed(_) => self.fetch_failed += 1,
            MetadataOutcome::DecodeFailed(_) => self.decode_failed += 1,
        }
    }
}

/// Occurrence records for a country, with the enrichment summary.
#[derive(Debug, Clone)]
pub struct CountrySpecies {
    /// Records in upstream order.
    pub records: Vec<OccurrenceRecord>,
    /// How the metadata lookups went.
    pub summary: EnrichmentSummary,
}

/// List occurrences in a country and enrich each with country metadata.
///
/// An absent limit is sent upstream as an empty value so the upstream picks
/// its default. At most `concurrency` metadata lookups are in flight at once.
#[instrument(skip(client))]
pub async fn get_country_species(
    client: &UpstreamClient,
    country: &str,
    limit: Option<&str>,
    concurrency: usize,
) -> Result<CountrySpecies, CountryError> {
    let mut search = client
        .occurrence_search(country, limit.unwrap_or_default())
        .await
        .map_err(|source| CountryError::Search {
            country: country.to_string(),
            source,
        })?;

    let codes: Vec<String> = search
        .results
        .iter()
        .map(|record| record.country_code.clone())
        .collect();

    let outcomes: Vec<MetadataOutcome> = stream::iter(codes)
        .map(|code| async move { client.country_metadata(&code).await })
        .buffered(concurrency.max(1))
        .map(MetadataOutcome::from)
        .collect()
        .await;

    let summary = merge_metadata(&mut search.results, outcomes);

    let enriched = search.results.iter().filter(|r| r.is_enriched()).count();
    metrics::inc_country_records_enriched(enriched as u64);
    metrics::inc_country_metadata_failures(summary.failures() as u64);

    if summary.is_clean() {
        info!(records = search.results.len(), "Country listing enriched");
    } else {
        warn!(
            records = search.results.len(),
            resolved = summary.resolved,
            fetch_failed = summary.fetch_failed,
            decode_failed = summary.decode_failed,
            "Country listing partially enriched"
        );
    }

    Ok(CountrySpecies {
        records: search.results,
        summary,
    })
}

/// Merge lookup outcomes into records by position.
///
/// Only resolved outcomes touch a record; failures are logged and counted.
pub fn merge_metadata(
    records: &mut [OccurrenceRecord],
    outcomes: Vec<MetadataOutcome>,
) -> EnrichmentSummary {
    let mut summary = EnrichmentSummary::default();

    for (record, outcome) in records.iter_mut().zip(outcomes) {
        summary.record(&outcome);
        match outcome {
            MetadataOutcome::Resolved(metadata) => record.apply_metadata(metadata),
            MetadataOutcome::FetchFailed(reason) => {
                warn!(country_code = %record.country_code, %reason, "Country metadata fetch failed");
            }
            MetadataOutcome::DecodeFailed(reason) => {
                warn!(country_code = %record.country_code, %reason, "Country metadata did not decode");
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(code: &str, species: &str) -> OccurrenceRecord {
        OccurrenceRecord {
            country_code: code.to_string(),
            species: species.to_string(),
            species_key: 1,
            ..Default::default()
        }
    }

    fn norway() -> CountryMetadata {
        CountryMetadata {
            flag: "https://flags.example/nor.svg".to_string(),
            name: "Norway".to_string(),
            alpha2_code: "NO".to_string(),
        }
    }

    #[test]
    fn merge_applies_metadata_by_position() {
        let mut records = vec![record("NO", "Picea abies"), record("NO", "Alces alces")];
        let outcomes = vec![
            MetadataOutcome::FetchFailed("connection refused".to_string()),
            MetadataOutcome::Resolved(norway()),
        ];

        let summary = merge_metadata(&mut records, outcomes);

        assert_eq!(records[0].country_name, "");
        assert_eq!(records[0].country_flag, "");
        assert_eq!(records[1].country_name, "Norway");
        assert_eq!(records[1].country_flag, "https://flags.example/nor.svg");
        assert_eq!(
            summary,
            EnrichmentSummary {
                resolved: 1,
                fetch_failed: 1,
                decode_failed: 0,
            }
        );
    }

    #[test]
    fn decode_failure_leaves_record_untouched() {
        let mut records = vec![record("NO", "Picea abies")];
        let before = records.clone();

        let summary = merge_metadata(
            &mut records,
            vec![MetadataOutcome::DecodeFailed("expected struct".to_string())],
        );

        assert_eq!(records, before);
        assert_eq!(summary.decode_failed, 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn merge_keeps_record_order() {
        let mut records = vec![record("NO", "a"), record("SE", "b"), record("DK", "c")];
        let outcomes = vec![
            MetadataOutcome::Resolved(norway()),
            MetadataOutcome::DecodeFailed("bad".to_string()),
            MetadataOutcome::Resolved(CountryMetadata {
                name: "Denmark".to_string(),
                flag: "https://flags.example/dnk.svg".to_string(),
                alpha2_code: "DK".to_string(),
            }),
        ];

        let summary = merge_metadata(&mut records, outcomes);

        let names: Vec<&str> = records.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["Norway", "", "Denmark"]);
        let species: Vec<&str> = records.iter().map(|r| r.species.as_str()).collect();
        assert_eq!(species, vec!["a", "b", "c"]);
        assert_eq!(summary.failures(), 1);
    }

    #[test]
    fn empty_listing_is_clean() {
        let summary = merge_metadata(&mut [], Vec::new());
        assert!(summary.is_clean());
        assert_eq!(summary, EnrichmentSummary::default());
    }

    #[test]
    fn decode_error_converts_to_decode_failed() {
        let source = serde_json::from_str::<CountryMetadata>(r#"{"name":1}"#).unwrap_err();
        let outcome = MetadataOutcome::from(Err(UpstreamError::Decode {
            upstream: crate::upstream::Upstream::RestCountries,
            url: "http://localhost/alpha/NO".to_string(),
            source,
        }));
        assert!(matches!(outcome, MetadataOutcome::DecodeFailed(_)));
    }

    #[test]
    fn incomplete_metadata_converts_to_decode_failed() {
        let outcome = MetadataOutcome::from(Ok(CountryMetadata {
            flag: String::new(),
            name: "Norway".to_string(),
            alpha2_code: "NO".to_string(),
        }));
        assert!(matches!(outcome, MetadataOutcome::DecodeFailed(_)));
    }

    #[test]
    fn partial_and_error_bodies_do_not_decode_as_metadata() {
        for body in [
            "[]",
            r#"{"name":"Norway","alpha2Code":"NO"}"#,
            r#"{"flag":"https://flags.example/nor.svg"}"#,
            r#"{"status":404,"message":"Not Found"}"#,
        ] {
            assert!(
                serde_json::from_str::<CountryMetadata>(body).is_err(),
                "{} should not decode",
                body
            );
        }
    }

    #[test]
    fn success_converts_to_resolved() {
        let outcome = MetadataOutcome::from(Ok(norway()));
        assert_eq!(outcome, MetadataOutcome::Resolved(norway()));
    }
}
