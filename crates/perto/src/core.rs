//! High-level search entry point.
//!
//! [`ProximitySearcher`] owns a loaded dataset and answers proximity
//! queries against it. It never mutates the entities while searching, so a
//! single searcher can be shared read-only across concurrent callers; each
//! query allocates its own result vector.
//!
//! ```rust
//! use perto::ProximitySearcher;
//!
//! let searcher = ProximitySearcher::new(perto::datasets::test_data::sample_markets());
//! let results = searcher.search(-23.5505, -46.6333, 5_000.0)?;
//! for hit in &results {
//!     println!("{} at {:.0} m", hit.entity, hit.distance_meters);
//! }
//! # Ok::<(), perto::error::PertoError>(())
//! ```

use perto_datasets::{DatasetSource, IngestReport, LocatedEntity, load_entities};
use tracing::{info, instrument};

use crate::{
    error::Result,
    search::{NearbyConfig, SearchResult, find_nearby, find_nearby_filtered},
};

/// A proximity searcher over a loaded entity dataset.
pub struct ProximitySearcher {
    entities: Vec<LocatedEntity>,
}

impl ProximitySearcher {
    /// Wrap an already-loaded (and already-normalized) entity collection.
    #[must_use]
    pub fn new(entities: Vec<LocatedEntity>) -> Self {
        Self { entities }
    }

    /// Load, normalize and wrap a dataset. Returns the ingestion counters
    /// alongside the searcher so callers can log data-quality numbers.
    #[instrument(name = "Load searcher", skip_all, level = "info")]
    pub fn from_source(source: &DatasetSource) -> Result<(Self, IngestReport)> {
        let (entities, report) = load_entities(source)?;
        info!(
            total = report.total,
            located = report.located,
            "searcher ready"
        );
        Ok((Self::new(entities), report))
    }

    #[must_use]
    pub fn entities(&self) -> &[LocatedEntity] {
        &self.entities
    }

    /// Mutable access for enrichment steps such as the backfill pipeline.
    pub fn entities_mut(&mut self) -> &mut [LocatedEntity] {
        &mut self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All searchable entities within `radius_meters` of the reference
    /// point, closest first.
    pub fn search(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<SearchResult<'_>>> {
        Ok(find_nearby(
            &self.entities,
            latitude,
            longitude,
            radius_meters,
            None,
        )?)
    }

    /// Search with an explicit radius/limit configuration.
    pub fn search_with_config(
        &self,
        latitude: f64,
        longitude: f64,
        config: &NearbyConfig,
    ) -> Result<Vec<SearchResult<'_>>> {
        Ok(find_nearby(
            &self.entities,
            latitude,
            longitude,
            config.radius_meters,
            config.limit,
        )?)
    }

    /// Search with a pre-filter predicate applied before distance work, for
    /// category-style filtering.
    pub fn search_filtered(
        &self,
        latitude: f64,
        longitude: f64,
        config: &NearbyConfig,
        pre_filter: impl Fn(&LocatedEntity) -> bool,
    ) -> Result<Vec<SearchResult<'_>>> {
        Ok(find_nearby_filtered(
            &self.entities,
            latitude,
            longitude,
            config.radius_meters,
            config.limit,
            pre_filter,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use perto_datasets::test_data::{self, BENEDITO_CALIXTO};

    use super::*;
    use crate::search::filter;

    #[test]
    fn test_from_source_reports_ingestion() {
        let source = DatasetSource::Inline(test_data::sample_dataset_json());
        let (searcher, report) = ProximitySearcher::from_source(&source).unwrap();

        assert_eq!(searcher.len(), 5);
        assert_eq!(report.located, 4);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let searcher = ProximitySearcher::new(test_data::sample_markets());
        let results = searcher
            .search(BENEDITO_CALIXTO.0, BENEDITO_CALIXTO.1, 5_000.0)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].distance_meters < results[1].distance_meters);
    }

    #[test]
    fn test_search_with_config_respects_limit() {
        let searcher = ProximitySearcher::new(test_data::sample_markets());
        let config = NearbyConfig::new(5_000.0).with_limit(1);
        let results = searcher
            .search_with_config(BENEDITO_CALIXTO.0, BENEDITO_CALIXTO.1, &config)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].distance_meters.abs() < 1e-9);
    }

    #[test]
    fn test_search_filtered_composes_category_predicate() {
        let searcher = ProximitySearcher::new(test_data::sample_markets());
        let config = NearbyConfig::new(5_000.0);
        let results = searcher
            .search_filtered(
                BENEDITO_CALIXTO.0,
                BENEDITO_CALIXTO.1,
                &config,
                filter::field_equals("weekday", "saturday"),
            )
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity.field_str("name"), Some("Feira Benedito Calixto"));
    }

    #[test]
    fn test_invalid_arguments_surface_as_errors() {
        let searcher = ProximitySearcher::new(test_data::sample_markets());
        assert!(searcher.search(91.0, 0.0, 1_000.0).is_err());
        assert!(searcher.search(0.0, 0.0, -5.0).is_err());
    }
}
