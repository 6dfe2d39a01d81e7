//! The proximity search engine.
//!
//! A pure, synchronous computation: given a reference point and a candidate
//! set, return the searchable entities within a radius, ordered by
//! ascending great-circle distance. Invalid *caller* arguments (reference
//! point, radius) fail fast; invalid *entity* data (missing or out-of-range
//! coordinates, inactive records) is a routine data-quality condition and
//! is silently excluded, so one bad record never aborts a query.

use perto_datasets::{Coordinates, LocatedEntity};
use serde::Serialize;

mod distance;
pub mod filter;

pub use distance::{EARTH_RADIUS_METERS, haversine_meters};
pub use error::SearchError;
use error::Result;

/// A searchable entity annotated with its distance from the reference
/// point of one query. Ephemeral and recomputed per query, never stored.
///
/// Serializes with the entity's own fields flattened next to
/// `distance_meters`, which is the shape an HTTP layer would hand to a map
/// client.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    #[serde(flatten)]
    pub entity: &'a LocatedEntity,
    pub distance_meters: f64,
}

/// Parameters of one proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyConfig {
    /// Maximum great-circle distance in meters, inclusive.
    pub radius_meters: f64,
    /// Optional cap on the number of results, applied after sorting.
    pub limit: Option<usize>,
}

impl NearbyConfig {
    #[must_use]
    pub const fn new(radius_meters: f64) -> Self {
        Self {
            radius_meters,
            limit: None,
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Find the searchable entities within `radius_meters` of the reference
/// point, ordered by ascending distance.
///
/// Entities at exactly `radius_meters` are included. Ties in distance keep
/// their input order. An empty or fully-unlocated input yields an empty
/// vec, never an error.
///
/// # Errors
///
/// [`SearchError::InvalidCoordinate`] when the reference point is
/// non-finite or out of range, [`SearchError::InvalidRadius`] when the
/// radius is non-positive or non-finite. Both are checked before any work.
pub fn find_nearby<'a, I>(
    entities: I,
    ref_latitude: f64,
    ref_longitude: f64,
    radius_meters: f64,
    limit: Option<usize>,
) -> Result<Vec<SearchResult<'a>>>
where
    I: IntoIterator<Item = &'a LocatedEntity>,
{
    find_nearby_filtered(
        entities,
        ref_latitude,
        ref_longitude,
        radius_meters,
        limit,
        |_| true,
    )
}

/// [`find_nearby`] with a pre-filter predicate applied before any distance
/// is computed. Category filtering (facility type, weekday) belongs here,
/// not inside the distance engine.
pub fn find_nearby_filtered<'a, I, F>(
    entities: I,
    ref_latitude: f64,
    ref_longitude: f64,
    radius_meters: f64,
    limit: Option<usize>,
    pre_filter: F,
) -> Result<Vec<SearchResult<'a>>>
where
    I: IntoIterator<Item = &'a LocatedEntity>,
    F: Fn(&LocatedEntity) -> bool,
{
    let origin = Coordinates::new(ref_latitude, ref_longitude);
    if !origin.in_range() {
        return Err(SearchError::InvalidCoordinate {
            latitude: ref_latitude,
            longitude: ref_longitude,
        });
    }
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return Err(SearchError::InvalidRadius(radius_meters));
    }

    let mut results: Vec<SearchResult<'a>> = entities
        .into_iter()
        .filter(|&entity| pre_filter(entity))
        .filter_map(|entity| {
            let location = entity.location()?;
            let distance_meters = haversine_meters(origin, location);
            (distance_meters <= radius_meters).then_some(SearchResult {
                entity,
                distance_meters,
            })
        })
        .collect();

    // sort_by is stable, so equal distances keep input order. total_cmp is
    // safe here: the searchable invariant already rejected non-finite
    // coordinates, and haversine never returns NaN.
    results.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

    if let Some(limit) = limit {
        results.truncate(limit);
    }
    Ok(results)
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, Copy, PartialEq)]
    pub enum SearchError {
        #[error("invalid reference coordinate: latitude {latitude}, longitude {longitude}")]
        InvalidCoordinate { latitude: f64, longitude: f64 },
        #[error("invalid radius {0} m: must be positive and finite")]
        InvalidRadius(f64),
    }

    pub type Result<T> = std::result::Result<T, SearchError>;
}

#[cfg(test)]
mod tests {
    use perto_datasets::test_data::{self, BENEDITO_CALIXTO};

    use super::*;

    fn markets() -> Vec<LocatedEntity> {
        test_data::sample_markets()
    }

    #[test]
    fn test_entity_at_reference_point_has_zero_distance() {
        let markets = markets();
        let results = find_nearby(
            &markets,
            BENEDITO_CALIXTO.0,
            BENEDITO_CALIXTO.1,
            5_000.0,
            None,
        )
        .unwrap();

        assert_eq!(results[0].entity.field_str("name"), Some("Feira Benedito Calixto"));
        assert!(results[0].distance_meters.abs() < 1e-9);
    }

    #[test]
    fn test_sao_paulo_scenario_excludes_rio() {
        let markets = markets();
        let results = find_nearby(
            &markets,
            BENEDITO_CALIXTO.0,
            BENEDITO_CALIXTO.1,
            5_000.0,
            None,
        )
        .unwrap();

        assert_eq!(results.len(), 2, "only the two São Paulo markets match");
        assert!(results[0].distance_meters.abs() < 1e-9);
        assert!(
            (10.0..20.0).contains(&results[1].distance_meters),
            "neighbor market should be ~15 m away, got {}",
            results[1].distance_meters
        );
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let entity = LocatedEntity::new(1).located_at(0.0, 0.001);
        let entities = vec![entity];
        let exact = haversine_meters(
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 0.001),
        );

        let at_boundary = find_nearby(&entities, 0.0, 0.0, exact, None).unwrap();
        assert_eq!(at_boundary.len(), 1, "entity exactly at the radius is included");

        let just_inside_radius = find_nearby(&entities, 0.0, 0.0, exact - 0.01, None).unwrap();
        assert!(just_inside_radius.is_empty(), "entity past the radius is excluded");
    }

    #[test]
    fn test_results_are_ordered_by_ascending_distance() {
        let entities: Vec<LocatedEntity> = vec![
            LocatedEntity::new(1).located_at(0.0, 0.003),
            LocatedEntity::new(2).located_at(0.0, 0.001),
            LocatedEntity::new(3).located_at(0.0, 0.002),
        ];

        let results = find_nearby(&entities, 0.0, 0.0, 10_000.0, None).unwrap();
        for window in results.windows(2) {
            assert!(window[0].distance_meters <= window[1].distance_meters);
        }
        assert_eq!(results[0].entity.id, 2.into());
        assert_eq!(results[2].entity.id, 1.into());
    }

    #[test]
    fn test_equal_distances_keep_input_order() {
        // Mirror points east and west of the origin along the equator are
        // exactly equidistant.
        let entities = vec![
            LocatedEntity::new("east").located_at(0.0, 0.001),
            LocatedEntity::new("west").located_at(0.0, -0.001),
        ];

        let results = find_nearby(&entities, 0.0, 0.0, 1_000.0, None).unwrap();
        assert_eq!(results[0].distance_meters, results[1].distance_meters);
        assert_eq!(results[0].entity.id, "east".into());
        assert_eq!(results[1].entity.id, "west".into());
    }

    #[test]
    fn test_inactive_and_unlocated_entities_never_match() {
        let markets = markets();
        let results = find_nearby(
            &markets,
            BENEDITO_CALIXTO.0,
            BENEDITO_CALIXTO.1,
            // Large enough to cover the planet.
            25_000_000.0,
            None,
        )
        .unwrap();

        for hit in &results {
            assert!(hit.entity.active);
            assert!(hit.entity.has_location());
        }
        assert_eq!(results.len(), 3, "active located markets only");
    }

    #[test]
    fn test_out_of_range_entity_is_excluded_not_an_error() {
        let entities = vec![
            LocatedEntity::new(1).located_at(95.0, 0.0),
            LocatedEntity::new(2).located_at(0.0, 0.0),
        ];

        let results = find_nearby(&entities, 0.0, 0.0, 1_000.0, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity.id, 2.into());
    }

    #[test]
    fn test_invalid_reference_coordinates_are_rejected() {
        let markets = markets();

        let err = find_nearby(&markets, 91.0, 0.0, 1_000.0, None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidCoordinate { .. }));

        let err = find_nearby(&markets, 0.0, -180.5, 1_000.0, None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidCoordinate { .. }));

        let err = find_nearby(&markets, f64::NAN, 0.0, 1_000.0, None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        let markets = markets();

        let err = find_nearby(&markets, 0.0, 0.0, -5.0, None).unwrap_err();
        assert_eq!(err, SearchError::InvalidRadius(-5.0));

        let err = find_nearby(&markets, 0.0, 0.0, 0.0, None).unwrap_err();
        assert_eq!(err, SearchError::InvalidRadius(0.0));

        let err = find_nearby(&markets, 0.0, 0.0, f64::INFINITY, None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidRadius(_)));
    }

    #[test]
    fn test_limit_truncates_after_sorting() {
        let entities: Vec<LocatedEntity> = (1..=5i64)
            .map(|i| LocatedEntity::new(i).located_at(0.0, (i as f64) * 0.001))
            .collect();

        let results = find_nearby(&entities, 0.0, 0.0, 10_000.0, Some(2)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entity.id, 1.into());
        assert_eq!(results[1].entity.id, 2.into());
    }

    #[test]
    fn test_empty_input_returns_empty_results() {
        let entities: Vec<LocatedEntity> = Vec::new();
        let results = find_nearby(&entities, 0.0, 0.0, 1_000.0, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_pre_filter_runs_before_distance() {
        let markets = markets();
        let results = find_nearby_filtered(
            &markets,
            BENEDITO_CALIXTO.0,
            BENEDITO_CALIXTO.1,
            5_000.0,
            None,
            |entity| entity.field_str("weekday") == Some("sunday"),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity.field_str("name"), Some("Feira da Vila"));
    }

    #[test]
    fn test_search_result_serializes_flat() {
        let markets = markets();
        let results = find_nearby(
            &markets,
            BENEDITO_CALIXTO.0,
            BENEDITO_CALIXTO.1,
            5_000.0,
            Some(1),
        )
        .unwrap();

        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["name"], "Feira Benedito Calixto");
        assert_eq!(json["id"], 1);
        assert!(json["distance_meters"].as_f64().unwrap().abs() < 1e-9);
    }
}
