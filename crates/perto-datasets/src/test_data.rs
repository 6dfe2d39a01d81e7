//! Shared fixtures for tests across the workspace.
//!
//! The coordinates are real São Paulo street-market locations plus a Rio de
//! Janeiro outlier, so distance assertions in the search tests line up with
//! geography a reviewer can check.

use crate::model::LocatedEntity;

/// Praça Benedito Calixto, São Paulo.
pub const BENEDITO_CALIXTO: (f64, f64) = (-23.5505, -46.6333);
/// One block away from [`BENEDITO_CALIXTO`], roughly 15 m.
pub const BENEDITO_NEIGHBOR: (f64, f64) = (-23.5506, -46.6334);
/// Centro, Rio de Janeiro, ~360 km from São Paulo.
pub const RIO_CENTRO: (f64, f64) = (-22.9068, -43.1729);

/// Five records covering the interesting cases: two close markets, one far
/// market, one inactive, one never geocoded.
#[must_use]
pub fn sample_markets() -> Vec<LocatedEntity> {
    vec![
        LocatedEntity::new(1)
            .located_at(BENEDITO_CALIXTO.0, BENEDITO_CALIXTO.1)
            .with_field("name", "Feira Benedito Calixto")
            .with_field("category", "street_market")
            .with_field("weekday", "saturday"),
        LocatedEntity::new(2)
            .located_at(BENEDITO_NEIGHBOR.0, BENEDITO_NEIGHBOR.1)
            .with_field("name", "Feira da Vila")
            .with_field("category", "street_market")
            .with_field("weekday", "sunday"),
        LocatedEntity::new(3)
            .located_at(RIO_CENTRO.0, RIO_CENTRO.1)
            .with_field("name", "Feira do Centro (Rio)")
            .with_field("category", "street_market"),
        LocatedEntity::new(4)
            .located_at(BENEDITO_CALIXTO.0, BENEDITO_CALIXTO.1)
            .inactive()
            .with_field("name", "Feira desativada"),
        LocatedEntity::new(5)
            .with_field("name", "Feira sem geocodificação")
            .with_field("address", "Rua Augusta, 1500, São Paulo")
            .with_field("postal_code", "01304-001"),
    ]
}

/// The same dataset as raw JSON, as a municipal export would ship it:
/// `lat`/`lng` field names, `active` omitted where true.
#[must_use]
pub fn sample_dataset_json() -> String {
    r#"[
        {"id": 1, "lat": -23.5505, "lng": -46.6333, "name": "Feira Benedito Calixto", "category": "street_market", "weekday": "saturday"},
        {"id": 2, "lat": -23.5506, "lng": -46.6334, "name": "Feira da Vila", "category": "street_market", "weekday": "sunday"},
        {"id": 3, "lat": -22.9068, "lng": -43.1729, "name": "Feira do Centro (Rio)", "category": "street_market"},
        {"id": 4, "lat": -23.5505, "lng": -46.6333, "active": false, "name": "Feira desativada"},
        {"id": 5, "name": "Feira sem geocodificação", "address": "Rua Augusta, 1500, São Paulo", "postal_code": "01304-001"}
    ]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{DatasetSource, load_entities};

    #[test]
    fn test_json_fixture_matches_struct_fixture() {
        let (from_json, report) =
            load_entities(&DatasetSource::Inline(sample_dataset_json())).unwrap();
        let built = sample_markets();

        assert_eq!(report.total, built.len());
        for (a, b) in from_json.iter().zip(&built) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.latitude, b.latitude);
            assert_eq!(a.longitude, b.longitude);
            assert_eq!(a.active, b.active);
        }
    }
}
