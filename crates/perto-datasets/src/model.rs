use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable identifier of a dataset record.
///
/// Municipal datasets are inconsistent about id types: street-market
/// records carry numeric ids while health-facility records use registry
/// code strings. Both shapes deserialize transparently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A pair of decimal-degree coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both axes finite and within `[-90, 90]` / `[-180, 180]`.
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Round both axes to `precision` decimal degrees.
    #[must_use]
    pub fn rounded(&self, precision: u32) -> Self {
        let factor = 10f64.powi(precision as i32);
        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A dataset record with a known or unknown position.
///
/// The descriptive fields the search engine never interprets (name,
/// address, schedule, category) are carried in `extra` and serialized back
/// out unchanged. `latitude`/`longitude` are optional because real
/// municipal datasets are only partially geocoded; an absent pair means
/// "unlocated", which is routine and never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatedEntity {
    pub id: EntityId,
    /// Latitude in decimal degrees, if geocoded. Ingestion also accepts the
    /// abbreviated `lat`/`lng` field names some municipal exports use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if geocoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Inactive records are excluded from search regardless of position.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Opaque descriptive fields, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl LocatedEntity {
    /// Create an active, unlocated entity with no descriptive fields.
    #[must_use]
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
            active: true,
            extra: Map::new(),
        }
    }

    /// Builder-style: set both coordinates.
    #[must_use]
    pub fn located_at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Builder-style: mark the record inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Builder-style: attach a descriptive field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Coordinates usable for proximity search.
    ///
    /// `None` unless the record is active and both axes are present, finite
    /// and in range. This is the single place the searchable invariant is
    /// enforced.
    #[must_use]
    pub fn location(&self) -> Option<Coordinates> {
        if !self.active {
            return None;
        }
        let coords = Coordinates::new(self.latitude?, self.longitude?);
        coords.in_range().then_some(coords)
    }

    /// True when both coordinate axes are present, regardless of validity.
    #[must_use]
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Overwrite both coordinate axes.
    pub fn set_location(&mut self, coords: Coordinates) {
        self.latitude = Some(coords.latitude);
        self.longitude = Some(coords.longitude);
    }

    /// String-valued descriptive field, if present.
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

impl fmt::Display for LocatedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocatedEntity {{ id: {}, name: \"{}\" }}",
            self.id,
            self.field_str("name").unwrap_or("?")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let numeric: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric, EntityId::Number(42));

        let text: EntityId = serde_json::from_str("\"feira-0042\"").unwrap();
        assert_eq!(text, EntityId::Text("feira-0042".to_string()));
    }

    #[test]
    fn test_entity_deserializes_with_defaults() {
        let entity: LocatedEntity = serde_json::from_str(
            r#"{"id": 7, "latitude": -23.5505, "longitude": -46.6333, "name": "Feira da Kantuta"}"#,
        )
        .unwrap();

        assert_eq!(entity.latitude, Some(-23.5505));
        assert_eq!(entity.longitude, Some(-46.6333));
        assert!(entity.active, "active should default to true");
        assert_eq!(entity.field_str("name"), Some("Feira da Kantuta"));
    }

    #[test]
    fn test_extra_fields_pass_through_unchanged() {
        let raw = r#"{"id":"m1","latitude":-23.5,"longitude":-46.6,"active":true,"address":"Rua X, 10","weekday":"sunday"}"#;
        let entity: LocatedEntity = serde_json::from_str(raw).unwrap();
        let reserialized = serde_json::to_value(&entity).unwrap();

        assert_eq!(reserialized["address"], "Rua X, 10");
        assert_eq!(reserialized["weekday"], "sunday");
    }

    #[test]
    fn test_location_requires_active_and_valid_coordinates() {
        let located = LocatedEntity::new(1).located_at(-23.5505, -46.6333);
        assert!(located.location().is_some());

        let inactive = LocatedEntity::new(2)
            .located_at(-23.5505, -46.6333)
            .inactive();
        assert!(inactive.location().is_none());

        let unlocated = LocatedEntity::new(3);
        assert!(unlocated.location().is_none());

        let half_located = LocatedEntity {
            longitude: None,
            ..LocatedEntity::new(4).located_at(-23.5505, -46.6333)
        };
        assert!(half_located.location().is_none());

        let out_of_range = LocatedEntity::new(5).located_at(90.5, 0.0);
        assert!(out_of_range.location().is_none());

        let not_finite = LocatedEntity::new(6).located_at(f64::NAN, 0.0);
        assert!(not_finite.location().is_none());
    }

    #[test]
    fn test_coordinates_rounding() {
        let coords = Coordinates::new(-23.55051234567, -46.63329876543);
        let rounded = coords.rounded(6);
        assert_eq!(rounded.latitude, -23.550512);
        assert_eq!(rounded.longitude, -46.633299);

        // Already at the target precision, rounding is a no-op.
        assert_eq!(rounded.rounded(6), rounded);
    }

    #[test]
    fn test_coordinates_range_check() {
        assert!(Coordinates::new(-90.0, 180.0).in_range());
        assert!(Coordinates::new(90.0, -180.0).in_range());
        assert!(!Coordinates::new(90.001, 0.0).in_range());
        assert!(!Coordinates::new(0.0, -180.001).in_range());
        assert!(!Coordinates::new(f64::INFINITY, 0.0).in_range());
    }
}
