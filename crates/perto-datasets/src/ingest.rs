//! Dataset loading and one-time coordinate normalization.
//!
//! The original municipal datasets were geocoded by several independent
//! batch scripts that disagreed on rounding precision. Normalization
//! therefore happens exactly once, here: coordinates are rounded to a fixed
//! decimal-degree precision and out-of-range or non-finite values are
//! dropped to `None`. A record with bad coordinates stays in the dataset as
//! an unlocated entity; it is never an error.

use std::{collections::HashSet, fs, path::PathBuf};

use tracing::{info, instrument, warn};

use crate::{
    error::{DataError, Result},
    model::{Coordinates, LocatedEntity},
};

/// Decimal-degree precision stored coordinates are rounded to.
pub const DEFAULT_PRECISION: u32 = 6;

/// Where a dataset comes from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// A JSON file on disk containing an array of entity records.
    Path(PathBuf),
    /// Raw JSON text, useful for embedded datasets and tests.
    Inline(String),
}

impl DatasetSource {
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    fn read(&self) -> Result<String> {
        match self {
            Self::Path(path) => Ok(fs::read_to_string(path)?),
            Self::Inline(raw) => Ok(raw.clone()),
        }
    }
}

/// Counters from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records kept after duplicate removal.
    pub total: usize,
    /// Records with valid coordinates after normalization.
    pub located: usize,
    /// Records whose coordinates changed when rounded.
    pub normalized: usize,
    /// Records whose coordinates were out of range and dropped to `None`.
    pub dropped_out_of_range: usize,
    /// Earlier occurrences removed because a later record had the same id.
    pub duplicate_ids: usize,
}

/// Load a dataset and normalize it at [`DEFAULT_PRECISION`].
#[instrument(name = "Load dataset", skip_all, level = "info")]
pub fn load_entities(source: &DatasetSource) -> Result<(Vec<LocatedEntity>, IngestReport)> {
    load_entities_with_precision(source, DEFAULT_PRECISION)
}

/// Load a dataset, rounding stored coordinates to `precision` decimal
/// degrees. Later records win when ids collide.
pub fn load_entities_with_precision(
    source: &DatasetSource,
    precision: u32,
) -> Result<(Vec<LocatedEntity>, IngestReport)> {
    let raw = source.read()?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    if !value.is_array() {
        return Err(DataError::NotAnArray);
    }
    let entities: Vec<LocatedEntity> = serde_json::from_value(value)?;

    let mut report = IngestReport::default();

    // Walk backwards so the last occurrence of a duplicated id is the one
    // that survives.
    let mut seen = HashSet::new();
    let mut entities: Vec<LocatedEntity> = entities
        .into_iter()
        .rev()
        .filter(|entity| {
            let fresh = seen.insert(entity.id.clone());
            if !fresh {
                warn!(id = %entity.id, "duplicate id, keeping the later record");
                report.duplicate_ids += 1;
            }
            fresh
        })
        .collect();
    entities.reverse();
    report.total = entities.len();

    for entity in &mut entities {
        promote_coordinate_aliases(entity);
        let (Some(lat), Some(lng)) = (entity.latitude, entity.longitude) else {
            continue;
        };
        let coords = Coordinates::new(lat, lng);
        if coords.in_range() {
            let rounded = coords.rounded(precision);
            if rounded != coords {
                report.normalized += 1;
            }
            entity.set_location(rounded);
            report.located += 1;
        } else {
            warn!(id = %entity.id, lat, lng, "out-of-range coordinates dropped");
            entity.latitude = None;
            entity.longitude = None;
            report.dropped_out_of_range += 1;
        }
    }

    info!(
        total = report.total,
        located = report.located,
        normalized = report.normalized,
        dropped = report.dropped_out_of_range,
        duplicates = report.duplicate_ids,
        "dataset loaded"
    );
    Ok((entities, report))
}

/// Accept the abbreviated coordinate field names (`lat`, `lng`, `lon`) some
/// municipal exports use. The abbreviated keys land in `extra` during
/// deserialization; move them onto the canonical fields and drop them so
/// the record serializes back out with one spelling.
fn promote_coordinate_aliases(entity: &mut LocatedEntity) {
    let lat = entity.extra.remove("lat");
    let lng = entity
        .extra
        .remove("lng")
        .or_else(|| entity.extra.remove("lon"));
    if entity.latitude.is_none() {
        entity.latitude = lat.as_ref().and_then(serde_json::Value::as_f64);
    }
    if entity.longitude.is_none() {
        entity.longitude = lng.as_ref().and_then(serde_json::Value::as_f64);
    }
}
