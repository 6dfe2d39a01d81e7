//! Data layer for the Perto workspace.
//!
//! This crate owns everything that touches dataset records before the search
//! engine sees them: the entity model, JSON ingestion with one-time
//! coordinate normalization, and the checkpoint store that lets backfill
//! jobs resume after an interruption.
//!
//! Coordinates are normalized exactly once, at ingestion: they are rounded
//! to a fixed decimal-degree precision and out-of-range values are dropped
//! to `None`. The query path downstream never re-normalizes.

mod checkpoint;
pub mod error;
mod ingest;
mod model;
pub mod test_data;

pub use checkpoint::BackfillCheckpoint;
pub use error::{DataError, Result};
pub use ingest::{
    DEFAULT_PRECISION, DatasetSource, IngestReport, load_entities, load_entities_with_precision,
};
pub use model::{Coordinates, EntityId, LocatedEntity};
