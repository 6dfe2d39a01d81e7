//! Perto - Proximity Search and Geocoding Backfill
//!
//! Perto finds the public services nearest to a point: given a reference
//! latitude/longitude and a municipal dataset (street markets, health
//! facilities), it returns the active, geocoded entities within a radius,
//! ordered by ascending great-circle distance. A companion backfill
//! pipeline fills in missing coordinates offline through pluggable
//! geocoding providers.
//!
//! # Quick Start
//!
//! ```rust
//! use perto::{NearbyConfig, ProximitySearcher};
//!
//! let searcher = ProximitySearcher::new(perto::datasets::test_data::sample_markets());
//!
//! // Everything within 5 km of Praça Benedito Calixto, closest first.
//! let results = searcher.search(-23.5505, -46.6333, 5_000.0)?;
//! for hit in &results {
//!     println!("{} at {:.0} m", hit.entity, hit.distance_meters);
//! }
//!
//! // The same query, capped at ten results.
//! let config = NearbyConfig::new(5_000.0).with_limit(10);
//! let results = searcher.search_with_config(-23.5505, -46.6333, &config)?;
//! # let _ = results;
//! # Ok::<(), perto::error::PertoError>(())
//! ```
//!
//! # Design
//!
//! - **Pure search core**: [`find_nearby`] is a synchronous, side-effect
//!   free function. Invalid caller arguments fail fast; partially-geocoded
//!   records are silently excluded because that is the routine state of
//!   real municipal data.
//! - **Filters compose outside the engine**: category predicates
//!   ([`filter`]) run before any distance is computed.
//! - **Backfill is offline**: the [`backfill`] pipeline (behind the
//!   default-on `backfill` feature) enriches a dataset once, with
//!   checkpointed resume; the query path never performs I/O.

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

#[cfg(feature = "backfill")]
pub mod backfill;
mod config;
mod core;
pub mod error;
mod search;

pub use core::ProximitySearcher;

#[cfg(feature = "backfill")]
pub use backfill::{
    BackfillPipeline, BackfillReport, GeocodeFuture, GeocodeQuery, Geocoder, providers,
};
pub use config::{BackfillConfig, BackfillConfigBuilder};
pub use perto_datasets as datasets;
pub use perto_datasets::{
    BackfillCheckpoint, Coordinates, DatasetSource, EntityId, IngestReport, LocatedEntity,
};
pub use search::{
    EARTH_RADIUS_METERS, NearbyConfig, SearchError, SearchResult, filter, find_nearby,
    find_nearby_filtered, haversine_meters,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Perto library.
///
/// Sets up structured logging with configurable levels and filtering. Call
/// this once at the start of your application; later calls are no-ops.
///
/// ```rust
/// use perto::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), perto::error::PertoError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::PertoError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
