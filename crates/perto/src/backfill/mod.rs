//! Idempotent enrich-if-missing geocoding backfill.
//!
//! The pipeline walks a dataset and fills in coordinates for entities that
//! do not have them yet, asking a chain of pluggable [`Geocoder`] providers
//! in order. Entities that already carry coordinates are never touched, so
//! re-running the pipeline is always safe, and a checkpoint records every
//! attempted id so an interrupted run resumes where it stopped instead of
//! re-hammering the geocoding APIs.
//!
//! This is offline data preparation: the search path never calls into this
//! module.

use futures::future::BoxFuture;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use perto_datasets::{BackfillCheckpoint, Coordinates, LocatedEntity};
use tracing::{debug, info, instrument, warn};

use crate::config::BackfillConfig;

pub mod providers;

pub use error::BackfillError;
use error::Result;

/// What a provider is asked to geocode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeQuery {
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

impl GeocodeQuery {
    fn from_entity(entity: &LocatedEntity, config: &BackfillConfig) -> Self {
        Self {
            address: entity.field_str(&config.address_field).map(str::to_string),
            postal_code: entity
                .field_str(&config.postal_code_field)
                .map(str::to_string),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.postal_code.is_none()
    }

    /// Best single-line query text: the address when present, else the
    /// bare postal code.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.address.as_deref().or(self.postal_code.as_deref())
    }
}

/// The future a [`Geocoder`] returns.
pub type GeocodeFuture<'a> = BoxFuture<'a, Result<Option<Coordinates>>>;

/// A pluggable geocoding backend.
///
/// Dyn-compatible so one pipeline can hold a mixed provider chain;
/// implementations box their futures.
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolve a query to coordinates. `Ok(None)` is a definitive miss and
    /// moves the pipeline on to the next provider; `Err` is transient and
    /// retried with backoff.
    fn geocode<'a>(&'a self, query: &'a GeocodeQuery) -> GeocodeFuture<'a>;
}

/// Totals from one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub examined: usize,
    pub already_located: usize,
    pub skipped_checkpointed: usize,
    pub skipped_no_query: usize,
    pub geocoded: usize,
    pub unresolved: usize,
}

/// A provider chain plus run configuration.
pub struct BackfillPipeline {
    providers: Vec<Box<dyn Geocoder>>,
    config: BackfillConfig,
}

impl BackfillPipeline {
    #[must_use]
    pub fn new(config: BackfillConfig) -> Self {
        Self {
            providers: Vec::new(),
            config,
        }
    }

    /// Append a provider to the chain; providers are consulted in the order
    /// they were added.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Geocoder + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Synchronous entry point for batch jobs; owns its own tokio runtime.
    #[instrument(name = "Backfill", skip_all, level = "info")]
    pub fn run(
        &self,
        entities: &mut [LocatedEntity],
        checkpoint: &mut BackfillCheckpoint,
    ) -> Result<BackfillReport> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run_async(entities, checkpoint))
    }

    /// Walk the dataset once, enriching unlocated entities in place.
    pub async fn run_async(
        &self,
        entities: &mut [LocatedEntity],
        checkpoint: &mut BackfillCheckpoint,
    ) -> Result<BackfillReport> {
        info!(
            providers = %self.providers.iter().map(|p| p.name()).join(", "),
            total = entities.len(),
            "starting backfill"
        );

        let bar = if self.config.progress {
            ProgressBar::new(entities.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{wide_bar}] {pos}/{len}")
                .expect("Progress bar template")
                .progress_chars("█░"),
        );
        bar.set_message("Geocoding");

        let mut report = BackfillReport::default();
        let mut since_checkpoint = 0usize;

        for entity in entities.iter_mut() {
            bar.inc(1);
            report.examined += 1;

            if entity.has_location() {
                report.already_located += 1;
                continue;
            }
            if checkpoint.contains(&entity.id) {
                report.skipped_checkpointed += 1;
                continue;
            }

            let mut query = GeocodeQuery::from_entity(entity, &self.config);
            if query.address.is_none() && self.config.expand_postal_codes {
                if let Some(cep) = query.postal_code.clone() {
                    // Best-effort; a failed expansion degrades to querying
                    // with the bare postal code.
                    match providers::expand_postal_code(&cep).await {
                        Ok(Some(address)) => query.address = Some(address),
                        Ok(None) => {}
                        Err(error) => {
                            warn!(id = %entity.id, %error, "postal code expansion failed");
                        }
                    }
                }
            }
            if query.is_empty() {
                debug!(id = %entity.id, "no address or postal code to geocode");
                report.skipped_no_query += 1;
                continue;
            }

            match self.resolve(&query).await {
                Some(coords) => {
                    entity.set_location(coords.rounded(self.config.coordinate_precision));
                    report.geocoded += 1;
                }
                None => report.unresolved += 1,
            }

            checkpoint.insert(entity.id.clone());
            since_checkpoint += 1;
            if since_checkpoint >= self.config.checkpoint_every && checkpoint.is_persistent() {
                checkpoint.save()?;
                since_checkpoint = 0;
            }

            tokio::time::sleep(self.config.request_delay).await;
        }

        if checkpoint.is_persistent() {
            checkpoint.save()?;
        }
        bar.finish_and_clear();
        info!(?report, "backfill finished");
        Ok(report)
    }

    /// Try each provider in order; within a provider, retry transient
    /// errors with exponential backoff. A definitive miss (`Ok(None)`)
    /// falls through to the next provider immediately.
    async fn resolve(&self, query: &GeocodeQuery) -> Option<Coordinates> {
        for provider in &self.providers {
            let mut backoff = self.config.initial_backoff;
            for attempt in 1..=self.config.max_attempts {
                match provider.geocode(query).await {
                    Ok(Some(coords)) => {
                        debug!(provider = provider.name(), %coords, "geocoded");
                        return Some(coords);
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(
                            provider = provider.name(),
                            attempt,
                            %error,
                            "geocode attempt failed"
                        );
                        if attempt < self.config.max_attempts {
                            tokio::time::sleep(backoff).await;
                            backoff *= 2;
                        }
                    }
                }
            }
        }
        None
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum BackfillError {
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Provider {provider} rejected the request with status {status}")]
        ProviderStatus { provider: &'static str, status: u16 },
        #[error("Provider {provider} returned an unusable payload: {detail}")]
        ProviderPayload {
            provider: &'static str,
            detail: String,
        },
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Checkpoint error: {0}")]
        Checkpoint(#[from] perto_datasets::DataError),
    }

    pub type Result<T> = std::result::Result<T, BackfillError>;
}
