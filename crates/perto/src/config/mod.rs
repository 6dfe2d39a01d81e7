use std::time::Duration;

use crate::error::PertoError;

/// Tuning for one backfill run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    /// Attempts per provider per entity, first try included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
    /// Pause between entities. The default respects Nominatim's public
    /// endpoint policy of at most one request per second.
    pub request_delay: Duration,
    /// Save the checkpoint after this many geocoding attempts.
    pub checkpoint_every: usize,
    /// Decimal-degree precision for coordinates written back, matching the
    /// ingestion precision so the dataset stays uniform.
    pub coordinate_precision: u32,
    /// `extra` field holding the free-form street address.
    pub address_field: String,
    /// `extra` field holding the postal code.
    pub postal_code_field: String,
    /// Expand a postal code into a street address via ViaCEP when the
    /// address field is missing.
    pub expand_postal_codes: bool,
    /// Draw a progress bar while the run is underway.
    pub progress: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            request_delay: Duration::from_millis(1100),
            checkpoint_every: 25,
            coordinate_precision: perto_datasets::DEFAULT_PRECISION,
            address_field: "address".to_string(),
            postal_code_field: "postal_code".to_string(),
            expand_postal_codes: true,
            progress: true,
        }
    }
}

/// Builder for backfill configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct BackfillConfigBuilder {
    config: BackfillConfig,
}

impl BackfillConfigBuilder {
    /// Create a new builder with sensible defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BackfillConfig::default(),
        }
    }

    /// Preset for rate-limited public endpoints: slower pacing, more
    /// patience per provider.
    #[must_use]
    pub fn gentle() -> Self {
        let mut builder = Self::new();
        builder.config.max_attempts = 5;
        builder.config.request_delay = Duration::from_millis(2000);
        builder.config.initial_backoff = Duration::from_millis(1000);
        builder
    }

    /// Preset for self-hosted or paid endpoints where rate limits allow
    /// rapid requests.
    #[must_use]
    pub fn aggressive() -> Self {
        let mut builder = Self::new();
        builder.config.max_attempts = 2;
        builder.config.request_delay = Duration::from_millis(100);
        builder.config.checkpoint_every = 100;
        builder
    }

    /// Set attempts per provider per entity (minimum 1).
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.config.initial_backoff = backoff;
        self
    }

    /// Set the pause between entities.
    #[must_use]
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.config.request_delay = delay;
        self
    }

    /// Set how often the checkpoint is saved (minimum every 1).
    #[must_use]
    pub fn checkpoint_every(mut self, entities: usize) -> Self {
        self.config.checkpoint_every = entities.max(1);
        self
    }

    /// Set the write-back precision in decimal degrees (clamped to 0..=9).
    #[must_use]
    pub fn coordinate_precision(mut self, precision: u32) -> Self {
        self.config.coordinate_precision = precision.min(9);
        self
    }

    /// Name the `extra` fields the query is built from.
    pub fn field_names(
        mut self,
        address_field: &str,
        postal_code_field: &str,
    ) -> Result<Self, PertoError> {
        if address_field.is_empty() || postal_code_field.is_empty() {
            return Err(PertoError::ConfigError(
                "address and postal code field names must be non-empty".to_string(),
            ));
        }
        self.config.address_field = address_field.to_string();
        self.config.postal_code_field = postal_code_field.to_string();
        Ok(self)
    }

    /// Enable or disable ViaCEP postal-code expansion.
    #[must_use]
    pub fn expand_postal_codes(mut self, enabled: bool) -> Self {
        self.config.expand_postal_codes = enabled;
        self
    }

    /// Enable or disable the progress bar.
    #[must_use]
    pub fn progress(mut self, enabled: bool) -> Self {
        self.config.progress = enabled;
        self
    }

    /// Build the final configuration
    #[must_use]
    pub fn build(self) -> BackfillConfig {
        self.config
    }
}
