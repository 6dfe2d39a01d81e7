use perto_datasets::Coordinates;
use reqwest::Client;
use serde::Deserialize;

use super::USER_AGENT;
use crate::backfill::{BackfillError, GeocodeFuture, GeocodeQuery, Geocoder};

const ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const PROVIDER: &str = "nominatim";

/// OpenStreetMap's Nominatim geocoder.
///
/// The public endpoint allows at most one request per second; keep
/// `BackfillConfig::request_delay` at its default when pointing at it, or
/// use [`Nominatim::with_endpoint`] for a self-hosted instance.
pub struct Nominatim {
    client: Client,
    endpoint: String,
}

/// Nominatim serializes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Hit {
    lat: String,
    lon: String,
}

impl Hit {
    fn into_coordinates(self) -> Result<Coordinates, BackfillError> {
        let parse = |axis: &str, raw: &str| {
            raw.parse::<f64>().map_err(|_| BackfillError::ProviderPayload {
                provider: PROVIDER,
                detail: format!("unparseable {axis} {raw:?}"),
            })
        };
        Ok(Coordinates::new(
            parse("latitude", &self.lat)?,
            parse("longitude", &self.lon)?,
        ))
    }
}

impl Nominatim {
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT)
    }

    /// Point at a self-hosted instance.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn lookup(&self, query: &GeocodeQuery) -> Result<Option<Coordinates>, BackfillError> {
        let Some(text) = query.text() else {
            return Ok(None);
        };

        let hits: Vec<Hit> = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("q", text), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        hits.into_iter()
            .next()
            .map(Hit::into_coordinates)
            .transpose()
    }
}

impl Default for Nominatim {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for Nominatim {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn geocode<'a>(&'a self, query: &'a GeocodeQuery) -> GeocodeFuture<'a> {
        Box::pin(self.lookup(query))
    }
}
