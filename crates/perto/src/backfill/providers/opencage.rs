use perto_datasets::Coordinates;
use reqwest::Client;
use serde::Deserialize;

use super::USER_AGENT;
use crate::backfill::{BackfillError, GeocodeFuture, GeocodeQuery, Geocoder};

const ENDPOINT: &str = "https://api.opencagedata.com/geocode/v1/json";
const PROVIDER: &str = "opencage";

/// OpenCage forward geocoder. Requires an API key.
pub struct OpenCage {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Response {
    status: Status,
    results: Vec<Entry>,
}

/// OpenCage reports errors in the body even on HTTP 200.
#[derive(Debug, Deserialize)]
struct Status {
    code: u16,
}

#[derive(Debug, Deserialize)]
struct Entry {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

impl OpenCage {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, ENDPOINT)
    }

    #[must_use]
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    async fn lookup(&self, query: &GeocodeQuery) -> Result<Option<Coordinates>, BackfillError> {
        let Some(text) = query.text() else {
            return Ok(None);
        };

        let response: Response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("q", text),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status.code != 200 {
            return Err(BackfillError::ProviderStatus {
                provider: PROVIDER,
                status: response.status.code,
            });
        }

        Ok(response
            .results
            .into_iter()
            .next()
            .map(|entry| Coordinates::new(entry.geometry.lat, entry.geometry.lng)))
    }
}

impl Geocoder for OpenCage {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn geocode<'a>(&'a self, query: &'a GeocodeQuery) -> GeocodeFuture<'a> {
        Box::pin(self.lookup(query))
    }
}
