use perto_datasets::Coordinates;
use reqwest::Client;
use serde::Deserialize;

use super::USER_AGENT;
use crate::backfill::{BackfillError, GeocodeFuture, GeocodeQuery, Geocoder};

const ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
const PROVIDER: &str = "mapbox";

/// MapBox forward geocoder. Requires an access token.
pub struct MapBox {
    client: Client,
    access_token: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Response {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[longitude, latitude]`, in MapBox's axis order.
    center: [f64; 2],
}

impl Feature {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.center[1], self.center[0])
    }
}

impl MapBox {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_endpoint(access_token, ENDPOINT)
    }

    #[must_use]
    pub fn with_endpoint(access_token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, text: &str) -> Result<reqwest::Url, BackfillError> {
        // The query lives in the URL path; Url::path_segments_mut
        // percent-encodes it.
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|error| {
            BackfillError::ProviderPayload {
                provider: PROVIDER,
                detail: format!("bad endpoint: {error}"),
            }
        })?;
        url.path_segments_mut()
            .map_err(|()| BackfillError::ProviderPayload {
                provider: PROVIDER,
                detail: "endpoint cannot be a base URL".to_string(),
            })?
            .push(&format!("{text}.json"));
        Ok(url)
    }

    async fn lookup(&self, query: &GeocodeQuery) -> Result<Option<Coordinates>, BackfillError> {
        let Some(text) = query.text() else {
            return Ok(None);
        };

        let response: Response = self
            .client
            .get(self.request_url(text)?)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .features
            .first()
            .map(Feature::coordinates))
    }
}

impl Geocoder for MapBox {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn geocode<'a>(&'a self, query: &'a GeocodeQuery) -> GeocodeFuture<'a> {
        Box::pin(self.lookup(query))
    }
}
