use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::resolver::{Coordinate, Geocoder};
use crate::config::GeocodeConfig;
use crate::error::GeocodeError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One search hit. Coordinates arrive as numeric strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
}

/// Geocoder backed by a Nominatim-compatible `search` endpoint:
/// `GET {endpoint}?format=json&limit=1&q=<place> <locale hint>`.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    locale_hint: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            locale_hint: config.locale_hint.clone(),
        })
    }

    /// Free-text query sent for a place.
    pub fn query_for(&self, place: &str) -> String {
        if self.locale_hint.is_empty() {
            place.to_string()
        } else {
            format!("{place} {}", self.locale_hint)
        }
    }
}

/// First hit of a search response as a coordinate.
pub fn first_coordinate(place: &str, hits: &[SearchHit]) -> Result<Coordinate, GeocodeError> {
    let hit = hits
        .first()
        .ok_or_else(|| GeocodeError::NoMatch(place.to_string()))?;
    let lat = hit.lat.trim().parse::<f64>().ok();
    let lon = hit.lon.trim().parse::<f64>().ok();
    lat.zip(lon)
        .and_then(|(lat, lon)| Coordinate::finite(lat, lon))
        .ok_or_else(|| GeocodeError::InvalidCoordinate {
            lat: hit.lat.clone(),
            lon: hit.lon.clone(),
        })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, place: &str) -> Result<Coordinate, GeocodeError> {
        let query = self.query_for(place);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("limit", "1"), ("q", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        first_coordinate(place, &hits)
    }
}
