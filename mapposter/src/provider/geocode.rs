//! Nominatim geocoding client.

use serde::Deserialize;
use tracing::info;

use super::http::HttpClient;
use super::{percent_encode, ProviderError};
use crate::coord::GeoPoint;

/// Default Nominatim search endpoint.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A geocoding hit: resolved point plus the canonical address.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub point: GeoPoint,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Free-text geocoder backed by Nominatim.
pub struct Geocoder<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> Geocoder<C> {
    /// Creates a geocoder against the public Nominatim endpoint.
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, NOMINATIM_URL.to_string())
    }

    /// Creates a geocoder with a custom base URL, for tests or mirrors.
    pub fn with_base_url(client: C, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Resolves a city and country to coordinates.
    ///
    /// # Errors
    ///
    /// `NoResults` when the service finds nothing; `InvalidResponse` when
    /// the payload cannot be parsed. Both are fatal to the job.
    pub fn resolve(&self, city: &str, country: &str) -> Result<ResolvedLocation, ProviderError> {
        let query = format!("{}, {}", city, country);
        let url = format!(
            "{}?q={}&format=json&limit=1",
            self.base_url,
            percent_encode(&query)
        );
        let body = self.client.get(&url)?;
        let hits: Vec<NominatimHit> = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("geocoder payload: {}", e)))?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoResults(query.clone()))?;

        let lat: f64 = hit
            .lat
            .parse()
            .map_err(|_| ProviderError::InvalidResponse(format!("latitude '{}'", hit.lat)))?;
        let lon: f64 = hit
            .lon
            .parse()
            .map_err(|_| ProviderError::InvalidResponse(format!("longitude '{}'", hit.lon)))?;

        info!(
            query = %query,
            address = %hit.display_name,
            lat,
            lon,
            "resolved coordinates"
        );
        Ok(ResolvedLocation {
            point: GeoPoint::new(lat, lon),
            display_name: hit.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockHttpClient;

    const PARIS_HIT: &str =
        r#"[{"lat": "48.8566", "lon": "2.3522", "display_name": "Paris, Île-de-France, France"}]"#;

    #[test]
    fn test_resolve_parses_first_hit() {
        let mock = MockHttpClient::default().with_get("q=Paris", Ok(PARIS_HIT.into()));
        let geocoder = Geocoder::new(mock);

        let location = geocoder.resolve("Paris", "France").unwrap();
        assert_eq!(location.point, GeoPoint::new(48.8566, 2.3522));
        assert!(location.display_name.starts_with("Paris"));
    }

    #[test]
    fn test_resolve_empty_result_is_no_results() {
        let mock = MockHttpClient::default().with_get("q=", Ok(b"[]".to_vec()));
        let geocoder = Geocoder::new(mock);

        let err = geocoder.resolve("Nowhereville", "Atlantis").unwrap_err();
        assert!(matches!(err, ProviderError::NoResults(_)));
    }

    #[test]
    fn test_resolve_garbage_payload_is_invalid_response() {
        let mock = MockHttpClient::default().with_get("q=", Ok(b"<html>".to_vec()));
        let geocoder = Geocoder::new(mock);

        let err = geocoder.resolve("Paris", "France").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_resolve_builds_encoded_query() {
        // The needle only matches when the query is percent-encoded.
        let mock = MockHttpClient::default()
            .with_get("q=New%20York%2C%20USA", Ok(PARIS_HIT.into()));
        let geocoder = Geocoder::new(mock);

        assert!(geocoder.resolve("New York", "USA").is_ok());
    }
}
