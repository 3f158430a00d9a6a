//! Upstream service clients.
//!
//! The pipeline consumes two external services through the [`HttpClient`]
//! seam: Nominatim for geocoding and the Overpass API for street-network
//! and tagged-feature geometry. Both clients accept a custom base URL so
//! tests can point them at canned responses.

mod geocode;
mod http;
mod overpass;

pub use geocode::{Geocoder, ResolvedLocation, NOMINATIM_URL};
pub use http::{HttpClient, ReqwestClient};
pub use overpass::{
    features_query, parse_features, parse_street_network, street_network_query, OverpassClient,
    TagClause, TagPredicate, OVERPASS_URL,
};
pub use types::ProviderError;

mod types {
    use thiserror::Error;

    /// Errors from upstream service clients.
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum ProviderError {
        /// Request failed or returned a non-success status.
        #[error("HTTP error: {0}")]
        Http(String),
        /// Response body could not be parsed.
        #[error("invalid response: {0}")]
        InvalidResponse(String),
        /// The query succeeded but matched nothing usable.
        #[error("no results for {0}")]
        NoResults(String),
    }
}

/// Percent-encodes a query-string component (RFC 3986 unreserved set).
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
pub use http::tests::MockHttpClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode_passes_unreserved() {
        assert_eq!(percent_encode("Paris-2.0_ok~"), "Paris-2.0_ok~");
    }

    #[test]
    fn test_percent_encode_escapes_separators() {
        assert_eq!(percent_encode("New York, USA"), "New%20York%2C%20USA");
    }
}
