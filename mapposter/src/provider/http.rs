//! HTTP client abstraction for testability.
//!
//! This seam allows dependency injection of mock clients in tests; the
//! real implementation wraps a blocking `reqwest` client. The pipeline is
//! synchronous by design: all queries within one job run sequentially.

use tracing::{debug, warn};

use super::ProviderError;

/// Trait for synchronous HTTP operations.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;

    /// Performs an HTTP POST request with a form-urlencoded body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `params` - Slice of `(name, value)` form fields
    fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, ProviderError>;
}

/// Default User-Agent string for HTTP requests.
/// Nominatim's usage policy rejects requests without an identifying agent.
const DEFAULT_USER_AGENT: &str = concat!("mapposter/", env!("CARGO_PKG_VERSION"));

/// Default request timeout. Overpass queries over a large radius can run
/// for minutes before the server responds.
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Http(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn read_body(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<Vec<u8>, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(ProviderError::Http(format!("HTTP {} from {}", status, url)));
        }
        let bytes = response
            .bytes()
            .map_err(|e| ProviderError::Http(format!("failed to read response: {}", e)))?;
        debug!(url = url, bytes = bytes.len(), "HTTP response body read");
        Ok(bytes.to_vec())
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::Http(format!("request failed: {}", e)))?;
        Self::read_body(url, response)
    }

    fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .map_err(|e| ProviderError::Http(format!("POST request failed: {}", e)))?;
        Self::read_body(url, response)
    }
}
