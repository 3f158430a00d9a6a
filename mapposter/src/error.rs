//! Job-level error taxonomy.
//!
//! Fatal kinds abort a poster job with a single human-readable message.
//! Secondary feature-layer failures are *not* represented here: they are
//! recovered in place and recorded as [`crate::geo::LayerState::Unavailable`]
//! so the job can continue without the layer.

use thiserror::Error;

/// Fatal errors for one poster generation job.
///
/// The pipeline performs no automatic retries; retry/backoff is the
/// caller's responsibility.
#[derive(Debug, Error)]
pub enum PosterError {
    /// Missing or invalid theme field, invalid option value or custom
    /// layer spec. Reported before any fetch happens.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Coordinates for the requested city could not be determined.
    #[error("could not resolve coordinates: {0}")]
    Resolution(String),

    /// The mandatory street-network fetch failed.
    #[error("street network fetch failed: {0}")]
    Fetch(String),

    /// The finished canvas could not be encoded or written.
    #[error("failed to write poster: {0}")]
    Encoding(String),
}

/// Convenience alias used throughout the pipeline.
pub type PosterResult<T> = Result<T, PosterError>;
