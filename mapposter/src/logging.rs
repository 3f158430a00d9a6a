//! Logging initialization.
//!
//! Structured logs go to stderr so poster paths printed on stdout stay
//! machine-readable. Verbosity is configurable via the `RUST_LOG`
//! environment variable and defaults to `info`.

use std::io;

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a
/// subscriber.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
