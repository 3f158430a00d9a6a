//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use mapposter::error::PosterError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line usage
    Usage(String),
    /// HTTP client could not be created
    HttpClient(String),
    /// Poster generation failed
    Generation(PosterError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Generation(PosterError::Resolution(_)) => {
                eprintln!();
                eprintln!("The location could not be resolved. Make sure:");
                eprintln!("  1. The city and country names are spelled correctly");
                eprintln!("  2. The country is given in English (e.g. 'Germany', not 'Deutschland')");
                eprintln!("  3. You have network access to nominatim.openstreetmap.org");
            }
            CliError::Generation(PosterError::Fetch(_)) => {
                eprintln!();
                eprintln!("The Overpass API request failed. Common causes:");
                eprintln!("  1. The public server is busy; retry in a minute");
                eprintln!("  2. A very large --distance produced a query that timed out");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::HttpClient(msg) => write!(f, "Failed to create HTTP client: {}", msg),
            CliError::Generation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Generation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PosterError> for CliError {
    fn from(e: PosterError) -> Self {
        CliError::Generation(e)
    }
}
