//! MapPoster - Themed city map posters from OpenStreetMap data
//!
//! This library turns a geographic point and radius into a print-quality
//! poster image: a street network plus optional feature layers (water,
//! parks, buildings, railways, arbitrary tagged layers), styled by a named
//! color theme and composited with gradient fades and centered typography.
//!
//! # High-Level API
//!
//! For most use cases, the [`poster`] module provides the pipeline facade:
//!
//! ```ignore
//! use mapposter::poster::{AssemblerConfig, PosterAssembler, PosterRequest};
//! use mapposter::provider::ReqwestClient;
//! use mapposter::theme::Theme;
//! use mapposter::options::GenerationOptions;
//!
//! let client = ReqwestClient::new()?;
//! let assembler = PosterAssembler::new(client, AssemblerConfig::default())?;
//! let request = PosterRequest::new("Paris", "France", "noir", 10_000.0);
//! let poster = assembler.generate(&request, &Theme::fallback(), &GenerationOptions::default())?;
//! println!("saved {}", poster.path.display());
//! ```

pub mod cache;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod logging;
pub mod options;
pub mod poster;
pub mod provider;
pub mod render;
pub mod style;
pub mod theme;

/// Version of the MapPoster library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
