//! Pipeline facade: one call from request to finished PNG.
//!
//! The assembler owns the geocoder, the geodata fetcher and the output
//! layout. A job runs strictly sequentially: resolve, fetch, composite,
//! typeset, encode. Missing fonts skip typography with a warning instead
//! of failing the job.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::cache::DiskCache;
use crate::coord::{BoundingBox, GeoPoint};
use crate::error::{PosterError, PosterResult};
use crate::fetch::{GeoDataFetcher, QUERY_DELAY};
use crate::options::GenerationOptions;
use crate::provider::{Geocoder, HttpClient, OverpassClient, NOMINATIM_URL, OVERPASS_URL};
use crate::render::canvas::{
    write_png, POSTER_DPI, POSTER_HEIGHT_IN, POSTER_WIDTH_IN,
};
use crate::render::{FontLibrary, LayerCompositor, TypographyRenderer};
use crate::theme::Theme;

/// One poster to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterRequest {
    pub city: String,
    pub country: String,
    /// Theme id, used in the output filename.
    pub theme_id: String,
    /// Half-extent of the square fetch area, in meters.
    pub dist_m: f64,
    /// Explicit center; skips geocoding when set.
    pub point: Option<GeoPoint>,
}

impl PosterRequest {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        theme_id: impl Into<String>,
        dist_m: f64,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            theme_id: theme_id.into(),
            dist_m,
            point: None,
        }
    }
}

/// A finished poster on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Poster {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
    pub width_in: f32,
    pub height_in: f32,
    pub dpi: u32,
    pub generated_at: DateTime<Local>,
}

/// Directory layout and upstream endpoints for an assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerConfig {
    pub output_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub nominatim_url: String,
    pub overpass_url: String,
    /// Minimum delay between external queries; tests use zero.
    pub query_delay: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("posters"),
            fonts_dir: PathBuf::from("fonts"),
            cache_dir: PathBuf::from("cache"),
            nominatim_url: NOMINATIM_URL.to_string(),
            overpass_url: OVERPASS_URL.to_string(),
            query_delay: QUERY_DELAY,
        }
    }
}

/// Filename-safe form of a city name: lower-cased, whitespace replaced
/// with underscores.
pub fn city_slug(city: &str) -> String {
    city.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Runs the full pipeline for one request.
pub struct PosterAssembler<C: HttpClient> {
    geocoder: Geocoder<C>,
    fetcher: GeoDataFetcher<C>,
    config: AssemblerConfig,
}

impl<C: HttpClient + Clone> PosterAssembler<C> {
    /// Builds an assembler sharing one HTTP client across both upstream
    /// services.
    ///
    /// # Errors
    ///
    /// Configuration error when the cache directory cannot be created.
    pub fn new(client: C, config: AssemblerConfig) -> PosterResult<Self> {
        let cache = DiskCache::new(config.cache_dir.clone()).map_err(|e| {
            PosterError::Configuration(format!(
                "cannot open cache directory '{}': {}",
                config.cache_dir.display(),
                e
            ))
        })?;
        let geocoder = Geocoder::with_base_url(client.clone(), config.nominatim_url.clone());
        let overpass = OverpassClient::with_base_url(client, config.overpass_url.clone());
        let fetcher =
            GeoDataFetcher::new(overpass, Box::new(cache)).with_delay(config.query_delay);
        Ok(Self {
            geocoder,
            fetcher,
            config,
        })
    }
}

impl<C: HttpClient> PosterAssembler<C> {
    /// Generates one poster and writes it under the output directory.
    ///
    /// # Errors
    ///
    /// Configuration errors for an invalid theme or options, a resolution
    /// error when geocoding fails, a fetch error when the street network
    /// cannot be acquired, and an encoding error when the PNG cannot be
    /// written. Feature-layer failures degrade instead of erroring.
    pub fn generate(
        &self,
        request: &PosterRequest,
        theme: &Theme,
        options: &GenerationOptions,
    ) -> PosterResult<Poster> {
        theme.validate()?;
        // Normalize first: specs dropped by normalization are never
        // validated.
        let options = options.clone().normalized();
        options.validate()?;

        let center = match request.point {
            Some(point) => point,
            None => self
                .geocoder
                .resolve(&request.city, &request.country)
                .map_err(|e| {
                    PosterError::Resolution(format!(
                        "'{}, {}': {}",
                        request.city, request.country, e
                    ))
                })?
                .point,
        };
        info!(
            city = %request.city,
            lat = center.lat,
            lon = center.lon,
            dist_m = request.dist_m,
            "starting poster job"
        );

        let features = self.fetcher.fetch(center, request.dist_m, &options)?;
        let bbox = BoundingBox::around(center, request.dist_m);

        let compositor = LayerCompositor::new(theme, &options);
        let mut canvas = compositor.paint(&features, bbox)?;

        match FontLibrary::load(&self.config.fonts_dir) {
            Some(fonts) => {
                let renderer =
                    TypographyRenderer::new(&fonts, theme, options.typography_positions);
                renderer.render(&mut canvas.pixmap, &request.city, &request.country, center)?;
            }
            None => warn!(
                fonts_dir = %self.config.fonts_dir.display(),
                "no usable fonts found, poster rendered without typography"
            ),
        }

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            PosterError::Encoding(format!(
                "cannot create output directory '{}': {}",
                self.config.output_dir.display(),
                e
            ))
        })?;
        let generated_at = Local::now();
        let filename = format!(
            "{}_{}_{}.png",
            city_slug(&request.city),
            request.theme_id,
            generated_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.config.output_dir.join(filename);
        write_png(&canvas.pixmap, &path)?;

        let poster = Poster {
            width_px: canvas.width(),
            height_px: canvas.height(),
            width_in: POSTER_WIDTH_IN,
            height_in: POSTER_HEIGHT_IN,
            dpi: POSTER_DPI,
            generated_at,
            path,
        };
        info!(path = %poster.path.display(), "poster written");
        Ok(poster)
    }
}
