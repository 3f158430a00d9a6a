//! Geodata acquisition for one poster job.
//!
//! The fetcher turns a center point, radius and option set into a
//! [`MapFeatureSet`]: the merged street network plus one tri-state layer
//! result per requested feature layer. All queries within a job run
//! sequentially with a fixed politeness delay between external calls;
//! cache hits do not consume a delay.

use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheKey, FetchCache, NoOpCache};
use crate::coord::{BoundingBox, GeoPoint};
use crate::error::{PosterError, PosterResult};
use crate::geo::{CustomLayer, LayerState, MapFeatureSet, StreetGraph};
use crate::options::{CustomLayerSpec, GenerationOptions, NetworkType};
use crate::provider::{self, HttpClient, OverpassClient, ProviderError, TagPredicate};

/// Minimum delay between consecutive external queries within one job.
///
/// This is politeness to the upstream service, a correctness requirement
/// rather than a tunable.
pub const QUERY_DELAY: Duration = Duration::from_millis(300);

/// Tag predicates for the built-in feature layers.
fn water_predicate() -> TagPredicate {
    TagPredicate::key_value("natural", "water").or_key_value("waterway", "riverbank")
}

fn parks_predicate() -> TagPredicate {
    TagPredicate::key_value("leisure", "park").or_key_value("landuse", "grass")
}

fn buildings_predicate() -> TagPredicate {
    TagPredicate::any("building")
}

fn railways_predicate() -> TagPredicate {
    TagPredicate::key_value("railway", "rail")
}

fn custom_predicate(spec: &CustomLayerSpec) -> TagPredicate {
    match spec.effective_tag_value() {
        Some(value) => TagPredicate::key_value(spec.tag_key.clone(), value),
        None => TagPredicate::any(spec.tag_key.clone()),
    }
}

/// Spaces out external queries; cache hits never pause.
struct QueryPacer {
    delay: Duration,
    primed: bool,
}

impl QueryPacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }

    fn pause(&mut self) {
        if self.primed && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.primed = true;
    }
}

/// Acquires and merges street-network and feature-layer geometry.
pub struct GeoDataFetcher<C: HttpClient> {
    overpass: OverpassClient<C>,
    cache: Box<dyn FetchCache>,
    delay: Duration,
}

impl<C: HttpClient> GeoDataFetcher<C> {
    pub fn new(overpass: OverpassClient<C>, cache: Box<dyn FetchCache>) -> Self {
        Self {
            overpass,
            cache,
            delay: QUERY_DELAY,
        }
    }

    /// Overrides the inter-query delay; tests use zero.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fetches everything the compositor needs for one job.
    ///
    /// Street-network failure is fatal. Each feature layer is an
    /// independent query whose failure degrades that layer to
    /// [`LayerState::Unavailable`] without aborting the job.
    pub fn fetch(
        &self,
        center: GeoPoint,
        dist_m: f64,
        options: &GenerationOptions,
    ) -> PosterResult<MapFeatureSet> {
        let bbox = BoundingBox::around(center, dist_m);
        let mut pacer = QueryPacer::new(self.delay);
        let use_cache = options.use_cache;

        let street_graph = self.fetch_street_network(&bbox, options, &mut pacer, use_cache)?;
        info!(
            segments = street_graph.segments.len(),
            "street network fetched"
        );

        let mut features = MapFeatureSet {
            street_graph,
            ..MapFeatureSet::default()
        };

        if options.show_water {
            features.water = self.fetch_layer(&bbox, &water_predicate(), &mut pacer, use_cache);
        }
        if options.show_parks {
            features.parks = self.fetch_layer(&bbox, &parks_predicate(), &mut pacer, use_cache);
        }
        if options.show_buildings {
            features.buildings =
                self.fetch_layer(&bbox, &buildings_predicate(), &mut pacer, use_cache);
        }
        if options.show_railways {
            features.railways =
                self.fetch_layer(&bbox, &railways_predicate(), &mut pacer, use_cache);
        }
        for spec in &options.custom_layers {
            let state =
                self.fetch_layer(&bbox, &custom_predicate(spec), &mut pacer, use_cache);
            features.custom.push(CustomLayer {
                spec: spec.clone(),
                state,
            });
        }

        Ok(features)
    }

    /// Fetches and merges the street network for the requested modes.
    ///
    /// `all` fetches one unified graph; otherwise one subgraph per mode is
    /// fetched and structurally unioned.
    fn fetch_street_network(
        &self,
        bbox: &BoundingBox,
        options: &GenerationOptions,
        pacer: &mut QueryPacer,
        use_cache: bool,
    ) -> PosterResult<StreetGraph> {
        let modes: Vec<NetworkType> = if options.network_types.contains(&NetworkType::All) {
            vec![NetworkType::All]
        } else {
            options.network_types.clone()
        };

        let mut merged = StreetGraph::default();
        for mode in modes {
            let query = provider::street_network_query(bbox, mode);
            let body = self
                .query_with_cache(&query, pacer, use_cache)
                .map_err(|e| {
                    PosterError::Fetch(format!("{} network: {}", mode.as_str(), e))
                })?;
            let graph = provider::parse_street_network(&body)
                .map_err(|e| PosterError::Fetch(format!("{} network: {}", mode.as_str(), e)))?;
            merged.merge(graph);
        }
        Ok(merged)
    }

    /// Runs one isolated feature-layer query.
    fn fetch_layer(
        &self,
        bbox: &BoundingBox,
        predicate: &TagPredicate,
        pacer: &mut QueryPacer,
        use_cache: bool,
    ) -> LayerState {
        let query = provider::features_query(bbox, predicate);
        let outcome = self
            .query_with_cache(&query, pacer, use_cache)
            .and_then(|body| provider::parse_features(&body));
        match outcome {
            Ok(features) if features.is_empty() => {
                info!(layer = %predicate.describe(), "layer empty in bounding box");
                LayerState::Empty
            }
            Ok(features) => {
                info!(
                    layer = %predicate.describe(),
                    ways = features.len(),
                    "layer fetched"
                );
                LayerState::Present(features)
            }
            Err(e) => {
                warn!(
                    layer = %predicate.describe(),
                    error = %e,
                    "layer fetch failed, continuing without it"
                );
                LayerState::Unavailable(e.to_string())
            }
        }
    }

    /// Consults the cache, falling back to one paced external query.
    fn query_with_cache(
        &self,
        query: &str,
        pacer: &mut QueryPacer,
        use_cache: bool,
    ) -> Result<Vec<u8>, ProviderError> {
        static NOOP: NoOpCache = NoOpCache;
        let cache: &dyn FetchCache = if use_cache { self.cache.as_ref() } else { &NOOP };

        let key = CacheKey::new(self.overpass.base_url(), query);
        if let Some(cached) = cache.get(&key) {
            return Ok(cached);
        }
        pacer.pause();
        let body = self.overpass.query_raw(query)?;
        if let Err(e) = cache.put(&key, &body) {
            warn!(error = %e, "failed to cache response");
        }
        Ok(body)
    }
}
