//! Overpass API geodata client.
//!
//! Builds Overpass QL queries for street networks and tagged feature
//! layers within a bounding box, and parses the JSON responses into the
//! crate's geometry model. Query strings double as cache-key material, so
//! building them is deterministic.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use super::ProviderError;
use crate::coord::{BoundingBox, GeoPoint};
use crate::geo::{normalize_highway, FeatureCollection, Polyline, RoadSegment, StreetGraph};
use crate::options::NetworkType;

/// Default Overpass interpreter endpoint.
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Server-side query timeout in seconds.
const QUERY_TIMEOUT_SECS: u32 = 180;

/// One tag filter: a key with an optional exact value.
#[derive(Debug, Clone, PartialEq)]
pub struct TagClause {
    pub key: String,
    /// `None` matches any value of the key.
    pub value: Option<String>,
}

/// Union of tag filters selecting one feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPredicate {
    pub clauses: Vec<TagClause>,
}

impl TagPredicate {
    /// Single key=value filter.
    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            clauses: vec![TagClause {
                key: key.into(),
                value: Some(value.into()),
            }],
        }
    }

    /// Single key-present filter.
    pub fn any(key: impl Into<String>) -> Self {
        Self {
            clauses: vec![TagClause {
                key: key.into(),
                value: None,
            }],
        }
    }

    /// Union with another key=value filter.
    pub fn or_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(TagClause {
            key: key.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Short description for logging and layer names.
    pub fn describe(&self) -> String {
        self.clauses
            .iter()
            .map(|c| match &c.value {
                Some(v) => format!("{}={}", c.key, v),
                None => format!("{}=*", c.key),
            })
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Highway tag filter for a routing mode.
///
/// Mirrors the conventional routable-way exclusions: service ways stay in
/// `all`, motorways are excluded from foot and bike networks, and
/// non-vehicular ways are excluded from the drive network.
fn highway_filter(network: NetworkType) -> &'static str {
    match network {
        NetworkType::All => {
            r#"["highway"]["highway"!~"proposed|construction|abandoned|platform|raceway"]"#
        }
        NetworkType::Drive => {
            r#"["highway"]["highway"!~"footway|cycleway|path|pedestrian|steps|corridor|bridleway|proposed|construction|abandoned|platform|raceway"]["motor_vehicle"!~"no"]"#
        }
        NetworkType::Bike => {
            r#"["highway"]["highway"!~"motorway|motorway_link|footway|steps|pedestrian|corridor|proposed|construction|abandoned|platform|raceway"]["bicycle"!~"no"]"#
        }
        NetworkType::Walk => {
            r#"["highway"]["highway"!~"motorway|motorway_link|proposed|construction|abandoned|platform|raceway"]["foot"!~"no"]"#
        }
    }
}

fn bbox_clause(bbox: &BoundingBox) -> String {
    format!(
        "({:.7},{:.7},{:.7},{:.7})",
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

/// Builds the street-network query for one routing mode.
pub fn street_network_query(bbox: &BoundingBox, network: NetworkType) -> String {
    format!(
        "[out:json][timeout:{}];(way{}{};);out geom;",
        QUERY_TIMEOUT_SECS,
        highway_filter(network),
        bbox_clause(bbox)
    )
}

/// Builds the feature query for one tag predicate.
pub fn features_query(bbox: &BoundingBox, predicate: &TagPredicate) -> String {
    let bbox = bbox_clause(bbox);
    let mut body = String::new();
    for clause in &predicate.clauses {
        match &clause.value {
            Some(value) => {
                body.push_str(&format!(r#"way["{}"="{}"]{};"#, clause.key, value, bbox))
            }
            None => body.push_str(&format!(r#"way["{}"]{};"#, clause.key, bbox)),
        }
    }
    format!(
        "[out:json][timeout:{}];({});out geom;",
        QUERY_TIMEOUT_SECS, body
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    geometry: Vec<OverpassLatLon>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassLatLon {
    lat: f64,
    lon: f64,
}

fn parse_response(body: &[u8]) -> Result<OverpassResponse, ProviderError> {
    serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("overpass payload: {}", e)))
}

fn way_polyline(element: &OverpassElement) -> Option<Polyline> {
    if element.kind != "way" || element.geometry.len() < 2 {
        return None;
    }
    Some(Polyline::new(
        element
            .geometry
            .iter()
            .map(|p| GeoPoint::new(p.lat, p.lon))
            .collect(),
    ))
}

/// Parses a street-network response into a graph.
///
/// Each way becomes one classified segment; node positions are taken from
/// the way geometry so graphs from several queries can be unioned by id.
pub fn parse_street_network(body: &[u8]) -> Result<StreetGraph, ProviderError> {
    let response = parse_response(body)?;
    let mut graph = StreetGraph::default();
    for element in &response.elements {
        let Some(geometry) = way_polyline(element) else {
            continue;
        };
        for (id, point) in element.nodes.iter().zip(geometry.points.iter()) {
            graph.nodes.insert(*id, *point);
        }
        graph.segments.push(RoadSegment {
            highway: normalize_highway(element.tags.get("highway").map(String::as_str)),
            geometry,
        });
    }
    debug!(
        segments = graph.segments.len(),
        nodes = graph.nodes.len(),
        "parsed street network"
    );
    Ok(graph)
}

/// Parses a feature response; closed ways become polygons, open ways lines.
pub fn parse_features(body: &[u8]) -> Result<FeatureCollection, ProviderError> {
    let response = parse_response(body)?;
    let mut features = FeatureCollection::default();
    for element in &response.elements {
        if let Some(way) = way_polyline(element) {
            features.push(way);
        }
    }
    Ok(features)
}

/// Overpass API client.
pub struct OverpassClient<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> OverpassClient<C> {
    /// Creates a client against the public Overpass endpoint.
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, OVERPASS_URL.to_string())
    }

    /// Creates a client with a custom base URL, for tests or mirrors.
    pub fn with_base_url(client: C, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs a raw Overpass QL query and returns the response bytes.
    ///
    /// Raw bytes are returned (rather than parsed geometry) so the caller
    /// can cache the response before parsing.
    pub fn query_raw(&self, query: &str) -> Result<Vec<u8>, ProviderError> {
        debug!(bytes = query.len(), "running overpass query");
        self.client.post_form(&self.base_url, &[("data", query)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoPoint;

    fn bbox() -> BoundingBox {
        BoundingBox::around(GeoPoint::new(48.8566, 2.3522), 1000.0)
    }

    #[test]
    fn test_street_query_contains_bbox_and_filter() {
        let query = street_network_query(&bbox(), NetworkType::All);
        assert!(query.starts_with("[out:json]"));
        assert!(query.contains(r#"way["highway"]"#));
        assert!(query.contains("out geom"));
        assert!(query.contains("48.8"));
    }

    #[test]
    fn test_street_query_is_deterministic() {
        let a = street_network_query(&bbox(), NetworkType::Drive);
        let b = street_network_query(&bbox(), NetworkType::Drive);
        assert_eq!(a, b);
    }

    #[test]
    fn test_network_filters_differ_per_mode() {
        let drive = street_network_query(&bbox(), NetworkType::Drive);
        let walk = street_network_query(&bbox(), NetworkType::Walk);
        assert_ne!(drive, walk);
        assert!(drive.contains("footway"));
        assert!(walk.contains("motorway"));
    }

    #[test]
    fn test_features_query_unions_clauses() {
        let predicate =
            TagPredicate::key_value("natural", "water").or_key_value("waterway", "riverbank");
        let query = features_query(&bbox(), &predicate);
        assert!(query.contains(r#"way["natural"="water"]"#));
        assert!(query.contains(r#"way["waterway"="riverbank"]"#));
    }

    #[test]
    fn test_features_query_any_value() {
        let query = features_query(&bbox(), &TagPredicate::any("building"));
        assert!(query.contains(r#"way["building"]("#));
    }

    #[test]
    fn test_predicate_describe() {
        let predicate = TagPredicate::key_value("leisure", "park").or_key_value("landuse", "grass");
        assert_eq!(predicate.describe(), "leisure=park|landuse=grass");
        assert_eq!(TagPredicate::any("building").describe(), "building=*");
    }

    const STREET_BODY: &str = r#"{
        "elements": [
            {"type": "way", "id": 1, "nodes": [10, 11],
             "geometry": [{"lat": 48.85, "lon": 2.35}, {"lat": 48.86, "lon": 2.36}],
             "tags": {"highway": "primary"}},
            {"type": "way", "id": 2, "nodes": [11, 12],
             "geometry": [{"lat": 48.86, "lon": 2.36}, {"lat": 48.87, "lon": 2.37}],
             "tags": {}},
            {"type": "node", "id": 10}
        ]
    }"#;

    #[test]
    fn test_parse_street_network() {
        let graph = parse_street_network(STREET_BODY.as_bytes()).unwrap();

        assert_eq!(graph.segments.len(), 2);
        assert_eq!(graph.segments[0].highway, "primary");
        // Missing highway tag normalizes to the default class.
        assert_eq!(graph.segments[1].highway, "unclassified");
        // Node 11 is shared between the two ways.
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn test_parse_features_sorts_closed_and_open_ways() {
        let body = r#"{
            "elements": [
                {"type": "way", "id": 1, "geometry": [
                    {"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0},
                    {"lat": 1.0, "lon": 1.0}, {"lat": 0.0, "lon": 0.0}]},
                {"type": "way", "id": 2, "geometry": [
                    {"lat": 0.0, "lon": 0.0}, {"lat": 2.0, "lon": 2.0}]}
            ]
        }"#;
        let features = parse_features(body.as_bytes()).unwrap();
        assert_eq!(features.polygons.len(), 1);
        assert_eq!(features.lines.len(), 1);
    }

    #[test]
    fn test_parse_empty_response_is_empty_not_error() {
        let features = parse_features(br#"{"elements": []}"#).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_invalid_response() {
        let err = parse_features(b"<html>busy</html>").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
