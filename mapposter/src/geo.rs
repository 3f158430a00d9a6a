//! Geometry model shared by fetching, styling and compositing.
//!
//! A fetched job produces one [`MapFeatureSet`]: a merged street graph plus
//! one [`LayerState`] per requested feature layer. Each layer is an explicit
//! tri-state so downstream logic can distinguish "queried and genuinely
//! empty" from "unavailable because the fetch failed".

use std::collections::HashMap;

use crate::coord::GeoPoint;
use crate::options::CustomLayerSpec;

/// An ordered sequence of geographic points.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// A way is treated as a polygon ring when it closes on itself.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }
}

/// Polygon and line geometry for one feature layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Closed rings, painted as filled interiors.
    pub polygons: Vec<Polyline>,
    /// Open ways, painted as strokes.
    pub lines: Vec<Polyline>,
}

impl FeatureCollection {
    /// Sorts a fetched way into the polygon or line bucket.
    pub fn push(&mut self, way: Polyline) {
        if way.points.len() < 2 {
            return;
        }
        if way.is_closed() {
            self.polygons.push(way);
        } else {
            self.lines.push(way);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len() + self.lines.len()
    }
}

/// Normalizes a raw highway attribute to a single canonical class value.
///
/// The source attribute may be absent, a single value, or several values
/// separated by `;`. The first non-empty value wins; the default class is
/// `unclassified`. Normalization happens once at ingestion so style lookup
/// never re-inspects the raw representation.
pub fn normalize_highway(raw: Option<&str>) -> String {
    raw.and_then(|v| v.split(';').map(str::trim).find(|s| !s.is_empty()))
        .unwrap_or("unclassified")
        .to_string()
}

/// One street-network edge with its resolved highway classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// Canonical highway class (already normalized, never multi-valued).
    pub highway: String,
    pub geometry: Polyline,
}

/// A merged street network: node positions plus classified edges.
#[derive(Debug, Clone, Default)]
pub struct StreetGraph {
    /// Node id to position. Merging unions the key sets.
    pub nodes: HashMap<i64, GeoPoint>,
    /// Edge list. Merging concatenates; an edge fetched from several
    /// subgraphs is retained once per source graph.
    pub segments: Vec<RoadSegment>,
}

impl StreetGraph {
    /// Structural union of two graphs: nodes merged by id, segments
    /// appended without cross-graph deduplication.
    pub fn merge(&mut self, other: StreetGraph) {
        self.nodes.extend(other.nodes);
        self.segments.extend(other.segments);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Outcome of one feature-layer fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerState {
    /// The query succeeded and returned geometry.
    Present(FeatureCollection),
    /// The query succeeded but matched nothing in the bounding box.
    Empty,
    /// The query failed; the recorded message is logged, never fatal.
    Unavailable(String),
}

impl LayerState {
    /// Geometry to paint, if any. Empty and unavailable layers are
    /// skipped without error.
    pub fn features(&self) -> Option<&FeatureCollection> {
        match self {
            LayerState::Present(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, LayerState::Unavailable(_))
    }
}

/// One user-defined overlay with its fetch outcome.
#[derive(Debug, Clone)]
pub struct CustomLayer {
    pub spec: CustomLayerSpec,
    pub state: LayerState,
}

/// Per-job bundle of everything the compositor paints.
///
/// Produced and consumed within one job; never shared between jobs.
#[derive(Debug, Clone)]
pub struct MapFeatureSet {
    pub street_graph: StreetGraph,
    pub water: LayerState,
    pub parks: LayerState,
    pub buildings: LayerState,
    pub railways: LayerState,
    /// Custom layers in the order their specs were given.
    pub custom: Vec<CustomLayer>,
}

impl Default for MapFeatureSet {
    fn default() -> Self {
        Self {
            street_graph: StreetGraph::default(),
            water: LayerState::Empty,
            parks: LayerState::Empty,
            buildings: LayerState::Empty,
            railways: LayerState::Empty,
            custom: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect())
    }

    #[test]
    fn test_normalize_highway_absent_defaults_to_unclassified() {
        assert_eq!(normalize_highway(None), "unclassified");
    }

    #[test]
    fn test_normalize_highway_scalar_passes_through() {
        assert_eq!(normalize_highway(Some("primary")), "primary");
    }

    #[test]
    fn test_normalize_highway_multi_value_takes_first() {
        assert_eq!(normalize_highway(Some("primary;secondary")), "primary");
    }

    #[test]
    fn test_normalize_highway_skips_empty_leading_values() {
        assert_eq!(normalize_highway(Some(" ;secondary")), "secondary");
        assert_eq!(normalize_highway(Some("")), "unclassified");
    }

    #[test]
    fn test_closed_way_becomes_polygon() {
        let mut fc = FeatureCollection::default();
        fc.push(line(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]));

        assert_eq!(fc.polygons.len(), 1);
        assert!(fc.lines.is_empty());
    }

    #[test]
    fn test_open_way_becomes_line() {
        let mut fc = FeatureCollection::default();
        fc.push(line(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]));

        assert!(fc.polygons.is_empty());
        assert_eq!(fc.lines.len(), 1);
    }

    #[test]
    fn test_degenerate_way_is_dropped() {
        let mut fc = FeatureCollection::default();
        fc.push(line(&[(0.0, 0.0)]));

        assert!(fc.is_empty());
    }

    #[test]
    fn test_graph_merge_unions_nodes_and_keeps_duplicate_segments() {
        let segment = RoadSegment {
            highway: "residential".to_string(),
            geometry: line(&[(0.0, 0.0), (0.0, 1.0)]),
        };

        let mut a = StreetGraph::default();
        a.nodes.insert(1, GeoPoint::new(0.0, 0.0));
        a.nodes.insert(2, GeoPoint::new(0.0, 1.0));
        a.segments.push(segment.clone());

        let mut b = StreetGraph::default();
        b.nodes.insert(2, GeoPoint::new(0.0, 1.0));
        b.nodes.insert(3, GeoPoint::new(1.0, 1.0));
        b.segments.push(segment);

        a.merge(b);

        // Union is structural: shared nodes collapse, shared edges do not.
        assert_eq!(a.nodes.len(), 3);
        assert_eq!(a.segments.len(), 2);
    }

    #[test]
    fn test_layer_state_features_only_for_present() {
        let mut fc = FeatureCollection::default();
        fc.push(line(&[(0.0, 0.0), (1.0, 1.0)]));

        assert!(LayerState::Present(fc).features().is_some());
        assert!(LayerState::Empty.features().is_none());
        assert!(LayerState::Unavailable("boom".to_string()).features().is_none());
    }
}
