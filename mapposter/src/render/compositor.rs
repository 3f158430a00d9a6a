//! Layer compositing in a fixed z-order.
//!
//! Paint operations are collected with a numeric z-order, stable-sorted
//! ascending and painted in that order: lower z paints first, later
//! operations overwrite earlier ones on overlap. Custom layers interleave
//! among the built-ins strictly by their own z-order; ties keep built-in
//! insertion order.

use std::collections::HashMap;

use tiny_skia::{
    Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Shader, Stroke, Transform,
};
use tracing::debug;

use crate::coord::BoundingBox;
use crate::error::{PosterError, PosterResult};
use crate::geo::{FeatureCollection, MapFeatureSet, Polyline, StreetGraph};
use crate::options::{GenerationOptions, LayerMode};
use crate::render::canvas::{pt_to_px, Canvas, Projection};
use crate::render::color::{parse_hex, parse_hex_with_alpha};
use crate::style::StyleResolver;
use crate::theme::Theme;

/// Built-in layer z-orders. Custom layers default to 2.5 and may be
/// placed anywhere on this axis.
pub const Z_WATER: f32 = 1.0;
pub const Z_PARKS: f32 = 2.0;
pub const Z_BUILDINGS: f32 = 2.2;
pub const Z_RAILWAYS: f32 = 2.6;
pub const Z_ROADS: f32 = 3.0;
pub const Z_GRADIENTS: f32 = 10.0;

/// Which edge a gradient fade is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeLocation {
    Bottom,
    Top,
}

/// Number of bands in a gradient fade ramp.
pub const FADE_STEPS: usize = 256;

/// Alpha of one fade band.
///
/// Bottom fade: step 0 sits at the bottom edge with alpha 1.0, decreasing
/// linearly to 0.0 at the 25%-height mark. Top fade: step 0 sits at the
/// 75%-height mark with alpha 0.0, increasing linearly to 1.0 at the top
/// edge.
pub fn fade_alpha(location: FadeLocation, step: usize) -> f32 {
    let t = step as f32 / (FADE_STEPS - 1) as f32;
    match location {
        FadeLocation::Bottom => 1.0 - t,
        FadeLocation::Top => t,
    }
}

enum OpKind<'f> {
    /// Polygon interiors, no stroke.
    Fill {
        features: &'f FeatureCollection,
        color: Color,
    },
    /// Strokes for open ways and polygon rings.
    Stroke {
        features: &'f FeatureCollection,
        color: Color,
        width_px: f32,
    },
    Roads(&'f StreetGraph),
    Fade(FadeLocation),
}

struct PaintOp<'f> {
    z: f32,
    kind: OpKind<'f>,
}

/// Paints ordered, styled layers onto the poster canvas.
pub struct LayerCompositor<'a> {
    theme: &'a Theme,
    options: &'a GenerationOptions,
}

impl<'a> LayerCompositor<'a> {
    pub fn new(theme: &'a Theme, options: &'a GenerationOptions) -> Self {
        Self { theme, options }
    }

    /// Paints every layer of a feature set over the job's bounding box.
    ///
    /// Empty and unavailable layers are skipped without error. The
    /// returned canvas is ready for typography and encoding.
    pub fn paint(&self, features: &MapFeatureSet, bbox: BoundingBox) -> PosterResult<Canvas> {
        let resolver = StyleResolver::new(self.theme, self.options);
        let bg = parse_hex(&self.theme.bg)
            .map_err(|e| PosterError::Configuration(e.to_string()))?;
        let mut canvas = Canvas::new(bbox, bg)?;

        let mut ops: Vec<PaintOp<'_>> = Vec::new();

        if let Some(fc) = features.water.features() {
            let style = resolver.water_style();
            ops.push(PaintOp {
                z: Z_WATER,
                kind: OpKind::Fill {
                    features: fc,
                    color: layer_color(&style.color, style.alpha)?,
                },
            });
        }
        if let Some(fc) = features.parks.features() {
            let style = resolver.parks_style();
            ops.push(PaintOp {
                z: Z_PARKS,
                kind: OpKind::Fill {
                    features: fc,
                    color: layer_color(&style.color, style.alpha)?,
                },
            });
        }
        if self.options.show_buildings {
            if let Some(fc) = features.buildings.features() {
                let style = resolver.building_style();
                ops.push(PaintOp {
                    z: Z_BUILDINGS,
                    kind: OpKind::Fill {
                        features: fc,
                        color: layer_color(&style.color, style.alpha)?,
                    },
                });
            }
        }
        if self.options.show_railways {
            if let Some(fc) = features.railways.features() {
                let style = resolver.railway_style();
                ops.push(PaintOp {
                    z: Z_RAILWAYS,
                    kind: OpKind::Stroke {
                        features: fc,
                        color: layer_color(&style.color, style.alpha)?,
                        width_px: pt_to_px(style.width),
                    },
                });
            }
        }
        for layer in &features.custom {
            let Some(fc) = layer.state.features() else {
                continue;
            };
            let style = resolver.custom_style(&layer.spec);
            let color = layer_color(&style.color, style.alpha)?;
            let kind = match style.mode {
                LayerMode::Fill => OpKind::Fill {
                    features: fc,
                    color,
                },
                LayerMode::Line => OpKind::Stroke {
                    features: fc,
                    color,
                    width_px: pt_to_px(style.line_width),
                },
            };
            ops.push(PaintOp {
                z: style.zorder,
                kind,
            });
        }
        if !features.street_graph.is_empty() {
            ops.push(PaintOp {
                z: Z_ROADS,
                kind: OpKind::Roads(&features.street_graph),
            });
        }
        if self.options.show_gradients {
            ops.push(PaintOp {
                z: Z_GRADIENTS,
                kind: OpKind::Fade(FadeLocation::Bottom),
            });
            ops.push(PaintOp {
                z: Z_GRADIENTS,
                kind: OpKind::Fade(FadeLocation::Top),
            });
        }

        // Stable sort: equal z keeps insertion order.
        ops.sort_by(|a, b| a.z.total_cmp(&b.z));
        debug!(ops = ops.len(), "compositing layers");

        let projection = canvas.projection;
        for op in ops {
            match op.kind {
                OpKind::Fill { features, color } => {
                    fill_polygons(&mut canvas.pixmap, &projection, features, color)
                }
                OpKind::Stroke {
                    features,
                    color,
                    width_px,
                } => stroke_features(&mut canvas.pixmap, &projection, features, color, width_px),
                OpKind::Roads(graph) => {
                    self.paint_roads(&mut canvas.pixmap, &projection, &resolver, graph)?
                }
                OpKind::Fade(location) => {
                    let color = parse_hex(&self.theme.gradient_color)
                        .map_err(|e| PosterError::Configuration(e.to_string()))?;
                    paint_fade(&mut canvas.pixmap, location, color);
                }
            }
        }

        Ok(canvas)
    }

    /// Strokes every street segment with its resolved hierarchy style.
    fn paint_roads(
        &self,
        pixmap: &mut Pixmap,
        projection: &Projection,
        resolver: &StyleResolver<'_>,
        graph: &StreetGraph,
    ) -> PosterResult<()> {
        // Styles repeat heavily across segments; parse each color once.
        let mut colors: HashMap<String, Color> = HashMap::new();
        for segment in &graph.segments {
            let style = resolver.road_style(&segment.highway);
            let color = match colors.get(&style.color) {
                Some(color) => *color,
                None => {
                    let parsed = parse_hex(&style.color)
                        .map_err(|e| PosterError::Configuration(e.to_string()))?;
                    colors.insert(style.color.clone(), parsed);
                    parsed
                }
            };
            stroke_polyline(
                pixmap,
                projection,
                &segment.geometry,
                color,
                pt_to_px(style.width),
            );
        }
        Ok(())
    }
}

fn layer_color(hex: &str, alpha: f32) -> PosterResult<Color> {
    parse_hex_with_alpha(hex, alpha).map_err(|e| PosterError::Configuration(e.to_string()))
}

fn polyline_path(projection: &Projection, line: &Polyline, close: bool) -> Option<Path> {
    let mut builder = PathBuilder::new();
    let mut points = line.points.iter();
    let first = points.next()?;
    let (x, y) = projection.to_px(first);
    builder.move_to(x, y);
    for point in points {
        let (x, y) = projection.to_px(point);
        builder.line_to(x, y);
    }
    if close {
        builder.close();
    }
    builder.finish()
}

fn solid_paint(color: Color) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(color),
        anti_alias: true,
        ..Paint::default()
    }
}

fn fill_polygons(
    pixmap: &mut Pixmap,
    projection: &Projection,
    features: &FeatureCollection,
    color: Color,
) {
    let paint = solid_paint(color);
    for ring in &features.polygons {
        if let Some(path) = polyline_path(projection, ring, true) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }
}

fn stroke_polyline(
    pixmap: &mut Pixmap,
    projection: &Projection,
    line: &Polyline,
    color: Color,
    width_px: f32,
) {
    let paint = solid_paint(color);
    if let Some(path) = polyline_path(projection, line, false) {
        let stroke = Stroke {
            width: width_px,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn stroke_features(
    pixmap: &mut Pixmap,
    projection: &Projection,
    features: &FeatureCollection,
    color: Color,
    width_px: f32,
) {
    for line in features.lines.iter().chain(features.polygons.iter()) {
        stroke_polyline(pixmap, projection, line, color, width_px);
    }
}

/// Paints one gradient fade as a 256-band alpha ramp.
///
/// The bottom fade covers the lowest quarter of the canvas, the top fade
/// the highest quarter.
fn paint_fade(pixmap: &mut Pixmap, location: FadeLocation, color: Color) {
    let width = pixmap.width() as f32;
    let height = pixmap.height() as f32;
    let quarter = height / 4.0;
    let band_h = quarter / FADE_STEPS as f32;

    for step in 0..FADE_STEPS {
        let alpha = fade_alpha(location, step);
        if alpha <= 0.0 {
            continue;
        }
        let y1 = match location {
            // Step 0 hugs the bottom edge and the ramp climbs upward.
            FadeLocation::Bottom => height - step as f32 * band_h,
            // Step 0 hugs the 75%-height mark and the ramp climbs to the
            // top edge.
            FadeLocation::Top => quarter - step as f32 * band_h,
        };
        let y0 = y1 - band_h;
        let mut band_color = color;
        band_color.apply_opacity(alpha);
        if let Some(rect) = Rect::from_ltrb(0.0, y0, width, y1) {
            pixmap.fill_rect(rect, &solid_paint(band_color), Transform::identity(), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoPoint;
    use crate::geo::{CustomLayer, LayerState, RoadSegment};
    use crate::options::CustomLayerSpec;

    fn bbox() -> BoundingBox {
        BoundingBox {
            south: 0.0,
            west: 0.0,
            north: 1.0,
            east: 1.0,
        }
    }

    fn ring(coords: &[(f64, f64)]) -> Polyline {
        let mut points: Vec<GeoPoint> =
            coords.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect();
        points.push(points[0]);
        Polyline::new(points)
    }

    fn fill_layer(tag: &str, color: &str, zorder: f32, ring: Polyline) -> CustomLayer {
        let mut spec = CustomLayerSpec::any_value(tag);
        spec.mode = LayerMode::Fill;
        spec.color = color.to_string();
        spec.zorder = zorder;
        let mut fc = FeatureCollection::default();
        fc.push(ring);
        CustomLayer {
            spec,
            state: LayerState::Present(fc),
        }
    }

    fn pixel_rgb(canvas: &Canvas, x: u32, y: u32) -> (u8, u8, u8) {
        let p = canvas.pixmap.pixel(x, y).unwrap().demultiply();
        (p.red(), p.green(), p.blue())
    }

    fn plain_options() -> GenerationOptions {
        let mut options = GenerationOptions::default();
        options.show_gradients = false;
        options
    }

    #[test]
    fn test_empty_feature_set_paints_background_only() {
        let theme = Theme::fallback();
        let options = plain_options();
        let compositor = LayerCompositor::new(&theme, &options);

        let canvas = compositor.paint(&MapFeatureSet::default(), bbox()).unwrap();

        assert_eq!(pixel_rgb(&canvas, 0, 0), (255, 255, 255));
        let (w, h) = (canvas.width(), canvas.height());
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (255, 255, 255));
        assert_eq!(pixel_rgb(&canvas, w - 1, h - 1), (255, 255, 255));
    }

    #[test]
    fn test_higher_zorder_overwrites_lower_on_overlap() {
        let theme = Theme::fallback();
        let mut options = plain_options();
        // Two overlapping fills; z=5 must win in the overlap region.
        options.custom_layers.clear();
        let low = fill_layer(
            "low",
            "#FF0000",
            1.0,
            ring(&[(0.2, 0.2), (0.2, 0.8), (0.8, 0.8), (0.8, 0.2)]),
        );
        let high = fill_layer(
            "high",
            "#0000FF",
            5.0,
            ring(&[(0.4, 0.4), (0.4, 0.6), (0.6, 0.6), (0.6, 0.4)]),
        );
        let mut features = MapFeatureSet::default();
        // Insert the high-z layer first to prove ordering is by z, not by
        // insertion.
        features.custom = vec![high, low];

        let compositor = LayerCompositor::new(&theme, &options);
        let canvas = compositor.paint(&features, bbox()).unwrap();

        let (w, h) = (canvas.width(), canvas.height());
        // Overlap center: only the z=5 blue layer is visible.
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (0, 0, 255));
        // Outside the small square but inside the big one: red.
        assert_eq!(pixel_rgb(&canvas, w / 4, h / 2), (255, 0, 0));
    }

    #[test]
    fn test_street_segment_painted_with_hierarchy_color() {
        let theme = Theme::fallback();
        let options = plain_options();
        let mut features = MapFeatureSet::default();
        features.street_graph.segments.push(RoadSegment {
            highway: "motorway".to_string(),
            geometry: Polyline::new(vec![
                GeoPoint::new(0.5, 0.1),
                GeoPoint::new(0.5, 0.9),
            ]),
        });

        let compositor = LayerCompositor::new(&theme, &options);
        let canvas = compositor.paint(&features, bbox()).unwrap();

        // Midpoint of a 5px-wide horizontal stroke across the center.
        let (w, h) = (canvas.width(), canvas.height());
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (0x0A, 0x0A, 0x0A));
    }

    #[test]
    fn test_fill_mode_paints_interior_line_mode_does_not() {
        let theme = Theme::fallback();
        let options = plain_options();
        let square = ring(&[(0.3, 0.3), (0.3, 0.7), (0.7, 0.7), (0.7, 0.3)]);

        let mut line_spec = CustomLayerSpec::any_value("outline");
        line_spec.color = "#00FF00".to_string();
        let mut fc = FeatureCollection::default();
        fc.push(square.clone());
        let mut features = MapFeatureSet::default();
        features.custom = vec![CustomLayer {
            spec: line_spec,
            state: LayerState::Present(fc),
        }];

        let compositor = LayerCompositor::new(&theme, &options);
        let canvas = compositor.paint(&features, bbox()).unwrap();
        let (w, h) = (canvas.width(), canvas.height());
        // Interior stays background in line mode.
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (255, 255, 255));

        let mut features = MapFeatureSet::default();
        features.custom = vec![fill_layer("area", "#00FF00", 2.5, square)];
        let canvas = compositor.paint(&features, bbox()).unwrap();
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (0, 255, 0));
    }

    #[test]
    fn test_unavailable_layer_is_skipped_without_error() {
        let theme = Theme::fallback();
        let mut options = plain_options();
        options.show_buildings = true;
        let mut features = MapFeatureSet::default();
        features.buildings = LayerState::Unavailable("upstream 504".to_string());

        let compositor = LayerCompositor::new(&theme, &options);
        let canvas = compositor.paint(&features, bbox()).unwrap();
        let (w, h) = (canvas.width(), canvas.height());
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (255, 255, 255));
    }

    #[test]
    fn test_bottom_fade_alpha_strictly_decreases() {
        let mut last = f32::INFINITY;
        for step in 0..FADE_STEPS {
            let alpha = fade_alpha(FadeLocation::Bottom, step);
            assert!(alpha < last, "alpha must strictly decrease at step {}", step);
            last = alpha;
        }
        assert_eq!(fade_alpha(FadeLocation::Bottom, 0), 1.0);
        assert_eq!(fade_alpha(FadeLocation::Bottom, FADE_STEPS - 1), 0.0);
    }

    #[test]
    fn test_top_fade_alpha_strictly_increases() {
        let mut last = f32::NEG_INFINITY;
        for step in 0..FADE_STEPS {
            let alpha = fade_alpha(FadeLocation::Top, step);
            assert!(alpha > last, "alpha must strictly increase at step {}", step);
            last = alpha;
        }
        assert_eq!(fade_alpha(FadeLocation::Top, 0), 0.0);
        assert_eq!(fade_alpha(FadeLocation::Top, FADE_STEPS - 1), 1.0);
    }

    #[test]
    fn test_gradient_covers_edges_but_not_middle() {
        let mut theme = Theme::fallback();
        theme.gradient_color = "#FF00FF".to_string();
        let mut options = GenerationOptions::default();
        options.show_gradients = true;

        let compositor = LayerCompositor::new(&theme, &options);
        let canvas = compositor.paint(&MapFeatureSet::default(), bbox()).unwrap();

        let (w, h) = (canvas.width(), canvas.height());
        // Bottom and top edges are fully faded to the gradient color.
        assert_eq!(pixel_rgb(&canvas, w / 2, h - 1), (255, 0, 255));
        assert_eq!(pixel_rgb(&canvas, w / 2, 0), (255, 0, 255));
        // The middle half is untouched.
        assert_eq!(pixel_rgb(&canvas, w / 2, h / 2), (255, 255, 255));
    }
}
