//! Style resolution: semantic attributes to render styles.
//!
//! The resolver is pure: identical inputs always produce identical styles
//! and no call has an observable side effect, so it can be consulted per
//! element during compositing.

use crate::options::{CustomLayerSpec, GenerationOptions, LayerMode};
use crate::theme::Theme;

/// Resolved road-hierarchy color slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadSlot {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    /// Anything outside the named hierarchy classes.
    Default,
}

/// Classifies a normalized highway value. First match wins.
pub fn classify(highway: &str) -> RoadSlot {
    match highway {
        "motorway" | "motorway_link" => RoadSlot::Motorway,
        "trunk" | "trunk_link" | "primary" | "primary_link" => RoadSlot::Primary,
        "secondary" | "secondary_link" => RoadSlot::Secondary,
        "tertiary" | "tertiary_link" => RoadSlot::Tertiary,
        "residential" | "living_street" | "unclassified" => RoadSlot::Residential,
        _ => RoadSlot::Default,
    }
}

/// Hierarchy line width for a road slot, in points.
pub fn hierarchy_width(slot: RoadSlot) -> f32 {
    match slot {
        RoadSlot::Motorway => 1.2,
        RoadSlot::Primary => 1.0,
        RoadSlot::Secondary => 0.8,
        RoadSlot::Tertiary => 0.6,
        RoadSlot::Residential | RoadSlot::Default => 0.4,
    }
}

/// Resolved stroke style for one road segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadStyle {
    /// Hex color string from the theme (or a uniform override).
    pub color: String,
    /// Line width in points.
    pub width: f32,
}

/// Resolved style for a polygonal fill layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub color: String,
    pub alpha: f32,
}

/// Resolved style for a stroked line layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f32,
    pub alpha: f32,
}

/// Resolved style for a custom layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomStyle {
    pub color: String,
    pub alpha: f32,
    pub zorder: f32,
    pub line_width: f32,
    pub mode: LayerMode,
}

/// Maps semantic attributes to render styles for one job's theme and
/// options.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    theme: &'a Theme,
    options: &'a GenerationOptions,
}

impl<'a> StyleResolver<'a> {
    pub fn new(theme: &'a Theme, options: &'a GenerationOptions) -> Self {
        Self { theme, options }
    }

    /// Style for one street segment, honoring the hierarchy toggles.
    ///
    /// With hierarchy coloring disabled every segment uses one uniform
    /// color (the explicit override, else `road_default`); with hierarchy
    /// widths disabled every segment uses the configured uniform width.
    pub fn road_style(&self, highway: &str) -> RoadStyle {
        let slot = classify(highway);
        let color = if self.options.use_road_hierarchy_colors {
            self.theme.road_color(slot).to_string()
        } else {
            self.options
                .road_color
                .clone()
                .unwrap_or_else(|| self.theme.road_default.clone())
        };
        let width = if self.options.use_road_hierarchy_widths {
            hierarchy_width(slot)
        } else {
            self.options.road_width
        };
        RoadStyle { color, width }
    }

    pub fn water_style(&self) -> FillStyle {
        FillStyle {
            color: self.theme.water.clone(),
            alpha: 1.0,
        }
    }

    pub fn parks_style(&self) -> FillStyle {
        FillStyle {
            color: self.theme.parks.clone(),
            alpha: 1.0,
        }
    }

    /// Buildings fall back to the residential road color.
    pub fn building_style(&self) -> FillStyle {
        FillStyle {
            color: self
                .options
                .building_color
                .clone()
                .unwrap_or_else(|| self.theme.road_residential.clone()),
            alpha: self.options.building_alpha,
        }
    }

    /// Railways fall back to the primary road color.
    pub fn railway_style(&self) -> LineStyle {
        LineStyle {
            color: self
                .options
                .railway_color
                .clone()
                .unwrap_or_else(|| self.theme.road_primary.clone()),
            width: self.options.railway_width,
            alpha: 0.9,
        }
    }

    pub fn custom_style(&self, spec: &CustomLayerSpec) -> CustomStyle {
        CustomStyle {
            color: spec.color.clone(),
            alpha: spec.alpha,
            zorder: spec.zorder,
            line_width: spec.line_width,
            mode: spec.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GenerationOptions;

    fn resolver_fixtures() -> (Theme, GenerationOptions) {
        (Theme::fallback(), GenerationOptions::default())
    }

    #[test]
    fn test_classification_table_first_match_wins() {
        assert_eq!(classify("motorway"), RoadSlot::Motorway);
        assert_eq!(classify("motorway_link"), RoadSlot::Motorway);
        assert_eq!(classify("trunk"), RoadSlot::Primary);
        assert_eq!(classify("primary_link"), RoadSlot::Primary);
        assert_eq!(classify("secondary"), RoadSlot::Secondary);
        assert_eq!(classify("tertiary_link"), RoadSlot::Tertiary);
        assert_eq!(classify("living_street"), RoadSlot::Residential);
        assert_eq!(classify("unclassified"), RoadSlot::Residential);
        assert_eq!(classify("footway"), RoadSlot::Default);
        assert_eq!(classify(""), RoadSlot::Default);
    }

    #[test]
    fn test_road_style_returns_table_pairs() {
        let (theme, options) = resolver_fixtures();
        let resolver = StyleResolver::new(&theme, &options);

        let expected = [
            ("motorway", &theme.road_motorway, 1.2),
            ("primary", &theme.road_primary, 1.0),
            ("secondary", &theme.road_secondary, 0.8),
            ("tertiary", &theme.road_tertiary, 0.6),
            ("residential", &theme.road_residential, 0.4),
            ("footway", &theme.road_default, 0.4),
        ];
        for (highway, color, width) in expected {
            let style = resolver.road_style(highway);
            assert_eq!(&style.color, color, "color for {}", highway);
            assert_eq!(style.width, width, "width for {}", highway);
        }
    }

    #[test]
    fn test_road_style_is_deterministic_and_pure() {
        let (theme, options) = resolver_fixtures();
        let resolver = StyleResolver::new(&theme, &options);

        let first = resolver.road_style("secondary");
        for _ in 0..10 {
            assert_eq!(resolver.road_style("secondary"), first);
        }
    }

    #[test]
    fn test_classification_is_representation_invariant() {
        use crate::geo::normalize_highway;
        let (theme, options) = resolver_fixtures();
        let resolver = StyleResolver::new(&theme, &options);

        // A scalar value and a multi-valued attribute whose first element
        // equals that value resolve identically.
        let scalar = resolver.road_style(&normalize_highway(Some("tertiary")));
        let multi = resolver.road_style(&normalize_highway(Some("tertiary;residential")));
        assert_eq!(scalar, multi);
    }

    #[test]
    fn test_uniform_road_style_when_hierarchy_disabled() {
        let (theme, mut options) = resolver_fixtures();
        options.use_road_hierarchy_colors = false;
        options.use_road_hierarchy_widths = false;
        options.road_color = Some("#ABCDEF".to_string());
        options.road_width = 0.9;
        let resolver = StyleResolver::new(&theme, &options);

        for highway in ["motorway", "secondary", "footway"] {
            let style = resolver.road_style(highway);
            assert_eq!(style.color, "#ABCDEF");
            assert_eq!(style.width, 0.9);
        }
    }

    #[test]
    fn test_uniform_road_color_defaults_to_road_default() {
        let (theme, mut options) = resolver_fixtures();
        options.use_road_hierarchy_colors = false;
        let resolver = StyleResolver::new(&theme, &options);

        assert_eq!(resolver.road_style("motorway").color, theme.road_default);
    }

    #[test]
    fn test_building_and_railway_fallback_colors() {
        let (theme, options) = resolver_fixtures();
        let resolver = StyleResolver::new(&theme, &options);

        assert_eq!(resolver.building_style().color, theme.road_residential);
        assert_eq!(resolver.building_style().alpha, 0.4);
        assert_eq!(resolver.railway_style().color, theme.road_primary);
        assert_eq!(resolver.railway_style().alpha, 0.9);
    }

    #[test]
    fn test_building_and_railway_overrides() {
        let (theme, mut options) = resolver_fixtures();
        options.building_color = Some("#111111".to_string());
        options.railway_color = Some("#222222".to_string());
        options.railway_width = 1.5;
        let resolver = StyleResolver::new(&theme, &options);

        assert_eq!(resolver.building_style().color, "#111111");
        assert_eq!(resolver.railway_style().color, "#222222");
        assert_eq!(resolver.railway_style().width, 1.5);
    }
}
