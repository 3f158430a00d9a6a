//! Per-job generation options.
//!
//! [`GenerationOptions`] carries every layer toggle, override and custom
//! layer spec for one poster job. Like the theme, options are constructed
//! once per job and passed explicitly through every stage.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PosterError, PosterResult};
use crate::render::color::parse_hex;

/// Street-graph routing-mode filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// One unified graph of all routable ways.
    All,
    Drive,
    Bike,
    Walk,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::All => "all",
            NetworkType::Drive => "drive",
            NetworkType::Bike => "bike",
            NetworkType::Walk => "walk",
        }
    }
}

/// Paint mode for a custom layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerMode {
    /// Stroke only.
    Line,
    /// Polygon interior with no stroke.
    Fill,
}

/// A user-defined overlay selected by an arbitrary geodata tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLayerSpec {
    /// Tag key to match; specs with an empty key are dropped before fetch.
    pub tag_key: String,
    /// Tag value to match. Absent, empty or `"true"` means "any value".
    #[serde(default)]
    pub tag_value: Option<String>,
    #[serde(default = "default_layer_mode")]
    pub mode: LayerMode,
    #[serde(default = "default_layer_color")]
    pub color: String,
    #[serde(default = "default_layer_width")]
    pub line_width: f32,
    #[serde(default = "default_layer_alpha")]
    pub alpha: f32,
    /// Numeric paint priority; lower paints first.
    #[serde(default = "default_layer_zorder")]
    pub zorder: f32,
}

fn default_layer_mode() -> LayerMode {
    LayerMode::Line
}

fn default_layer_color() -> String {
    "#333333".to_string()
}

fn default_layer_width() -> f32 {
    0.5
}

fn default_layer_alpha() -> f32 {
    1.0
}

fn default_layer_zorder() -> f32 {
    2.5
}

impl CustomLayerSpec {
    /// Line-mode spec matching any value of `tag_key`.
    pub fn any_value(tag_key: impl Into<String>) -> Self {
        Self {
            tag_key: tag_key.into(),
            tag_value: None,
            mode: default_layer_mode(),
            color: default_layer_color(),
            line_width: default_layer_width(),
            alpha: default_layer_alpha(),
            zorder: default_layer_zorder(),
        }
    }

    /// The tag value to filter on, or `None` for "any value present".
    ///
    /// Absent, empty and `"true"`/`"True"` values all mean "any value".
    pub fn effective_tag_value(&self) -> Option<&str> {
        match self.tag_value.as_deref() {
            None | Some("") | Some("true") | Some("True") => None,
            Some(value) => Some(value),
        }
    }
}

/// Typography anchors as fractions of canvas height, measured from the
/// bottom edge. Fractions, not pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypographyPositions {
    pub city_y: f32,
    pub line_y: f32,
    pub country_y: f32,
    pub coords_y: f32,
    pub attribution_y: f32,
}

impl Default for TypographyPositions {
    fn default() -> Self {
        Self {
            city_y: 0.14,
            line_y: 0.125,
            country_y: 0.10,
            coords_y: 0.07,
            attribution_y: 0.02,
        }
    }
}

impl TypographyPositions {
    fn validate(&self) -> PosterResult<()> {
        let fractions = [
            ("city_y", self.city_y),
            ("line_y", self.line_y),
            ("country_y", self.country_y),
            ("coords_y", self.coords_y),
            ("attribution_y", self.attribution_y),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(PosterError::Configuration(format!(
                    "typography position '{}' must be a fraction in [0, 1], got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

/// Everything configurable about one generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Requested routing modes; subgraphs are unioned when several are given.
    pub network_types: Vec<NetworkType>,
    pub use_cache: bool,
    pub show_water: bool,
    pub show_parks: bool,
    pub show_buildings: bool,
    pub show_railways: bool,
    pub show_gradients: bool,
    pub use_road_hierarchy_colors: bool,
    pub use_road_hierarchy_widths: bool,
    /// Uniform road color when hierarchy coloring is off.
    pub road_color: Option<String>,
    /// Uniform road width when hierarchy widths are off.
    pub road_width: f32,
    pub building_color: Option<String>,
    pub building_alpha: f32,
    pub railway_color: Option<String>,
    pub railway_width: f32,
    pub custom_layers: Vec<CustomLayerSpec>,
    pub typography_positions: TypographyPositions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            network_types: vec![NetworkType::All],
            use_cache: true,
            show_water: true,
            show_parks: true,
            show_buildings: false,
            show_railways: false,
            show_gradients: true,
            use_road_hierarchy_colors: true,
            use_road_hierarchy_widths: true,
            road_color: None,
            road_width: 0.6,
            building_color: None,
            building_alpha: 0.4,
            railway_color: None,
            railway_width: 0.6,
            custom_layers: Vec::new(),
            typography_positions: TypographyPositions::default(),
        }
    }
}

impl GenerationOptions {
    /// Normalizes the options for one job.
    ///
    /// Custom layer specs with an empty tag key are dropped silently
    /// before any fetch; an empty network list falls back to `all`.
    pub fn normalized(mut self) -> Self {
        let before = self.custom_layers.len();
        self.custom_layers
            .retain(|layer| !layer.tag_key.trim().is_empty());
        if self.custom_layers.len() != before {
            warn!(
                dropped = before - self.custom_layers.len(),
                "dropped custom layer specs with empty tag key"
            );
        }
        if self.network_types.is_empty() {
            self.network_types = vec![NetworkType::All];
        }
        self
    }

    /// Validates option values before any fetch.
    pub fn validate(&self) -> PosterResult<()> {
        self.typography_positions.validate()?;
        check_alpha("building_alpha", self.building_alpha)?;
        for (field, color) in [
            ("road_color", &self.road_color),
            ("building_color", &self.building_color),
            ("railway_color", &self.railway_color),
        ] {
            if let Some(color) = color {
                parse_hex(color).map_err(|_| {
                    PosterError::Configuration(format!(
                        "option '{}' holds invalid color '{}'",
                        field, color
                    ))
                })?;
            }
        }
        for layer in &self.custom_layers {
            check_alpha("custom layer alpha", layer.alpha)?;
            parse_hex(&layer.color).map_err(|_| {
                PosterError::Configuration(format!(
                    "custom layer '{}' holds invalid color '{}'",
                    layer.tag_key, layer.color
                ))
            })?;
        }
        Ok(())
    }
}

fn check_alpha(field: &str, alpha: f32) -> PosterResult<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PosterError::Configuration(format!(
            "'{}' must be in [0, 1], got {}",
            field, alpha
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let options = GenerationOptions::default();

        assert_eq!(options.network_types, vec![NetworkType::All]);
        assert!(options.use_cache && options.show_water && options.show_parks);
        assert!(!options.show_buildings && !options.show_railways);
        assert!(options.show_gradients);
        assert_eq!(options.road_width, 0.6);
        assert_eq!(options.building_alpha, 0.4);
        assert_eq!(options.typography_positions.city_y, 0.14);
        assert_eq!(options.typography_positions.attribution_y, 0.02);
    }

    #[test]
    fn test_normalized_drops_empty_tag_keys() {
        let mut options = GenerationOptions::default();
        options.custom_layers = vec![
            CustomLayerSpec::any_value("aeroway"),
            CustomLayerSpec::any_value(""),
            CustomLayerSpec::any_value("   "),
        ];

        let normalized = options.normalized();
        assert_eq!(normalized.custom_layers.len(), 1);
        assert_eq!(normalized.custom_layers[0].tag_key, "aeroway");
    }

    #[test]
    fn test_normalized_defaults_empty_networks_to_all() {
        let mut options = GenerationOptions::default();
        options.network_types.clear();

        assert_eq!(options.normalized().network_types, vec![NetworkType::All]);
    }

    #[test]
    fn test_effective_tag_value_treats_true_as_any() {
        let mut spec = CustomLayerSpec::any_value("amenity");
        assert_eq!(spec.effective_tag_value(), None);

        spec.tag_value = Some("true".to_string());
        assert_eq!(spec.effective_tag_value(), None);

        spec.tag_value = Some("".to_string());
        assert_eq!(spec.effective_tag_value(), None);

        spec.tag_value = Some("fountain".to_string());
        assert_eq!(spec.effective_tag_value(), Some("fountain"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_fraction() {
        let mut options = GenerationOptions::default();
        options.typography_positions.city_y = 1.4;

        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("city_y"));
    }

    #[test]
    fn test_validate_rejects_bad_override_color() {
        let mut options = GenerationOptions::default();
        options.road_color = Some("#GGGGGG".to_string());

        assert!(options.validate().is_err());
    }

    #[test]
    fn test_network_type_serde_is_lowercase() {
        let json = serde_json::to_string(&NetworkType::Drive).unwrap();
        assert_eq!(json, "\"drive\"");
        let back: NetworkType = serde_json::from_str("\"walk\"").unwrap();
        assert_eq!(back, NetworkType::Walk);
    }
}
