//! Theme palettes and theme-file storage.
//!
//! A theme is an immutable named palette with one string color slot per
//! paintable concern. Themes are stored as JSON files in a themes
//! directory; a missing file falls back to the built-in palette, while a
//! file with a missing required slot is a configuration error.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PosterError, PosterResult};
use crate::render::color::parse_hex;
use crate::style::RoadSlot;

/// Required color slots, used for validation error messages.
pub const REQUIRED_SLOTS: &[&str] = &[
    "bg",
    "text",
    "gradient_color",
    "water",
    "parks",
    "road_motorway",
    "road_primary",
    "road_secondary",
    "road_tertiary",
    "road_residential",
    "road_default",
];

/// Immutable named palette controlling poster appearance.
///
/// Constructed once per job and passed explicitly through every pipeline
/// stage; no job ever observes another job's theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Display name, distinct from the theme file id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub bg: String,
    pub text: String,
    pub gradient_color: String,
    pub water: String,
    pub parks: String,
    pub road_motorway: String,
    pub road_primary: String,
    pub road_secondary: String,
    pub road_tertiary: String,
    pub road_residential: String,
    pub road_default: String,
}

impl Theme {
    /// The built-in "Feature-Based Shading" palette.
    ///
    /// Used as the documented fallback when a named theme file is absent.
    pub fn fallback() -> Self {
        Self {
            name: Some("Feature-Based Shading".to_string()),
            description: None,
            bg: "#FFFFFF".to_string(),
            text: "#000000".to_string(),
            gradient_color: "#FFFFFF".to_string(),
            water: "#C0C0C0".to_string(),
            parks: "#F0F0F0".to_string(),
            road_motorway: "#0A0A0A".to_string(),
            road_primary: "#1A1A1A".to_string(),
            road_secondary: "#2A2A2A".to_string(),
            road_tertiary: "#3A3A3A".to_string(),
            road_residential: "#4A4A4A".to_string(),
            road_default: "#3A3A3A".to_string(),
        }
    }

    /// Loads and validates a theme from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read, a
    /// required slot is missing, or a slot holds an unparseable color.
    pub fn from_file(path: &Path) -> PosterResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PosterError::Configuration(format!("cannot read theme file '{}': {}", path.display(), e))
        })?;
        let theme: Theme = serde_json::from_str(&raw).map_err(|e| {
            PosterError::Configuration(format!("invalid theme file '{}': {}", path.display(), e))
        })?;
        theme.validate()?;
        Ok(theme)
    }

    /// Loads the named theme from a themes directory.
    ///
    /// A missing file falls back to [`Theme::fallback`] with a warning; an
    /// invalid file is a configuration error.
    pub fn load(themes_dir: &Path, theme_id: &str) -> PosterResult<Self> {
        let path = themes_dir.join(format!("{}.json", theme_id));
        if !path.exists() {
            warn!(
                theme = theme_id,
                path = %path.display(),
                "theme file not found, using built-in fallback palette"
            );
            return Ok(Self::fallback());
        }
        let theme = Self::from_file(&path)?;
        info!(
            theme = theme_id,
            name = theme.name.as_deref().unwrap_or(theme_id),
            "loaded theme"
        );
        Ok(theme)
    }

    /// Checks that every required slot is present and parseable.
    pub fn validate(&self) -> PosterResult<()> {
        for (slot, value) in self.slots() {
            if value.trim().is_empty() {
                return Err(PosterError::Configuration(format!(
                    "theme is missing required color slot '{}'",
                    slot
                )));
            }
            parse_hex(value).map_err(|_| {
                PosterError::Configuration(format!(
                    "theme slot '{}' holds invalid color '{}'",
                    slot, value
                ))
            })?;
        }
        Ok(())
    }

    /// Road color for a resolved hierarchy slot.
    pub fn road_color(&self, slot: RoadSlot) -> &str {
        match slot {
            RoadSlot::Motorway => &self.road_motorway,
            RoadSlot::Primary => &self.road_primary,
            RoadSlot::Secondary => &self.road_secondary,
            RoadSlot::Tertiary => &self.road_tertiary,
            RoadSlot::Residential => &self.road_residential,
            RoadSlot::Default => &self.road_default,
        }
    }

    fn slots(&self) -> [(&'static str, &str); 11] {
        [
            ("bg", &self.bg),
            ("text", &self.text),
            ("gradient_color", &self.gradient_color),
            ("water", &self.water),
            ("parks", &self.parks),
            ("road_motorway", &self.road_motorway),
            ("road_primary", &self.road_primary),
            ("road_secondary", &self.road_secondary),
            ("road_tertiary", &self.road_tertiary),
            ("road_residential", &self.road_residential),
            ("road_default", &self.road_default),
        ]
    }
}

/// Identifier plus display metadata for one stored theme.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSummary {
    /// File stem, used in output filenames.
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Lists theme ids available in a themes directory, sorted by id.
pub fn available_themes(themes_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(themes_dir) else {
        return Vec::new();
    };
    let mut ids: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                path.file_stem().and_then(|s| s.to_str()).map(String::from)
            } else {
                None
            }
        })
        .collect();
    ids.sort();
    ids
}

/// Loads display metadata for every stored theme, sorted by id.
///
/// Unreadable theme files degrade to their file stem instead of failing
/// the listing.
pub fn theme_summaries(themes_dir: &Path) -> Vec<ThemeSummary> {
    let mut summaries = BTreeMap::new();
    for id in available_themes(themes_dir) {
        let summary = match Theme::from_file(&themes_dir.join(format!("{}.json", id))) {
            Ok(theme) => ThemeSummary {
                display_name: theme.name.unwrap_or_else(|| id.clone()),
                description: theme.description,
                id: id.clone(),
            },
            Err(_) => ThemeSummary {
                display_name: id.clone(),
                description: None,
                id: id.clone(),
            },
        };
        summaries.insert(id, summary);
    }
    summaries.into_values().collect()
}
