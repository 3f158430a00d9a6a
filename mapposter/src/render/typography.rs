//! Poster typography: city name, divider, country, coordinates and
//! attribution.
//!
//! All anchors are fractions of canvas height measured from the bottom
//! edge. Glyphs are alpha-blended straight into the pixmap; the canvas is
//! opaque, so premultiplied and straight RGBA coincide.

use std::fs;
use std::path::{Path, PathBuf};

use rusttype::{point, Font, Scale};
use tiny_skia::{Pixmap, Rect, Transform};
use tracing::{debug, warn};

use crate::coord::{format_coordinates, GeoPoint};
use crate::error::{PosterError, PosterResult};
use crate::options::TypographyPositions;
use crate::render::canvas::pt_to_px;
use crate::render::color::{parse_hex, parse_hex_with_alpha};
use crate::theme::Theme;

const CITY_SIZE_PT: f32 = 60.0;
const COUNTRY_SIZE_PT: f32 = 22.0;
const COORDS_SIZE_PT: f32 = 14.0;
const ATTRIBUTION_SIZE_PT: f32 = 8.0;
const DIVIDER_WIDTH_PT: f32 = 1.0;

const COORDS_ALPHA: f32 = 0.7;
const ATTRIBUTION_ALPHA: f32 = 0.5;

/// Fixed data-source credit, always painted when fonts are available.
pub const ATTRIBUTION_TEXT: &str = "© OpenStreetMap contributors";

const BUNDLED_FONTS: [(&str, Weight); 3] = [
    ("Roboto-Bold.ttf", Weight::Bold),
    ("Roboto-Regular.ttf", Weight::Regular),
    ("Roboto-Light.ttf", Weight::Light),
];

/// System-wide fonts tried when the bundled set is absent. The first
/// readable file serves for every weight.
const SYSTEM_FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    Bold,
    Regular,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextElement {
    City,
    Country,
    Coordinates,
    Attribution,
}

/// Font weight each text element renders in.
fn element_weight(element: TextElement) -> Weight {
    match element {
        TextElement::City => Weight::Bold,
        TextElement::Country => Weight::Light,
        TextElement::Coordinates => Weight::Regular,
        TextElement::Attribution => Weight::Light,
    }
}

/// The three font weights the poster layout uses.
///
/// Loading prefers the bundled set in the fonts directory and degrades to
/// a single system font for all weights. When neither is available the
/// caller skips typography entirely rather than failing the job.
pub struct FontLibrary {
    bold: Font<'static>,
    regular: Font<'static>,
    light: Font<'static>,
}

impl FontLibrary {
    /// Loads fonts from the fonts directory, falling back to a system
    /// font. Returns `None` when no usable font exists.
    pub fn load(fonts_dir: &Path) -> Option<Self> {
        if let Some(library) = Self::bundled(fonts_dir) {
            debug!(dir = %fonts_dir.display(), "loaded bundled fonts");
            return Some(library);
        }
        Self::system_fallback()
    }

    fn bundled(fonts_dir: &Path) -> Option<Self> {
        let mut bold = None;
        let mut regular = None;
        let mut light = None;
        for (file, weight) in BUNDLED_FONTS {
            let font = load_font(&fonts_dir.join(file))?;
            match weight {
                Weight::Bold => bold = Some(font),
                Weight::Regular => regular = Some(font),
                Weight::Light => light = Some(font),
            }
        }
        Some(Self {
            bold: bold?,
            regular: regular?,
            light: light?,
        })
    }

    fn for_weight(&self, weight: Weight) -> &Font<'static> {
        match weight {
            Weight::Bold => &self.bold,
            Weight::Regular => &self.regular,
            Weight::Light => &self.light,
        }
    }

    fn system_fallback() -> Option<Self> {
        for candidate in SYSTEM_FONT_CANDIDATES {
            if let Some(font) = load_font(&PathBuf::from(candidate)) {
                warn!(
                    font = candidate,
                    "bundled fonts not found, using one system font for all weights"
                );
                return Some(Self {
                    bold: font.clone(),
                    regular: font.clone(),
                    light: font,
                });
            }
        }
        None
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}

/// Pixel y of a baseline anchored `fraction` of the height above the
/// bottom edge.
pub(crate) fn baseline_from_bottom(height: u32, fraction: f32) -> f32 {
    height as f32 * (1.0 - fraction)
}

/// Left origin that centers a run of the given width.
pub(crate) fn centered_origin(width: u32, text_width: f32) -> f32 {
    (width as f32 - text_width) / 2.0
}

/// Paints the poster text block onto a composited canvas.
pub struct TypographyRenderer<'a> {
    fonts: &'a FontLibrary,
    theme: &'a Theme,
    positions: TypographyPositions,
}

impl<'a> TypographyRenderer<'a> {
    pub fn new(fonts: &'a FontLibrary, theme: &'a Theme, positions: TypographyPositions) -> Self {
        Self {
            fonts,
            theme,
            positions,
        }
    }

    /// Draws all five text elements.
    ///
    /// # Arguments
    ///
    /// * `pixmap` - The composited poster raster.
    /// * `city` - City name; rendered upper-cased with letter spacing.
    /// * `country` - Country name; rendered upper-cased.
    /// * `center` - Map center for the coordinates line.
    pub fn render(
        &self,
        pixmap: &mut Pixmap,
        city: &str,
        country: &str,
        center: GeoPoint,
    ) -> PosterResult<()> {
        let rgb = text_rgb(&self.theme.text)?;
        let height = pixmap.height();
        let width = pixmap.width();

        // City: 60pt bold, upper-cased, letter-spaced by twice the space
        // advance.
        let city_font = self.fonts.for_weight(element_weight(TextElement::City));
        let city_text = city.to_uppercase();
        let city_px = pt_to_px(CITY_SIZE_PT);
        let spacing = 2.0 * space_advance(city_font, city_px);
        let run = text_width(city_font, city_px, &city_text, spacing);
        draw_text(
            pixmap,
            city_font,
            city_px,
            centered_origin(width, run),
            baseline_from_bottom(height, self.positions.city_y),
            rgb,
            1.0,
            &city_text,
            spacing,
        );

        self.draw_divider(pixmap)?;

        let country_font = self.fonts.for_weight(element_weight(TextElement::Country));
        let country_text = country.to_uppercase();
        let country_px = pt_to_px(COUNTRY_SIZE_PT);
        let run = text_width(country_font, country_px, &country_text, 0.0);
        draw_text(
            pixmap,
            country_font,
            country_px,
            centered_origin(width, run),
            baseline_from_bottom(height, self.positions.country_y),
            rgb,
            1.0,
            &country_text,
            0.0,
        );

        let coords_font = self.fonts.for_weight(element_weight(TextElement::Coordinates));
        let coords_text = format_coordinates(center.lat, center.lon);
        let coords_px = pt_to_px(COORDS_SIZE_PT);
        let run = text_width(coords_font, coords_px, &coords_text, 0.0);
        draw_text(
            pixmap,
            coords_font,
            coords_px,
            centered_origin(width, run),
            baseline_from_bottom(height, self.positions.coords_y),
            rgb,
            COORDS_ALPHA,
            &coords_text,
            0.0,
        );

        // Attribution: light weight, right-aligned, ending at 98% of the
        // width.
        let attribution_font = self.fonts.for_weight(element_weight(TextElement::Attribution));
        let attribution_px = pt_to_px(ATTRIBUTION_SIZE_PT);
        let run = text_width(attribution_font, attribution_px, ATTRIBUTION_TEXT, 0.0);
        draw_text(
            pixmap,
            attribution_font,
            attribution_px,
            width as f32 * 0.98 - run,
            baseline_from_bottom(height, self.positions.attribution_y),
            rgb,
            ATTRIBUTION_ALPHA,
            ATTRIBUTION_TEXT,
            0.0,
        );

        Ok(())
    }

    /// Horizontal divider between city and country, spanning the middle
    /// fifth of the width.
    fn draw_divider(&self, pixmap: &mut Pixmap) -> PosterResult<()> {
        let color = parse_hex_with_alpha(&self.theme.text, 1.0)
            .map_err(|e| PosterError::Configuration(e.to_string()))?;
        let width = pixmap.width() as f32;
        let y = baseline_from_bottom(pixmap.height(), self.positions.line_y);
        let thickness = pt_to_px(DIVIDER_WIDTH_PT);
        if let Some(rect) = Rect::from_ltrb(
            width * 0.4,
            y - thickness / 2.0,
            width * 0.6,
            y + thickness / 2.0,
        ) {
            let paint = tiny_skia::Paint {
                shader: tiny_skia::Shader::SolidColor(color),
                anti_alias: true,
                ..tiny_skia::Paint::default()
            };
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        Ok(())
    }
}

fn text_rgb(hex: &str) -> PosterResult<[u8; 3]> {
    let color = parse_hex(hex).map_err(|e| PosterError::Configuration(e.to_string()))?;
    Ok([
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
    ])
}

fn space_advance(font: &Font<'_>, px: f32) -> f32 {
    font.glyph(' ')
        .scaled(Scale::uniform(px))
        .h_metrics()
        .advance_width
}

/// Advance-based width of a run, including letter spacing between glyphs.
fn text_width(font: &Font<'_>, px: f32, text: &str, letter_spacing: f32) -> f32 {
    let scale = Scale::uniform(px);
    let mut width = 0.0;
    let mut glyphs = 0usize;
    for ch in text.chars() {
        width += font.glyph(ch).scaled(scale).h_metrics().advance_width;
        glyphs += 1;
    }
    if glyphs > 1 {
        width += letter_spacing * (glyphs - 1) as f32;
    }
    width
}

/// Draws one run of glyphs at a baseline, blending coverage into the
/// opaque pixmap.
#[allow(clippy::too_many_arguments)]
fn draw_text(
    pixmap: &mut Pixmap,
    font: &Font<'_>,
    px_size: f32,
    origin_x: f32,
    baseline_y: f32,
    rgb: [u8; 3],
    alpha: f32,
    text: &str,
    letter_spacing: f32,
) {
    let scale = Scale::uniform(px_size);
    let width = pixmap.width();
    let height = pixmap.height();
    let data = pixmap.data_mut();
    let mut caret_x = origin_x;

    for ch in text.chars() {
        let glyph = font.glyph(ch).scaled(scale).positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let a = coverage * alpha;
                if a <= 0.0 {
                    return;
                }
                let idx = ((py as u32 * width + px as u32) * 4) as usize;
                let inv = 1.0 - a;
                data[idx] = (rgb[0] as f32 * a + data[idx] as f32 * inv) as u8;
                data[idx + 1] = (rgb[1] as f32 * a + data[idx + 1] as f32 * inv) as u8;
                data[idx + 2] = (rgb[2] as f32 * a + data[idx + 2] as f32 * inv) as u8;
                data[idx + 3] = 255;
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width + letter_spacing;
    }
}
