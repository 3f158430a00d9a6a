//! Fixed-size poster canvas and geographic projection.
//!
//! The canvas is a fixed 12x16 inch portrait (3:4) raster at 300 dpi.
//! Geometry is projected linearly from the job's bounding box onto the
//! full canvas, north up.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tiny_skia::{Color, Pixmap};

use crate::coord::{BoundingBox, GeoPoint};
use crate::error::{PosterError, PosterResult};

/// Physical poster width in inches.
pub const POSTER_WIDTH_IN: f32 = 12.0;
/// Physical poster height in inches.
pub const POSTER_HEIGHT_IN: f32 = 16.0;
/// Output resolution in dots per inch.
pub const POSTER_DPI: u32 = 300;

/// Canvas width in pixels (12 in at 300 dpi).
pub const CANVAS_WIDTH_PX: u32 = (POSTER_WIDTH_IN as u32) * POSTER_DPI;
/// Canvas height in pixels (16 in at 300 dpi).
pub const CANVAS_HEIGHT_PX: u32 = (POSTER_HEIGHT_IN as u32) * POSTER_DPI;

/// Converts a line width or font size in points to pixels at poster dpi.
pub fn pt_to_px(points: f32) -> f32 {
    points * POSTER_DPI as f32 / 72.0
}

/// Linear geo-to-pixel projection over a bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    bbox: BoundingBox,
    width_px: f32,
    height_px: f32,
}

impl Projection {
    pub fn new(bbox: BoundingBox, width_px: u32, height_px: u32) -> Self {
        Self {
            bbox,
            width_px: width_px as f32,
            height_px: height_px as f32,
        }
    }

    /// Projects a point to pixel coordinates (y grows downward).
    pub fn to_px(&self, point: &GeoPoint) -> (f32, f32) {
        let x = (point.lon - self.bbox.west) / self.bbox.width() * self.width_px as f64;
        let y = (self.bbox.north - point.lat) / self.bbox.height() * self.height_px as f64;
        (x as f32, y as f32)
    }
}

/// The poster raster plus its projection.
pub struct Canvas {
    pub pixmap: Pixmap,
    pub projection: Projection,
}

impl Canvas {
    /// Allocates the fixed-size canvas filled with a background color.
    pub fn new(bbox: BoundingBox, background: Color) -> PosterResult<Self> {
        let mut pixmap = Pixmap::new(CANVAS_WIDTH_PX, CANVAS_HEIGHT_PX).ok_or_else(|| {
            PosterError::Encoding("failed to allocate poster canvas".to_string())
        })?;
        pixmap.fill(background);
        Ok(Self {
            projection: Projection::new(bbox, CANVAS_WIDTH_PX, CANVAS_HEIGHT_PX),
            pixmap,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Encodes a pixmap as PNG at the given path.
///
/// The pixmap stores premultiplied RGBA; pixels are demultiplied before
/// encoding.
pub fn write_png(pixmap: &Pixmap, path: &Path) -> PosterResult<()> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let file = File::create(path)
        .map_err(|e| PosterError::Encoding(format!("cannot create '{}': {}", path.display(), e)))?;
    PngEncoder::new(BufWriter::new(file))
        .write_image(&rgba, pixmap.width(), pixmap.height(), ColorType::Rgba8)
        .map_err(|e| PosterError::Encoding(format!("PNG encode failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bbox() -> BoundingBox {
        BoundingBox {
            south: 48.0,
            west: 2.0,
            north: 49.0,
            east: 3.0,
        }
    }

    #[test]
    fn test_canvas_dimensions_are_3600_by_4800() {
        assert_eq!(CANVAS_WIDTH_PX, 3600);
        assert_eq!(CANVAS_HEIGHT_PX, 4800);
    }

    #[test]
    fn test_projection_corners() {
        let projection = Projection::new(bbox(), 100, 200);

        // Northwest corner maps to the origin.
        let (x, y) = projection.to_px(&GeoPoint::new(49.0, 2.0));
        assert_eq!((x, y), (0.0, 0.0));

        // Southeast corner maps to the far corner.
        let (x, y) = projection.to_px(&GeoPoint::new(48.0, 3.0));
        assert_eq!((x, y), (100.0, 200.0));
    }

    #[test]
    fn test_projection_center() {
        let projection = Projection::new(bbox(), 100, 200);
        let (x, y) = projection.to_px(&GeoPoint::new(48.5, 2.5));
        assert!((x - 50.0).abs() < 1e-3);
        assert!((y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_pt_to_px_at_300_dpi() {
        assert!((pt_to_px(72.0) - 300.0).abs() < 1e-3);
        assert!((pt_to_px(1.2) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_write_png_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        pixmap.fill(Color::from_rgba8(10, 20, 30, 255));

        write_png(&pixmap, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_write_png_to_missing_directory_is_encoding_error() {
        let pixmap = Pixmap::new(2, 2).unwrap();
        let err = write_png(&pixmap, Path::new("/nonexistent/dir/out.png")).unwrap_err();
        assert!(matches!(err, PosterError::Encoding(_)));
    }
}
