//! Geographic coordinates, bounding boxes and coordinate formatting.

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees (positive north).
    pub lat: f64,
    /// Longitude in degrees (positive east).
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Meters per degree of latitude (spherical approximation).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Builds a square bounding box of half-side `dist_m` meters around a
    /// center point.
    ///
    /// The longitude span is widened by the latitude cosine so the box
    /// covers roughly `2 * dist_m` meters in both axes.
    pub fn around(center: GeoPoint, dist_m: f64) -> Self {
        let dlat = dist_m / METERS_PER_DEGREE;
        let dlon = dist_m / (METERS_PER_DEGREE * center.lat.to_radians().cos().abs().max(1e-9));
        Self {
            south: center.lat - dlat,
            west: center.lon - dlon,
            north: center.lat + dlat,
            east: center.lon + dlon,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }
}

/// Formats a coordinate pair for poster typography.
///
/// Produces `"D.DDDD° {N|S} / D.DDDD° {E|W}"` with 4 decimals; the
/// hemisphere letter carries the sign and only the magnitude is shown.
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    let lat_dir = if lat >= 0.0 { "N" } else { "S" };
    let lon_dir = if lon >= 0.0 { "E" } else { "W" };
    format!(
        "{:.4}° {} / {:.4}° {}",
        lat.abs(),
        lat_dir,
        lon.abs(),
        lon_dir
    )
}
