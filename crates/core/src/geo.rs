//! Geographic calculations
//!
//! Great-circle distance, bearing and forward projection on a spherical Earth,
//! plus the degree-space helpers used by the hull and path builders.
//!
//! All angle math runs in radians internally; degrees at the API boundary.
//! Inputs are assumed to stay inside a bounded regional area: nothing here
//! handles wraparound at the antimeridian.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Approximate length of one degree of latitude in miles
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, valid range [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, valid range [-180, 180]
    pub longitude: f64,
}

impl Position {
    /// Create a new position (not validated, see [`Position::is_valid`])
    #[inline]
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite coordinates inside the latitude/longitude ranges
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Planar view of the position (x = longitude, y = latitude)
    #[inline]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.longitude, self.latitude)
    }

    /// Inverse of [`Position::to_vector`]
    #[inline]
    pub fn from_vector(v: Vector2<f64>) -> Self {
        Self::new(v.y, v.x)
    }

    /// Linear interpolation in degree space (`t = 0` is `self`, `t = 1` is `other`)
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::from_vector(self.to_vector().lerp(&other.to_vector(), t))
    }
}

/// Convert degrees to radians
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Convert radians to degrees
#[inline]
pub fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Great-circle (haversine) distance between two positions
///
/// # Returns
///
/// Distance in miles
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    let lat1 = to_radians(a.latitude);
    let lat2 = to_radians(b.latitude);
    let dlat2 = (lat2 - lat1) / 2.0;
    let dlon2 = to_radians(b.longitude - a.longitude) / 2.0;

    let h = dlat2.sin().powi(2) + lat1.cos() * lat2.cos() * dlon2.sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let arc = 2.0 * h.sqrt().min(1.0).asin();

    arc * EARTH_RADIUS_MILES
}

/// Initial bearing from `from` toward `to`
///
/// # Returns
///
/// Bearing in degrees, normalized to [0, 360)
pub fn bearing(from: Position, to: Position) -> f64 {
    let lat1 = to_radians(from.latitude);
    let lat2 = to_radians(to.latitude);
    let dlon = to_radians(to.longitude - from.longitude);

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let deg = to_degrees(y.atan2(x)).rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

/// Project a position forward along a bearing
///
/// # Arguments
///
/// * `start` - Starting position
/// * `bearing_deg` - Bearing in degrees clockwise from north
/// * `distance_miles` - Distance to travel in miles
pub fn destination_point(start: Position, bearing_deg: f64, distance_miles: f64) -> Position {
    let delta = distance_miles / EARTH_RADIUS_MILES;
    let theta = to_radians(bearing_deg);
    let lat1 = to_radians(start.latitude);
    let lon1 = to_radians(start.longitude);

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Position::new(to_degrees(lat2), to_degrees(lon2))
}

/// Polar angle of `point` around `pivot` in degree space, in radians
pub fn polar_angle(pivot: Position, point: Position) -> f64 {
    (point.latitude - pivot.latitude).atan2(point.longitude - pivot.longitude)
}

/// Twice the signed area of the triangle `p1 → p2 → p3` in degree space
///
/// Positive for a counter-clockwise (left) turn, negative for clockwise,
/// zero when collinear.
pub fn cross_product(p1: Position, p2: Position, p3: Position) -> f64 {
    (p2.longitude - p1.longitude) * (p3.latitude - p1.latitude)
        - (p2.latitude - p1.latitude) * (p3.longitude - p1.longitude)
}

/// Plain Cartesian distance in degree space (not geodesic)
#[inline]
pub fn euclidean_degree_distance(a: Position, b: Position) -> f64 {
    (a.to_vector() - b.to_vector()).norm()
}

/// Closed polygon ring
///
/// The first vertex implicitly connects to the last. An empty polygon means
/// "no boundary".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Position>,
}

impl Polygon {
    /// Create a polygon from its ring vertices
    #[must_use]
    pub fn new(vertices: Vec<Position>) -> Self {
        Self { vertices }
    }

    /// Empty (absent) polygon
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is no boundary
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of ring vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Ring vertices in order
    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }

    /// Consume the polygon, returning its vertices
    pub fn into_vertices(self) -> Vec<Position> {
        self.vertices
    }

    /// Mean of the ring vertices, `None` for an empty polygon
    pub fn centroid(&self) -> Option<Position> {
        centroid(&self.vertices)
    }

    /// Point-in-polygon test (even-odd ray casting in degree space)
    ///
    /// Points exactly on an edge may land on either side.
    pub fn contains(&self, point: Position) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let (x, y) = (point.longitude, point.latitude);
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.vertices[i].longitude, self.vertices[i].latitude);
            let (xj, yj) = (self.vertices[j].longitude, self.vertices[j].latitude);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Mean of a set of positions
pub(crate) fn centroid(points: &[Position]) -> Option<Position> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.to_vector());
    Some(Position::from_vector(sum / points.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_zero_distance() {
        let p = Position::new(34.0, -118.0);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of latitude is ~69.1 miles on a 3959 mi sphere
        let d = haversine_distance(Position::new(34.0, -118.0), Position::new(35.0, -118.0));
        assert_relative_eq!(d, 69.097, epsilon = 0.01);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Position::new(34.05, -118.25);
        let b = Position::new(37.77, -122.42);
        assert_relative_eq!(haversine_distance(a, b), haversine_distance(b, a));
        // LA to SF is roughly 347 miles
        assert!((haversine_distance(a, b) - 347.0).abs() < 5.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Position::new(0.0, 0.0);
        assert_relative_eq!(bearing(origin, Position::new(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, Position::new(0.0, 1.0)), 90.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, Position::new(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, Position::new(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let from = Position::new(34.0, -118.0);
        for &(lat, lon) in &[(34.1, -118.1), (33.9, -117.9), (34.0, -118.5), (35.0, -118.0)] {
            let b = bearing(from, Position::new(lat, lon));
            assert!((0.0..360.0).contains(&b), "bearing out of range: {b}");
        }
    }

    #[test]
    fn test_destination_point_round_trip_distance() {
        let start = Position::new(34.0, -118.0);
        let end = destination_point(start, 45.0, 10.0);
        assert_relative_eq!(haversine_distance(start, end), 10.0, epsilon = 1e-6);
        assert_relative_eq!(bearing(start, end), 45.0, epsilon = 0.1);
    }

    #[test]
    fn test_destination_point_zero_distance() {
        let start = Position::new(34.0, -118.0);
        let end = destination_point(start, 123.0, 0.0);
        assert_relative_eq!(end.latitude, start.latitude, epsilon = 1e-12);
        assert_relative_eq!(end.longitude, start.longitude, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_product_turns() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(0.0, 1.0);
        assert!(cross_product(a, b, Position::new(1.0, 1.0)) > 0.0, "left turn");
        assert!(cross_product(a, b, Position::new(-1.0, 1.0)) < 0.0, "right turn");
        assert_eq!(cross_product(a, b, Position::new(0.0, 2.0)), 0.0);
    }

    #[test]
    fn test_polar_angle() {
        let pivot = Position::new(0.0, 0.0);
        assert_relative_eq!(polar_angle(pivot, Position::new(0.0, 1.0)), 0.0);
        assert_relative_eq!(polar_angle(pivot, Position::new(1.0, 0.0)), PI / 2.0);
    }

    #[test]
    fn test_position_validity() {
        assert!(Position::new(34.0, -118.0).is_valid());
        assert!(!Position::new(91.0, 0.0).is_valid());
        assert!(!Position::new(0.0, 181.0).is_valid());
        assert!(!Position::new(f64::NAN, 0.0).is_valid());
        assert!(!Position::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_polygon_contains() {
        let square = Polygon::new(vec![
            Position::new(0.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(1.0, 1.0),
            Position::new(1.0, 0.0),
        ]);
        assert!(square.contains(Position::new(0.5, 0.5)));
        assert!(!square.contains(Position::new(1.5, 0.5)));
        assert!(!Polygon::empty().contains(Position::new(0.5, 0.5)));
    }

    #[test]
    fn test_polygon_centroid() {
        let square = Polygon::new(vec![
            Position::new(0.0, 0.0),
            Position::new(0.0, 2.0),
            Position::new(2.0, 2.0),
            Position::new(2.0, 0.0),
        ]);
        let c = square.centroid().unwrap();
        assert_relative_eq!(c.latitude, 1.0);
        assert_relative_eq!(c.longitude, 1.0);
        assert!(Polygon::empty().centroid().is_none());
    }
}
