//! Margin buffering and Chaikin corner cutting
//!
//! Corner cutting on a convex ring never self-intersects, which is why it is
//! used here instead of spline interpolation: a Catmull-Rom pass over a
//! near-degenerate hull can loop back on itself.

use crate::geo::{bearing, centroid, destination_point, haversine_distance, Position};

/// Fraction of the configured margin actually applied as outward buffer
///
/// Kept small so the boundary tracks its sensors instead of bulging away
/// from them.
pub const MARGIN_BUFFER_FRACTION: f64 = 0.1;

/// Vertices closer than this (miles) to the centroid are not pushed
const MIN_BUFFER_DISTANCE_MILES: f64 = 1e-9;

/// Number of Chaikin iterations for a smoothing factor
///
/// `round(clamp(factor × 3, 1, 2))`, so always 1 or 2.
pub fn smoothing_iterations(smoothing_factor: f64) -> usize {
    if !smoothing_factor.is_finite() {
        return 1;
    }
    (smoothing_factor * 3.0).clamp(1.0, 2.0).round() as usize
}

/// Push every ring vertex outward from the ring centroid
///
/// # Arguments
///
/// * `ring` - Closed ring, usually a convex hull
/// * `distance_miles` - Outward offset; zero or negative leaves the ring as is
pub fn buffer_ring(ring: &[Position], distance_miles: f64) -> Vec<Position> {
    let center = match centroid(ring) {
        Some(c) if distance_miles > 0.0 => c,
        _ => return ring.to_vec(),
    };

    ring.iter()
        .map(|&vertex| {
            if haversine_distance(center, vertex) < MIN_BUFFER_DISTANCE_MILES {
                vertex
            } else {
                destination_point(vertex, bearing(center, vertex), distance_miles)
            }
        })
        .collect()
}

/// Chaikin corner cutting
///
/// Every edge `(p0, p1)` is replaced by the points 25% and 75% along it;
/// repeated `iterations` times. Rings with fewer than 3 vertices are returned
/// unchanged.
pub fn chaikin_smooth(ring: &[Position], iterations: usize) -> Vec<Position> {
    if ring.len() < 3 {
        return ring.to_vec();
    }

    let mut current = ring.to_vec();
    for _ in 0..iterations {
        let n = current.len();
        let mut next = Vec::with_capacity(n * 2);
        for i in 0..n {
            let p0 = current[i];
            let p1 = current[(i + 1) % n];
            next.push(p0.lerp(p1, 0.25));
            next.push(p0.lerp(p1, 0.75));
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{cross_product, Polygon};
    use approx::assert_relative_eq;

    fn square() -> Vec<Position> {
        vec![
            Position::new(34.0, -118.0),
            Position::new(34.0, -117.9),
            Position::new(34.1, -117.9),
            Position::new(34.1, -118.0),
        ]
    }

    #[test]
    fn test_smoothing_iterations() {
        assert_eq!(smoothing_iterations(0.0), 1);
        assert_eq!(smoothing_iterations(0.3), 1);
        assert_eq!(smoothing_iterations(0.5), 2);
        assert_eq!(smoothing_iterations(1.0), 2);
        assert_eq!(smoothing_iterations(f64::NAN), 1);
    }

    #[test]
    fn test_chaikin_doubles_vertices() {
        let once = chaikin_smooth(&square(), 1);
        assert_eq!(once.len(), 8);
        assert_relative_eq!(once[0].longitude, -117.975, epsilon = 1e-12);
        assert_relative_eq!(once[1].longitude, -117.925, epsilon = 1e-12);
        assert_eq!(chaikin_smooth(&square(), 2).len(), 16);
    }

    #[test]
    fn test_chaikin_stays_convex() {
        let smoothed = chaikin_smooth(&square(), 2);
        let n = smoothed.len();
        for i in 0..n {
            let turn = cross_product(smoothed[i], smoothed[(i + 1) % n], smoothed[(i + 2) % n]);
            assert!(turn >= 0.0, "smoothed ring must not turn clockwise");
        }
    }

    #[test]
    fn test_buffer_moves_vertices_outward() {
        let ring = square();
        let center = centroid(&ring).unwrap();
        let buffered = buffer_ring(&ring, 0.5);
        for (before, after) in ring.iter().zip(&buffered) {
            let d0 = haversine_distance(center, *before);
            let d1 = haversine_distance(center, *after);
            assert!(d1 > d0);
            assert_relative_eq!(haversine_distance(*before, *after), 0.5, epsilon = 1e-6);
        }
        let polygon = Polygon::new(buffered);
        for v in &ring {
            assert!(polygon.contains(*v));
        }
    }

    #[test]
    fn test_zero_buffer_is_identity() {
        assert_eq!(buffer_ring(&square(), 0.0), square());
    }
}
