//! Convex hull extraction (Graham scan) with a ring fallback for degenerate input

use crate::geo::{
    cross_product, destination_point, euclidean_degree_distance, polar_angle, Position,
};

/// Vertices in the fallback ring placed around isolated points
pub const RING_POINTS: usize = 12;

/// Convex hull of a point set, counter-clockwise in degree space
///
/// Picks the lowest (then left-most) point as pivot, sorts the rest by polar
/// angle around it (ties broken by distance) and sweeps, popping while the
/// last three points fail to make a strict left turn.
///
/// Returns the input unchanged when it has fewer than 3 points; the result can
/// also collapse below 3 vertices for collinear or coincident input. Use
/// [`hull_with_fallback`] when a proper ring is required.
pub fn convex_hull(points: &[Position]) -> Vec<Position> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let pivot_idx = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.latitude
                .total_cmp(&b.latitude)
                .then_with(|| a.longitude.total_cmp(&b.longitude))
        })
        .map_or(0, |(i, _)| i);
    let pivot = points[pivot_idx];

    let mut rest: Vec<(f64, f64, Position)> = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != pivot_idx)
        .map(|(_, &p)| (polar_angle(pivot, p), euclidean_degree_distance(pivot, p), p))
        .collect();
    rest.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));

    let mut hull: Vec<Position> = Vec::with_capacity(points.len());
    hull.push(pivot);
    for (_, _, p) in rest {
        while hull.len() >= 2
            && cross_product(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    hull
}

/// Regular ring of [`RING_POINTS`] vertices (30° apart) around `center`
pub fn ring_around(center: Position, radius_miles: f64) -> Vec<Position> {
    let step = 360.0 / RING_POINTS as f64;
    (0..RING_POINTS)
        .map(|k| destination_point(center, k as f64 * step, radius_miles))
        .collect()
}

/// Convex hull that is always a proper ring for non-empty input
///
/// With fewer than 3 points, or when the hull collapses to a segment or a
/// point, each input point is replaced by a ring of radius `ring_radius_miles`
/// and the rings are hulled instead. A lone point becomes a small circle.
pub fn hull_with_fallback(points: &[Position], ring_radius_miles: f64) -> Vec<Position> {
    if points.is_empty() {
        return Vec::new();
    }

    if points.len() >= 3 {
        let hull = convex_hull(points);
        if hull.len() >= 3 {
            return hull;
        }
    }

    let mut expanded = Vec::with_capacity(points.len() * RING_POINTS);
    for &p in points {
        expanded.extend(ring_around(p, ring_radius_miles));
    }
    convex_hull(&expanded)
}
