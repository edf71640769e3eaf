//! Dense path synthesis
//!
//! Expands an ordered stop list into a path an agent can follow at a steady
//! point density: straight transits between stops, a circular patrol loop
//! around each stop, and a final return to the start. The raw path is then
//! thinned with a distance filter.

use crate::geo::{bearing, euclidean_degree_distance, to_radians, Position, MILES_PER_DEGREE};
use crate::sensor::{PriorityClass, Sensor};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::warn;

/// Minimum number of points in a patrol loop
pub const MIN_LOOP_POINTS: usize = 4;

/// Half-width (degrees) of the default loop used when there is nothing to visit
pub const DEFAULT_LOOP_OFFSET_DEG: f64 = 0.01;

/// Smallest cosine used for the equirectangular longitude correction
const MIN_COS_LATITUDE: f64 = 0.01;

/// Patrol loop radius per priority class (miles)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolRadii {
    /// Loop radius around `Critical` sensors
    pub critical: f64,
    /// Loop radius around `Warning` sensors
    pub warning: f64,
    /// Loop radius around `Active` sensors
    pub active: f64,
}

impl Default for PatrolRadii {
    fn default() -> Self {
        Self {
            critical: 0.05,
            warning: 0.03,
            active: 0.02,
        }
    }
}

impl PatrolRadii {
    /// Loop radius for a priority class
    pub fn radius_for(&self, priority: PriorityClass) -> f64 {
        match priority {
            PriorityClass::Critical => self.critical,
            PriorityClass::Warning => self.warning,
            PriorityClass::Active => self.active,
        }
    }
}

/// Settings for path synthesis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSettings {
    /// Maximum spacing between interpolated points (degrees)
    pub density_deg: f64,
    /// Patrol loop radii
    pub radii: PatrolRadii,
    /// Minimum spacing kept by the simplification pass (degrees)
    pub simplify_distance_deg: f64,
}

/// Fixed four-point loop around `center`
///
/// Used when there is nothing to visit: the agent always needs somewhere to go.
pub fn default_loop(center: Position) -> Vec<Position> {
    let d = DEFAULT_LOOP_OFFSET_DEG;
    vec![
        Position::new(center.latitude + d, center.longitude),
        Position::new(center.latitude, center.longitude + d),
        Position::new(center.latitude - d, center.longitude),
        Position::new(center.latitude, center.longitude - d),
    ]
}

/// Number of interpolation steps needed to cover `from → to` at `density`
fn transit_steps(from: Position, to: Position, density: f64) -> usize {
    let distance = euclidean_degree_distance(from, to);
    if distance == 0.0 {
        0
    } else {
        (distance / density).ceil().max(1.0) as usize
    }
}

/// Number of points in a patrol loop of `radius_miles` at `density`
pub fn loop_point_count(radius_miles: f64, density: f64) -> usize {
    let circumference_deg = TAU * radius_miles / MILES_PER_DEGREE;
    ((circumference_deg / density).ceil() as usize).max(MIN_LOOP_POINTS)
}

/// Append the straight transit `from → to`, excluding `from`
fn push_transit(path: &mut Vec<Position>, from: Position, to: Position, density: f64) {
    let steps = transit_steps(from, to, density);
    for k in 1..=steps {
        path.push(from.lerp(to, k as f64 / steps as f64));
    }
}

/// Append a closed patrol loop around `center`
///
/// The loop starts and ends on `exit_bearing_deg`, so it hands off directly
/// into the transition toward the next stop. Longitude offsets are scaled by
/// `1 / cos(latitude)` to keep the loop round on an equirectangular map.
fn push_patrol_loop(
    path: &mut Vec<Position>,
    center: Position,
    radius_miles: f64,
    exit_bearing_deg: f64,
    density: f64,
) {
    let radius_deg = radius_miles / MILES_PER_DEGREE;
    let points = loop_point_count(radius_miles, density);
    let stretch = lon_scale(center.latitude);
    let start = to_radians(exit_bearing_deg);

    for k in 0..=points {
        let theta = start + TAU * k as f64 / points as f64;
        path.push(Position::new(
            center.latitude + radius_deg * theta.cos(),
            center.longitude + radius_deg * theta.sin() * stretch,
        ));
    }
}

/// Raw path points are capped near this count; density is coarsened to fit
pub const MAX_RAW_PATH_POINTS: usize = 1_000_000;

/// Longitude stretch applied to patrol loops at `latitude`
fn lon_scale(latitude: f64) -> f64 {
    1.0 / to_radians(latitude).cos().abs().max(MIN_COS_LATITUDE)
}

/// Degree-space length the raw path can cover: every leg (lengthened by the
/// loop exit offset of the stop it leaves), every loop circumference and the
/// return leg
fn path_extent_deg(stops: &[&Sensor], radii: &PatrolRadii) -> f64 {
    let Some(first) = stops.first() else {
        return 0.0;
    };
    let mut extent = 0.0;
    let mut tip = first.position;
    let mut exit_offset = 0.0;
    for stop in stops {
        let radius_miles = radii.radius_for(stop.priority);
        let radius_deg = radius_miles / MILES_PER_DEGREE;
        extent += euclidean_degree_distance(tip, stop.position) + exit_offset;
        extent += TAU * radius_deg;
        exit_offset = radius_deg * lon_scale(stop.position.latitude);
        tip = stop.position;
    }
    extent + euclidean_degree_distance(tip, first.position) + exit_offset
}

/// Point spacing actually used for `stops`
///
/// The configured density, widened when the path would exceed
/// [`MAX_RAW_PATH_POINTS`].
fn effective_density(stops: &[&Sensor], settings: &PathSettings) -> f64 {
    let extent = path_extent_deg(stops, &settings.radii);
    let limit = MAX_RAW_PATH_POINTS as f64;
    if extent / settings.density_deg > limit {
        extent / limit
    } else {
        settings.density_deg
    }
}

/// Upper bound on the raw path length at `density`, used to size the buffer
/// once
fn raw_capacity(stops: &[&Sensor], settings: &PathSettings, density: f64) -> usize {
    if stops.is_empty() {
        return 0;
    }
    // Per stop: one partial transit step, the loop minimum and its closing point
    let slack = 8 * (stops.len() + 1);
    (path_extent_deg(stops, &settings.radii) / density).ceil() as usize + slack
}

/// Build the raw (unsimplified) path through `stops`
pub fn build_raw_path(stops: &[&Sensor], settings: &PathSettings) -> Vec<Position> {
    let Some(first) = stops.first() else {
        return Vec::new();
    };
    let start = first.position;
    let density = effective_density(stops, settings);
    if density > settings.density_deg {
        warn!(
            "Path density {}° would exceed {} points, using {:.6}°",
            settings.density_deg, MAX_RAW_PATH_POINTS, density
        );
    }

    let mut path = Vec::with_capacity(raw_capacity(stops, settings, density));
    path.push(start);

    for (i, stop) in stops.iter().enumerate() {
        let tip = path.last().copied().unwrap_or(start);
        push_transit(&mut path, tip, stop.position, density);

        let next = stops.get(i + 1).map_or(start, |s| s.position);
        let exit_bearing = if next == stop.position {
            0.0
        } else {
            bearing(stop.position, next)
        };
        push_patrol_loop(
            &mut path,
            stop.position,
            settings.radii.radius_for(stop.priority),
            exit_bearing,
            density,
        );
    }

    let tip = path.last().copied().unwrap_or(start);
    push_transit(&mut path, tip, start, density);
    path
}

/// Distance-filter simplification
///
/// Keeps a point only if it lies at least `min_distance_deg` from the last
/// kept point. The first and last points are always kept.
pub fn simplify_path(path: &[Position], min_distance_deg: f64) -> Vec<Position> {
    let (first, last) = match (path.first(), path.last()) {
        (Some(&f), Some(&l)) if path.len() > 2 => (f, l),
        _ => return path.to_vec(),
    };

    let mut kept = Vec::with_capacity(path.len());
    kept.push(first);
    let mut anchor = first;
    for &p in &path[1..path.len() - 1] {
        if euclidean_degree_distance(anchor, p) >= min_distance_deg {
            kept.push(p);
            anchor = p;
        }
    }
    kept.push(last);
    kept
}

/// Dense, simplified path through `stops`
pub fn build_path(stops: &[&Sensor], settings: &PathSettings) -> Vec<Position> {
    let raw = build_raw_path(stops, settings);
    simplify_path(&raw, settings.simplify_distance_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> PathSettings {
        PathSettings {
            density_deg: 0.01,
            radii: PatrolRadii::default(),
            simplify_distance_deg: 0.0001,
        }
    }

    #[test]
    fn test_default_loop_has_four_points() {
        let center = Position::new(34.05, -118.25);
        let path = default_loop(center);
        assert_eq!(path.len(), 4);
        assert_relative_eq!(path[0].latitude, 34.06);
        assert_relative_eq!(path[3].longitude, -118.26);
    }

    #[test]
    fn test_loop_point_count() {
        assert_eq!(loop_point_count(0.05, 0.01), MIN_LOOP_POINTS);
        // 2π · (5 mi / 69) / 0.01 ≈ 45.5
        assert_eq!(loop_point_count(5.0, 0.01), 46);
    }

    #[test]
    fn test_transit_respects_density() {
        let mut path = vec![Position::new(34.0, -118.0)];
        push_transit(&mut path, Position::new(34.0, -118.0), Position::new(34.1, -118.0), 0.03);
        // 0.1° at 0.03°/step needs 4 steps
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            assert!(euclidean_degree_distance(pair[0], pair[1]) <= 0.03 + 1e-12);
        }
        assert_eq!(*path.last().unwrap(), Position::new(34.1, -118.0));
    }

    #[test]
    fn test_patrol_loop_is_closed_and_round() {
        let center = Position::new(34.0, -118.0);
        let mut path = Vec::new();
        push_patrol_loop(&mut path, center, 0.05, 90.0, 0.0001);
        let first = path[0];
        let last = *path.last().unwrap();
        assert_relative_eq!(first.latitude, last.latitude, epsilon = 1e-12);
        assert_relative_eq!(first.longitude, last.longitude, epsilon = 1e-12);
        // Exit point lies due east of the center
        assert_relative_eq!(first.latitude, center.latitude, epsilon = 1e-12);
        assert!(first.longitude > center.longitude);
        let radius_deg = 0.05 / MILES_PER_DEGREE;
        for p in &path {
            assert!((p.latitude - center.latitude).abs() <= radius_deg + 1e-12);
        }
    }

    #[test]
    fn test_raw_path_returns_to_start() {
        let a = Sensor::new(1, Position::new(34.0, -118.0), 90.0);
        let b = Sensor::new(2, Position::new(34.05, -118.05), 30.0);
        let stops = [&a, &b];
        let path = build_raw_path(&stops, &settings());
        assert_eq!(path[0], a.position);
        assert_eq!(*path.last().unwrap(), a.position);
        assert!(path.len() <= raw_capacity(&stops, &settings(), 0.01));
    }

    #[test]
    fn test_extreme_density_stays_bounded() {
        let a = Sensor::new(1, Position::new(34.0, -118.0), 90.0);
        let b = Sensor::new(2, Position::new(35.0, -118.0), 30.0);
        let stops = [&a, &b];
        let tiny = PathSettings {
            density_deg: 1e-13,
            ..settings()
        };
        let density = effective_density(&stops, &tiny);
        assert!(density > tiny.density_deg);

        let path = build_raw_path(&stops, &tiny);
        assert!(path.len() <= MAX_RAW_PATH_POINTS + 8 * (stops.len() + 1));
        assert!(path.len() <= raw_capacity(&stops, &tiny, density));
        assert_eq!(*path.last().unwrap(), a.position);
    }

    #[test]
    fn test_simplify_keeps_endpoints() {
        let path: Vec<Position> = (0..100)
            .map(|i| Position::new(34.0 + f64::from(i) * 0.00001, -118.0))
            .collect();
        let simplified = simplify_path(&path, 0.0001);
        assert_eq!(simplified[0], path[0]);
        assert_eq!(*simplified.last().unwrap(), *path.last().unwrap());
        assert!(simplified.len() < path.len());
        for pair in simplified[..simplified.len() - 1].windows(2) {
            assert!(euclidean_degree_distance(pair[0], pair[1]) >= 0.0001 - 1e-12);
        }
    }

    #[test]
    fn test_simplify_short_paths_untouched() {
        let path = vec![Position::new(34.0, -118.0), Position::new(34.0, -118.0)];
        assert_eq!(simplify_path(&path, 1.0), path);
        assert!(simplify_path(&[], 1.0).is_empty());
    }
}
