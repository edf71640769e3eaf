//! Adaptive grid sampling of the risk field
//!
//! Two grids are laid down: a fine grid (5× denser) inside each sensor's
//! influence radius, where the boundary actually bends, and a coarse grid over
//! the padded bounding box of all sensors. Every sensor's exact position is
//! sampled too. Samples closer than [`DEDUP_TOLERANCE_DEG`] collapse into one.

use super::field::RiskField;
use crate::geo::{haversine_distance, to_radians, Position, MILES_PER_DEGREE};
use crate::sensor::Sensor;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Fine grid density relative to the coarse grid
pub const FINE_GRID_FACTOR: f64 = 5.0;

/// Samples within this distance (degrees) of each other are merged
pub const DEDUP_TOLERANCE_DEG: f64 = 0.0001;

/// Upper bound on the number of cells in any single grid; the step is
/// widened when a grid would exceed it
const MAX_CELLS_PER_GRID: f64 = 200_000.0;

/// Smallest cosine used when converting miles to degrees of longitude
const MIN_COS_LATITUDE: f64 = 0.01;

/// A sampled field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Sample location
    pub position: Position,
    /// Field value at the location (0-100)
    pub probability: f64,
}

/// Degrees of longitude spanned by `miles` at `latitude`
fn longitude_span(miles: f64, latitude: f64) -> f64 {
    miles / (MILES_PER_DEGREE * to_radians(latitude).cos().abs().max(MIN_COS_LATITUDE))
}

/// Widen `step` until a `lat_span × lon_span` grid stays under the cell cap
fn bounded_step(step: f64, lat_span: f64, lon_span: f64) -> f64 {
    let cells = (lat_span / step + 1.0) * (lon_span / step + 1.0);
    if cells > MAX_CELLS_PER_GRID {
        step * (cells / MAX_CELLS_PER_GRID).sqrt()
    } else {
        step
    }
}

/// Collects sample positions, merging near-duplicates
struct SampleSet {
    seen: FxHashSet<(i64, i64)>,
    points: Vec<Position>,
}

impl SampleSet {
    fn with_capacity(capacity: usize) -> Self {
        let mut seen = FxHashSet::default();
        seen.reserve(capacity);
        Self {
            seen,
            points: Vec::with_capacity(capacity),
        }
    }

    fn insert(&mut self, p: Position) {
        let key = (
            (p.latitude / DEDUP_TOLERANCE_DEG).round() as i64,
            (p.longitude / DEDUP_TOLERANCE_DEG).round() as i64,
        );
        if self.seen.insert(key) {
            self.points.push(p);
        }
    }
}

/// Sample the field on the fine and coarse grids
///
/// # Arguments
///
/// * `field` - Risk field to evaluate
/// * `sensors` - Sensors the grids are built around (non-empty)
/// * `max_influence_miles` - Influence radius, also the bounding-box padding
/// * `grid_resolution_deg` - Coarse grid step in degrees
///
/// # Returns
///
/// One sample per unique grid point and sensor position. Field evaluation is
/// spread across the rayon pool since every sample is independent.
pub fn sample_field(
    field: &RiskField<'_>,
    sensors: &[&Sensor],
    max_influence_miles: f64,
    grid_resolution_deg: f64,
) -> Vec<FieldSample> {
    let mut samples = SampleSet::with_capacity(4096 * sensors.len().max(1));

    // Exact sensor positions first so they survive deduplication untouched
    for sensor in sensors {
        samples.insert(sensor.position);
    }

    // Fine grid inside each sensor's influence radius
    let lat_radius = max_influence_miles / MILES_PER_DEGREE;
    for sensor in sensors {
        let center = sensor.position;
        let lon_radius = longitude_span(max_influence_miles, center.latitude);
        let step = bounded_step(
            grid_resolution_deg / FINE_GRID_FACTOR,
            2.0 * lat_radius,
            2.0 * lon_radius,
        );
        let n_lat = (lat_radius / step).ceil() as i64;
        let n_lon = (lon_radius / step).ceil() as i64;

        for i in -n_lat..=n_lat {
            for j in -n_lon..=n_lon {
                let p = Position::new(
                    center.latitude + i as f64 * step,
                    center.longitude + j as f64 * step,
                );
                if haversine_distance(p, center) <= max_influence_miles {
                    samples.insert(p);
                }
            }
        }
    }

    // Coarse grid over the padded bounding box
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    for sensor in sensors {
        min_lat = min_lat.min(sensor.position.latitude);
        max_lat = max_lat.max(sensor.position.latitude);
        min_lon = min_lon.min(sensor.position.longitude);
        max_lon = max_lon.max(sensor.position.longitude);
    }
    let widest_lat = min_lat.abs().max(max_lat.abs());
    let lon_pad = longitude_span(max_influence_miles, widest_lat);
    min_lat -= lat_radius;
    max_lat += lat_radius;
    min_lon -= lon_pad;
    max_lon += lon_pad;

    let step = bounded_step(grid_resolution_deg, max_lat - min_lat, max_lon - min_lon);
    let rows = ((max_lat - min_lat) / step).ceil() as i64;
    let cols = ((max_lon - min_lon) / step).ceil() as i64;
    for i in 0..=rows {
        for j in 0..=cols {
            samples.insert(Position::new(
                min_lat + i as f64 * step,
                min_lon + j as f64 * step,
            ));
        }
    }

    trace!(
        "Sampling risk field at {} points ({} sensors)",
        samples.points.len(),
        sensors.len()
    );

    samples
        .points
        .par_iter()
        .map(|&position| FieldSample {
            position,
            probability: field.probability_at(position),
        })
        .collect()
}
