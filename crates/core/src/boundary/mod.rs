//! Risk boundary extraction
//!
//! Turns a discrete, noisy set of point sensors into two closed polygons
//! around the high (≥ 85) and medium (≥ 50) risk regions:
//!
//! 1. Filter out sensors with no risk or a bad position
//! 2. Build the max-combined risk field ([`RiskField`])
//! 3. Sample it on an adaptive grid ([`sample_field`])
//! 4. Threshold the samples, force-including qualifying sensors
//! 5. Convex hull with a ring fallback for degenerate sets
//! 6. Small outward margin buffer
//! 7. Chaikin corner cutting
//! 8. Containment repair for any sensor shaved off by smoothing
//!
//! The whole pipeline is a pure function of `(sensors, options)`.

pub mod field;
pub mod hull;
pub mod sampling;
pub mod smoothing;

pub use field::RiskField;
pub use hull::{convex_hull, hull_with_fallback, ring_around};
pub use sampling::{sample_field, FieldSample};
pub use smoothing::{buffer_ring, chaikin_smooth, smoothing_iterations};

use crate::error::{ensure_positive, ensure_range, ConfigError};
use crate::geo::{Polygon, Position};
use crate::sensor::Sensor;
use serde::{Deserialize, Serialize};
use smoothing::MARGIN_BUFFER_FRACTION;
use tracing::{debug, warn};

/// Field value at or above which a point is high risk
pub const HIGH_RISK_THRESHOLD: f64 = 85.0;

/// Field value at or above which a point is medium risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 50.0;

/// Boundary extraction settings
///
/// Together with the sensor set these fully determine the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryOptions {
    /// Radius (miles) beyond which a sensor has no influence
    pub max_influence_miles: f64,
    /// Exponent of the `(1 − d/R)` falloff
    pub decay_exponent: f64,
    /// Coarse grid step (degrees); the fine grid is 5× denser
    pub grid_resolution_deg: f64,
    /// Configured margin (miles); 10% of it is applied as outward buffer and
    /// twice it is the radius of fallback rings
    pub margin_miles: f64,
    /// Smoothing strength (0-1), mapped to 1 or 2 Chaikin iterations
    pub smoothing_factor: f64,
    /// Minimum number of qualifying sensors before any boundary is drawn
    ///
    /// Only sensors whose risk is at or above `probability_threshold` count.
    /// Lower-risk sensors still shape the field once the minimum is met.
    pub min_sensors: usize,
    /// Risk value at or above which a sensor counts toward `min_sensors`
    pub probability_threshold: f64,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        BoundaryPreset::Balanced.options()
    }
}

impl BoundaryOptions {
    /// Set the qualifying-sensor threshold
    #[must_use]
    pub fn with_probability_threshold(mut self, threshold: f64) -> Self {
        self.probability_threshold = threshold;
        self
    }

    /// Set the minimum number of qualifying sensors
    #[must_use]
    pub fn with_min_sensors(mut self, min_sensors: usize) -> Self {
        self.min_sensors = min_sensors;
        self
    }

    /// Set the configured margin
    #[must_use]
    pub fn with_margin_miles(mut self, margin_miles: f64) -> Self {
        self.margin_miles = margin_miles;
        self
    }

    /// Set the smoothing strength
    #[must_use]
    pub fn with_smoothing_factor(mut self, smoothing_factor: f64) -> Self {
        self.smoothing_factor = smoothing_factor;
        self
    }

    /// Check every setting
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_influence_miles", self.max_influence_miles)?;
        ensure_positive("decay_exponent", self.decay_exponent)?;
        ensure_range("grid_resolution_deg", self.grid_resolution_deg, 1e-6, 1.0)?;
        ensure_positive("margin_miles", self.margin_miles)?;
        ensure_range("smoothing_factor", self.smoothing_factor, 0.0, 1.0)?;
        ensure_range("probability_threshold", self.probability_threshold, 0.0, 100.0)?;
        Ok(())
    }

    /// These options if valid, the defaults otherwise
    fn sanitized(&self) -> Self {
        match self.validate() {
            Ok(()) => self.clone(),
            Err(err) => {
                warn!("Invalid boundary options ({err}), falling back to defaults");
                Self::default()
            }
        }
    }
}

/// Named boundary option sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryPreset {
    /// Short influence radius and fine grid: boundaries hug the sensors
    Tight,
    /// Default trade-off
    Balanced,
    /// Long influence radius and coarse grid for sparse sensor networks
    Broad,
}

impl BoundaryPreset {
    /// Options for this preset
    pub fn options(&self) -> BoundaryOptions {
        let (max_influence_miles, grid_resolution_deg, margin_miles, smoothing_factor) = match self
        {
            Self::Tight => (3.0, 0.005, 0.3, 0.3),
            Self::Balanced => (5.0, 0.01, 0.5, 0.5),
            Self::Broad => (8.0, 0.02, 1.0, 0.7),
        };
        BoundaryOptions {
            max_influence_miles,
            decay_exponent: 1.0,
            grid_resolution_deg,
            margin_miles,
            smoothing_factor,
            min_sensors: 1,
            probability_threshold: MEDIUM_RISK_THRESHOLD,
        }
    }
}

/// Nested risk boundaries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryResult {
    /// Ring around the ≥ 85 region, empty when there is none
    pub high_risk: Polygon,
    /// Ring around the ≥ 50 region, empty when there is none
    pub medium_risk: Polygon,
}

impl BoundaryResult {
    /// Both polygons empty
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither boundary exists
    pub fn is_empty(&self) -> bool {
        self.high_risk.is_empty() && self.medium_risk.is_empty()
    }
}

/// Compute the high and medium risk boundaries for a sensor set
///
/// Never fails: invalid sensors are skipped, invalid options fall back to
/// defaults, and too few qualifying sensors yield two empty polygons.
///
/// # Arguments
///
/// * `sensors` - Sensor set with risk values
/// * `options` - Extraction settings
pub fn compute_boundary(sensors: &[Sensor], options: &BoundaryOptions) -> BoundaryResult {
    let options = options.sanitized();

    let active: Vec<&Sensor> = sensors
        .iter()
        .filter(|s| s.risk_value.is_finite() && s.risk_value > 0.0 && s.position.is_valid())
        .collect();
    let qualifying = active
        .iter()
        .filter(|s| s.risk_value >= options.probability_threshold)
        .count();

    if active.is_empty() || qualifying < options.min_sensors {
        debug!(
            "No boundary: {} active sensor(s), {} qualifying (minimum {})",
            active.len(),
            qualifying,
            options.min_sensors
        );
        return BoundaryResult::empty();
    }

    let field = RiskField::new(&active, options.max_influence_miles, options.decay_exponent);
    let samples = sample_field(
        &field,
        &active,
        options.max_influence_miles,
        options.grid_resolution_deg,
    );

    let high_risk = extract_region(&samples, &active, HIGH_RISK_THRESHOLD, &options);
    let medium_risk = extract_region(&samples, &active, MEDIUM_RISK_THRESHOLD, &options);

    debug!(
        "Boundary from {} sensor(s), {} samples: high={} vertices, medium={} vertices",
        active.len(),
        samples.len(),
        high_risk.len(),
        medium_risk.len()
    );

    BoundaryResult {
        high_risk,
        medium_risk,
    }
}

/// Build the smoothed ring around every sample at or above `threshold`
fn extract_region(
    samples: &[FieldSample],
    sensors: &[&Sensor],
    threshold: f64,
    options: &BoundaryOptions,
) -> Polygon {
    // Sensors clearing the threshold on their own are always inside, even if
    // the grid missed their neighborhood
    let anchors: Vec<Position> = sensors
        .iter()
        .filter(|s| s.risk_value >= threshold)
        .map(|s| s.position)
        .collect();

    let mut points: Vec<Position> = samples
        .iter()
        .filter(|s| s.probability >= threshold)
        .map(|s| s.position)
        .collect();
    points.extend_from_slice(&anchors);

    if points.is_empty() {
        return Polygon::empty();
    }

    let ring_radius = 2.0 * options.margin_miles;
    let hull = hull_with_fallback(&points, ring_radius);
    let buffered = buffer_ring(&hull, options.margin_miles * MARGIN_BUFFER_FRACTION);
    let smoothed = chaikin_smooth(&buffered, smoothing_iterations(options.smoothing_factor));

    repair_containment(Polygon::new(smoothed), &anchors, ring_radius)
}

/// Re-hull with rings around any anchor that corner cutting left outside
///
/// The result contains the input polygon, so anchors already inside stay
/// inside.
fn repair_containment(polygon: Polygon, anchors: &[Position], ring_radius: f64) -> Polygon {
    let missing: Vec<Position> = anchors
        .iter()
        .copied()
        .filter(|&a| !polygon.contains(a))
        .collect();
    if missing.is_empty() {
        return polygon;
    }

    debug!(
        "{} sensor(s) fell outside the smoothed boundary, widening",
        missing.len()
    );
    let mut points = polygon.into_vertices();
    for &anchor in &missing {
        points.extend(ring_around(anchor, ring_radius));
    }
    Polygon::new(hull_with_fallback(&points, ring_radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: u32, lat: f64, lon: f64, risk: f64) -> Sensor {
        Sensor::new(id, Position::new(lat, lon), risk)
    }

    #[test]
    fn test_empty_input() {
        let result = compute_boundary(&[], &BoundaryOptions::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_all_below_medium_threshold() {
        let sensors = vec![
            sensor(1, 34.0, -118.0, 45.0),
            sensor(2, 34.01, -118.01, 30.0),
            sensor(3, 34.02, -118.0, 49.9),
        ];
        let result = compute_boundary(&sensors, &BoundaryOptions::default());
        assert!(result.high_risk.is_empty());
        assert!(result.medium_risk.is_empty());
    }

    #[test]
    fn test_min_sensors_not_met() {
        let sensors = vec![sensor(1, 34.0, -118.0, 95.0), sensor(2, 34.01, -118.0, 90.0)];
        let options = BoundaryOptions::default().with_min_sensors(3);
        assert!(compute_boundary(&sensors, &options).is_empty());
    }

    #[test]
    fn test_min_sensors_counts_only_qualifying_sensors() {
        let sensors = vec![
            sensor(1, 34.0, -118.0, 95.0),
            sensor(2, 34.01, -118.0, 90.0),
            sensor(3, 34.02, -118.01, 20.0),
        ];
        let options = BoundaryOptions::default().with_min_sensors(3);
        assert!(compute_boundary(&sensors, &options).is_empty());

        let lowered = options.with_probability_threshold(20.0);
        let result = compute_boundary(&sensors, &lowered);
        assert!(!result.high_risk.is_empty());
        assert!(!result.medium_risk.is_empty());
    }

    #[test]
    fn test_non_positive_and_invalid_sensors_ignored() {
        let sensors = vec![
            sensor(1, 34.0, -118.0, 0.0),
            sensor(2, f64::NAN, -118.0, 99.0),
            sensor(3, 34.0, 200.0, 99.0),
        ];
        assert!(compute_boundary(&sensors, &BoundaryOptions::default()).is_empty());
    }

    #[test]
    fn test_single_high_risk_sensor_gets_round_boundary() {
        let s = sensor(1, 34.0, -118.0, 95.0);
        let result = compute_boundary(std::slice::from_ref(&s), &BoundaryOptions::default());
        assert!(result.high_risk.len() >= 12, "expected a smoothed ring");
        assert!(result.high_risk.contains(s.position));
        assert!(result.medium_risk.contains(s.position));
    }

    #[test]
    fn test_medium_encloses_high_region() {
        let sensors = vec![
            sensor(1, 34.0, -118.0, 92.0),
            sensor(2, 34.02, -118.03, 88.0),
            sensor(3, 34.05, -118.01, 60.0),
        ];
        let result = compute_boundary(&sensors, &BoundaryOptions::default());
        for v in result.high_risk.vertices() {
            assert!(result.medium_risk.contains(*v));
        }
    }

    #[test]
    fn test_invalid_options_fall_back_to_defaults() {
        let sensors = vec![sensor(1, 34.0, -118.0, 95.0)];
        let bad = BoundaryOptions {
            max_influence_miles: -1.0,
            ..BoundaryOptions::default()
        };
        assert!(bad.validate().is_err());
        assert_eq!(
            compute_boundary(&sensors, &bad),
            compute_boundary(&sensors, &BoundaryOptions::default())
        );
    }

    #[test]
    fn test_presets_validate() {
        for preset in [BoundaryPreset::Tight, BoundaryPreset::Balanced, BoundaryPreset::Broad] {
            assert!(preset.options().validate().is_ok(), "{preset:?}");
        }
    }

    #[test]
    fn test_repair_adds_missing_anchor() {
        let triangle = Polygon::new(vec![
            Position::new(34.0, -118.0),
            Position::new(34.0, -117.9),
            Position::new(34.1, -117.95),
        ]);
        let outside = Position::new(34.2, -118.2);
        let repaired = repair_containment(triangle.clone(), &[outside], 0.5);
        assert!(repaired.contains(outside));
        assert!(repaired.contains(Position::new(34.03, -117.95)));
        assert_eq!(repair_containment(triangle.clone(), &[], 0.5), triangle);
    }
}
