//! Scalar risk field derived from point sensors

use crate::geo::{haversine_distance, Position};
use crate::sensor::Sensor;

/// Risk field over the plane
///
/// Each sensor contributes `risk × max(0, 1 − d/R)^k` within its influence
/// radius `R`. The field value is the **maximum** contribution, never a sum:
/// summing inflates the boundary wherever sensors cluster.
pub struct RiskField<'a> {
    sensors: &'a [&'a Sensor],
    max_influence_miles: f64,
    decay_exponent: f64,
}

impl<'a> RiskField<'a> {
    /// Build a field over already-filtered sensors
    ///
    /// # Arguments
    ///
    /// * `sensors` - Sensors with a positive risk and a valid position
    /// * `max_influence_miles` - Influence radius `R`
    /// * `decay_exponent` - Falloff exponent `k`
    pub fn new(sensors: &'a [&'a Sensor], max_influence_miles: f64, decay_exponent: f64) -> Self {
        Self {
            sensors,
            max_influence_miles,
            decay_exponent,
        }
    }

    /// Field value (0-100) at `point`
    pub fn probability_at(&self, point: Position) -> f64 {
        self.sensors
            .iter()
            .filter_map(|sensor| {
                let distance = haversine_distance(point, sensor.position);
                if distance > self.max_influence_miles {
                    return None;
                }
                let normalized = distance / self.max_influence_miles;
                let decay = (1.0 - normalized).max(0.0).powf(self.decay_exponent);
                Some(sensor.risk_value * decay)
            })
            .fold(0.0, f64::max)
    }
}
