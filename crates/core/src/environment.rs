//! Spatio-temporal environment model
//!
//! Synthesizes physically plausible readings (temperature, humidity, wind,
//! fire probability) at any position and simulation tick. Readings are driven
//! by a fixed set of fire origins whose radius grows linearly with time and
//! whose intensity ramps up over the first [`INTENSITY_RAMP_TICKS`] ticks.
//!
//! The model holds no mutable state: every reading is a pure function of
//! `(position, tick)`, so any tick can be replayed, including going backward.
//! Callers that want caching own it.

use crate::geo::{euclidean_degree_distance, Position};
use crate::sensor::{PriorityClass, Sensor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// MODEL CONSTANTS
// ============================================================================

/// Ticks after ignition before a fire reaches full intensity
pub const INTENSITY_RAMP_TICKS: f64 = 50.0;

/// Influence cutoff as a multiple of the current fire radius
const INFLUENCE_RADIUS_FACTOR: f64 = 5.0;

/// Smallest radius used in the exponential decay (degrees)
const MIN_DECAY_RADIUS_DEG: f64 = 1e-6;

/// Humidity never drops below this floor (%)
const MIN_HUMIDITY: f64 = 5.0;

/// Humidity lost per unit of heat boost
const HUMIDITY_PER_BOOST: f64 = 0.25;

/// Wind speed gained per unit of heat boost (fire-induced inflow)
const WIND_PER_BOOST: f64 = 0.12;

/// Wind veer in degrees per unit of heat boost
const WIND_VEER_PER_BOOST: f64 = 2.0;

/// Neutral fire probability with no fire influence
const BASE_FIRE_PROBABILITY: f64 = 50.0;

/// Fire probability gained per unit of heat boost
const PROBABILITY_PER_BOOST: f64 = 0.4;

/// Fire percentage gained per unit of heat boost
const PERCENTAGE_PER_BOOST: f64 = 0.35;

/// Ambient conditions with no fire present
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientBaseline {
    /// Air temperature (°F)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (mph)
    pub wind_speed: f64,
    /// Wind direction in degrees clockwise from north
    pub wind_direction_deg: f64,
}

impl Default for AmbientBaseline {
    fn default() -> Self {
        Self {
            temperature: 72.0,
            humidity: 45.0,
            wind_speed: 8.0,
            wind_direction_deg: 225.0,
        }
    }
}

/// Simulated ignition point
///
/// Immutable after construction. Its effective radius and intensity are pure
/// functions of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireOrigin {
    /// Ignition location
    pub position: Position,
    /// Radius at ignition (degrees)
    pub base_radius_deg: f64,
    /// Radius growth per tick (degrees)
    pub spread_rate_deg_per_tick: f64,
    /// Peak heat boost once fully developed
    pub max_intensity: f64,
    /// Tick of ignition; the fire has no influence at or before this tick
    pub start_tick: u32,
}

impl FireOrigin {
    /// Create a new fire origin
    #[must_use]
    pub fn new(
        position: Position,
        base_radius_deg: f64,
        spread_rate_deg_per_tick: f64,
        max_intensity: f64,
        start_tick: u32,
    ) -> Self {
        Self {
            position,
            base_radius_deg,
            spread_rate_deg_per_tick,
            max_intensity,
            start_tick,
        }
    }

    /// Ticks elapsed since ignition, `None` until the fire has started
    #[inline]
    pub fn elapsed(&self, tick: u32) -> Option<u32> {
        tick.checked_sub(self.start_tick).filter(|&elapsed| elapsed > 0)
    }

    /// Fire radius at `tick` in degrees
    pub fn effective_radius(&self, tick: u32) -> f64 {
        let elapsed = f64::from(self.elapsed(tick).unwrap_or(0));
        self.base_radius_deg + self.spread_rate_deg_per_tick * elapsed
    }

    /// Intensity ramp (0-1) at `tick`
    pub fn intensity(&self, tick: u32) -> f64 {
        let elapsed = f64::from(self.elapsed(tick).unwrap_or(0));
        (elapsed / INTENSITY_RAMP_TICKS).clamp(0.0, 1.0)
    }

    /// Heat boost this fire contributes at `position` and `tick`
    ///
    /// Uses plain Cartesian distance in degree space, which is adequate for
    /// regional extents.
    pub fn boost_at(&self, position: Position, tick: u32) -> f64 {
        if self.elapsed(tick).is_none() {
            return 0.0;
        }

        let radius = self.effective_radius(tick);
        let distance = euclidean_degree_distance(position, self.position);
        // A zero-radius fire reaches nowhere, not even its own origin
        if distance >= radius * INFLUENCE_RADIUS_FACTOR {
            return 0.0;
        }

        let decay = (-distance / radius.max(MIN_DECAY_RADIUS_DEG)).exp();
        self.max_intensity * self.intensity(tick) * decay
    }
}

/// Environmental reading at one position and tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Air temperature (°F)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (mph)
    pub wind_speed: f64,
    /// Wind direction in degrees, [0, 360)
    pub wind_direction_deg: f64,
    /// Fire probability (0-100)
    pub fire_probability: f64,
    /// Fire percentage (0-100)
    pub fire_percentage: f64,
    /// Status label derived from the fire probability
    pub status: PriorityClass,
}

/// Deterministic environment evaluator
///
/// Holds the ambient baseline and a fixed list of fire origins. `Send + Sync`
/// and free of interior mutability, so it can be queried from many threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentModel {
    baseline: AmbientBaseline,
    origins: Vec<FireOrigin>,
}

impl EnvironmentModel {
    /// Create a model from a baseline and fire origins
    #[must_use]
    pub fn new(baseline: AmbientBaseline, origins: Vec<FireOrigin>) -> Self {
        info!(
            "Environment model initialized: {} fire origin(s), baseline {:.1}°F / {:.0}% RH",
            origins.len(),
            baseline.temperature,
            baseline.humidity
        );
        for (i, origin) in origins.iter().enumerate() {
            debug!(
                "Fire origin {}: ({:.4}, {:.4}) r0={:.4}° spread={:.5}°/tick peak={:.1} start={}",
                i,
                origin.position.latitude,
                origin.position.longitude,
                origin.base_radius_deg,
                origin.spread_rate_deg_per_tick,
                origin.max_intensity,
                origin.start_tick
            );
        }
        Self { baseline, origins }
    }

    /// Three staggered ignitions around the San Gabriel foothills
    #[must_use]
    pub fn southern_california() -> Self {
        Self::new(
            AmbientBaseline::default(),
            vec![
                FireOrigin::new(Position::new(34.05, -118.05), 0.01, 0.0008, 80.0, 0),
                FireOrigin::new(Position::new(34.18, -118.22), 0.008, 0.0006, 70.0, 20),
                FireOrigin::new(Position::new(34.30, -117.95), 0.012, 0.001, 90.0, 45),
            ],
        )
    }

    /// Ambient baseline
    pub fn baseline(&self) -> &AmbientBaseline {
        &self.baseline
    }

    /// Fire origins
    pub fn origins(&self) -> &[FireOrigin] {
        &self.origins
    }

    /// Strongest heat boost at `position`
    ///
    /// Overlapping fires do not add up: the maximum across origins is used.
    pub fn heat_boost(&self, position: Position, tick: u32) -> f64 {
        self.origins
            .iter()
            .map(|origin| origin.boost_at(position, tick))
            .fold(0.0, f64::max)
    }

    /// Evaluate the environment at `position` and `tick`
    pub fn conditions_at(&self, position: Position, tick: u32) -> EnvironmentReading {
        let boost = self.heat_boost(position, tick);
        let base = &self.baseline;

        let fire_probability =
            (BASE_FIRE_PROBABILITY + PROBABILITY_PER_BOOST * boost).clamp(0.0, 100.0);
        let fire_percentage =
            (BASE_FIRE_PROBABILITY + PERCENTAGE_PER_BOOST * boost).clamp(0.0, 100.0);

        EnvironmentReading {
            temperature: base.temperature + boost,
            humidity: (base.humidity - HUMIDITY_PER_BOOST * boost).max(MIN_HUMIDITY),
            wind_speed: base.wind_speed + WIND_PER_BOOST * boost,
            wind_direction_deg: (base.wind_direction_deg + WIND_VEER_PER_BOOST * boost)
                .rem_euclid(360.0),
            fire_probability,
            fire_percentage,
            status: PriorityClass::from_probability(fire_probability),
        }
    }

    /// Refresh each sensor's risk value and priority from a fresh reading
    pub fn sample_sensors(&self, sensors: &mut [Sensor], tick: u32) {
        for sensor in sensors.iter_mut() {
            let reading = self.conditions_at(sensor.position, tick);
            sensor.risk_value = reading.fire_probability;
            sensor.priority = reading.status;
        }
    }
}

impl Default for EnvironmentModel {
    fn default() -> Self {
        Self::southern_california()
    }
}
