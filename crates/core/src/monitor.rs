//! Monitoring clock
//!
//! Drives the environment model forward tick by tick. Sensor readings are
//! cheap and refreshed every tick; zone boundaries are expensive and only
//! recomputed every `boundary_interval_ticks` ticks. Boundary and route
//! results are memoized by content, so a zone whose sensors did not change
//! costs a hash lookup.

use crate::boundary::{compute_boundary, BoundaryOptions, BoundaryResult};
use crate::cache::{content_key, ResultCache};
use crate::environment::{EnvironmentModel, EnvironmentReading};
use crate::error::{ensure_positive, ConfigError};
use crate::route::{compute_route, Route, RouteOptions};
use crate::sensor::{PriorityClass, Sensor, SensorId};
use crate::zone::{assemble_zones, Zone, ZoneId, ZoneStrategy};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Boundaries are recomputed on ticks divisible by this
    pub boundary_interval_ticks: u32,
    /// How sensors are grouped
    pub zones: ZoneStrategy,
    /// Boundary extraction settings shared by every zone
    pub boundary: BoundaryOptions,
    /// Route planning settings shared by every zone
    pub route: RouteOptions,
    /// Entries per result cache
    pub cache_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            boundary_interval_ticks: 5,
            zones: ZoneStrategy::default(),
            boundary: BoundaryOptions::default(),
            route: RouteOptions::default(),
            cache_capacity: 64,
        }
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn with_boundary_interval(mut self, ticks: u32) -> Self {
        self.boundary_interval_ticks = ticks;
        self
    }

    #[must_use]
    pub fn with_zones(mut self, zones: ZoneStrategy) -> Self {
        self.zones = zones;
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryOptions) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub fn with_route(mut self, route: RouteOptions) -> Self {
        self.route = route;
        self
    }

    /// Check every setting, including the nested engine options
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.boundary_interval_ticks == 0 {
            return Err(ConfigError::invalid("boundary_interval_ticks", "must be at least 1"));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::invalid("cache_capacity", "must be at least 1"));
        }
        if let ZoneStrategy::Proximity { radius_miles } = self.zones {
            ensure_positive("zones.radius_miles", radius_miles)?;
        }
        self.boundary.validate()?;
        self.route.validate()
    }
}

/// One sensor's reading at the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor that took the reading
    pub sensor_id: SensorId,
    /// Conditions at the sensor's position
    pub reading: EnvironmentReading,
}

/// What happened on one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick the clock advanced to
    pub tick: u32,
    /// Fresh reading per sensor, in sensor order
    pub readings: Vec<SensorReading>,
    /// True when zone boundaries were recomputed on this tick
    pub boundaries_refreshed: bool,
    /// Sensors whose reading is `Critical`
    pub critical_sensors: Vec<SensorId>,
}

/// Time-stepped monitoring over a fixed sensor network
#[derive(Debug)]
pub struct MonitoringSimulation {
    model: EnvironmentModel,
    sensors: Vec<Sensor>,
    zones: Vec<Zone>,
    config: SimulationConfig,
    tick: u32,
    boundaries: Vec<BoundaryResult>,
    boundary_cache: ResultCache<BoundaryResult>,
    route_cache: ResultCache<Route>,
}

impl MonitoringSimulation {
    /// Build the clock at tick 0
    ///
    /// Sensors are polled and zone boundaries computed immediately.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or duplicate sensor ids.
    pub fn new(
        model: EnvironmentModel,
        sensors: Vec<Sensor>,
        config: SimulationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut seen = FxHashSet::default();
        if let Some(duplicate) = sensors.iter().find(|s| !seen.insert(s.id)) {
            return Err(ConfigError::invalid(
                "sensors",
                &format!("duplicate sensor id {}", duplicate.id),
            ));
        }

        let zones = assemble_zones(&sensors, &config.zones);
        info!(
            "Monitoring {} sensor(s) in {} zone(s), boundaries every {} tick(s)",
            sensors.len(),
            zones.len(),
            config.boundary_interval_ticks
        );

        let mut simulation = Self {
            model,
            sensors,
            zones,
            boundary_cache: ResultCache::new(config.cache_capacity),
            route_cache: ResultCache::new(config.cache_capacity),
            config,
            tick: 0,
            boundaries: Vec::new(),
        };
        simulation.poll();
        simulation.refresh_boundaries();
        Ok(simulation)
    }

    /// Advance one tick
    pub fn step(&mut self) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let readings = self.poll();

        let boundaries_refreshed = self.tick % self.config.boundary_interval_ticks == 0;
        if boundaries_refreshed {
            self.refresh_boundaries();
        }

        let critical_sensors: Vec<SensorId> = readings
            .iter()
            .filter(|r| r.reading.status == PriorityClass::Critical)
            .map(|r| r.sensor_id)
            .collect();

        debug!(
            "Tick {}: {} critical sensor(s){}",
            self.tick,
            critical_sensors.len(),
            if boundaries_refreshed { ", boundaries refreshed" } else { "" }
        );

        TickReport {
            tick: self.tick,
            readings,
            boundaries_refreshed,
            critical_sensors,
        }
    }

    /// Jump to `tick`, forward or backward
    ///
    /// The environment is a pure function of tick, so this lands in exactly
    /// the state stepping would have produced.
    pub fn seek(&mut self, tick: u32) {
        debug!("Seeking from tick {} to {}", self.tick, tick);
        self.tick = tick;
        self.poll();
        self.refresh_boundaries();
    }

    /// Patrol route through one zone, `None` for an unknown zone
    pub fn route_for_zone(&mut self, zone_id: ZoneId) -> Option<Route> {
        let zone = self.zones.get(zone_id)?;
        let members = zone.select(&self.sensors);
        let options = &self.config.route;
        let key = content_key(&members, options);
        let route = self
            .route_cache
            .get_or_insert_with(key, || compute_route(&members, options));
        Some(route.clone())
    }

    /// Latest boundaries, one per zone in zone order
    pub fn zone_boundaries(&self) -> &[BoundaryResult] {
        &self.boundaries
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Sensors with their latest risk values
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn model(&self) -> &EnvironmentModel {
        &self.model
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// `(hits, misses)` of the boundary cache
    pub fn boundary_cache_stats(&self) -> (u64, u64) {
        (self.boundary_cache.hits(), self.boundary_cache.misses())
    }

    /// Re-read every sensor at the current tick
    fn poll(&mut self) -> Vec<SensorReading> {
        let tick = self.tick;
        self.sensors
            .iter_mut()
            .map(|sensor| {
                let reading = self.model.conditions_at(sensor.position, tick);
                sensor.risk_value = reading.fire_probability;
                sensor.priority = reading.status;
                SensorReading {
                    sensor_id: sensor.id,
                    reading,
                }
            })
            .collect()
    }

    fn refresh_boundaries(&mut self) {
        let options = &self.config.boundary;
        let cache = &mut self.boundary_cache;
        self.boundaries = self
            .zones
            .iter()
            .map(|zone| {
                let members = zone.select(&self.sensors);
                let key = content_key(&members, options);
                cache
                    .get_or_insert_with(key, || compute_boundary(&members, options))
                    .clone()
            })
            .collect();
        debug!(
            "Refreshed {} zone boundar(ies) at tick {}",
            self.boundaries.len(),
            self.tick
        );
    }
}
