//! Wildfire Monitoring Core Library
//!
//! Simulates a time-evolving wildfire environment over a network of point
//! sensors and derives two artifacts from it:
//!
//! - Smooth high/medium risk boundary polygons around a sensor cluster
//! - An optimized patrol route that visits every sensor in a cluster
//!
//! ## Components
//!
//! - [`EnvironmentModel`]: deterministic `(position, tick) -> reading` over
//!   moving, growing fire origins
//! - [`compute_boundary`]: sampled risk field, convex hull, margin buffer and
//!   Chaikin smoothing
//! - [`compute_route`]: nearest-neighbor, simulated annealing or genetic
//!   ordering expanded into a dense path with patrol loops
//! - [`assemble_zones`]: static or proximity-based sensor grouping
//! - [`MonitoringSimulation`]: the tick clock tying everything together
//!
//! The engines are stateless pure functions; memoization lives in [`cache`].

// Geometry and shared records
pub mod geo;
pub mod sensor;

// Engines
pub mod boundary;
pub mod environment;
pub mod route;

// Orchestration
pub mod cache;
pub mod monitor;
pub mod zone;

pub mod error;

// Re-export the public surface
pub use boundary::{compute_boundary, BoundaryOptions, BoundaryPreset, BoundaryResult};
pub use cache::{content_key, ContentHash, ResultCache};
pub use environment::{AmbientBaseline, EnvironmentModel, EnvironmentReading, FireOrigin};
pub use error::{ConfigError, ConfigErrorCode};
pub use geo::{haversine_distance, Polygon, Position};
pub use monitor::{MonitoringSimulation, SensorReading, SimulationConfig, TickReport};
pub use route::{compute_route, ensure_complete, Route, RouteAlgorithm, RouteOptions};
pub use sensor::{PriorityClass, Sensor, SensorId};
pub use zone::{assemble_zones, Zone, ZoneDefinition, ZoneId, ZoneStrategy};
