//! Patrol route planning
//!
//! Two stages:
//!
//! 1. **Ordering** - a permutation of the sensors chosen by one of the
//!    [`RouteAlgorithm`]s, repaired into a full permutation and never worse
//!    than the greedy nearest-neighbor order
//! 2. **Path synthesis** - transits, patrol loops and the return leg, thinned
//!    by a distance filter
//!
//! Randomized strategies draw from a `ChaCha8Rng` seeded by
//! [`RouteOptions::seed`], so a route is a pure function of its inputs.

pub mod annealing;
pub mod genetic;
pub mod ordering;
pub mod path;

pub use annealing::{anneal, AnnealingParams, MAX_ANNEALING_ATTEMPTS};
pub use genetic::{evolve, order_crossover, GeneticParams, MAX_GENETIC_EVALUATIONS};
pub use ordering::{ensure_complete, nearest_neighbor_order, priority_order, DistanceMatrix};
pub use path::{
    build_path, build_raw_path, default_loop, simplify_path, PathSettings, PatrolRadii,
    MAX_RAW_PATH_POINTS,
};

use crate::error::{ensure_positive, ensure_range, ConfigError};
use crate::geo::Position;
use crate::sensor::{Sensor, SensorId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Below this many stops the priority order is used as is
const SMALL_ROUTE: usize = 3;

/// Visit-order strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RouteAlgorithm {
    /// Greedy nearest unvisited stop
    #[default]
    NearestNeighbor,
    /// Random swaps under a cooling acceptance schedule
    SimulatedAnnealing,
    /// Tournament selection with order crossover
    Genetic,
}

impl RouteAlgorithm {
    /// Short name used in logs and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "nearest-neighbor",
            Self::SimulatedAnnealing => "annealing",
            Self::Genetic => "genetic",
        }
    }
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Route planning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Ordering strategy
    pub algorithm: RouteAlgorithm,
    /// Sort stops by priority before ordering
    pub prioritize: bool,
    /// Maximum spacing between path points (degrees)
    pub path_density_deg: f64,
    /// Patrol loop radius per priority class (miles)
    pub patrol_radii: PatrolRadii,
    /// Minimum spacing kept when thinning the path (degrees)
    pub simplify_distance_deg: f64,
    /// Seed for the randomized strategies
    pub seed: u64,
    /// Simulated annealing schedule
    pub annealing: AnnealingParams,
    /// Genetic algorithm settings
    pub genetic: GeneticParams,
    /// Center of the default loop used when there is nothing to visit
    pub fallback_center: Position,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            algorithm: RouteAlgorithm::default(),
            prioritize: true,
            path_density_deg: 0.01,
            patrol_radii: PatrolRadii::default(),
            simplify_distance_deg: 0.0001,
            seed: 42,
            annealing: AnnealingParams::default(),
            genetic: GeneticParams::default(),
            fallback_center: Position::new(34.05, -118.25),
        }
    }
}

impl RouteOptions {
    /// Set the ordering strategy
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: RouteAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable or disable the priority sort
    #[must_use]
    pub fn with_prioritize(mut self, prioritize: bool) -> Self {
        self.prioritize = prioritize;
        self
    }

    /// Set the RNG seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the path point spacing
    #[must_use]
    pub fn with_path_density(mut self, density_deg: f64) -> Self {
        self.path_density_deg = density_deg;
        self
    }

    /// Set the fallback loop center
    #[must_use]
    pub fn with_fallback_center(mut self, center: Position) -> Self {
        self.fallback_center = center;
        self
    }

    /// Check every setting
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_range("path_density_deg", self.path_density_deg, 1e-6, 1.0)?;
        ensure_positive("patrol_radii.critical", self.patrol_radii.critical)?;
        ensure_positive("patrol_radii.warning", self.patrol_radii.warning)?;
        ensure_positive("patrol_radii.active", self.patrol_radii.active)?;
        ensure_range("simplify_distance_deg", self.simplify_distance_deg, 0.0, 1.0)?;

        let a = &self.annealing;
        ensure_positive("annealing.initial_temperature", a.initial_temperature)?;
        ensure_positive("annealing.min_temperature", a.min_temperature)?;
        // A rate of 1 would never cool
        ensure_range("annealing.cooling_rate", a.cooling_rate, 0.0, 0.999_999)?;
        if a.cooling_rate <= 0.0 {
            return Err(ConfigError::non_positive("annealing.cooling_rate", a.cooling_rate));
        }
        if a.attempts() > MAX_ANNEALING_ATTEMPTS {
            return Err(ConfigError::invalid(
                "annealing",
                &format!(
                    "schedule needs {} swap attempts, limit is {}",
                    a.attempts(),
                    MAX_ANNEALING_ATTEMPTS
                ),
            ));
        }

        let g = &self.genetic;
        if g.population_size < 2 {
            return Err(ConfigError::invalid(
                "genetic.population_size",
                "needs at least 2 individuals",
            ));
        }
        if g.tournament_size == 0 || g.tournament_size > g.population_size {
            return Err(ConfigError::invalid(
                "genetic.tournament_size",
                "must be between 1 and the population size",
            ));
        }
        if g.evaluations() > MAX_GENETIC_EVALUATIONS {
            return Err(ConfigError::invalid(
                "genetic",
                &format!(
                    "run evaluates {} individuals, limit is {}",
                    g.evaluations(),
                    MAX_GENETIC_EVALUATIONS
                ),
            ));
        }
        ensure_range("genetic.mutation_rate", g.mutation_rate, 0.0, 1.0)?;

        if !self.fallback_center.is_valid() {
            return Err(ConfigError::invalid("fallback_center", "not a valid position"));
        }
        Ok(())
    }

    /// Path synthesis settings derived from these options
    pub fn path_settings(&self) -> PathSettings {
        PathSettings {
            density_deg: self.path_density_deg,
            radii: self.patrol_radii,
            simplify_distance_deg: self.simplify_distance_deg,
        }
    }

    /// These options if valid, the defaults otherwise
    fn sanitized(&self) -> Self {
        match self.validate() {
            Ok(()) => self.clone(),
            Err(err) => {
                warn!("Invalid route options ({err}), falling back to defaults");
                Self::default()
            }
        }
    }
}

/// Planned patrol route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Sensors in visiting order
    pub visit_order: Vec<SensorId>,
    /// Dense, simplified path (never empty)
    pub dense_path: Vec<Position>,
    /// Strategy that produced the order
    pub algorithm: RouteAlgorithm,
    /// Open path length of the visit order (miles)
    pub cost_miles: f64,
}

impl Route {
    /// True when the route visits no sensor (default loop only)
    pub fn is_idle(&self) -> bool {
        self.visit_order.is_empty()
    }
}

/// Plan a patrol route through every sensor with a valid position
///
/// Never fails. Sensors with an invalid position are skipped; with nothing
/// left to visit the route is a fixed four-point loop around
/// [`RouteOptions::fallback_center`].
pub fn compute_route(sensors: &[Sensor], options: &RouteOptions) -> Route {
    let options = options.sanitized();

    let stops: Vec<&Sensor> = sensors.iter().filter(|s| s.position.is_valid()).collect();
    if stops.len() < sensors.len() {
        warn!(
            "Skipping {} sensor(s) with invalid positions",
            sensors.len() - stops.len()
        );
    }

    if stops.is_empty() {
        debug!("No sensors to visit, using the default loop");
        return Route {
            visit_order: Vec::new(),
            dense_path: default_loop(options.fallback_center),
            algorithm: options.algorithm,
            cost_miles: 0.0,
        };
    }

    let matrix = DistanceMatrix::new(&stops);
    let order = plan_order(&stops, &matrix, &options);
    let cost_miles = matrix.path_cost(&order);

    let ordered: Vec<&Sensor> = order.iter().map(|&i| stops[i]).collect();
    let dense_path = build_path(&ordered, &options.path_settings());

    debug!(
        "Route ({}) through {} sensor(s): {:.2} mi, {} path points",
        options.algorithm,
        ordered.len(),
        cost_miles,
        dense_path.len()
    );

    Route {
        visit_order: ordered.iter().map(|s| s.id).collect(),
        dense_path,
        algorithm: options.algorithm,
        cost_miles,
    }
}

/// Choose a complete visit order, never costlier than nearest-neighbor
fn plan_order(stops: &[&Sensor], matrix: &DistanceMatrix, options: &RouteOptions) -> Vec<usize> {
    let n = stops.len();
    if n < SMALL_ROUTE {
        return priority_order(stops, options.prioritize);
    }

    let baseline = nearest_neighbor_order(stops, matrix, options.prioritize);
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let candidate = match options.algorithm {
        RouteAlgorithm::NearestNeighbor => return ensure_complete(&baseline, n),
        RouteAlgorithm::SimulatedAnnealing => anneal(matrix, &options.annealing, &mut rng),
        RouteAlgorithm::Genetic => evolve(matrix, &options.genetic, &mut rng),
    };
    let candidate = ensure_complete(&candidate, n);

    let baseline_cost = matrix.path_cost(&baseline);
    let candidate_cost = matrix.path_cost(&candidate);
    if candidate_cost <= baseline_cost {
        candidate
    } else {
        debug!(
            "{} order ({:.3} mi) lost to nearest-neighbor ({:.3} mi)",
            options.algorithm, candidate_cost, baseline_cost
        );
        baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: u32, lat: f64, lon: f64, risk: f64) -> Sensor {
        Sensor::new(id, Position::new(lat, lon), risk)
    }

    fn scatter() -> Vec<Sensor> {
        vec![
            sensor(1, 34.00, -118.00, 30.0),
            sensor(2, 34.04, -118.06, 75.0),
            sensor(3, 34.01, -118.09, 45.0),
            sensor(4, 34.07, -118.02, 20.0),
            sensor(5, 34.03, -118.03, 90.0),
            sensor(6, 34.06, -118.08, 55.0),
        ]
    }

    #[test]
    fn test_empty_input_uses_default_loop() {
        let route = compute_route(&[], &RouteOptions::default());
        assert!(route.is_idle());
        assert_eq!(route.dense_path.len(), 4);
        assert_eq!(route.cost_miles, 0.0);
    }

    #[test]
    fn test_invalid_positions_skipped() {
        let sensors = vec![sensor(1, f64::NAN, -118.0, 50.0), sensor(2, 34.0, -118.0, 50.0)];
        let route = compute_route(&sensors, &RouteOptions::default());
        assert_eq!(route.visit_order, vec![SensorId(2)]);
        assert!(!route.dense_path.is_empty());
    }

    #[test]
    fn test_small_route_uses_priority_order() {
        let sensors = vec![sensor(1, 34.0, -118.0, 10.0), sensor(2, 34.1, -118.0, 95.0)];
        let route = compute_route(&sensors, &RouteOptions::default());
        assert_eq!(route.visit_order, vec![SensorId(2), SensorId(1)]);

        let unsorted = RouteOptions::default().with_prioritize(false);
        let route = compute_route(&sensors, &unsorted);
        assert_eq!(route.visit_order, vec![SensorId(1), SensorId(2)]);
    }

    #[test]
    fn test_every_algorithm_visits_everything() {
        let sensors = scatter();
        for algorithm in [
            RouteAlgorithm::NearestNeighbor,
            RouteAlgorithm::SimulatedAnnealing,
            RouteAlgorithm::Genetic,
        ] {
            let route = compute_route(&sensors, &RouteOptions::default().with_algorithm(algorithm));
            let mut ids = route.visit_order.clone();
            ids.sort_unstable();
            assert_eq!(ids, (1..=6).map(SensorId).collect::<Vec<_>>(), "{algorithm}");
            assert_eq!(route.algorithm, algorithm);
        }
    }

    #[test]
    fn test_optimizers_never_lose_to_nearest_neighbor() {
        let sensors = scatter();
        let baseline = compute_route(&sensors, &RouteOptions::default());
        for algorithm in [RouteAlgorithm::SimulatedAnnealing, RouteAlgorithm::Genetic] {
            let route = compute_route(&sensors, &RouteOptions::default().with_algorithm(algorithm));
            assert!(route.cost_miles <= baseline.cost_miles + 1e-9, "{algorithm}");
        }
    }

    #[test]
    fn test_same_inputs_same_route() {
        let sensors = scatter();
        let options = RouteOptions::default().with_algorithm(RouteAlgorithm::Genetic);
        assert_eq!(compute_route(&sensors, &options), compute_route(&sensors, &options));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(RouteOptions::default().validate().is_ok());
        assert!(RouteOptions::default().with_path_density(0.0).validate().is_err());

        let mut options = RouteOptions::default();
        options.annealing.cooling_rate = 1.0;
        assert!(options.validate().is_err());

        let mut options = RouteOptions::default();
        options.genetic.population_size = 1;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_runaway_settings() {
        let too_dense = RouteOptions::default().with_path_density(1e-13);
        assert!(too_dense.validate().is_err());

        let mut endless_cooling = RouteOptions::default();
        endless_cooling.annealing.min_temperature = 1e-300;
        endless_cooling.annealing.cooling_rate = 0.9999;
        assert!(endless_cooling.validate().is_err());

        let mut busy_swaps = RouteOptions::default();
        busy_swaps.annealing.iterations_per_temperature = usize::MAX;
        assert!(busy_swaps.validate().is_err());

        let mut endless_evolution = RouteOptions::default();
        endless_evolution.genetic.generations = usize::MAX;
        assert!(endless_evolution.validate().is_err());

        let mut huge_tournament = RouteOptions::default();
        huge_tournament.genetic.tournament_size = 1000;
        assert!(huge_tournament.validate().is_err());
    }

    #[test]
    fn test_extreme_density_falls_back_instead_of_exhausting_memory() {
        let sensors = vec![sensor(1, 34.0, -118.0, 90.0), sensor(2, 35.0, -119.0, 30.0)];
        let extreme = RouteOptions::default().with_path_density(1e-13);
        let route = compute_route(&sensors, &extreme);
        assert_eq!(route, compute_route(&sensors, &RouteOptions::default()));
        assert!(route.dense_path.len() < MAX_RAW_PATH_POINTS);
    }

    #[test]
    fn test_invalid_options_fall_back_to_defaults() {
        let sensors = scatter();
        let bad = RouteOptions::default().with_path_density(-1.0);
        assert_eq!(
            compute_route(&sensors, &bad),
            compute_route(&sensors, &RouteOptions::default())
        );
    }
}
