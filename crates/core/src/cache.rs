//! Content-keyed memoization for engine results
//!
//! The engines are stateless; a caller that re-runs them on unchanged input
//! keeps a [`ResultCache`] keyed by [`content_key`] of the inputs instead.

use crate::boundary::BoundaryOptions;
use crate::geo::Position;
use crate::route::RouteOptions;
use crate::sensor::Sensor;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use tracing::trace;

/// Feeds a value's content into a hasher
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` hash differently
/// and identical inputs always produce identical keys.
pub trait ContentHash {
    fn content_hash<H: Hasher>(&self, state: &mut H);
}

impl ContentHash for f64 {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl ContentHash for Position {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.content_hash(state);
        self.longitude.content_hash(state);
    }
}

impl ContentHash for Sensor {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.position.content_hash(state);
        self.risk_value.content_hash(state);
        self.priority.hash(state);
    }
}

impl<T: ContentHash> ContentHash for [T] {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self {
            item.content_hash(state);
        }
    }
}

impl ContentHash for BoundaryOptions {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.max_influence_miles.content_hash(state);
        self.decay_exponent.content_hash(state);
        self.grid_resolution_deg.content_hash(state);
        self.margin_miles.content_hash(state);
        self.smoothing_factor.content_hash(state);
        self.min_sensors.hash(state);
        self.probability_threshold.content_hash(state);
    }
}

impl ContentHash for RouteOptions {
    fn content_hash<H: Hasher>(&self, state: &mut H) {
        self.algorithm.hash(state);
        self.prioritize.hash(state);
        self.path_density_deg.content_hash(state);
        self.patrol_radii.critical.content_hash(state);
        self.patrol_radii.warning.content_hash(state);
        self.patrol_radii.active.content_hash(state);
        self.simplify_distance_deg.content_hash(state);
        self.seed.hash(state);

        let a = &self.annealing;
        a.initial_temperature.content_hash(state);
        a.cooling_rate.content_hash(state);
        a.min_temperature.content_hash(state);
        a.iterations_per_temperature.hash(state);

        let g = &self.genetic;
        g.population_size.hash(state);
        g.generations.hash(state);
        g.tournament_size.hash(state);
        g.mutation_rate.content_hash(state);

        self.fallback_center.content_hash(state);
    }
}

/// Key for an engine call over `(sensors, options)`
///
/// The key is a 64-bit hash, not the inputs themselves. Two different
/// inputs that collide share a cache slot and the later call gets the
/// earlier result. The odds are about `n² / 2⁶⁵` for `n` distinct inputs,
/// which is negligible at the few hundred entries a clock keeps live.
pub fn content_key<O: ContentHash + ?Sized>(sensors: &[Sensor], options: &O) -> u64 {
    let mut hasher = FxHasher::default();
    sensors.content_hash(&mut hasher);
    options.content_hash(&mut hasher);
    hasher.finish()
}

/// Bounded memo table
///
/// When full, the table is cleared before the next insert. Entries are
/// cheap to recompute, so there is no eviction order to maintain.
///
/// Entries are looked up by [`content_key`] alone and the inputs are never
/// compared, so a hash collision returns the colliding entry's value.
#[derive(Debug, Clone)]
pub struct ResultCache<T> {
    entries: FxHashMap<u64, T>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<T> ResultCache<T> {
    /// Empty cache holding at most `capacity` entries (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached value for `key`, computing and storing it on a miss
    pub fn get_or_insert_with<F: FnOnce() -> T>(&mut self, key: u64, compute: F) -> &T {
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            if self.entries.len() >= self.capacity {
                trace!("Result cache full ({} entries), clearing", self.entries.len());
                self.entries.clear();
            }
        }
        self.entries.entry(key).or_insert_with(compute)
    }

    pub fn get(&self, key: u64) -> Option<&T> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
