//! Simulated annealing over visit orders

use super::ordering::DistanceMatrix;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on swap attempts over a whole schedule
pub const MAX_ANNEALING_ATTEMPTS: f64 = 5_000_000.0;

/// Annealing schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealingParams {
    /// Starting temperature
    pub initial_temperature: f64,
    /// Geometric cooling factor applied after each temperature step
    pub cooling_rate: f64,
    /// Annealing stops once the temperature drops to this value
    pub min_temperature: f64,
    /// Swap attempts at each temperature
    pub iterations_per_temperature: usize,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.95,
            min_temperature: 1.0,
            iterations_per_temperature: 100,
        }
    }
}

impl AnnealingParams {
    /// Number of cooling steps from the initial to the minimum temperature
    ///
    /// Only meaningful for a cooling rate strictly between 0 and 1.
    pub fn temperature_steps(&self) -> f64 {
        if self.initial_temperature <= self.min_temperature {
            return 0.0;
        }
        ((self.min_temperature / self.initial_temperature).ln() / self.cooling_rate.ln()).ceil()
    }

    /// Total swap attempts over the schedule
    pub fn attempts(&self) -> f64 {
        self.temperature_steps() * self.iterations_per_temperature as f64
    }
}

/// Anneal a random starting permutation toward a short open path
///
/// Each attempt swaps two random positions. Improvements are always kept; a
/// worse order is kept with probability `exp(-Δ / T)`. The best order seen at
/// any point is returned, since the walk can wander away from it.
pub fn anneal<R: Rng + ?Sized>(
    matrix: &DistanceMatrix,
    params: &AnnealingParams,
    rng: &mut R,
) -> Vec<usize> {
    let n = matrix.len();
    let mut current: Vec<usize> = (0..n).collect();
    current.shuffle(rng);
    if n < 2 {
        return current;
    }

    let mut current_cost = matrix.path_cost(&current);
    let mut best = current.clone();
    let mut best_cost = current_cost;

    let mut temperature = params.initial_temperature;
    while temperature > params.min_temperature {
        for _ in 0..params.iterations_per_temperature {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            if i == j {
                continue;
            }

            current.swap(i, j);
            let cost = matrix.path_cost(&current);
            let delta = cost - current_cost;
            if delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
                current_cost = cost;
                if cost < best_cost {
                    best_cost = cost;
                    best.clone_from(&current);
                }
            } else {
                current.swap(i, j);
            }
        }
        temperature *= params.cooling_rate;
    }

    best
}
