//! Small genetic algorithm over visit orders
//!
//! Tournament selection, order-preserving crossover, swap mutation and
//! elitism. Deliberately small: routes cover dozens of sensors at most.

use super::ordering::DistanceMatrix;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on individuals evaluated over a whole run
pub const MAX_GENETIC_EVALUATIONS: usize = 1_000_000;

/// Genetic algorithm settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneticParams {
    /// Individuals per generation
    pub population_size: usize,
    /// Generations to evolve
    pub generations: usize,
    /// Individuals drawn per tournament
    pub tournament_size: usize,
    /// Probability (0-1) that a child gets one random swap
    pub mutation_rate: f64,
}

impl GeneticParams {
    /// Individuals evaluated over the whole run, saturating
    pub fn evaluations(&self) -> usize {
        self.population_size.saturating_mul(self.generations.saturating_add(1))
    }
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 20,
            generations: 50,
            tournament_size: 3,
            mutation_rate: 0.1,
        }
    }
}

/// Evolve a population of random permutations toward a short open path
///
/// The best individual of each generation is carried over unchanged, so the
/// best cost never gets worse from one generation to the next.
pub fn evolve<R: Rng + ?Sized>(
    matrix: &DistanceMatrix,
    params: &GeneticParams,
    rng: &mut R,
) -> Vec<usize> {
    let n = matrix.len();
    let population_size = params.population_size.max(2);

    let mut population: Vec<Vec<usize>> = (0..population_size)
        .map(|_| {
            let mut individual: Vec<usize> = (0..n).collect();
            individual.shuffle(rng);
            individual
        })
        .collect();

    for _ in 0..params.generations {
        let costs: Vec<f64> = population.iter().map(|p| matrix.path_cost(p)).collect();

        let mut next = Vec::with_capacity(population_size);
        next.push(population[fittest(&costs)].clone());

        while next.len() < population_size {
            let parent_a = tournament(&population, &costs, params.tournament_size, rng);
            let parent_b = tournament(&population, &costs, params.tournament_size, rng);
            let mut child = order_crossover(parent_a, parent_b, rng);
            if rng.random::<f64>() < params.mutation_rate {
                swap_mutation(&mut child, rng);
            }
            next.push(child);
        }

        population = next;
    }

    let costs: Vec<f64> = population.iter().map(|p| matrix.path_cost(p)).collect();
    population.swap_remove(fittest(&costs))
}

/// Index of the lowest cost
fn fittest(costs: &[f64]) -> usize {
    costs
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i)
}

/// Best of `size` randomly drawn individuals
fn tournament<'p, R: Rng + ?Sized>(
    population: &'p [Vec<usize>],
    costs: &[f64],
    size: usize,
    rng: &mut R,
) -> &'p [usize] {
    let mut winner = rng.random_range(0..population.len());
    for _ in 1..size.max(1) {
        let challenger = rng.random_range(0..population.len());
        if costs[challenger] < costs[winner] {
            winner = challenger;
        }
    }
    &population[winner]
}

/// Order crossover
///
/// Copies a random slice of `parent_a` into the same positions of the child
/// and fills the remaining positions with `parent_b`'s genes in `parent_b`'s
/// order, skipping genes already taken from the slice.
pub fn order_crossover<R: Rng + ?Sized>(
    parent_a: &[usize],
    parent_b: &[usize],
    rng: &mut R,
) -> Vec<usize> {
    let n = parent_a.len();
    if n < 2 {
        return parent_a.to_vec();
    }

    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    let (start, end) = if i <= j { (i, j) } else { (j, i) };

    let mut child: Vec<Option<usize>> = vec![None; n];
    let mut taken = vec![false; n];
    for k in start..=end {
        let gene = parent_a[k];
        child[k] = Some(gene);
        if gene < n {
            taken[gene] = true;
        }
    }

    let mut fill = parent_b.iter().copied().filter(|&gene| gene < n && !taken[gene]);
    for slot in child.iter_mut().filter(|slot| slot.is_none()) {
        *slot = fill.next();
    }

    // A malformed parent can leave holes; callers run the completeness pass
    child.into_iter().flatten().collect()
}

/// Swap two random positions
fn swap_mutation<R: Rng + ?Sized>(individual: &mut [usize], rng: &mut R) {
    let n = individual.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    individual.swap(i, j);
}
