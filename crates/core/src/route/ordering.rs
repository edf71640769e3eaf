//! Visit ordering primitives shared by every strategy
//!
//! Orders are permutations of indices into a stop slice. Cost is the open
//! path length: the sum of haversine distances between consecutive stops.

use crate::geo::haversine_distance;
use crate::sensor::Sensor;
use std::cmp::Reverse;
use tracing::warn;

/// Pairwise haversine distances between stops (miles)
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    distances: Vec<f64>,
}

impl DistanceMatrix {
    /// Precompute all pairwise distances
    pub fn new(stops: &[&Sensor]) -> Self {
        let n = stops.len();
        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = haversine_distance(stops[i].position, stops[j].position);
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }
        Self { n, distances }
    }

    /// Number of stops
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when there are no stops
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between stops `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.n + j]
    }

    /// Open path length of `order`
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}

/// Stop indices sorted by priority (`Critical` first) when `prioritize` is set
///
/// The sort is stable, so equal priorities keep their input order.
pub fn priority_order(stops: &[&Sensor], prioritize: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..stops.len()).collect();
    if prioritize {
        order.sort_by_key(|&i| Reverse(stops[i].priority));
    }
    order
}

/// Greedy nearest-neighbor tour
///
/// Starts at the first stop of [`priority_order`] and repeatedly jumps to the
/// closest unvisited stop. O(n²).
pub fn nearest_neighbor_order(
    stops: &[&Sensor],
    matrix: &DistanceMatrix,
    prioritize: bool,
) -> Vec<usize> {
    let n = stops.len();
    let Some(&start) = priority_order(stops, prioritize).first() else {
        return Vec::new();
    };

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    visited[start] = true;
    order.push(start);

    let mut current = start;
    for _ in 1..n {
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by(|&a, &b| matrix.get(current, a).total_cmp(&matrix.get(current, b)));
        let Some(next) = next else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }
    order
}

/// Make `order` a permutation of `0..n`
///
/// Out-of-range and repeated indices are dropped (first occurrence wins) and
/// any stop the order left out is appended at the end in index order. A
/// repair is logged as a warning: it means an optimizer produced a defective
/// order.
pub fn ensure_complete(order: &[usize], n: usize) -> Vec<usize> {
    let mut seen = vec![false; n];
    let mut complete = Vec::with_capacity(n);
    let mut discarded = 0usize;

    for &i in order {
        if i < n && !seen[i] {
            seen[i] = true;
            complete.push(i);
        } else {
            discarded += 1;
        }
    }

    let kept = complete.len();
    complete.extend((0..n).filter(|&i| !seen[i]));

    let appended = complete.len() - kept;
    if appended > 0 || discarded > 0 {
        warn!(
            "Visit order repaired: {} stop(s) appended, {} invalid entr(ies) dropped",
            appended, discarded
        );
    }
    complete
}
