//! Tour representation and run results.
//!
//! A [`Tour`] is a cyclic permutation of the vertices together with its
//! length. Moves update the length incrementally; [`Tour::length`] always
//! recomputes it from the matrix so the two can be compared.

use serde::{Deserialize, Serialize};

use crate::instance::CostMatrix;

/// A cyclic visiting order and its total cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    /// Vertex indices in visiting order; the last vertex connects back to the first
    pub order: Vec<usize>,
    /// Total tour length, wrap-around edge included
    pub cost: i64,
}

impl Tour {
    /// Create a tour from a visiting order, computing its exact cost
    pub fn from_order(order: Vec<usize>, matrix: &CostMatrix) -> Self {
        let cost = matrix.tour_length(&order);
        Tour { order, cost }
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Vertex at a position, taken modulo the tour length
    #[inline]
    pub fn node_at(&self, pos: usize) -> usize {
        self.order[pos % self.order.len()]
    }

    /// Recompute the length from scratch
    pub fn length(&self, matrix: &CostMatrix) -> i64 {
        matrix.tour_length(&self.order)
    }

    /// Replace the stored cost by the recomputed length
    pub fn recompute(&mut self, matrix: &CostMatrix) {
        self.cost = self.length(matrix);
    }

    /// Check that the order is a permutation of `0..len`
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.order.len()];
        for &v in &self.order {
            if v >= seen.len() || seen[v] {
                return false;
            }
            seen[v] = true;
        }
        true
    }

    /// Swap the vertices at two positions. The cost is left stale.
    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
    }

    /// Reverse the positions `from..=to`, indices taken modulo the tour
    /// length, so the segment may wrap past the end. The cost is left stale.
    pub fn reverse_circular(&mut self, from: usize, to: usize) {
        let n = self.order.len();
        let (mut left, mut right) = (from, to);
        while left < right {
            self.order.swap(left % n, right % n);
            left += 1;
            right -= 1;
        }
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (length {})", self.order, self.cost)
    }
}

/// Outcome of a complete solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Instance name
    pub instance: String,
    /// Generator seed the run started from
    pub seed: u64,
    /// Number of vertices
    pub dimension: usize,
    /// ILS iterations (k)
    pub iterations: usize,
    /// Perturbation strength (l)
    pub perturbation_strength: usize,
    /// Length of the random starting tour
    pub initial_cost: i64,
    /// Length after the first local search
    pub local_optimum_cost: i64,
    /// Best tour found
    pub tour: Vec<usize>,
    /// Length of the best tour
    pub cost: i64,
    /// Number of accepted improvements
    pub improvements: usize,
    /// 2-opt passes over the whole run
    pub local_search_passes: usize,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({}, seed {})", self.instance, self.seed)?;
        writeln!(f, "  Vertices: {}", self.dimension)?;
        writeln!(f, "  k = {}, l = {}", self.iterations, self.perturbation_strength)?;
        writeln!(f, "  Initial length: {}", self.initial_cost)?;
        writeln!(f, "  After first 2-opt: {}", self.local_optimum_cost)?;
        writeln!(f, "  Best length: {}", self.cost)?;
        writeln!(f, "  Improvements: {}", self.improvements)?;
        writeln!(f, "  2-opt passes: {}", self.local_search_passes)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_matrix(n: usize) -> CostMatrix {
        CostMatrix::from_fn(n, |i, j| (j - i) as i64).unwrap()
    }

    #[test]
    fn test_from_order_computes_cost() {
        let m = line_matrix(4);
        let tour = Tour::from_order(vec![0, 2, 1, 3], &m);
        // 2 + 1 + 2 + 3
        assert_eq!(tour.cost, 8);
        assert_eq!(tour.length(&m), 8);
    }

    #[test]
    fn test_permutation_check() {
        let m = line_matrix(3);
        assert!(Tour::from_order(vec![2, 0, 1], &m).is_permutation());
        assert!(!Tour { order: vec![0, 0, 1], cost: 0 }.is_permutation());
        assert!(!Tour { order: vec![0, 3, 1], cost: 0 }.is_permutation());
    }

    #[test]
    fn test_node_at_wraps() {
        let m = line_matrix(3);
        let tour = Tour::from_order(vec![2, 0, 1], &m);
        assert_eq!(tour.node_at(3), 2);
        assert_eq!(tour.node_at(4), 0);
    }

    #[test]
    fn test_reverse_inside() {
        let m = line_matrix(6);
        let mut tour = Tour::from_order(vec![0, 1, 2, 3, 4, 5], &m);
        tour.reverse_circular(1, 4);
        assert_eq!(tour.order, vec![0, 4, 3, 2, 1, 5]);
    }

    #[test]
    fn test_reverse_wraps_past_end() {
        let m = line_matrix(5);
        let mut tour = Tour::from_order(vec![0, 1, 2, 3, 4], &m);
        // positions 3, 4, 0
        tour.reverse_circular(3, 5);
        assert_eq!(tour.order, vec![3, 1, 2, 0, 4]);
        assert!(tour.is_permutation());
    }

    #[test]
    fn test_recompute_after_swap() {
        let m = line_matrix(4);
        let mut tour = Tour::from_order(vec![0, 1, 2, 3], &m);
        tour.swap(1, 2);
        tour.recompute(&m);
        assert_eq!(tour.cost, m.tour_length(&[0, 2, 1, 3]));
    }
}
