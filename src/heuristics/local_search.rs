//! Local search improvement heuristics for the TSP.
//!
//! Greedy 2-opt: each pass scans the whole neighbourhood, applies the single
//! best improving move, and starts over until no move improves the tour.

use crate::instance::CostMatrix;
use crate::solution::Tour;

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, matrix: &CostMatrix, tour: &mut Tour) -> LocalSearchStats;
    fn name(&self) -> &str;
}

/// Work done by one local search call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalSearchStats {
    /// Full neighbourhood scans, the final unsuccessful one included
    pub passes: usize,
    /// Moves applied
    pub moves: usize,
    /// Total length removed from the tour
    pub gain: i64,
}

impl LocalSearchStats {
    pub fn improved(&self) -> bool {
        self.moves > 0
    }
}

impl std::ops::AddAssign for LocalSearchStats {
    fn add_assign(&mut self, other: Self) {
        self.passes += other.passes;
        self.moves += other.moves;
        self.gain += other.gain;
    }
}

/// A 2-opt move over tour positions.
///
/// Replaces edges `(t[i], t[i+1])` and `(t[j], t[j+1])` by `(t[i], t[j])`
/// and `(t[i+1], t[j+1])`, positions taken modulo `n`. `j` ranges up to
/// `n`, in which case the reversed segment wraps around to position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoOptMove {
    pub i: usize,
    pub j: usize,
    /// Length removed by the move; positive for an improving move
    pub benefit: i64,
}

impl TwoOptMove {
    /// Evaluate the move at positions `(i, j)`
    pub fn evaluate(matrix: &CostMatrix, tour: &Tour, i: usize, j: usize) -> Self {
        let a = tour.node_at(i);
        let b = tour.node_at(i + 1);
        let c = tour.node_at(j);
        let d = tour.node_at(j + 1);
        let benefit = matrix.cost(a, b) + matrix.cost(c, d) - matrix.cost(a, c) - matrix.cost(b, d);
        TwoOptMove { i, j, benefit }
    }

    /// Reverse positions `i+1..=j` and update the cost incrementally
    pub fn apply(&self, tour: &mut Tour) {
        tour.reverse_circular(self.i + 1, self.j);
        tour.cost -= self.benefit;
    }
}

/// Best-improvement 2-opt.
///
/// Ties are broken in favour of the first pair met in `(i, j)` scan order.
/// There is no iteration cap: every applied move strictly lowers a
/// non-negative integer length.
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoOptSearch;

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch
    }

    /// Scan the whole neighbourhood and return the strictly best improving
    /// move, if any.
    pub fn best_move(matrix: &CostMatrix, tour: &Tour) -> Option<TwoOptMove> {
        let order = &tour.order;
        let n = order.len();
        let mut best: Option<TwoOptMove> = None;
        let mut best_benefit = 0;

        for i in 0..n {
            let a = order[i];
            let b = order[(i + 1) % n];
            let ab = matrix.cost(a, b);
            for j in i + 2..=n {
                let c = order[j % n];
                let d = order[(j + 1) % n];
                let benefit = ab + matrix.cost(c, d) - matrix.cost(a, c) - matrix.cost(b, d);
                if benefit > best_benefit {
                    best_benefit = benefit;
                    best = Some(TwoOptMove { i, j, benefit });
                }
            }
        }

        best
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, matrix: &CostMatrix, tour: &mut Tour) -> LocalSearchStats {
        let mut stats = LocalSearchStats::default();

        loop {
            stats.passes += 1;
            let Some(mv) = Self::best_move(matrix, tour) else {
                break;
            };
            mv.apply(tour);
            stats.moves += 1;
            stats.gain += mv.benefit;
            log::trace!("2-opt ({}, {}) gains {} -> {}", mv.i, mv.j, mv.benefit, tour.cost);
        }

        stats
    }

    fn name(&self) -> &str {
        "2-Opt-BI"
    }
}

/// True when no single 2-opt move strictly shortens the tour
pub fn is_two_opt_optimal(matrix: &CostMatrix, tour: &Tour) -> bool {
    TwoOptSearch::best_move(matrix, tour).is_none()
}
