//! Iterated Local Search.
//!
//! Build a random tour and take it to a 2-opt local optimum. Then, `k`
//! times: copy the best tour, apply `l` random transpositions, re-optimise
//! with 2-opt, and keep the result only if it is strictly shorter than the
//! best so far.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::heuristics::construction::{ConstructionHeuristic, RandomTour};
use crate::heuristics::local_search::{LocalSearch, LocalSearchStats, TwoOptSearch};
use crate::instance::CostMatrix;
use crate::report::{Improvement, TourReporter};
use crate::rng::ParkMiller;
use crate::solution::{Solution, Tour};

/// ILS parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlsConfig {
    /// Number of perturbation rounds (k)
    pub iterations: usize,
    /// Random transpositions per perturbation (l)
    pub perturbation_strength: usize,
}

impl Default for IlsConfig {
    fn default() -> Self {
        IlsConfig {
            iterations: 1000,
            perturbation_strength: 3,
        }
    }
}

/// Result of an ILS run
#[derive(Debug, Clone)]
pub struct IlsOutcome {
    /// Best tour found
    pub best: Tour,
    /// Length of the starting tour
    pub initial_cost: i64,
    /// Length after the first local search
    pub local_optimum_cost: i64,
    /// Accepted improvements, one per reporter call
    pub improvements: usize,
    /// Work done by every local search of the run
    pub local_search: LocalSearchStats,
    /// `(iteration, cost)` of each accepted improvement
    pub history: Vec<(usize, i64)>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl IlsOutcome {
    pub fn to_solution(&self, instance: &str, seed: u64, config: &IlsConfig) -> Solution {
        Solution {
            instance: instance.to_string(),
            seed,
            dimension: self.best.len(),
            iterations: config.iterations,
            perturbation_strength: config.perturbation_strength,
            initial_cost: self.initial_cost,
            local_optimum_cost: self.local_optimum_cost,
            tour: self.best.order.clone(),
            cost: self.best.cost,
            improvements: self.improvements,
            local_search_passes: self.local_search.passes,
            computation_time: self.elapsed.as_secs_f64(),
        }
    }
}

/// Iterated Local Search over greedy 2-opt with better-only acceptance
#[derive(Debug, Default, Clone)]
pub struct IteratedLocalSearch {
    pub config: IlsConfig,
    local_search: TwoOptSearch,
    construction: RandomTour,
}

impl IteratedLocalSearch {
    pub fn new(config: IlsConfig) -> Self {
        IteratedLocalSearch {
            config,
            local_search: TwoOptSearch::new(),
            construction: RandomTour::new(),
        }
    }

    pub fn with_params(iterations: usize, perturbation_strength: usize) -> Self {
        Self::new(IlsConfig { iterations, perturbation_strength })
    }

    /// Run from a random starting tour drawn from `gen`
    pub fn run<R>(&self, matrix: &CostMatrix, gen: &mut ParkMiller, reporter: &mut R) -> IlsOutcome
    where
        R: TourReporter + ?Sized,
    {
        let tour = self.construction.construct(matrix, gen);
        self.search(tour, matrix, gen, reporter)
    }

    /// Run from a caller-supplied tour.
    ///
    /// The tour must be a permutation of the matrix vertices. Its stored
    /// cost is ignored and recomputed from `matrix`.
    pub fn run_from<R>(
        &self,
        mut tour: Tour,
        matrix: &CostMatrix,
        gen: &mut ParkMiller,
        reporter: &mut R,
    ) -> SolverResult<IlsOutcome>
    where
        R: TourReporter + ?Sized,
    {
        if tour.len() != matrix.dimension() {
            return Err(SolverError::parameter(
                "tour",
                format!("has {} vertices, the instance has {}", tour.len(), matrix.dimension()),
            ));
        }
        if !tour.is_permutation() {
            return Err(SolverError::parameter("tour", "is not a permutation of the vertices"));
        }
        tour.recompute(matrix);
        Ok(self.search(tour, matrix, gen, reporter))
    }

    fn search<R>(&self, tour: Tour, matrix: &CostMatrix, gen: &mut ParkMiller, reporter: &mut R) -> IlsOutcome
    where
        R: TourReporter + ?Sized,
    {
        let run_start = Instant::now();
        let n = tour.len();
        let initial_cost = tour.cost;
        log::info!("Initial tour length = {}", initial_cost);

        let mut best = tour;
        let start = Instant::now();
        let mut local_search = self.local_search.improve(matrix, &mut best);
        let local_optimum_cost = best.cost;
        log::info!(
            "Tour length after {} = {}; {} moves; time = {:.3}s",
            self.local_search.name(),
            local_optimum_cost,
            local_search.moves,
            start.elapsed().as_secs_f64()
        );

        let mut current = best.clone();
        let mut improvements = 0;
        let mut history = Vec::new();

        for iteration in 0..self.config.iterations {
            current.order.clone_from(&best.order);
            for _ in 0..self.config.perturbation_strength {
                let a = gen.next(n);
                let b = gen.next(n);
                current.swap(a, b);
            }
            // transpositions invalidate the incremental cost
            current.recompute(matrix);

            let start = Instant::now();
            local_search += self.local_search.improve(matrix, &mut current);

            if current.cost < best.cost {
                std::mem::swap(&mut best, &mut current);
                improvements += 1;
                history.push((iteration, best.cost));
                log::debug!(
                    "iteration {}: accepted length {}; local search took {:.3}s",
                    iteration,
                    best.cost,
                    start.elapsed().as_secs_f64()
                );
                reporter.report(&Improvement {
                    iteration,
                    cost: best.cost,
                    tour: &best.order,
                });
            } else {
                log::trace!("iteration {}: rejected length {}", iteration, current.cost);
            }
        }

        log::debug!(
            "ILS finished: best = {}, {} improvements, {} 2-opt passes",
            best.cost,
            improvements,
            local_search.passes
        );

        IlsOutcome {
            best,
            initial_cost,
            local_optimum_cost,
            improvements,
            local_search,
            history,
            elapsed: run_start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::is_two_opt_optimal;
    use crate::instance::Instance;
    use crate::report::{ImprovementHistory, NullReporter};

    fn instance(n: usize, seed: u64) -> (Instance, ParkMiller) {
        let mut gen = ParkMiller::new(seed).unwrap();
        let instance = Instance::random(n, 1000, &mut gen).unwrap();
        (instance, gen)
    }

    #[test]
    fn test_zero_iterations_only_optimises_start() {
        let (instance, mut gen) = instance(40, 1);
        let mut history = ImprovementHistory::new();

        let outcome = IteratedLocalSearch::with_params(0, 3).run(&instance.matrix, &mut gen, &mut history);

        assert!(history.is_empty());
        assert_eq!(outcome.improvements, 0);
        assert_eq!(outcome.best.cost, outcome.local_optimum_cost);
        assert!(outcome.local_optimum_cost <= outcome.initial_cost);
        assert!(is_two_opt_optimal(&instance.matrix, &outcome.best));
    }

    #[test]
    fn test_zero_strength_never_accepts() {
        let (instance, mut gen) = instance(30, 8);
        let mut history = ImprovementHistory::new();

        let outcome = IteratedLocalSearch::with_params(25, 0).run(&instance.matrix, &mut gen, &mut history);

        assert!(history.is_empty());
        assert_eq!(outcome.best.cost, outcome.local_optimum_cost);
    }

    #[test]
    fn test_improvements_are_strict_and_reported() {
        let (instance, mut gen) = instance(60, 3);
        let mut history = ImprovementHistory::new();

        let outcome = IteratedLocalSearch::with_params(300, 3).run(&instance.matrix, &mut gen, &mut history);

        assert_eq!(history.len(), outcome.improvements);
        assert_eq!(outcome.history.len(), outcome.improvements);

        let mut previous = outcome.local_optimum_cost;
        for (event, &(iteration, cost)) in history.events.iter().zip(&outcome.history) {
            assert_eq!(event.iteration, iteration);
            assert_eq!(event.cost, cost);
            assert!(cost < previous);
            assert_eq!(instance.matrix.tour_length(&event.tour), cost);
            previous = cost;
        }
        assert_eq!(outcome.best.cost, previous);
        if let Some(last) = history.last() {
            assert_eq!(last.tour, outcome.best.order);
        }
    }

    #[test]
    fn test_best_is_valid_local_optimum() {
        let (instance, mut gen) = instance(50, 17);

        let outcome = IteratedLocalSearch::with_params(100, 4).run(&instance.matrix, &mut gen, &mut NullReporter);

        assert!(outcome.best.is_permutation());
        assert_eq!(outcome.best.cost, outcome.best.length(&instance.matrix));
        assert!(is_two_opt_optimal(&instance.matrix, &outcome.best));
        assert!(outcome.best.cost <= outcome.local_optimum_cost);
    }

    #[test]
    fn test_same_seed_same_run() {
        let ils = IteratedLocalSearch::with_params(80, 3);

        let (first_instance, mut a) = instance(35, 99);
        let first = ils.run(&first_instance.matrix, &mut a, &mut NullReporter);
        let (second_instance, mut b) = instance(35, 99);
        let second = ils.run(&second_instance.matrix, &mut b, &mut NullReporter);

        assert_eq!(first.best, second.best);
        assert_eq!(first.history, second.history);
        assert_eq!(a, b);
    }

    #[test]
    fn test_closure_reporter() {
        let (instance, mut gen) = instance(40, 5);
        let mut costs = Vec::new();

        let outcome = IteratedLocalSearch::with_params(150, 2).run(
            &instance.matrix,
            &mut gen,
            &mut |event: &Improvement<'_>| costs.push(event.cost),
        );

        assert_eq!(costs.len(), outcome.improvements);
        assert!(costs.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_run_from_recomputes_stale_cost() {
        let (instance, mut gen) = instance(30, 6);
        let stale = Tour { order: (0..30).collect(), cost: 1 };

        let outcome = IteratedLocalSearch::with_params(50, 3)
            .run_from(stale, &instance.matrix, &mut gen, &mut NullReporter)
            .unwrap();

        let identity_length = instance.matrix.tour_length(&(0..30).collect::<Vec<_>>());
        assert_eq!(outcome.initial_cost, identity_length);
        assert_eq!(outcome.best.cost, outcome.best.length(&instance.matrix));
        assert!(outcome.best.cost <= outcome.local_optimum_cost);
        assert!(is_two_opt_optimal(&instance.matrix, &outcome.best));
    }

    #[test]
    fn test_run_from_rejects_foreign_tour() {
        let (instance, mut gen) = instance(10, 6);
        let ils = IteratedLocalSearch::with_params(5, 2);

        let short = Tour { order: (0..9).collect(), cost: 0 };
        assert!(matches!(
            ils.run_from(short, &instance.matrix, &mut gen, &mut NullReporter),
            Err(SolverError::InvalidParameter { name: "tour", .. })
        ));

        let repeated = Tour { order: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 8], cost: 0 };
        assert!(ils
            .run_from(repeated, &instance.matrix, &mut gen, &mut NullReporter)
            .is_err());
    }

    #[test]
    fn test_single_vertex() {
        let (instance, mut gen) = instance(1, 2);

        let outcome = IteratedLocalSearch::with_params(5, 2).run(&instance.matrix, &mut gen, &mut NullReporter);

        assert_eq!(outcome.best.order, vec![0]);
        assert_eq!(outcome.improvements, 0);
    }

    #[test]
    fn test_to_solution() {
        let (instance, mut gen) = instance(12, 4);
        let config = IlsConfig { iterations: 10, perturbation_strength: 2 };

        let outcome = IteratedLocalSearch::new(config).run(&instance.matrix, &mut gen, &mut NullReporter);
        let solution = outcome.to_solution(&instance.name, 4, &config);

        assert_eq!(solution.dimension, 12);
        assert_eq!(solution.cost, outcome.best.cost);
        assert_eq!(solution.iterations, 10);
        assert_eq!(solution.tour, outcome.best.order);
    }
}
