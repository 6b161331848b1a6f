//! ILS-TSP Solver Library
//!
//! Iterated Local Search over greedy best-improvement 2-opt for the
//! symmetric Travelling Salesman Problem.
//!
//! # Features
//!
//! - Park–Miller minimal standard generator, fully reproducible from a seed
//! - Random Euclidean instances and TSPLIB `EUC_2D` files
//! - Random tour construction and best-improvement 2-opt
//! - Iterated Local Search with random-transposition perturbation
//! - Improvement reporting (logging, Python turtle script, closures)
//! - Benchmarking and SVG visualization tools
//!
//! # Example
//!
//! ```no_run
//! use ils_tsp::instance::Instance;
//! use ils_tsp::heuristics::ils::IteratedLocalSearch;
//! use ils_tsp::report::LogReporter;
//! use ils_tsp::rng::ParkMiller;
//!
//! let mut gen = ParkMiller::new(1).unwrap();
//! let instance = Instance::random(100, 1000, &mut gen).unwrap();
//!
//! let ils = IteratedLocalSearch::with_params(1000, 3);
//! let outcome = ils.run(&instance.matrix, &mut gen, &mut LogReporter);
//!
//! println!("Tour length: {}", outcome.best.cost);
//! ```

pub mod error;
pub mod rng;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod report;
pub mod benchmark;
pub mod visualization;

pub use error::{SolverError, SolverResult};
pub use instance::{CostMatrix, Instance};
pub use rng::ParkMiller;
pub use solution::{Solution, Tour};
