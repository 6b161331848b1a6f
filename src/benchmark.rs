//! Benchmarking module.
//!
//! Runs the full pipeline (random instance, then ILS) once per seed,
//! collects the outcomes, and summarises them. Every run owns its own
//! generator, so runs are independent and may execute in parallel.

use std::fs::File;
use std::path::Path;

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{SolverError, SolverResult};
use crate::heuristics::ils::{IlsConfig, IteratedLocalSearch};
use crate::instance::Instance;
use crate::report::NullReporter;
use crate::rng::ParkMiller;

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub seed: u64,
    pub dimension: usize,
    pub iterations: usize,
    pub perturbation_strength: usize,
    pub initial_cost: i64,
    pub local_optimum_cost: i64,
    pub best_cost: i64,
    pub improvements: usize,
    pub local_search_passes: usize,
    /// Computation time in seconds
    pub time: f64,
}

/// Aggregated statistics over all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStatistics {
    pub runs: usize,
    pub best_cost: i64,
    pub worst_cost: i64,
    pub mean_cost: f64,
    pub std_cost: f64,
    /// Mean relative gain of ILS over the first local optimum, in percent
    pub mean_ils_gain: f64,
    pub mean_improvements: f64,
    pub mean_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Vertices per instance
    pub dimension: usize,
    /// Coordinates are drawn from `0..max_coord`
    pub max_coord: usize,
    /// ILS parameters shared by every run
    pub ils: IlsConfig,
    /// First seed
    pub first_seed: u64,
    /// Number of runs, seeded `first_seed..first_seed + runs`
    pub runs: usize,
    /// Run seeds in parallel
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            dimension: 100,
            max_coord: 1000,
            ils: IlsConfig::default(),
            first_seed: 1,
            runs: 5,
            parallel: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark { config, results: Vec::new() }
    }

    /// Run the pipeline once for a seed
    pub fn run_seed(&self, seed: u64) -> SolverResult<RunResult> {
        let mut gen = ParkMiller::new(seed)?;
        let instance = Instance::random(self.config.dimension, self.config.max_coord, &mut gen)?;
        let ils = IteratedLocalSearch::new(self.config.ils);
        let outcome = ils.run(&instance.matrix, &mut gen, &mut NullReporter);

        Ok(RunResult {
            seed,
            dimension: self.config.dimension,
            iterations: self.config.ils.iterations,
            perturbation_strength: self.config.ils.perturbation_strength,
            initial_cost: outcome.initial_cost,
            local_optimum_cost: outcome.local_optimum_cost,
            best_cost: outcome.best.cost,
            improvements: outcome.improvements,
            local_search_passes: outcome.local_search.passes,
            time: outcome.elapsed.as_secs_f64(),
        })
    }

    /// Run every configured seed, ticking `progress` once per finished run
    pub fn run(&mut self, progress: &ProgressBar) -> SolverResult<()> {
        if self.config.runs == 0 {
            return Err(SolverError::parameter("runs", "at least one run is required"));
        }
        let seeds: Vec<u64> = (self.config.first_seed..self.config.first_seed + self.config.runs as u64).collect();
        log::info!(
            "Benchmarking {} runs on n = {} (k = {}, l = {})",
            seeds.len(),
            self.config.dimension,
            self.config.ils.iterations,
            self.config.ils.perturbation_strength
        );

        let run_one = |&seed: &u64| {
            let result = self.run_seed(seed);
            progress.inc(1);
            result
        };
        let results: Vec<RunResult> = if self.config.parallel {
            seeds.par_iter().map(run_one).collect::<SolverResult<_>>()?
        } else {
            seeds.iter().map(run_one).collect::<SolverResult<_>>()?
        };

        self.results.extend(results);
        Ok(())
    }

    /// Compute statistics over the recorded runs
    pub fn compute_statistics(&self) -> Option<BenchmarkStatistics> {
        if self.results.is_empty() {
            return None;
        }

        let costs: Vec<f64> = self.results.iter().map(|r| r.best_cost as f64).collect();
        let times: Vec<f64> = self.results.iter().map(|r| r.time).collect();
        let gains: Vec<f64> = self
            .results
            .iter()
            .map(|r| {
                if r.local_optimum_cost == 0 {
                    0.0
                } else {
                    (r.local_optimum_cost - r.best_cost) as f64 / r.local_optimum_cost as f64 * 100.0
                }
            })
            .collect();
        let improvements: Vec<f64> = self.results.iter().map(|r| r.improvements as f64).collect();

        let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

        Some(BenchmarkStatistics {
            runs: self.results.len(),
            best_cost: Iterator::min(self.results.iter().map(|r| r.best_cost)).unwrap_or(0),
            worst_cost: Iterator::max(self.results.iter().map(|r| r.best_cost)).unwrap_or(0),
            mean_cost: costs.iter().mean(),
            std_cost,
            mean_ils_gain: gains.iter().mean(),
            mean_improvements: improvements.iter().mean(),
            mean_time: times.iter().mean(),
            total_time: Iterator::sum(times.iter()),
        })
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        if let Some(stats) = self.compute_statistics() {
            writer.serialize(stats)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        ILS-TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        report.push_str(&format!(
            "n = {}, k = {}, l = {}, coordinates < {}\n\n",
            self.config.dimension,
            self.config.ils.iterations,
            self.config.ils.perturbation_strength,
            self.config.max_coord
        ));

        report.push_str(&format!(
            "{:>8} {:>10} {:>10} {:>10} {:>8} {:>10}\n",
            "Seed", "Initial", "2-Opt", "ILS", "Impr.", "Time"
        ));
        report.push_str("-".repeat(61).as_str());
        report.push('\n');
        for r in &self.results {
            report.push_str(&format!(
                "{:>8} {:>10} {:>10} {:>10} {:>8} {:>10.4}\n",
                r.seed, r.initial_cost, r.local_optimum_cost, r.best_cost, r.improvements, r.time
            ));
        }
        report.push_str("-".repeat(61).as_str());
        report.push('\n');

        if let Some(stats) = self.compute_statistics() {
            report.push_str(&format!("Runs: {}\n", stats.runs));
            report.push_str(&format!("Best: {}  Worst: {}\n", stats.best_cost, stats.worst_cost));
            report.push_str(&format!("Mean: {:.2} (std {:.2})\n", stats.mean_cost, stats.std_cost));
            report.push_str(&format!("Mean ILS gain over 2-opt: {:.2}%\n", stats.mean_ils_gain));
            report.push_str(&format!("Mean improvements: {:.2}\n", stats.mean_improvements));
            report.push_str(&format!(
                "Mean time: {:.4}s (total {:.4}s)\n",
                stats.mean_time, stats.total_time
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}
