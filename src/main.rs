//! ILS-TSP Solver - Command Line Interface
//!
//! Iterated Local Search with greedy 2-opt for the symmetric TSP.

use clap::{Args, Parser, Subcommand};
use ils_tsp::benchmark::{Benchmark, BenchmarkConfig};
use ils_tsp::heuristics::construction::{ConstructionHeuristic, RandomTour};
use ils_tsp::heuristics::ils::{IlsConfig, IteratedLocalSearch};
use ils_tsp::heuristics::local_search::{LocalSearch, TwoOptSearch};
use ils_tsp::instance::Instance;
use ils_tsp::report::{LogReporter, Tee};
use ils_tsp::rng::ParkMiller;
use ils_tsp::visualization::{extent, TurtleScript, Visualizer};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ils-tsp")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Iterated Local Search with greedy 2-opt for the symmetric TSP")]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG says otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance, asking for missing parameters on stdin
    Solve(SolveArgs),

    /// Run the full pipeline over a range of seeds
    Benchmark {
        /// Number of vertices per instance
        #[arg(short = 'n', long, default_value = "100")]
        vertices: usize,

        /// Number of ILS iterations (k)
        #[arg(short = 'k', long, default_value = "1000")]
        iterations: usize,

        /// Random transpositions per perturbation (l)
        #[arg(short = 'l', long, default_value = "3")]
        strength: usize,

        /// Coordinates are drawn from 0..max-coord
        #[arg(long, default_value = "1000")]
        max_coord: usize,

        /// Seeds to run, `A..B` (exclusive) or `A..=B`
        #[arg(long, default_value = "1..11", value_parser = parse_seed_range)]
        seeds: Range<u64>,

        /// Run seeds in parallel
        #[arg(long)]
        parallel: bool,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Analyze an instance
    Analyze {
        /// Path to a TSPLIB instance file
        #[arg(short, long, conflicts_with = "vertices")]
        instance: Option<PathBuf>,

        /// Number of vertices of a random instance
        #[arg(short = 'n', long)]
        vertices: Option<usize>,

        /// Generator seed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Coordinates are drawn from 0..max-coord
        #[arg(long, default_value = "1000")]
        max_coord: usize,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// Number of ILS iterations (k)
    #[arg(short = 'k', long)]
    iterations: Option<usize>,

    /// Random transpositions per perturbation (l)
    #[arg(short = 'l', long)]
    strength: Option<usize>,

    /// Number of vertices of the random instance
    #[arg(short = 'n', long, conflicts_with = "instance")]
    vertices: Option<usize>,

    /// Generator seed
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Coordinates are drawn from 0..max-coord
    #[arg(long, default_value = "1000")]
    max_coord: usize,

    /// Load a TSPLIB instance instead of generating one
    #[arg(short, long)]
    instance: Option<PathBuf>,

    /// Python turtle script replaying every improvement
    #[arg(long, default_value = "script.py")]
    script: PathBuf,

    /// Draw the best tour as SVG (or PNG, by extension)
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Output solution to JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Solve(args) => solve(args),

        Commands::Benchmark { vertices, iterations, strength, max_coord, seeds, parallel, output } => {
            let config = BenchmarkConfig {
                dimension: vertices,
                max_coord,
                ils: IlsConfig { iterations, perturbation_strength: strength },
                first_seed: seeds.start,
                runs: (seeds.end - seeds.start) as usize,
                parallel,
            };
            run_benchmark(config, &output)
        }

        Commands::Analyze { instance, vertices, seed, max_coord } => {
            analyze_instance(instance.as_deref(), vertices, seed, max_coord)
        }
    }
}

/// Print `text` and read one non-negative integer from stdin
fn prompt(text: &str) -> Result<usize> {
    print!("{}", text);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("failed to read from stdin")?;
    let value = line.trim();
    value
        .parse()
        .with_context(|| format!("expected a non-negative integer, got {:?}", value))
}

fn parse_seed_range(s: &str) -> std::result::Result<Range<u64>, String> {
    let (start, end, inclusive) = if let Some((a, b)) = s.split_once("..=") {
        (a, b, true)
    } else if let Some((a, b)) = s.split_once("..") {
        (a, b, false)
    } else {
        let seed: u64 = s.trim().parse().map_err(|e| format!("invalid seed {:?}: {}", s, e))?;
        let end = seed.checked_add(1).ok_or_else(|| "seed overflows".to_string())?;
        return Ok(seed..end);
    };

    let start: u64 = start.trim().parse().map_err(|e| format!("invalid range start {:?}: {}", start, e))?;
    let mut end: u64 = end.trim().parse().map_err(|e| format!("invalid range end {:?}: {}", end, e))?;
    if inclusive {
        end = end.checked_add(1).ok_or_else(|| "range end overflows".to_string())?;
    }
    if end <= start {
        return Err(format!("empty seed range {:?}", s));
    }
    Ok(start..end)
}

/// Turtle world size: the coordinate bound of a random instance, else the
/// largest coordinate of the file
fn world_size(instance: &Instance, coordinate_bound: Option<usize>) -> f64 {
    match coordinate_bound {
        Some(bound) => bound as f64,
        None => extent(&instance.points),
    }
}

fn solve(args: SolveArgs) -> Result<()> {
    let iterations = match args.iterations {
        Some(k) => k,
        None => prompt("Number of iterations of ILS (k): ")?,
    };
    let strength = match args.strength {
        Some(l) => l,
        None => prompt("Perturbation strength (l): ")?,
    };

    // One generator feeds the instance coordinates and then the search
    let mut gen = ParkMiller::new(args.seed).context("invalid seed")?;
    let (instance, coordinate_bound) = match &args.instance {
        Some(path) => {
            let instance =
                Instance::from_file(path).with_context(|| format!("failed to load instance {:?}", path))?;
            (instance, None)
        }
        None => {
            let n = match args.vertices {
                Some(n) => n,
                None => prompt("Number of vertices: ")?,
            };
            let instance =
                Instance::random(n, args.max_coord, &mut gen).context("failed to generate instance")?;
            (instance, Some(args.max_coord))
        }
    };
    log::info!("Instance {} with {} vertices", instance.name, instance.dimension());

    let file = File::create(&args.script)
        .with_context(|| format!("failed to create turtle script {:?}", args.script))?;
    let world = world_size(&instance, coordinate_bound);
    let turtle = TurtleScript::new(BufWriter::new(file), &instance.points, world);

    let config = IlsConfig { iterations, perturbation_strength: strength };
    let ils = IteratedLocalSearch::new(config);
    let mut reporter = Tee(turtle, LogReporter);
    let outcome = ils.run(&instance.matrix, &mut gen, &mut reporter);

    let Tee(turtle, _) = reporter;
    turtle
        .finish()
        .with_context(|| format!("failed to write turtle script {:?}", args.script))?;
    log::info!("Turtle script written to {:?}", args.script);

    let solution = outcome.to_solution(&instance.name, args.seed, &config);

    println!("\n========== Results ==========");
    print!("{}", solution);

    if let Some(out_path) = &args.output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(out_path, json).with_context(|| format!("failed to write {:?}", out_path))?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(svg_path) = &args.svg {
        let viz = Visualizer::new();
        let svg = viz.generate_svg(&instance, &outcome.best);
        let is_png = svg_path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            match viz.save_png(&svg, svg_path) {
                Ok(()) => println!("Visualization saved to {:?}", svg_path),
                Err(e) => {
                    // fallback: write SVG if PNG conversion failed
                    let fallback = svg_path.with_extension("svg");
                    viz.save_svg(&svg, &fallback)
                        .with_context(|| format!("failed to write {:?}", fallback))?;
                    println!("PNG conversion failed ({}). Saved SVG to {:?}", e, fallback);
                }
            }
        } else {
            viz.save_svg(&svg, svg_path)
                .with_context(|| format!("failed to write {:?}", svg_path))?;
            println!("Visualization saved to {:?}", svg_path);
        }
    }

    Ok(())
}

fn run_benchmark(config: BenchmarkConfig, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {:?}", output))?;

    let progress = ProgressBar::new(config.runs as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} runs ({eta})")?
            .progress_chars("##-"),
    );

    let mut benchmark = Benchmark::new(config);
    benchmark.run(&progress).context("benchmark failed")?;
    progress.finish_and_clear();

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path).context("failed to export results")?;
    println!("Results exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path).context("failed to export statistics")?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).context("failed to save report")?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(path: Option<&Path>, vertices: Option<usize>, seed: u64, max_coord: usize) -> Result<()> {
    let mut gen = ParkMiller::new(seed).context("invalid seed")?;
    let instance = match (path, vertices) {
        (Some(path), _) => {
            Instance::from_file(path).with_context(|| format!("failed to load instance {:?}", path))?
        }
        (None, Some(n)) => Instance::random(n, max_coord, &mut gen).context("failed to generate instance")?,
        (None, None) => bail!("either --instance or --vertices is required"),
    };

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let construction = RandomTour::new();
    let mut tour = construction.construct(&instance.matrix, &mut gen);
    let random_cost = tour.cost;

    let start = Instant::now();
    let two_opt = TwoOptSearch::new();
    let stats = two_opt.improve(&instance.matrix, &mut tour);
    let elapsed = start.elapsed().as_secs_f64();

    println!("Quick Solution Estimates:");
    println!("  {}: {}", construction.name(), random_cost);
    println!(
        "  {}: {} ({} moves, {} passes, {:.4}s)",
        two_opt.name(),
        tour.cost,
        stats.moves,
        stats.passes,
        elapsed
    );
    if random_cost > 0 {
        println!(
            "  2-opt gain: {:.2}%",
            (random_cost - tour.cost) as f64 / random_cost as f64 * 100.0
        );
    }

    Ok(())
}
