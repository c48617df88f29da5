use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use qvik::grid::GridMap;
use qvik::interpreter::{DEFAULT_MAX_STEPS, Interpreter, Outcome, RunConfig};
use qvik::logging;
use qvik::program::{Program, format_sequence};
use qvik::search::{SearchConfig, SearchResult, search};

#[derive(Parser)]
#[command(name = "qvik", about = "Brute-force search for grid robot programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate candidate programs and print the ones that reach the goal.
    Search {
        /// Random seed for the subroutine sampler (drawn from entropy if omitted).
        #[arg(long)]
        seed: Option<u64>,

        /// Random subroutine draws per permutation of the vocabulary.
        #[arg(long, default_value_t = 10)]
        trials: usize,

        /// Max steps per candidate.
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Worker threads (defaults to one per core).
        #[arg(long)]
        threads: Option<usize>,

        /// Print successes as a JSON array instead of CSV.
        #[arg(long)]
        json: bool,

        /// Suppress results, print throughput stats.
        #[arg(long)]
        benchmark: bool,

        #[command(flatten)]
        map: MapArgs,
    },
    /// Run one program and print the path it takes.
    Run {
        /// Comma-separated tags for main (forward, backward, left, right, f1, f2).
        #[arg(long, value_delimiter = ',', default_value = "f1")]
        main: Vec<String>,

        /// Comma-separated tags for subroutine 1.
        #[arg(long, value_delimiter = ',')]
        sub1: Vec<String>,

        /// Comma-separated tags for subroutine 2.
        #[arg(long, value_delimiter = ',')]
        sub2: Vec<String>,

        /// Max steps for the run.
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        #[command(flatten)]
        map: MapArgs,
    },
}

#[derive(Args)]
struct MapArgs {
    /// Load the map from a `.npy` array or an ASCII file instead of the bundled one.
    #[arg(long, conflicts_with = "open")]
    map: Option<PathBuf>,

    /// Use a map with no walls.
    #[arg(long)]
    open: bool,
}

impl MapArgs {
    fn load(&self) -> Result<GridMap> {
        if self.open {
            return Ok(GridMap::open());
        }
        match &self.map {
            Some(path) => {
                GridMap::load(path).with_context(|| format!("load map {}", path.display()))
            }
            None => GridMap::bundled().context("decode bundled map"),
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Search {
            seed,
            trials,
            max_steps,
            threads,
            json,
            benchmark,
            map,
        } => {
            let grid = map.load()?;
            let seed = seed.unwrap_or_else(rand::random);
            info!(seed, "starting search");
            let config = SearchConfig {
                trials_per_permutation: trials,
                max_steps,
                seed,
                threads,
                ..Default::default()
            };
            if benchmark {
                cmd_benchmark(&grid, &config)
            } else {
                cmd_search(&grid, &config, json)
            }
        }
        Command::Run {
            main,
            sub1,
            sub2,
            max_steps,
            map,
        } => {
            let program = Program::from_tags(main.as_slice(), sub1.as_slice(), sub2.as_slice())?;
            let grid = map.load()?;
            cmd_run(&program, &grid, max_steps);
            Ok(())
        }
    }
}

fn cmd_search(grid: &GridMap, config: &SearchConfig, json: bool) -> Result<()> {
    let SearchResult { successes, stats } = search(grid, config).context("build worker pool")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&successes)?);
    } else {
        println!("steps,main,sub1,sub2");
        for s in &successes {
            println!(
                "{},{},{},{}",
                s.steps,
                format_sequence(&s.main),
                format_sequence(&s.sub1),
                format_sequence(&s.sub2)
            );
        }
    }

    eprintln!(
        "seed {}: {} of {} candidates reached the goal ({} distinct), {} exhausted, {} over budget",
        config.seed,
        stats.successes,
        stats.candidates,
        stats.unique_successes,
        stats.exhausted,
        stats.budget_exceeded
    );
    if let Some(fewest) = stats.fewest_steps {
        eprintln!("fewest steps: {fewest}");
    }
    Ok(())
}

fn cmd_benchmark(grid: &GridMap, config: &SearchConfig) -> Result<()> {
    let start = std::time::Instant::now();
    let SearchResult { stats, .. } = search(grid, config).context("build worker pool")?;
    let elapsed = start.elapsed();

    let runs_per_sec = stats.candidates as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results:");
    eprintln!("  Candidates:    {}", stats.candidates);
    eprintln!("  Successes:     {}", stats.successes);
    eprintln!("  Success rate:  {:.4}", stats.success_rate());
    eprintln!("  Elapsed:       {elapsed:.2?}");
    eprintln!("  Runs/sec:      {runs_per_sec:.0}");
    Ok(())
}

fn cmd_run(program: &Program, grid: &GridMap, max_steps: usize) {
    let config = RunConfig {
        max_steps,
        ..Default::default()
    };
    let mut interp = Interpreter::new(program, grid, config).record_path();
    let outcome = interp.execute();

    println!("{program}");
    if let Some(path) = interp.path() {
        for (steps, cell) in path.iter().enumerate() {
            println!("{steps}: {cell}");
        }
    }
    match outcome {
        Outcome::Success { steps } => println!("reached goal after {steps} steps"),
        Outcome::BudgetExceeded => println!("max steps exceeded"),
        Outcome::Exhausted => println!("did not reach goal"),
    }
}
