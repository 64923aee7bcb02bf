//! CLI entry point for the water sort solver.
//!
//! Usage:
//!   water-sort-solver solve <puzzle.json> --algorithm <name> [options]
//!   water-sort-solver solve --stdin --algorithm blind [options]
//!   water-sort-solver compare <puzzle.json> [options]
//!   water-sort-solver generate --colors <n> --regime <regime> [--seed <n>]
//!   water-sort-solver replay <puzzle.json> <plan.json>
//!
//! Options:
//!   --seed <n>         Seed for the randomized solvers
//!   --config <file>    Solver configuration JSON (partial files allowed)
//!   --max-nodes <n>    Node cap for the exhaustive searches
//!
//! Reports are printed as JSON on stdout. Logs go to stderr and follow
//! `RUST_LOG` (default `warn`).

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use water_sort_solver::{
    generate_level, replay, solve_puzzle, Algorithm, BeliefStats, Move, Puzzle, PuzzleConfig,
    Regime, SolveError, SolverConfig, SolverResult,
};

#[derive(Parser)]
#[command(name = "water-sort-solver")]
#[command(about = "Search, metaheuristic and belief-state solvers for the water sort puzzle")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a puzzle with one algorithm
    Solve {
        #[command(flatten)]
        input: Input,

        /// Algorithm to run
        #[arg(short, long, value_enum, default_value = "bfs")]
        algorithm: Algorithm,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Run every algorithm suited to the puzzle's regime and rank the results
    Compare {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Deal a random level and print it as puzzle JSON
    Generate {
        /// Number of color tubes (1 to 8)
        #[arg(long, default_value = "4")]
        colors: usize,

        #[arg(long, value_enum, default_value = "classic")]
        regime: Regime,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Replay a move list against a puzzle and report whether it ends solved
    Replay {
        /// Path to puzzle JSON file
        #[arg(value_name = "PUZZLE")]
        puzzle: PathBuf,

        /// Path to a JSON move list, or a report printed by `solve`
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
    },
}

#[derive(Args)]
struct Input {
    /// Path to puzzle JSON file (use --stdin to read from stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read puzzle from stdin instead of file
    #[arg(long)]
    stdin: bool,
}

#[derive(Args)]
struct Tuning {
    /// Seed for the randomized solvers
    #[arg(long)]
    seed: Option<u64>,

    /// Solver configuration JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Node cap for the exhaustive searches
    #[arg(long)]
    max_nodes: Option<usize>,
}

/// Output format for one solver run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    algorithm: Algorithm,
    label: &'static str,
    solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
    moves: Vec<Move>,
    steps: usize,
    nodes: usize,
    time_elapsed_ms: f64,
    stuck: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tests_performed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    belief_stats: Option<BeliefStats>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorOutput {
    kind: &'static str,
    message: String,
}

impl From<&SolveError> for ErrorOutput {
    fn from(error: &SolveError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayOutput {
    solved: bool,
    applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    puzzle: Option<PuzzleConfig>,
}

/// A plan file: a bare move list or any report with a `moves` field
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanFile {
    Moves(Vec<Move>),
    Report { moves: Vec<Move> },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command; `Ok(false)` means it ran but did not succeed.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Solve {
            input,
            algorithm,
            tuning,
        } => {
            let puzzle = load_puzzle(&input)?;
            let config = build_config(&tuning)?;
            if algorithm.needs_full_observation() && puzzle.has_hidden_segments() {
                warn!(%algorithm, "solver reads hidden segments of a {:?} puzzle", puzzle.regime());
            }

            let output = run_algorithm(&puzzle, algorithm, &config);
            print_json(&output)?;
            Ok(output.solved)
        }
        Commands::Compare { input, tuning } => {
            let puzzle = load_puzzle(&input)?;
            let config = build_config(&tuning)?;

            let mut outputs: Vec<SolveOutput> = Algorithm::applicable(puzzle.regime())
                .into_iter()
                .map(|algorithm| run_algorithm(&puzzle, algorithm, &config))
                .collect();
            outputs.sort_by_key(|o| (!o.solved, o.steps));

            print_json(&outputs)?;
            Ok(outputs.iter().any(|o| o.solved))
        }
        Commands::Generate {
            colors,
            regime,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let puzzle = generate_level(colors, regime, &mut rng);
            print_json(&puzzle.to_config())?;
            Ok(true)
        }
        Commands::Replay { puzzle, plan } => {
            let puzzle = parse_puzzle(&read_file(&puzzle)?)?;
            let moves = match serde_json::from_str::<PlanFile>(&read_file(&plan)?)
                .context("Failed to parse plan JSON")?
            {
                PlanFile::Moves(moves) | PlanFile::Report { moves } => moves,
            };

            let output = match replay(&puzzle, &moves) {
                Ok(report) => ReplayOutput {
                    solved: report.solved,
                    applied: report.applied,
                    error: None,
                    puzzle: Some(report.puzzle.to_config()),
                },
                Err(e) => ReplayOutput {
                    solved: false,
                    applied: match e {
                        SolveError::Replay { step, .. } => step,
                        _ => 0,
                    },
                    error: Some(ErrorOutput::from(&e)),
                    puzzle: None,
                },
            };
            print_json(&output)?;
            Ok(output.solved)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

fn load_puzzle(input: &Input) -> Result<Puzzle> {
    let json = if input.stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else if let Some(path) = &input.file {
        read_file(path)?
    } else {
        bail!("Must provide either a file path or --stdin");
    };
    parse_puzzle(&json)
}

fn parse_puzzle(json: &str) -> Result<Puzzle> {
    let config: PuzzleConfig = serde_json::from_str(json).context("Failed to parse puzzle JSON")?;
    Ok(Puzzle::from_config(&config)?)
}

/// Configuration file first, then command-line overrides.
fn build_config(tuning: &Tuning) -> Result<SolverConfig> {
    let mut config = match &tuning.config {
        Some(path) => SolverConfig::from_json(&read_file(path)?)
            .with_context(|| format!("Failed to parse solver config {:?}", path))?,
        None => SolverConfig::default(),
    };
    if let Some(seed) = tuning.seed {
        config.seed = Some(seed);
    }
    if let Some(max_nodes) = tuning.max_nodes {
        config.max_nodes = max_nodes;
    }
    Ok(config)
}

/// Solve and report, timing failed runs as well as successful ones.
fn run_algorithm(puzzle: &Puzzle, algorithm: Algorithm, config: &SolverConfig) -> SolveOutput {
    let started = Instant::now();
    let result = solve_puzzle(puzzle, algorithm, config);
    format_result(algorithm, &result, started.elapsed())
}

fn format_result(
    algorithm: Algorithm,
    result: &Result<SolverResult, SolveError>,
    elapsed: Duration,
) -> SolveOutput {
    match result {
        Ok(r) => SolveOutput {
            algorithm,
            label: algorithm.label(),
            solved: !r.stuck,
            error: None,
            moves: r.moves.clone(),
            steps: r.steps,
            nodes: r.nodes,
            time_elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
            stuck: r.stuck,
            tests_performed: r.tests_performed,
            belief_stats: r.belief_stats.clone(),
        },
        Err(e) => SolveOutput {
            algorithm,
            label: algorithm.label(),
            solved: false,
            error: Some(ErrorOutput::from(e)),
            moves: Vec::new(),
            steps: 0,
            nodes: match e {
                SolveError::Exhausted { nodes } | SolveError::BudgetExhausted { nodes } => *nodes,
                _ => 0,
            },
            time_elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            stuck: false,
            tests_performed: match e {
                SolveError::BeliefContradiction { tests } => Some(*tests),
                _ => None,
            },
            belief_stats: None,
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
