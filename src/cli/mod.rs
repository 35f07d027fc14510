// src/cli/mod.rs — CLI definition (clap derive)

pub mod backends;
pub mod progress;
pub mod run;
pub mod solve;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::benchmark::dataset::BenchmarkKind;

#[derive(Parser)]
#[command(
    name = "codegen-bench",
    about = "Benchmark LLM code-generation strategies on HumanEval/MBPP",
    version
)]
pub struct Cli {
    /// Config file path (default: ./codegen-bench.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every configured system over a dataset and write a CSV
    Run(RunArgs),
    /// Send one prompt through one system and print the code
    Solve {
        /// System name from the config (default: the first one)
        #[arg(short, long)]
        system: Option<String>,

        /// Override refinement rounds for agent teams
        #[arg(long)]
        max_iterations: Option<u8>,

        /// Problem statement
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },
    /// Check which backends the configured systems can reach
    Backends,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Benchmark format
    #[arg(short, long, value_enum, default_value = "humaneval")]
    pub benchmark: BenchmarkKind,

    /// JSONL dataset (default depends on the benchmark)
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Only the first N problems
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Only these systems (comma-separated names)
    #[arg(short, long, value_delimiter = ',')]
    pub systems: Vec<String>,

    /// Directory for result CSVs
    #[arg(short, long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Skip execution timing
    #[arg(long)]
    pub no_timing: bool,

    /// Override refinement rounds for agent teams
    #[arg(long)]
    pub max_iterations: Option<u8>,

    /// Suppress per-agent progress lines
    #[arg(short, long)]
    pub quiet: bool,
}
