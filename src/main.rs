// src/main.rs — codegen-bench entry point

use clap::Parser;

use codegen_bench::cli::{Cli, Commands};
use codegen_bench::infra::config::Config;
use codegen_bench::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // CODEGEN_BENCH_LOG / RUST_LOG override the level
    logger::init_logging(if cli.verbose { "debug" } else { "warn" });

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Run(args) => codegen_bench::cli::run::run_benchmark(config, args).await,
        Commands::Solve {
            system,
            max_iterations,
            prompt,
        } => {
            let prompt = prompt.join(" ");
            codegen_bench::cli::solve::run_solve(config, system.as_deref(), max_iterations, &prompt)
                .await
        }
        Commands::Backends => codegen_bench::cli::backends::show_backends(&config).await,
    }
}
