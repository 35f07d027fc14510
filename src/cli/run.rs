// src/cli/run.rs — `run`: benchmark every selected system over a dataset

use std::path::PathBuf;
use std::time::Duration;

use super::progress;
use super::RunArgs;
use crate::benchmark::dataset::load_problems;
use crate::benchmark::recorder::ResultRecorder;
use crate::benchmark::runner::{BenchEntry, BenchmarkRunner, RunSummary};
use crate::core::system::build_system;
use crate::evaluator::EvaluationPipeline;
use crate::infra::config::{Config, SystemConfig};
use crate::infra::errors::BenchError;
use crate::provider::resolver::ProviderSet;

/// Keep only the named systems, in config order. Empty `names` keeps all.
pub(crate) fn select_systems(
    config: &Config,
    names: &[String],
) -> Result<Vec<SystemConfig>, BenchError> {
    for name in names {
        if config.find_system(name).is_none() {
            return Err(BenchError::UnknownSystem {
                name: name.clone(),
                available: config
                    .systems
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }
    Ok(config
        .systems
        .iter()
        .filter(|s| names.is_empty() || names.iter().any(|n| n == s.name()))
        .cloned()
        .collect())
}

pub(crate) fn override_iterations(systems: &mut [SystemConfig], rounds: Option<u8>) {
    let Some(rounds) = rounds else { return };
    for system in systems {
        if let SystemConfig::AgentTeam { max_iterations, .. } = system {
            *max_iterations = rounds;
        }
    }
}

pub(crate) async fn resolve_providers(config: &Config, systems: &[SystemConfig]) -> ProviderSet {
    let refs: Vec<&str> = systems.iter().flat_map(|s| s.model_refs()).collect();
    ProviderSet::discover(&config.backends, &refs).await
}

pub async fn run_benchmark(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    let mut systems = select_systems(&config, &args.systems)?;
    override_iterations(&mut systems, args.max_iterations);
    if args.no_timing {
        config.evaluation.measure_exec_time = false;
    }

    let dataset = args
        .dataset
        .clone()
        .unwrap_or_else(|| PathBuf::from(args.benchmark.default_dataset()));
    let problems = match load_problems(&dataset, args.benchmark, args.limit) {
        Ok(p) => p,
        Err(BenchError::DatasetMissing { path }) => {
            eprintln!("File '{}' not found", path);
            println!("{} dataset not found; no results written.", args.benchmark);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    if problems.is_empty() {
        println!("{} contains no problems; no results written.", dataset.display());
        return Ok(());
    }

    let pipeline = EvaluationPipeline::from_config(&config.evaluation)?;
    let providers = resolve_providers(&config, &systems).await;
    let agent_progress = (!args.quiet).then(progress::terminal_progress);

    let entries: Vec<BenchEntry> = systems
        .iter()
        .map(|s| BenchEntry {
            system: build_system(
                s,
                &providers,
                &config.backends,
                config.evaluation.strip_scaffolding,
                agent_progress.clone(),
            ),
            delay_between_problems: Duration::from_secs(s.delay_between_problems_secs()),
        })
        .collect();

    let (mut recorder, path) = ResultRecorder::create(&args.output_dir, args.benchmark)?;
    println!(
        "Starting experiment: {} problems | {} systems",
        problems.len(),
        entries.len()
    );
    println!("Results will be saved to: {}", path.display());

    let runner = BenchmarkRunner::new(entries, pipeline).with_events(progress::run_events());
    let summary = runner.run(&problems, &mut recorder).await?;

    print_summary(&summary, &path);
    Ok(())
}

fn print_summary(summary: &RunSummary, path: &std::path::Path) {
    println!(
        "\nExperiment complete! {} rows for {} problems saved to {}",
        summary.rows,
        summary.problems,
        path.display()
    );
    for tally in &summary.systems {
        let avg_latency = if tally.attempted == 0 {
            0.0
        } else {
            tally.total_latency.as_secs_f64() / tally.attempted as f64
        };
        println!(
            "  {:<28} pass@1 {:>5.1}% ({}/{})  avg latency {:.2}s  tokens {}",
            tally.name,
            tally.pass_rate() * 100.0,
            tally.passed,
            tally.attempted,
            avg_latency,
            tally.total_tokens
        );
    }
}
