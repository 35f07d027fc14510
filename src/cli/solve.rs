// src/cli/solve.rs — `solve`: one ad-hoc prompt through one system

use super::progress;
use super::run::{override_iterations, resolve_providers, select_systems};
use crate::core::system::build_system;
use crate::evaluator::quality;
use crate::infra::config::Config;

pub async fn run_solve(
    config: Config,
    system: Option<&str>,
    max_iterations: Option<u8>,
    prompt: &str,
) -> anyhow::Result<()> {
    let names: Vec<String> = system.map(|s| vec![s.to_string()]).unwrap_or_default();
    let mut systems = select_systems(&config, &names)?;
    systems.truncate(1);
    override_iterations(&mut systems, max_iterations);
    let Some(chosen) = systems.first() else {
        anyhow::bail!("No systems configured");
    };

    let providers = resolve_providers(&config, &systems).await;
    let solver = build_system(
        chosen,
        &providers,
        &config.backends,
        config.evaluation.strip_scaffolding,
        Some(progress::terminal_progress()),
    );

    eprintln!("[{}] solving...", solver.name());
    let output = solver.solve(prompt).await;

    if let Some(reason) = output.draft.failure_reason() {
        anyhow::bail!("{} failed: {}", solver.name(), reason);
    }
    println!("{}", output.draft.as_text());

    let metrics = quality::analyze(&output.draft.as_text());
    eprintln!(
        "[{}] latency={:.2}s tokens={} rounds={} approved={} | syntax_valid={} loc={} complexity={} functions={}",
        solver.name(),
        output.latency.as_secs_f64(),
        output.tokens,
        output.refinement_rounds,
        output.approved,
        metrics.syntax_valid,
        metrics.loc,
        metrics.cyclomatic_complexity,
        metrics.num_functions
    );
    Ok(())
}
