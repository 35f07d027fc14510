// src/cli/backends.rs — `backends`: availability report

use super::run::resolve_providers;
use crate::infra::config::Config;

pub async fn show_backends(config: &Config) -> anyhow::Result<()> {
    let providers = resolve_providers(config, &config.systems).await;

    println!("Providers:");
    for status in providers.status() {
        match &status.unavailable {
            None => println!("  {:<10} ready", status.id),
            Some(reason) => println!("  {:<10} unavailable ({})", status.id, reason),
        }
    }

    println!("\nSystems:");
    for system in &config.systems {
        let missing: Vec<String> = system
            .model_refs()
            .into_iter()
            .filter(|r| !providers.backend(r, &config.backends).is_available())
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            println!("  {:<28} ready", system.name());
        } else {
            println!("  {:<28} blocked on {}", system.name(), missing.join(", "));
        }
    }
    Ok(())
}
