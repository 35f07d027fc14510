// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::prompts::PromptStyle;
use crate::core::types::OnAgentFailure;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "codegen-bench.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub backends: BackendsConfig,

    /// Systems under comparison, evaluated in declaration order.
    #[serde(default = "default_systems")]
    pub systems: Vec<SystemConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            evaluation: EvaluationConfig::default(),
            backends: BackendsConfig::default(),
            systems: default_systems(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Python interpreter; resolved from PATH (`python3`, then `python`) when unset.
    pub python: Option<String>,
    pub check_timeout_secs: u64,
    pub timing_verify_timeout_secs: u64,
    pub timing_run_timeout_secs: u64,
    pub measure_exec_time: bool,
    /// Drop top-level print/assert scaffolding from extracted code.
    pub strip_scaffolding: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            python: None,
            check_timeout_secs: 5,
            timing_verify_timeout_secs: 20,
            timing_run_timeout_secs: 120,
            measure_exec_time: true,
            strip_scaffolding: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Overrides `OLLAMA_HOST`; defaults to http://localhost:11434.
    pub ollama_url: Option<String>,
    /// Base URL for the `compat/` provider (any OpenAI-compatible endpoint).
    pub compat_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            ollama_url: None,
            compat_base_url: None,
            temperature: 0.1,
            max_tokens: 2048,
            request_timeout_secs: 300,
        }
    }
}

/// One strategy under comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemConfig {
    Baseline {
        name: String,
        /// `provider/model`
        model: String,
        #[serde(default)]
        prompt: PromptStyle,
        #[serde(default)]
        delay_between_problems_secs: u64,
    },
    AgentTeam {
        name: String,
        generator: String,
        reviewer: String,
        refiner: String,
        #[serde(default = "default_team_iterations")]
        max_iterations: u8,
        #[serde(default)]
        on_failure: OnAgentFailure,
        #[serde(default)]
        delay_between_problems_secs: u64,
    },
}

impl SystemConfig {
    pub fn name(&self) -> &str {
        match self {
            SystemConfig::Baseline { name, .. } | SystemConfig::AgentTeam { name, .. } => name,
        }
    }

    pub fn delay_between_problems_secs(&self) -> u64 {
        match self {
            SystemConfig::Baseline {
                delay_between_problems_secs,
                ..
            }
            | SystemConfig::AgentTeam {
                delay_between_problems_secs,
                ..
            } => *delay_between_problems_secs,
        }
    }

    /// Every `provider/model` reference this system needs.
    pub fn model_refs(&self) -> Vec<&str> {
        match self {
            SystemConfig::Baseline { model, .. } => vec![model.as_str()],
            SystemConfig::AgentTeam {
                generator,
                reviewer,
                refiner,
                ..
            } => vec![generator.as_str(), reviewer.as_str(), refiner.as_str()],
        }
    }
}

fn default_team_iterations() -> u8 {
    1
}

fn default_systems() -> Vec<SystemConfig> {
    vec![
        SystemConfig::Baseline {
            name: "Baseline_Llama31_8B".into(),
            model: "ollama/llama3.1:8b".into(),
            prompt: PromptStyle::Optimized,
            delay_between_problems_secs: 0,
        },
        SystemConfig::AgentTeam {
            name: "Agentic_Team".into(),
            generator: "ollama/codellama:7b-instruct".into(),
            reviewer: "ollama/deepseek-coder:6.7b-instruct".into(),
            refiner: "ollama/llama3:8b".into(),
            max_iterations: default_team_iterations(),
            on_failure: OnAgentFailure::default(),
            delay_between_problems_secs: 0,
        },
    ]
}

impl Config {
    /// Load `codegen-bench.toml` from the working directory, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for system in &self.systems {
            if !seen.insert(system.name()) {
                anyhow::bail!("duplicate system name '{}'", system.name());
            }
        }
        if self.evaluation.check_timeout_secs == 0 {
            anyhow::bail!("evaluation.check_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn find_system(&self, name: &str) -> Option<&SystemConfig> {
        self.systems.iter().find(|s| s.name() == name)
    }
}
