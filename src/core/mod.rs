// src/core/mod.rs — Agents, refinement loop and systems under comparison

pub mod agents;
pub mod extract;
pub mod orchestrator;
pub mod prompts;
pub mod system;
pub mod types;
