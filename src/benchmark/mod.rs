// src/benchmark/mod.rs — Datasets, result files and the benchmark loop

pub mod dataset;
pub mod recorder;
pub mod runner;
