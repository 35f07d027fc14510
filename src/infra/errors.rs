// src/infra/errors.rs — Error types for codegen-bench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    // Backend errors
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Backend '{provider}' unavailable: {reason}")]
    BackendUnavailable { provider: String, reason: String },

    // Dataset errors
    #[error("Dataset file '{path}' not found")]
    DatasetMissing { path: String },

    #[error("Dataset line {line}: {message}")]
    Dataset { line: usize, message: String },

    // User errors
    #[error("Unknown system '{name}'. Available: {available}")]
    UnknownSystem { name: String, available: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the failure might go away on its own. Recorded for diagnostics
    /// only; the pipeline never retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BenchError::Provider {
                retriable: true,
                ..
            } | BenchError::RateLimited { .. }
        )
    }
}
