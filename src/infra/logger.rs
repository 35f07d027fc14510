// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Env var checked before `RUST_LOG`.
pub const LOG_ENV: &str = "CODEGEN_BENCH_LOG";

/// Install the global subscriber on stderr. An explicit filter in the
/// environment wins over `default_level`; HTTP internals stay at `warn`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| base_filter(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn base_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,rustls=warn"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_filter_directives() {
        let filter = base_filter("debug").to_string();
        assert!(filter.contains("debug"));
        assert!(filter.contains("hyper=warn"));
    }
}
