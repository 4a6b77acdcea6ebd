use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::TablexConfig;

/// Initializes logging with a daily file in `~/.tablex/logs` plus compact
/// stderr output. Stdout stays free for command output and message replies.
/// Returns a guard that must be kept alive for the duration of the process.
pub fn init_logging(default_filter: &str) -> Result<WorkerGuard> {
    let logs_dir = TablexConfig::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "tablex");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// Map a `-v` count onto a filter string, starting from the configured level.
pub fn filter_for_verbosity(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_verbosity() {
        assert_eq!(filter_for_verbosity("info", 0), "info");
        assert_eq!(filter_for_verbosity("warn", 1), "debug");
        assert_eq!(filter_for_verbosity("info", 3), "trace");
    }
}
