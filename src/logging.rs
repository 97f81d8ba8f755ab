use std::path::Path;

use tracing_appender::rolling::Rotation;

const LOG_PREFIX: &str = "writing-time";

/// Logs go to daily rolling files only; the dashboard owns the terminal.
pub fn enable_logging(log_dir: &Path, log_level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(log_dir)?;

    let level = log_level
        .map(str::to_string)
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
        )))
        .with_ansi(false)
        .with_writer(appender)
        .try_init()
        .map_err(|err| err.to_string())?;
    Ok(())
}
