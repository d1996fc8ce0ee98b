use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging system
///
/// `RUST_LOG` overrides `level` when set. With `log_file` the events are
/// appended to that file in either format.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let file = log_file.map(open_log_file).transpose()?;

    let registry = tracing_subscriber::registry().with(filter);

    match (json_output, file) {
        (true, Some(file)) => registry
            .with(fmt::layer().json().with_writer(file))
            .try_init()?,
        (true, None) => registry.with(fmt::layer().json()).try_init()?,
        (false, Some(file)) => registry
            .with(fmt::layer().with_ansi(false).with_target(false).with_writer(file))
            .try_init()?,
        (false, None) => registry.with(fmt::layer().with_target(false)).try_init()?,
    }

    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Initialize logger from config
pub fn init_from_config(config: &crate::utils::config::LoggingConfig) -> Result<()> {
    let json = config.output == "json";
    let log_file = if !config.file_path.is_empty() {
        Some(Path::new(&config.file_path))
    } else {
        None
    };

    init_logger(&config.level, json, log_file)
}
