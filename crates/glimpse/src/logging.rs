//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Notes
///
/// - Log output goes to stderr (stdout is reserved for data output)
/// - The RUST_LOG environment variable overrides `level`
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging with configuration from Config.
///
/// `interactive` quiets info-level chatter so it doesn't tear through the
/// prompt; `--verbose` still wins.
pub fn init_from_config(
    config: &glimpse_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
    interactive: bool,
) {
    let level = resolve_level(config, verbose_override, interactive);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

fn resolve_level(config: &glimpse_core::Config, verbose: bool, interactive: bool) -> &str {
    if verbose {
        "debug"
    } else if interactive {
        "warn"
    } else {
        &config.logging.level
    }
}
