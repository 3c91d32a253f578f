use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor `--log-level` say otherwise.
pub const DEFAULT_FILTER: &str = "info";

/// Picks the filter directive: the command line wins over the default.
pub fn filter_directive(log_level: Option<&str>) -> &str {
    match log_level {
        Some(level) if !level.trim().is_empty() => level,
        _ => DEFAULT_FILTER,
    }
}

/// Installs the global subscriber. Logs go to stderr; stdout is reserved for JSON.
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_logging(log_level: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()?;
    Ok(())
}
