use anyhow::Result;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static LOGGING: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber for Verso binaries.
///
/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides `default_level` when it holds a valid filter. Calls after the
/// first are no-ops.
pub fn init_tracing(default_level: &str) -> Result<()> {
    if LOGGING.get().is_some() {
        return Ok(());
    }

    let directives = std::env::var("RUST_LOG").ok();
    let subscriber = Registry::default()
        .with(log_filter(directives.as_deref(), default_level))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    LOGGING.set(()).ok();

    Ok(())
}

fn log_filter(directives: Option<&str>, default_level: &str) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}
