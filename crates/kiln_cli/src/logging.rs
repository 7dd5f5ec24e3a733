use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive, e.g. `kiln_core=debug`.
pub const LOG_ENV_VAR: &str = "KILN_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Installs the stderr subscriber. Stdout stays reserved for command output
/// so `--json` remains machine readable.
pub fn init() {
    let filter = build_filter(std::env::var(LOG_ENV_VAR).ok().as_deref());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn build_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
