//! Tracing subscriber setup.
//!
//! The engine emits structured events through `tracing`; this module wires
//! the global subscriber. Output is either human-readable lines for local
//! development or newline-delimited JSON for log pipelines, selected by the
//! `log_format` config key. `RUST_LOG`, when set, overrides the configured
//! filter (directives like `"debug,acta_engine=trace"` work as usual).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    /// Parse the config-file spelling; anything unrecognized falls back to
    /// human output.
    pub fn from_config(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            _ => Self::Human,
        }
    }
}

/// Install the global subscriber. Panics if one is already set, so call it
/// once from the entry point, never from library code.
pub fn init_logging(format: LogFormat, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Human => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
    }
}
