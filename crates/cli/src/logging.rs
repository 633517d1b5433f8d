//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::args::LogFormat;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "bulkcheck=info,warn";

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the report.
pub fn init(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
    }
}
