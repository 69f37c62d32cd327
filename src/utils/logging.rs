//! Logging setup
//!
//! Console output stays human readable; the rolling file is JSON so a run can
//! be found again by its `run_id` field.

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct LoggingGuard {
    pub _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Transport crates that are chatty at info level
const QUIET_TARGETS: [&str; 3] = ["hyper_util=warn", "reqwest=warn", "alloy_transport_http=warn"];

pub fn setup_logging(log_dir: &str) -> Result<Arc<LoggingGuard>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::hourly(log_dir, "farm-apy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in QUIET_TARGETS {
        filter = filter.add_directive(directive.parse()?);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(true)
                .with_level(true)
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_current_span(false)
        )
        .with(filter)
        .init();

    Ok(Arc::new(LoggingGuard { _guard: guard }))
}
