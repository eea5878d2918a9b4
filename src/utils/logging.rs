use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::MakeWriterExt};

use crate::settings::LogSink;

pub const CLI_PREFIX: &str = "cli";
pub const DAEMON_PREFIX: &str = "daemon";

/// Turns writing into the rolling log file on and off while the process runs.
#[derive(Clone, Default)]
pub struct FileLogSwitch(Arc<AtomicBool>);

impl FileLogSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl LogSink for FileLogSwitch {
    fn set_file_logging(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

/// Installs the global subscriber. Files are written into `<application_data_path>/logs` only
/// while the returned switch is on.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
    log_to_file: bool,
) -> Result<FileLogSwitch> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(application_data_path.join("logs"))?;

    let switch = FileLogSwitch::new(log_to_file);
    let file_switch = switch.clone();
    let appender = appender.with_filter(move |_| file_switch.is_enabled());
    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .try_init()
        .map_err(|e| anyhow!("Failed to install the subscriber: {e}"))?;
    Ok(switch)
}

#[cfg(test)]
pub static TEST_LOGGING: std::sync::LazyLock<()> = std::sync::LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
