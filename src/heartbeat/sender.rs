use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::args::HeartbeatArgs;

pub const DEFAULT_CLI: &str = "wakatime-cli";

/// Delivers heartbeats to wherever they are recorded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeartbeatSender: Send + Sync {
    async fn send(&self, args: HeartbeatArgs) -> Result<()>;
}

/// Runs the reporting command line tool once per heartbeat.
pub struct CliHeartbeatSender {
    binary: PathBuf,
}

impl CliHeartbeatSender {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for CliHeartbeatSender {
    fn default() -> Self {
        Self::new(DEFAULT_CLI)
    }
}

#[async_trait]
impl HeartbeatSender for CliHeartbeatSender {
    #[instrument(skip(self, args), fields(entity = %args.entity))]
    async fn send(&self, args: HeartbeatArgs) -> Result<()> {
        let output = tokio::process::Command::new(&self.binary)
            .args(args.to_cli_args())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {:?}", self.binary))?;

        if !output.status.success() {
            bail!(
                "{:?} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        debug!("Sent heartbeat");
        Ok(())
    }
}
