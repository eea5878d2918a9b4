use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::utils::dir::{absolute_path, program_path};

#[derive(Parser, Debug)]
#[command(name = "deskbeat-daemon", version, about = "Reports activity of monitored applications")]
pub struct DaemonArgs {
    /// Run in the current process instead of detaching.
    #[arg(long)]
    pub force: bool,
    /// Application directory. By default $XDG_STATE_HOME/deskbeat or $HOME/.local/state/deskbeat
    #[arg(long, value_parser = absolute_path)]
    pub dir: Option<PathBuf>,
    /// User config file. By default $HOME/.deskbeat.cfg
    #[arg(long, value_parser = absolute_path)]
    pub config: Option<PathBuf>,
    /// Reporting tool invoked for every heartbeat.
    #[arg(long, value_parser = program_path)]
    pub cli: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
