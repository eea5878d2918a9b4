pub mod apps;
pub mod daemon_path;
pub mod process;
pub mod settings;

use std::{env, ffi::OsString, path::PathBuf, sync::Arc};

use anyhow::Result;
use apps::{process_apps_command, AppsCommand};
use clap::{Parser, Subcommand};
use daemon_path::to_daemon_path;
use process::{kill_previous_servers, restart_server};
use settings::{process_config_command, process_settings_command, ConfigCommand, SettingsCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    apps::enumeration::RunningProcessEnumerator,
    context::AgentContext,
    daemon::{start_daemon, DaemonConfig},
    heartbeat::sender::DEFAULT_CLI,
    settings::LogSink,
    utils::{
        dir::{absolute_path, create_application_default_path, default_user_config_path, program_path},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "deskbeat", version, long_about = None)]
#[command(about = "Reports activity of monitored desktop applications", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        value_parser = absolute_path,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_parser = absolute_path,
        help = "User config file. By default $HOME/.deskbeat.cfg"
    )]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(
            long,
            value_parser = program_path,
            help = "Reporting tool invoked for every heartbeat"
        )]
        cli: Option<PathBuf>,
    },
    #[command(about = "Run a daemon directly in current console. Used for debugging")]
    Serve {
        #[arg(
            long,
            value_parser = program_path,
            help = "Reporting tool invoked for every heartbeat"
        )]
        cli: Option<PathBuf>,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Read or change a setting")]
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    #[command(about = "Read or write raw config entries")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(about = "Choose which applications are monitored")]
    Apps {
        #[command(subcommand)]
        command: AppsCommand,
    },
}

fn daemon_args(
    dir: Option<PathBuf>,
    config: Option<PathBuf>,
    cli: Option<PathBuf>,
) -> Vec<OsString> {
    let mut daemon_args = vec![];
    if let Some(dir) = dir {
        daemon_args.extend(["--dir".into(), dir.into_os_string()]);
    }
    if let Some(config) = config {
        daemon_args.extend(["--config".into(), config.into_os_string()]);
    }
    if let Some(cli) = cli {
        daemon_args.extend(["--cli".into(), cli.into_os_string()]);
    }
    daemon_args
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.clone().map_or_else(create_application_default_path, Ok)?;
    let user_config = args.config.clone().map_or_else(default_user_config_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let log_switch = enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log, false)?;
    let ctx = AgentContext::open(
        &app_dir,
        user_config.clone(),
        Box::new(RunningProcessEnumerator),
        Some(Arc::new(log_switch.clone())),
    );
    log_switch.set_file_logging(ctx.settings.log_to_file());

    match args.commands {
        Commands::Init { cli } => {
            let daemon = to_daemon_path(env::current_exe()?);
            restart_server(&daemon, daemon_args(args.dir, args.config, cli))?;
            println!("Started {}", daemon.display());
            Ok(())
        }
        Commands::Stop {} => {
            let daemon = to_daemon_path(env::current_exe()?);
            let stopped = kill_previous_servers(&daemon)?;
            println!("Stopped {stopped} daemon(s)");
            Ok(())
        }
        Commands::Serve { cli } => {
            let config = DaemonConfig {
                app_dir,
                user_config,
                cli: cli.unwrap_or_else(|| DEFAULT_CLI.into()),
            };
            start_daemon(config, Some(Arc::new(log_switch))).await
        }
        Commands::Settings { command } => process_settings_command(&ctx.settings, command),
        Commands::Config { command } => process_config_command(&ctx.settings, command),
        Commands::Apps { command } => process_apps_command(&ctx.registry, command),
    }
}
