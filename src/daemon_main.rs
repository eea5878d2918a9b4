use std::{env::args, sync::Arc};

use anyhow::Result;
use clap::Parser;
use deskbeat::{
    daemon::{args::DaemonArgs, start_daemon, DaemonConfig},
    heartbeat::sender::DEFAULT_CLI,
    settings::{LogSink, Settings},
    utils::{
        dir::{create_application_default_path, default_user_config_path, internal_config_path},
        logging::{enable_logging, DAEMON_PREFIX},
    },
};

fn main() -> Result<()> {
    run_service(args().collect::<Vec<_>>())
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = DaemonArgs::parse_from(&command_args);

    if !args.force {
        #[cfg(unix)]
        {
            use daemonize::Daemonize;

            let daemonize = Daemonize::new()
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                // stdin is always redirected to /dev/null by daemonize 0.5 (no builder method)
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent.inspect_err(|e| eprintln!("Failed to create daemon {e:?}"))?;
                    println!("Created daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(_) => (),
            }
        }
    }

    run(args)
}

fn run(args: DaemonArgs) -> Result<()> {
    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    let user_config = args.config.map_or_else(default_user_config_path, Ok)?;

    let log_to_file = Settings::new(&user_config, internal_config_path(&app_dir)).log_to_file();
    let log_switch = enable_logging(
        DAEMON_PREFIX,
        &app_dir,
        args.log,
        args.log_console,
        log_to_file,
    )?;
    let log_sink: Arc<dyn LogSink> = Arc::new(log_switch);

    let config = DaemonConfig {
        app_dir,
        user_config,
        cli: args.cli.unwrap_or_else(|| DEFAULT_CLI.into()),
    };
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(start_daemon(config, Some(log_sink)))
}
