use anyhow::Result;
use clap::Subcommand;

use crate::apps::AppRegistry;

#[derive(Subcommand, Debug)]
pub enum AppsCommand {
    #[command(about = "List known applications and whether they are monitored")]
    List,
    #[command(about = "Start reporting activity of the executable at the given path")]
    Monitor { path: String },
    #[command(about = "Stop reporting activity of the executable at the given path")]
    Unmonitor { path: String },
    #[command(about = "Print whether the executable at the given path is monitored")]
    Status { path: String },
    #[command(about = "Print whether any browser is monitored")]
    BrowserMonitored,
}

pub fn process_apps_command(registry: &AppRegistry, command: AppsCommand) -> Result<()> {
    match command {
        AppsCommand::List => {
            for app in registry.apps() {
                let state = if registry.is_excluded(&app) {
                    "excluded"
                } else if registry.is_monitored(&app.path) {
                    "monitored"
                } else {
                    "-"
                };
                println!("{:<10} {:<24} {}", state, app.name, app.path);
            }
        }
        AppsCommand::Monitor { path } => registry.set_monitored_path(&path, true)?,
        AppsCommand::Unmonitor { path } => registry.set_monitored_path(&path, false)?,
        AppsCommand::Status { path } => println!("{}", registry.is_monitored(&path)),
        AppsCommand::BrowserMonitored => println!("{}", registry.is_browser_monitored()),
    }
    Ok(())
}
