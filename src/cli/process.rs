use std::{ffi::OsString, path::Path, process::Stdio};

use anyhow::{Context, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::{debug, info};

/// Stops every other process started from the executable at `name`. Returns how many were
/// stopped.
pub fn kill_previous_servers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow::anyhow!("Unknown current pid: {e}"))?;
    let mut stopped = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            debug!("Stopping {pid}");
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            stopped += 1;
        }
    }
    Ok(stopped)
}

/// Stops running daemons and starts a new one from `daemon` in its own process group.
pub fn restart_server(daemon: &Path, args: Vec<OsString>) -> Result<()> {
    let stopped = kill_previous_servers(daemon)?;
    if stopped > 0 {
        info!("Stopped {stopped} running daemon(s)");
    }

    let mut command = std::process::Command::new(daemon);
    command.arg("--force").args(args);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[allow(clippy::zombie_processes)]
    let child = command
        .spawn()
        .with_context(|| format!("Failed to start {daemon:?}"))?;
    info!("Started daemon {}", child.id());
    Ok(())
}
