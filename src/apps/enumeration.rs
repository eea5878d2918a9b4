use anyhow::Result;
use sysinfo::System;
use tracing::debug;

use super::{
    catalog::{exec_name, find_by_exec_name},
    AppData,
};

/// Source of the applications available on this machine.
#[cfg_attr(test, mockall::automock)]
pub trait AppEnumerator: Send + Sync {
    fn installed_apps(&self) -> Result<Vec<AppData>>;
}

/// Approximates installed applications with the catalog applications that are currently
/// running. Platforms with a real application registry can provide their own [AppEnumerator].
pub struct RunningProcessEnumerator;

impl AppEnumerator for RunningProcessEnumerator {
    fn installed_apps(&self) -> Result<Vec<AppData>> {
        let system = System::new_all();
        let mut apps: Vec<AppData> = vec![];
        for process in system.processes().values() {
            let Some(path) = process.exe().and_then(|v| v.to_str()) else {
                continue;
            };
            let Some(known) = exec_name(path).and_then(|exec| find_by_exec_name(&exec)) else {
                continue;
            };
            if apps.iter().any(|app| app.path == path) {
                continue;
            }
            debug!("Found {} at {path}", known.id);
            apps.push(known.to_app_data(path));
        }
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}
