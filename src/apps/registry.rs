use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{catalog, enumeration::AppEnumerator, AppData};
use crate::{settings::Settings, window_api::WindowInfo};

pub const EXTRA_APPS_FILE: &str = "extra-apps.json";
pub const APPS_CACHE_FILE: &str = "apps-cache.json";

const CACHE_LIFETIME_HOURS: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedApps {
    stored_at: DateTime<Utc>,
    apps: Vec<AppData>,
}

impl CachedApps {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.stored_at < TimeDelta::hours(CACHE_LIFETIME_HOURS)
    }
}

/// Keeps track of the applications available for monitoring and of the user's choices.
pub struct AppRegistry {
    settings: Arc<Settings>,
    enumerator: Box<dyn AppEnumerator>,
    extra_apps_path: PathBuf,
    cache_path: PathBuf,
    installed: Mutex<Option<CachedApps>>,
}

impl AppRegistry {
    /// `dir` holds the extra applications and the enumeration cache.
    pub fn new(settings: Arc<Settings>, enumerator: Box<dyn AppEnumerator>, dir: &Path) -> Self {
        Self {
            settings,
            enumerator,
            extra_apps_path: dir.join(EXTRA_APPS_FILE),
            cache_path: dir.join(APPS_CACHE_FILE),
            installed: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn read_cache_file(&self) -> Option<CachedApps> {
        let contents = fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Ignoring malformed {:?}: {e}", self.cache_path);
                None
            }
        }
    }

    fn write_cache_file(&self, cache: &CachedApps) -> Result<()> {
        write_json(&self.cache_path, cache)
    }

    /// Applications reported by the enumerator. Results are reused for an hour, and a stale
    /// result is preferred over nothing when enumeration fails.
    pub fn installed_apps(&self) -> Vec<AppData> {
        let now = Utc::now();
        let mut installed = self
            .installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if installed.is_none() {
            *installed = self.read_cache_file();
        }
        if let Some(cache) = installed.as_ref().filter(|v| v.is_fresh(now)) {
            return cache.apps.clone();
        }

        match self.enumerator.installed_apps() {
            Ok(apps) if !apps.is_empty() => {
                let cache = CachedApps {
                    stored_at: now,
                    apps,
                };
                if let Err(e) = self.write_cache_file(&cache) {
                    warn!("Failed to store application cache: {e:?}");
                }
                let apps = cache.apps.clone();
                *installed = Some(cache);
                apps
            }
            Ok(_) => {
                debug!("Enumeration found no applications");
                installed.as_ref().map(|v| v.apps.clone()).unwrap_or_default()
            }
            Err(e) => {
                warn!("Failed to enumerate applications: {e:?}");
                installed.as_ref().map(|v| v.apps.clone()).unwrap_or_default()
            }
        }
    }

    /// Applications the user added by hand or that were monitored while they were installed.
    pub fn extra_apps(&self) -> Vec<AppData> {
        let contents = match fs::read_to_string(&self.extra_apps_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return vec![],
            Err(e) => {
                warn!("Failed to read {:?}: {e}", self.extra_apps_path);
                return vec![];
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed {:?}: {e}", self.extra_apps_path);
            vec![]
        })
    }

    fn save_extra_apps(&self, apps: &[AppData]) -> Result<()> {
        write_json(&self.extra_apps_path, &apps)
    }

    /// Installed applications followed by extra applications, without repeating a path.
    pub fn apps(&self) -> Vec<AppData> {
        let mut apps = self.installed_apps();
        for extra in self.extra_apps() {
            if !apps.iter().any(|app| app.path == extra.path) {
                apps.push(extra);
            }
        }
        apps
    }

    pub fn find(&self, path: &str) -> Option<AppData> {
        self.apps().into_iter().find(|app| app.path == path)
    }

    /// Finds the application that owns the window. Applications that were never enumerated are
    /// still recognized when the catalog knows their executable.
    pub fn resolve(&self, window: &WindowInfo) -> Option<AppData> {
        self.find(&window.process_path).or_else(|| {
            let exec = catalog::exec_name(&window.process_path)?;
            catalog::find_by_exec_name(&exec).map(|known| known.to_app_data(&window.process_path))
        })
    }

    pub fn is_excluded(&self, app: &AppData) -> bool {
        catalog::is_excluded(app)
    }

    pub fn is_monitored(&self, path: &str) -> bool {
        let app = self.find(path).unwrap_or_else(|| {
            let name = catalog::exec_name(path).unwrap_or_default();
            AppData::from_path(path, &name)
        });
        if self.is_excluded(&app) {
            return false;
        }
        self.settings.monitored_flag(path)
    }

    pub fn set_monitored(&self, app: &AppData, monitor: bool) -> Result<()> {
        if self.is_excluded(app) {
            debug!("Refusing to change monitoring of excluded {}", app.path);
            return Ok(());
        }

        let mut extra = self.extra_apps();
        let known = extra.iter().any(|v| v.path == app.path);
        if monitor && !known {
            extra.push(app.clone());
            self.save_extra_apps(&extra)?;
        } else if !monitor && known {
            extra.retain(|v| v.path != app.path);
            self.save_extra_apps(&extra)?;
        }

        self.settings.set_monitored_flag(&app.path, monitor)?;
        info!("{} is monitored: {monitor}", app.path);
        Ok(())
    }

    /// Monitors the executable at `path`, whether or not it was ever enumerated.
    pub fn set_monitored_path(&self, path: &str, monitor: bool) -> Result<()> {
        let app = self.find(path).unwrap_or_else(|| {
            let name = Path::new(path)
                .file_stem()
                .and_then(|v| v.to_str())
                .unwrap_or(path);
            AppData::from_path(path, name)
        });
        self.set_monitored(&app, monitor)
    }

    pub fn is_browser_monitored(&self) -> bool {
        self.apps()
            .iter()
            .filter(|app| app.is_browser)
            .any(|app| self.is_monitored(&app.path))
    }

    /// Enables the applications that are monitored out of the box. Only happens once.
    pub fn initialize_defaults(&self) -> Result<()> {
        if self.settings.has_launched_before() {
            return Ok(());
        }
        for app in self.apps().iter().filter(|app| app.is_default_enabled) {
            self.set_monitored(app, true)?;
        }
        self.settings.set_has_launched_before(true)?;
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {path:?}"))
}
