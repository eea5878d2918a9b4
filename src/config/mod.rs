//! Section-keyed text configuration files.
//!
//! [ConfigFile] keeps no state in memory: every [ConfigFile::get] reads the whole file and every
//! [ConfigFile::set] rewrites it through [document::rewrite]. Access is serialized across
//! processes with an advisory lock on a sibling `.lock` file, so the daemon and the cli can both
//! touch the same document.

pub mod document;

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use thiserror::Error;
use tracing::{debug, warn};

const TRUE_VALUE: &str = "True";
const FALSE_VALUE: &str = "False";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed writing config file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed locking config file {path:?}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Held for the duration of a single read or read-modify-write.
struct ConfigLock {
    file: File,
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release config lock {e:?}");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|v| v.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn lock(&self, mode: LockMode) -> Result<ConfigLock, ConfigError> {
        let lock_path = self.lock_path();
        let to_error = |source| ConfigError::Lock {
            path: lock_path.clone(),
            source,
        };
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(to_error)?;
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        }
        .map_err(to_error)?;
        Ok(ConfigLock { file })
    }

    /// Reads `key` from `section`. Any failure to read the file is treated as an absent value.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let _lock = self
            .lock(LockMode::Shared)
            .inspect_err(|e| warn!("Reading config without a lock: {e}"))
            .ok();
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    debug!("Config file {:?} doesn't exist yet", self.path);
                } else {
                    warn!("Failed reading config file {:?}: {e}", self.path);
                }
                return None;
            }
        };
        document::lookup(&contents, section, key)
    }

    /// Stores `value` under `section`/`key`, creating the file or the section when missing.
    pub fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let updated = document::rewrite(contents.as_deref(), section, key, value);
        if contents.as_deref() == Some(updated.as_str()) {
            return Ok(());
        }

        debug!("Writing [{section}] {key} to {:?}", self.path);
        fs::write(&self.path, updated).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// `None` when the value is absent or isn't one of `True`/`False`.
    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        match self.get(section, key)?.as_str() {
            TRUE_VALUE => Some(true),
            FALSE_VALUE => Some(false),
            _ => None,
        }
    }

    pub fn set_bool(&self, section: &str, key: &str, value: bool) -> Result<(), ConfigError> {
        self.set(section, key, if value { TRUE_VALUE } else { FALSE_VALUE })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{ConfigError, ConfigFile};

    #[test]
    fn test_config_round_trip_in_new_file() -> Result<()> {
        let dir = tempdir()?;
        let config = ConfigFile::new(dir.path().join("test.cfg"));

        assert_eq!(config.get("settings", "api_key"), None);

        config.set("settings", "api_key", "waka_123=abc\nsecond line")?;
        assert_eq!(
            config.get("settings", "api_key").as_deref(),
            Some("waka_123=abc\nsecond line")
        );
        assert_eq!(
            fs::read_to_string(config.path())?,
            "[settings]\napi_key = waka_123=abc\\nsecond line"
        );
        Ok(())
    }

    #[test]
    fn test_config_keeps_unrelated_sections() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.cfg");
        fs::write(&path, "[git]\nsubmodules = false\n\n[settings]\ndebug = true\n")?;
        let config = ConfigFile::new(&path);

        config.set("properties", "filter_type", "allowlist")?;

        assert_eq!(
            fs::read_to_string(&path)?,
            "[git]\nsubmodules = false\n\n[settings]\ndebug = true\n[properties]\nfilter_type = allowlist\n"
        );
        assert_eq!(config.get("git", "submodules").as_deref(), Some("false"));
        Ok(())
    }

    #[test]
    fn test_config_duplicate_key_only_first_changes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.cfg");
        fs::write(&path, "[s]\nkey = a\nkey = b\n")?;
        let config = ConfigFile::new(&path);

        config.set("s", "key", "c")?;

        assert_eq!(fs::read_to_string(&path)?, "[s]\nkey = c\nkey = b\n");
        assert_eq!(config.get("s", "key").as_deref(), Some("c"));
        Ok(())
    }

    #[test]
    fn test_config_same_value_twice_is_byte_identical() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.cfg");
        fs::write(&path, "[a]\nx = 1\n")?;
        let config = ConfigFile::new(&path);

        config.set("b", "y", "2")?;
        let once = fs::read(&path)?;
        config.set("b", "y", "2")?;
        let twice = fs::read(&path)?;

        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_config_bool() -> Result<()> {
        let dir = tempdir()?;
        let config = ConfigFile::new(dir.path().join("test.cfg"));

        assert_eq!(config.get_bool("properties", "log_to_file"), None);

        config.set_bool("properties", "log_to_file", true)?;
        assert_eq!(config.get_bool("properties", "log_to_file"), Some(true));

        config.set_bool("properties", "log_to_file", false)?;
        assert_eq!(config.get_bool("properties", "log_to_file"), Some(false));

        config.set("properties", "log_to_file", "yes")?;
        assert_eq!(config.get_bool("properties", "log_to_file"), None);
        Ok(())
    }

    #[test]
    fn test_config_unreadable_file_reads_as_absent() -> Result<()> {
        let dir = tempdir()?;
        // A directory can't be read as a file.
        let path = dir.path().join("test.cfg");
        fs::create_dir(&path)?;
        let config = ConfigFile::new(&path);

        assert_eq!(config.get("settings", "api_key"), None);
        Ok(())
    }

    #[test]
    fn test_config_write_failure_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.cfg");
        fs::create_dir(&path)?;
        let config = ConfigFile::new(&path);

        let result = config.set("settings", "api_key", "value");

        assert!(matches!(
            result,
            Err(ConfigError::Read { .. } | ConfigError::Write { .. })
        ));
        Ok(())
    }
}
