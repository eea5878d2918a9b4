use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

pub const USER_CONFIG_FILE: &str = ".deskbeat.cfg";
pub const INTERNAL_CONFIG_FILE: &str = "deskbeat-internal.cfg";

fn home_dir() -> Result<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Couldn't find the home directory"))
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = env::var_os("APPDATA")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("APPDATA should be present on Windows"))?;
            path.push("deskbeat");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = match env::var_os("XDG_STATE_HOME") {
                Some(state) => PathBuf::from(state),
                None => home_dir()
                    .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?
                    .join(".local/state"),
            };
            path.push("deskbeat");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// The config users edit, shared with other tools reading the same format.
pub fn default_user_config_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(USER_CONFIG_FILE))
}

pub fn internal_config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(INTERNAL_CONFIG_FILE)
}

/// Resolves a path argument against the current directory. The daemon changes its working
/// directory, so every path it receives has to be absolute.
pub fn absolute_path(value: &str) -> io::Result<PathBuf> {
    std::path::absolute(value)
}

/// Like [absolute_path], but a bare program name is kept as is and looked up in `PATH`.
pub fn program_path(value: &str) -> io::Result<PathBuf> {
    let path = Path::new(value);
    if path.components().count() > 1 {
        std::path::absolute(path)
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use std::{env, path::PathBuf};

    use anyhow::Result;

    use super::{absolute_path, program_path};

    #[test]
    fn test_relative_arguments_become_absolute() -> Result<()> {
        let cwd = env::current_dir()?;
        assert_eq!(absolute_path("my.cfg")?, cwd.join("my.cfg"));
        assert_eq!(absolute_path("state/dir")?, cwd.join("state/dir"));
        assert_eq!(absolute_path("/etc/deskbeat.cfg")?, PathBuf::from("/etc/deskbeat.cfg"));
        assert!(absolute_path("").is_err());
        Ok(())
    }

    #[test]
    fn test_program_names_stay_bare() -> Result<()> {
        let cwd = env::current_dir()?;
        assert_eq!(program_path("wakatime-cli")?, PathBuf::from("wakatime-cli"));
        assert_eq!(program_path("bin/wakatime-cli")?, cwd.join("bin/wakatime-cli"));
        Ok(())
    }
}
