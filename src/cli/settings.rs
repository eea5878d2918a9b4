use anyhow::{anyhow, Result};
use clap::{Subcommand, ValueEnum};

use crate::settings::{ConfigTarget, DomainPreference, FilterType, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingName {
    ApiKey,
    LaunchOnLogin,
    LogToFile,
    AutoUpdateEnabled,
    DownloadUpdatesAutomatically,
    RequestAccessibility,
    DomainPreference,
    FilterType,
    Denylist,
    Allowlist,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    #[command(about = "Print the value of a setting")]
    Get { name: SettingName },
    #[command(about = "Change a setting. Lists take one pattern per line")]
    Set { name: SettingName, value: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    #[command(about = "Print a raw config entry")]
    Get {
        section: String,
        key: String,
        #[arg(long, help = "Use the internal config instead of the user config")]
        internal: bool,
    },
    #[command(about = "Write a raw config entry")]
    Set {
        section: String,
        key: String,
        value: String,
        #[arg(long, help = "Use the internal config instead of the user config")]
        internal: bool,
    },
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(anyhow!("Expected true or false, got {value:?}")),
    }
}

fn parse_enum<T: ValueEnum>(value: &str) -> Result<T> {
    T::from_str(value, true).map_err(|e| anyhow!(e))
}

/// Values are read through the same accessors the daemon uses, so missing ones are initialized.
pub fn read_setting(settings: &Settings, name: SettingName) -> String {
    match name {
        SettingName::ApiKey => settings.api_key().unwrap_or_default(),
        SettingName::LaunchOnLogin => settings.launch_on_login().to_string(),
        SettingName::LogToFile => settings.log_to_file().to_string(),
        SettingName::AutoUpdateEnabled => settings.auto_update_enabled().to_string(),
        SettingName::DownloadUpdatesAutomatically => {
            settings.download_updates_automatically().to_string()
        }
        SettingName::RequestAccessibility => settings.request_accessibility().to_string(),
        SettingName::DomainPreference => settings.domain_preference().to_string(),
        SettingName::FilterType => settings.filter_type().to_string(),
        SettingName::Denylist => settings.denylist(),
        SettingName::Allowlist => settings.allowlist(),
    }
}

pub fn write_setting(settings: &Settings, name: SettingName, value: &str) -> Result<()> {
    match name {
        SettingName::ApiKey => settings.set_api_key(value)?,
        SettingName::LaunchOnLogin => settings.set_launch_on_login(parse_bool(value)?)?,
        SettingName::LogToFile => settings.set_log_to_file(parse_bool(value)?)?,
        SettingName::AutoUpdateEnabled => settings.set_auto_update_enabled(parse_bool(value)?)?,
        SettingName::DownloadUpdatesAutomatically => {
            settings.set_download_updates_automatically(parse_bool(value)?)?
        }
        SettingName::RequestAccessibility => {
            settings.set_request_accessibility(parse_bool(value)?)?
        }
        SettingName::DomainPreference => {
            settings.set_domain_preference(parse_enum::<DomainPreference>(value)?)?
        }
        SettingName::FilterType => settings.set_filter_type(parse_enum::<FilterType>(value)?)?,
        SettingName::Denylist => settings.set_denylist(&value.replace("\\n", "\n"))?,
        SettingName::Allowlist => settings.set_allowlist(&value.replace("\\n", "\n"))?,
    }
    Ok(())
}

pub fn process_settings_command(settings: &Settings, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Get { name } => println!("{}", read_setting(settings, name)),
        SettingsCommand::Set { name, value } => write_setting(settings, name, &value)?,
    }
    Ok(())
}

pub fn process_config_command(settings: &Settings, command: ConfigCommand) -> Result<()> {
    let target = |internal: bool| {
        if internal {
            ConfigTarget::Internal
        } else {
            ConfigTarget::User
        }
    };
    match command {
        ConfigCommand::Get {
            section,
            key,
            internal,
        } => {
            if let Some(value) = settings.get_raw(target(internal), &section, &key) {
                println!("{value}");
            }
        }
        ConfigCommand::Set {
            section,
            key,
            value,
            internal,
        } => settings.set_raw(target(internal), &section, &key, &value)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::{read_setting, write_setting, SettingName};
    use crate::settings::{tests::temp_settings, FilterType};

    #[test]
    fn test_settings_from_the_command_line() -> Result<()> {
        let (_dir, settings) = temp_settings()?;

        assert_eq!(read_setting(&settings, SettingName::LaunchOnLogin), "true");
        write_setting(&settings, SettingName::LaunchOnLogin, "False")?;
        assert!(!settings.launch_on_login());

        write_setting(&settings, SettingName::FilterType, "denylist")?;
        assert_eq!(settings.filter_type(), FilterType::Denylist);

        write_setting(&settings, SettingName::Denylist, "^a\\.com/\\n^b\\.com/")?;
        assert_eq!(settings.denylist(), "^a\\.com/\n^b\\.com/");

        assert!(write_setting(&settings, SettingName::DomainPreference, "host").is_err());
        assert!(write_setting(&settings, SettingName::LogToFile, "maybe").is_err());
        Ok(())
    }
}
