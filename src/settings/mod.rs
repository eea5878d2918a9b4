//! Typed access to the two configuration documents.
//!
//! Every setting is a [Setting] descriptor binding a (document, section, key) triple to a value
//! type and a default. Reading goes through [Settings::get_or_initialize], which persists the
//! default the first time a value is found missing, so the file always shows what the agent is
//! actually using.

pub mod values;

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, warn};

use crate::config::{ConfigError, ConfigFile};

pub use values::{DomainPreference, FilterType, SettingValue, DEFAULT_ALLOWLIST};

pub const SETTINGS_SECTION: &str = "settings";
pub const PROPERTIES_SECTION: &str = "properties";
pub const MONITORING_SECTION: &str = "monitoring";
pub const INTERNAL_SECTION: &str = "internal";

/// Selects one of the two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTarget {
    /// The document users are expected to edit.
    User,
    /// Bookkeeping the agent keeps for itself.
    Internal,
}

/// What happens when a stored value can't be decoded.
pub enum OnInvalid<T> {
    /// Treat it like a missing value, writing the default over it.
    Reinitialize,
    /// Return the given member without touching the file.
    Fallback(fn() -> T),
}

pub struct Setting<T> {
    pub target: ConfigTarget,
    pub section: &'static str,
    pub key: &'static str,
    pub default: fn() -> T,
    pub on_invalid: OnInvalid<T>,
}

pub const API_KEY: Setting<String> = Setting {
    target: ConfigTarget::User,
    section: SETTINGS_SECTION,
    key: "api_key",
    default: String::new,
    on_invalid: OnInvalid::Reinitialize,
};

pub const LAUNCH_ON_LOGIN: Setting<bool> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "launch_on_login",
    default: || true,
    on_invalid: OnInvalid::Reinitialize,
};

pub const LOG_TO_FILE: Setting<bool> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "log_to_file",
    default: || false,
    on_invalid: OnInvalid::Reinitialize,
};

pub const AUTO_UPDATE_ENABLED: Setting<bool> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "auto_update_enabled",
    default: || true,
    on_invalid: OnInvalid::Reinitialize,
};

pub const DOWNLOAD_UPDATES_AUTOMATICALLY: Setting<bool> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "should_automatically_download_updates",
    default: || true,
    on_invalid: OnInvalid::Reinitialize,
};

pub const REQUEST_ACCESSIBILITY: Setting<bool> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "request_a11y",
    default: || true,
    on_invalid: OnInvalid::Reinitialize,
};

pub const DOMAIN_PREFERENCE: Setting<DomainPreference> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "domain_preference",
    default: || DomainPreference::Domain,
    on_invalid: OnInvalid::Fallback(|| DomainPreference::Domain),
};

pub const FILTER_TYPE: Setting<FilterType> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "filter_type",
    default: || FilterType::Allowlist,
    on_invalid: OnInvalid::Fallback(|| FilterType::Denylist),
};

pub const DENYLIST: Setting<String> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "denylist",
    default: String::new,
    on_invalid: OnInvalid::Reinitialize,
};

pub const ALLOWLIST: Setting<String> = Setting {
    target: ConfigTarget::User,
    section: PROPERTIES_SECTION,
    key: "allowlist",
    default: || DEFAULT_ALLOWLIST.to_string(),
    on_invalid: OnInvalid::Reinitialize,
};

pub const HAS_LAUNCHED_BEFORE: Setting<bool> = Setting {
    target: ConfigTarget::Internal,
    section: INTERNAL_SECTION,
    key: "has_launched_before",
    default: || false,
    on_invalid: OnInvalid::Reinitialize,
};

/// Key of the flag telling whether the application at `path` is tracked.
pub fn monitored_key(path: &str) -> String {
    format!("is_{path}_monitored")
}

/// Receives the effect of the "log to file" setting.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn set_file_logging(&self, enabled: bool);
}

pub struct Settings {
    user: ConfigFile,
    internal: ConfigFile,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl Settings {
    pub fn new(user_config: impl Into<PathBuf>, internal_config: impl Into<PathBuf>) -> Self {
        Self {
            user: ConfigFile::new(user_config),
            internal: ConfigFile::new(internal_config),
            log_sink: None,
        }
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn file(&self, target: ConfigTarget) -> &ConfigFile {
        match target {
            ConfigTarget::User => &self.user,
            ConfigTarget::Internal => &self.internal,
        }
    }

    pub fn get_raw(&self, target: ConfigTarget, section: &str, key: &str) -> Option<String> {
        self.file(target).get(section, key)
    }

    pub fn set_raw(
        &self,
        target: ConfigTarget,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        self.file(target).set(section, key, value)
    }

    /// Returns the stored value without persisting anything. Values that fail to decode are
    /// reported as absent.
    pub fn get<T: SettingValue>(&self, setting: &Setting<T>) -> Option<T> {
        let raw = self.get_raw(setting.target, setting.section, setting.key)?;
        T::decode(&raw)
    }

    /// Returns the stored value. A missing value is replaced by the default, which is written
    /// back immediately. Failing to write the default doesn't prevent returning it.
    pub fn get_or_initialize<T: SettingValue>(&self, setting: &Setting<T>) -> T {
        let stored = self.get_raw(setting.target, setting.section, setting.key);
        if let Some(raw) = stored {
            if let Some(value) = T::decode(&raw) {
                return value;
            }
            if let OnInvalid::Fallback(fallback) = &setting.on_invalid {
                debug!(
                    "Illegal value {raw:?} for {}, using the fallback",
                    setting.key
                );
                return fallback();
            }
        }

        let default = (setting.default)();
        if let Err(e) = self.set(setting, &default) {
            warn!("Failed to persist default for {}: {e}", setting.key);
        }
        default
    }

    pub fn set<T: SettingValue>(&self, setting: &Setting<T>, value: &T) -> Result<(), ConfigError> {
        self.set_raw(setting.target, setting.section, setting.key, &value.encode())
    }

    /// The api key is never initialized with a default, an empty value means it's missing.
    pub fn api_key(&self) -> Option<String> {
        self.get(&API_KEY).filter(|v| !v.is_empty())
    }

    pub fn set_api_key(&self, value: &str) -> Result<(), ConfigError> {
        self.set(&API_KEY, &value.to_string())
    }

    pub fn launch_on_login(&self) -> bool {
        self.get_or_initialize(&LAUNCH_ON_LOGIN)
    }

    pub fn set_launch_on_login(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&LAUNCH_ON_LOGIN, &value)
    }

    pub fn log_to_file(&self) -> bool {
        self.get_or_initialize(&LOG_TO_FILE)
    }

    /// Persists the value and switches file logging accordingly.
    pub fn set_log_to_file(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&LOG_TO_FILE, &value)?;
        if let Some(sink) = &self.log_sink {
            sink.set_file_logging(value);
        }
        Ok(())
    }

    pub fn auto_update_enabled(&self) -> bool {
        self.get_or_initialize(&AUTO_UPDATE_ENABLED)
    }

    pub fn set_auto_update_enabled(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&AUTO_UPDATE_ENABLED, &value)
    }

    pub fn download_updates_automatically(&self) -> bool {
        self.get_or_initialize(&DOWNLOAD_UPDATES_AUTOMATICALLY)
    }

    pub fn set_download_updates_automatically(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&DOWNLOAD_UPDATES_AUTOMATICALLY, &value)
    }

    pub fn request_accessibility(&self) -> bool {
        self.get_or_initialize(&REQUEST_ACCESSIBILITY)
    }

    pub fn set_request_accessibility(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&REQUEST_ACCESSIBILITY, &value)
    }

    pub fn domain_preference(&self) -> DomainPreference {
        self.get_or_initialize(&DOMAIN_PREFERENCE)
    }

    pub fn set_domain_preference(&self, value: DomainPreference) -> Result<(), ConfigError> {
        self.set(&DOMAIN_PREFERENCE, &value)
    }

    pub fn filter_type(&self) -> FilterType {
        self.get_or_initialize(&FILTER_TYPE)
    }

    pub fn set_filter_type(&self, value: FilterType) -> Result<(), ConfigError> {
        self.set(&FILTER_TYPE, &value)
    }

    pub fn denylist(&self) -> String {
        self.get_or_initialize(&DENYLIST)
    }

    pub fn set_denylist(&self, value: &str) -> Result<(), ConfigError> {
        self.set(&DENYLIST, &value.to_string())
    }

    pub fn allowlist(&self) -> String {
        self.get_or_initialize(&ALLOWLIST)
    }

    pub fn set_allowlist(&self, value: &str) -> Result<(), ConfigError> {
        self.set(&ALLOWLIST, &value.to_string())
    }

    /// Text of the list selected by [Settings::filter_type].
    pub fn current_filter_list(&self) -> String {
        match self.filter_type() {
            FilterType::Denylist => self.denylist(),
            FilterType::Allowlist => self.allowlist(),
        }
    }

    pub fn has_launched_before(&self) -> bool {
        self.get(&HAS_LAUNCHED_BEFORE).unwrap_or(false)
    }

    pub fn set_has_launched_before(&self, value: bool) -> Result<(), ConfigError> {
        self.set(&HAS_LAUNCHED_BEFORE, &value)
    }

    /// Every application is opt-in: an unset flag is stored as `False`.
    pub fn monitored_flag(&self, path: &str) -> bool {
        let key = monitored_key(path);
        match self.user.get_bool(MONITORING_SECTION, &key) {
            Some(value) => value,
            None => {
                if let Err(e) = self.user.set_bool(MONITORING_SECTION, &key, false) {
                    warn!("Failed to persist monitoring flag for {path}: {e}");
                }
                false
            }
        }
    }

    pub fn set_monitored_flag(&self, path: &str, value: bool) -> Result<(), ConfigError> {
        self.user
            .set_bool(MONITORING_SECTION, &monitored_key(path), value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{fs, sync::Arc};

    use anyhow::Result;
    use tempfile::{tempdir, TempDir};

    use super::{
        ConfigTarget, DomainPreference, FilterType, MockLogSink, Settings, DEFAULT_ALLOWLIST,
        FILTER_TYPE, LAUNCH_ON_LOGIN,
    };

    pub(crate) fn temp_settings() -> Result<(TempDir, Settings)> {
        let dir = tempdir()?;
        let settings = Settings::new(
            dir.path().join("user.cfg"),
            dir.path().join("internal.cfg"),
        );
        Ok((dir, settings))
    }

    #[test]
    fn test_settings_default_is_persisted_on_first_read() -> Result<()> {
        let (dir, settings) = temp_settings()?;

        assert!(settings.launch_on_login());
        assert_eq!(
            fs::read_to_string(dir.path().join("user.cfg"))?,
            "[properties]\nlaunch_on_login = True"
        );
        assert_eq!(settings.get(&LAUNCH_ON_LOGIN), Some(true));

        settings.set_launch_on_login(false)?;
        assert!(!settings.launch_on_login());
        Ok(())
    }

    #[test]
    fn test_settings_invalid_enum_falls_back_without_writing() -> Result<()> {
        let (dir, settings) = temp_settings()?;
        settings.set_raw(ConfigTarget::User, "properties", "filter_type", "blocklist")?;
        settings.set_raw(ConfigTarget::User, "properties", "domain_preference", "host")?;

        assert_eq!(settings.filter_type(), FilterType::Denylist);
        assert_eq!(settings.domain_preference(), DomainPreference::Domain);
        assert_eq!(settings.get(&FILTER_TYPE), None);
        assert!(fs::read_to_string(dir.path().join("user.cfg"))?.contains("filter_type = blocklist"));
        Ok(())
    }

    #[test]
    fn test_settings_invalid_bool_is_reinitialized() -> Result<()> {
        let (_dir, settings) = temp_settings()?;
        settings.set_raw(ConfigTarget::User, "properties", "log_to_file", "maybe")?;

        assert!(!settings.log_to_file());
        assert_eq!(
            settings
                .get_raw(ConfigTarget::User, "properties", "log_to_file")
                .as_deref(),
            Some("False")
        );
        Ok(())
    }

    #[test]
    fn test_settings_filter_lists() -> Result<()> {
        let (_dir, settings) = temp_settings()?;

        assert_eq!(settings.filter_type(), FilterType::Allowlist);
        assert_eq!(settings.current_filter_list(), DEFAULT_ALLOWLIST);

        settings.set_filter_type(FilterType::Denylist)?;
        settings.set_denylist("^example\\.com/\n^news\\.")?;
        assert_eq!(settings.current_filter_list(), "^example\\.com/\n^news\\.");
        Ok(())
    }

    #[test]
    fn test_settings_log_to_file_toggles_sink() -> Result<()> {
        let (_dir, settings) = temp_settings()?;
        let mut sink = MockLogSink::new();
        sink.expect_set_file_logging()
            .withf(|enabled| *enabled)
            .times(1)
            .return_const(());
        let settings = settings.with_log_sink(Arc::new(sink));

        settings.set_log_to_file(true)?;
        assert!(settings.log_to_file());
        Ok(())
    }

    #[test]
    fn test_settings_internal_document_is_separate() -> Result<()> {
        let (dir, settings) = temp_settings()?;

        assert!(!settings.has_launched_before());
        settings.set_has_launched_before(true)?;

        assert!(settings.has_launched_before());
        assert!(!dir.path().join("user.cfg").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("internal.cfg"))?,
            "[internal]\nhas_launched_before = True"
        );
        Ok(())
    }

    #[test]
    fn test_settings_monitored_flag_defaults_to_false() -> Result<()> {
        let (_dir, settings) = temp_settings()?;

        assert!(!settings.monitored_flag("/usr/bin/figma"));
        assert_eq!(
            settings
                .get_raw(ConfigTarget::User, "monitoring", "is_/usr/bin/figma_monitored")
                .as_deref(),
            Some("False")
        );

        settings.set_monitored_flag("/usr/bin/figma", true)?;
        assert!(settings.monitored_flag("/usr/bin/figma"));
        Ok(())
    }

    #[test]
    fn test_settings_api_key() -> Result<()> {
        let (_dir, settings) = temp_settings()?;

        assert_eq!(settings.api_key(), None);
        settings.set_api_key("waka_0000")?;
        assert_eq!(settings.api_key().as_deref(), Some("waka_0000"));
        Ok(())
    }
}
