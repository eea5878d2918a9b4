//! Applications the agent can report on, and which of them the user opted into.

pub mod catalog;
pub mod enumeration;
pub mod registry;

use serde::{Deserialize, Serialize};

pub use registry::AppRegistry;

/// Identity of an installed (or manually added) application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    /// Catalog id for known applications, otherwise derived from the executable.
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub exec_name: Option<String>,
    #[serde(default)]
    pub is_browser: bool,
    #[serde(default)]
    pub is_default_enabled: bool,
}

impl AppData {
    /// Entry for an application that isn't part of the catalog.
    pub fn unknown(path: &str, name: &str) -> Self {
        let exec_name = catalog::exec_name(path);
        Self {
            id: exec_name
                .as_deref()
                .unwrap_or(name)
                .to_lowercase()
                .replace(' ', "_"),
            name: name.to_string(),
            path: path.to_string(),
            icon: None,
            version: None,
            bundle_id: None,
            exec_name,
            is_browser: false,
            is_default_enabled: false,
        }
    }

    /// Builds the entry for an executable, recognizing catalog applications by their executable
    /// name. `fallback_name` is used for applications outside of the catalog.
    pub fn from_path(path: &str, fallback_name: &str) -> Self {
        catalog::exec_name(path)
            .and_then(|exec| catalog::find_by_exec_name(&exec))
            .map(|known| known.to_app_data(path))
            .unwrap_or_else(|| Self::unknown(path, fallback_name))
    }
}

#[cfg(test)]
mod tests {
    use super::AppData;

    #[test]
    fn test_app_data_from_path() {
        let firefox = AppData::from_path("/usr/lib/firefox/firefox", "firefox");
        assert_eq!(firefox.id, "firefox");
        assert!(firefox.is_browser);

        let editor = AppData::from_path("/usr/bin/my-editor", "My Editor");
        assert_eq!(editor.id, "my-editor");
        assert_eq!(editor.name, "My Editor");
        assert!(!editor.is_browser);
    }

    #[test]
    fn test_app_data_serde_defaults() {
        let app: AppData =
            serde_json::from_str(r#"{"id":"x","name":"X","path":"/bin/x"}"#).unwrap();
        assert_eq!(app.path, "/bin/x");
        assert_eq!(app.exec_name, None);
        assert!(!app.is_browser && !app.is_default_enabled);
    }
}
