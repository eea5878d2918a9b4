//! Static knowledge about applications the agent understands.

use std::{collections::HashMap, path::Path, sync::LazyLock};

use regex::Regex;
use tracing::warn;

use super::AppData;

/// An application the classifier has special rules for.
#[derive(Debug)]
pub struct KnownApp {
    pub id: &'static str,
    pub name: &'static str,
    pub mac_bundle_id: Option<&'static str>,
    /// Executable names as they appear on Windows and Linux, compared case-insensitively and
    /// without an `.exe` suffix.
    pub exec_names: &'static [&'static str],
    pub is_browser: bool,
    pub is_default_enabled: bool,
}

impl KnownApp {
    const fn new(id: &'static str, name: &'static str) -> Self {
        Self {
            id,
            name,
            mac_bundle_id: None,
            exec_names: &[],
            is_browser: false,
            is_default_enabled: false,
        }
    }

    const fn mac(mut self, bundle_id: &'static str) -> Self {
        self.mac_bundle_id = Some(bundle_id);
        self
    }

    const fn execs(mut self, exec_names: &'static [&'static str]) -> Self {
        self.exec_names = exec_names;
        self
    }

    const fn browser(mut self) -> Self {
        self.is_browser = true;
        self
    }

    const fn default_enabled(mut self) -> Self {
        self.is_default_enabled = true;
        self
    }

    /// Describes an installation of this application located at `path`.
    pub fn to_app_data(&self, path: &str) -> AppData {
        AppData {
            id: self.id.to_string(),
            name: self.name.to_string(),
            path: path.to_string(),
            icon: None,
            version: None,
            bundle_id: self.mac_bundle_id.map(str::to_string),
            exec_name: exec_name(path),
            is_browser: self.is_browser,
            is_default_enabled: self.is_default_enabled,
        }
    }
}

pub static KNOWN_APPS: &[KnownApp] = &[
    KnownApp::new("arcbrowser", "Arc")
        .mac("company.thebrowser.Browser")
        .execs(&["arc"])
        .browser(),
    KnownApp::new("brave", "Brave")
        .mac("com.brave.Browser")
        .execs(&["brave", "brave-browser"])
        .browser(),
    KnownApp::new("canva", "Canva")
        .mac("com.canva.CanvaDesktop")
        .execs(&["canva"])
        .default_enabled(),
    KnownApp::new("chrome", "Google Chrome")
        .mac("com.google.Chrome")
        .execs(&["chrome", "google-chrome", "google-chrome-stable", "chromium"])
        .browser(),
    KnownApp::new("figma", "Figma")
        .mac("com.figma.Desktop")
        .execs(&["figma", "figma-linux"])
        .default_enabled(),
    KnownApp::new("firefox", "Firefox")
        .mac("org.mozilla.firefox")
        .execs(&["firefox", "firefox-bin"])
        .browser(),
    KnownApp::new("imessage", "Messages").mac("com.apple.MobileSMS"),
    KnownApp::new("iterm2", "iTerm2").mac("com.googlecode.iterm2"),
    KnownApp::new("linear", "Linear")
        .mac("com.linear")
        .execs(&["linear"])
        .default_enabled(),
    KnownApp::new("mac_terminal", "Terminal").mac("com.apple.Terminal"),
    KnownApp::new("microsoft_access", "Microsoft Access")
        .execs(&["msaccess"])
        .default_enabled(),
    KnownApp::new("microsoft_edge", "Microsoft Edge")
        .mac("com.microsoft.edgemac")
        .execs(&["msedge", "microsoft-edge"])
        .browser(),
    KnownApp::new("microsoft_excel", "Microsoft Excel")
        .execs(&["excel"])
        .default_enabled(),
    KnownApp::new("microsoft_onenote", "Microsoft OneNote")
        .execs(&["onenote"])
        .default_enabled(),
    KnownApp::new("microsoft_outlook", "Microsoft Outlook")
        .execs(&["outlook"])
        .default_enabled(),
    KnownApp::new("microsoft_powerpoint", "Microsoft PowerPoint")
        .execs(&["powerpnt"])
        .default_enabled(),
    KnownApp::new("microsoft_word", "Microsoft Word")
        .execs(&["winword"])
        .default_enabled(),
    KnownApp::new("notes", "Notes")
        .mac("com.apple.Notes")
        .default_enabled(),
    KnownApp::new("notion", "Notion")
        .mac("notion.id")
        .execs(&["notion"])
        .default_enabled(),
    KnownApp::new("postman", "Postman")
        .mac("com.postmanlabs.mac")
        .execs(&["postman"])
        .default_enabled(),
    KnownApp::new("powershell", "PowerShell").execs(&["powershell", "pwsh"]),
    KnownApp::new("safari", "Safari")
        .mac("com.apple.Safari")
        .browser(),
    KnownApp::new("safaripreview", "Safari Technology Preview")
        .mac("com.apple.SafariTechnologyPreview")
        .browser(),
    KnownApp::new("slack", "Slack")
        .mac("com.tinyspeck.slackmacgap")
        .execs(&["slack"]),
    KnownApp::new("tableplus", "TablePlus")
        .mac("com.tinyapp.TablePlus")
        .execs(&["tableplus"])
        .default_enabled(),
    KnownApp::new("warp", "Warp")
        .mac("dev.warp.Warp-Stable")
        .execs(&["warp", "warp-terminal"]),
    KnownApp::new("wecom", "WeCom").mac("com.tencent.WeWorkMac"),
    KnownApp::new("whatsapp", "WhatsApp")
        .mac("net.whatsapp.WhatsApp")
        .execs(&["whatsapp"]),
    KnownApp::new("windows_terminal", "Terminal").execs(&["windowsterminal"]),
    KnownApp::new("xcode", "Xcode")
        .mac("com.apple.dt.Xcode")
        .default_enabled(),
    KnownApp::new("zoom", "Zoom")
        .mac("us.zoom.xos")
        .execs(&["zoom"])
        .default_enabled(),
];

/// File name of the executable without directories or an `.exe` suffix.
pub fn exec_name(path: &str) -> Option<String> {
    let file_name = Path::new(path).file_name()?.to_str()?;
    let name = file_name
        .strip_suffix(".exe")
        .or_else(|| file_name.strip_suffix(".EXE"))
        .unwrap_or(file_name);
    (!name.is_empty()).then(|| name.to_string())
}

pub fn find_by_id(id: &str) -> Option<&'static KnownApp> {
    KNOWN_APPS.iter().find(|app| app.id == id)
}

pub fn find_by_exec_name(name: &str) -> Option<&'static KnownApp> {
    KNOWN_APPS.iter().find(|app| {
        app.exec_names
            .iter()
            .any(|exec| exec.eq_ignore_ascii_case(name))
    })
}

pub enum NameRule {
    Exact(&'static str),
    Pattern(&'static str),
}

/// Applications that can never be monitored. Each field that is set has to match on its own.
pub struct ExcludeRule {
    pub bundle_id: Option<&'static str>,
    pub exec_name: Option<&'static str>,
    pub name: Option<NameRule>,
}

pub static EXCLUDED_APPS: &[ExcludeRule] = &[
    ExcludeRule {
        bundle_id: None,
        exec_name: None,
        name: Some(NameRule::Exact("Electron")),
    },
    ExcludeRule {
        bundle_id: Some("com.github.Electron"),
        exec_name: Some("electron"),
        name: None,
    },
    ExcludeRule {
        bundle_id: None,
        exec_name: Some("deskbeat"),
        name: Some(NameRule::Pattern("^deskbeat(-daemon)?$")),
    },
    ExcludeRule {
        bundle_id: None,
        exec_name: Some("deskbeat-daemon"),
        name: None,
    },
];

static NAME_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    EXCLUDED_APPS
        .iter()
        .filter_map(|rule| match &rule.name {
            Some(NameRule::Pattern(pattern)) => Some(*pattern),
            _ => None,
        })
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some((pattern, regex)),
            Err(e) => {
                warn!("Illegal exclusion pattern {pattern}: {e}");
                None
            }
        })
        .collect()
});

impl ExcludeRule {
    pub fn matches(&self, app: &AppData) -> bool {
        let bundle_matches = matches!(
            (self.bundle_id, app.bundle_id.as_deref()),
            (Some(rule), Some(bundle)) if rule == bundle
        );
        let exec = app.exec_name.clone().or_else(|| exec_name(&app.path));
        let exec_matches = matches!(
            (self.exec_name, exec.as_deref()),
            (Some(rule), Some(exec)) if rule == exec
        );
        let name_matches = match &self.name {
            Some(NameRule::Exact(name)) => *name == app.name,
            Some(NameRule::Pattern(pattern)) => NAME_PATTERNS
                .get(pattern)
                .is_some_and(|regex| regex.is_match(&app.name)),
            None => false,
        };
        bundle_matches || exec_matches || name_matches
    }
}

pub fn is_excluded(app: &AppData) -> bool {
    EXCLUDED_APPS.iter().any(|rule| rule.matches(app))
}
