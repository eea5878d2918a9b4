//! Turns a window snapshot into the entity, category, language and project of a heartbeat.

mod project;
mod types;

pub use project::project_from_url;
pub use types::{Category, Classification, EntityType};

use tracing::debug;
use url::Url;

use crate::{
    apps::AppData,
    filter::UrlFilter,
    settings::{DomainPreference, Settings},
    window_api::WindowInfo,
};

/// Returns `None` when nothing about the window is worth reporting, which is the normal outcome
/// for filtered browser pages and for applications without entity support.
pub fn classify(
    settings: &Settings,
    window: &WindowInfo,
    app: Option<&AppData>,
) -> Option<Classification> {
    let (entity, entity_type) = entity(settings, window, app)?;
    Some(Classification {
        entity,
        entity_type,
        category: app.and_then(category),
        language: app.and_then(language),
        project: window.url.as_deref().and_then(project_from_url),
    })
}

fn entity(
    settings: &Settings,
    window: &WindowInfo,
    app: Option<&AppData>,
) -> Option<(String, EntityType)> {
    if let Some(app) = app.filter(|v| v.is_browser) {
        let url = window.url.as_deref().filter(|v| !v.is_empty())?;
        if !UrlFilter::new(settings).passes(url) {
            return None;
        }
        return match settings.domain_preference() {
            DomainPreference::Domain => {
                let domain = domain_from_url(url).unwrap_or_else(|| {
                    debug!("{} reported an address without a host: {url}", app.id);
                    url.to_string()
                });
                Some((domain, EntityType::Domain))
            }
            DomainPreference::Url => Some((url.to_string(), EntityType::Url)),
        };
    }

    match app.map(|v| v.id.as_str()) {
        Some("canva" | "notes") => None,
        _ => title_entity(window, app).map(|v| (v, EntityType::App)),
    }
}

/// Text before the first `" - "`, where window titles usually append the application name.
fn leading_title(title: &str) -> &str {
    title.split(" - ").next().unwrap_or(title)
}

fn title_entity(window: &WindowInfo, app: Option<&AppData>) -> Option<String> {
    let title = leading_title(&window.title);
    let placeholders: &[&str] = match app.map(|v| v.id.as_str()) {
        Some("xcode") => return app.map(|v| v.name.clone()),
        Some("figma") => &["Figma", "Drafts"],
        Some("warp") => &["Warp", "Wrap"],
        Some("postman") => &["Postman"],
        _ if title.is_empty() => {
            return (!window.display_name.is_empty()).then(|| window.display_name.clone());
        }
        _ => &[],
    };
    (!title.is_empty() && !placeholders.contains(&title)).then(|| title.to_string())
}

pub fn category(app: &AppData) -> Option<Category> {
    let category = match app.id.as_str() {
        "arcbrowser" | "brave" | "chrome" | "firefox" | "safari" | "safaripreview" => {
            Category::Browsing
        }
        "imessage" | "microsoft_outlook" | "slack" | "wecom" => Category::Communicating,
        "iterm2" | "mac_terminal" | "microsoft_excel" | "windows_terminal" | "powershell"
        | "warp" | "xcode" => Category::Coding,
        "postman" | "tableplus" => Category::Debugging,
        "microsoft_word" | "notes" | "notion" => Category::WritingDocs,
        "canva" | "figma" => Category::Designing,
        "whatsapp" | "zoom" => Category::Meeting,
        _ => return None,
    };
    Some(category)
}

pub fn language(app: &AppData) -> Option<&'static str> {
    match app.id.as_str() {
        "canva" | "figma" => Some("Image (svg)"),
        "postman" => Some("HTTP Request"),
        _ => None,
    }
}

/// Host of the address without a `www.` prefix, followed by the port unless it's the default
/// one of the scheme. Addresses without a scheme are read as `http`.
pub fn domain_from_url(url: &str) -> Option<String> {
    let parsed = if url.contains("://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("http://{url}"))
    }
    .inspect_err(|e| debug!("Unparsable address {url:?}: {e}"))
    .ok()?;

    let host = parsed.host_str().filter(|v| !v.is_empty())?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}
