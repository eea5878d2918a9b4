//! Allow/deny matching of browsed addresses.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use regex::Regex;
use tracing::warn;

use crate::settings::{FilterType, Settings};

/// Patterns of a filter, one per non-blank line, compiled once when parsed.
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    /// `None` for patterns that failed to compile. They still count as entries of the list.
    patterns: Vec<Option<Regex>>,
}

/// Address without a leading `scheme://`, if it has one.
fn strip_scheme(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|v| v.is_ascii_alphabetic())
        && chars.all(|v| v.is_ascii_alphanumeric() || matches!(v, '+' | '-' | '.'));
    valid.then_some(rest)
}

impl FilterList {
    pub fn parse(text: &str) -> Self {
        Self {
            patterns: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| {
                    Regex::new(line)
                        .inspect_err(|e| warn!("Skipping illegal filter pattern {line:?}: {e}"))
                        .ok()
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether some pattern matches the address. It's tried as is, with either scheme in front
    /// and without its own scheme.
    pub fn matches(&self, url: &str) -> bool {
        let mut candidates = vec![
            url.to_string(),
            format!("http://{url}"),
            format!("https://{url}"),
        ];
        if let Some(rest) = strip_scheme(url) {
            candidates.push(rest.to_string());
        }
        self.patterns.iter().flatten().any(|regex| {
            candidates.iter().any(|v| regex.is_match(v))
        })
    }
}

/// An empty list lets everything through in either mode.
pub fn passes(filter_type: FilterType, list: &FilterList, url: &str) -> bool {
    if list.is_empty() {
        return true;
    }
    match filter_type {
        FilterType::Denylist => !list.matches(url),
        FilterType::Allowlist => list.matches(url),
    }
}

/// Filter backed by the current settings. Lists are re-read on every check so edits made
/// through the command line apply without a restart.
pub struct UrlFilter<'a> {
    settings: &'a Settings,
}

impl<'a> UrlFilter<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn passes(&self, url: &str) -> bool {
        let filter_type = self.settings.filter_type();
        let list = compiled(&self.settings.current_filter_list());
        passes(filter_type, &list, url)
    }
}

/// Last parsed list, reused until the text in the settings changes.
static LAST_LIST: LazyLock<Mutex<Option<(String, Arc<FilterList>)>>> =
    LazyLock::new(|| Mutex::new(None));

fn compiled(text: &str) -> Arc<FilterList> {
    let mut last = LAST_LIST.lock().unwrap_or_else(PoisonError::into_inner);
    match last.as_ref() {
        Some((source, list)) if source == text => list.clone(),
        _ => {
            let list = Arc::new(FilterList::parse(text));
            *last = Some((text.to_string(), list.clone()));
            list
        }
    }
}
