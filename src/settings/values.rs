use std::fmt::Display;

use clap::ValueEnum;

/// A type that can be stored as the textual value of a config entry.
pub trait SettingValue: Sized {
    fn encode(&self) -> String;

    /// Returns `None` when `raw` isn't a legal value of the type.
    fn decode(raw: &str) -> Option<Self>;
}

impl SettingValue for bool {
    fn encode(&self) -> String {
        if *self { "True" } else { "False" }.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        match raw {
            "True" => Some(true),
            "False" => Some(false),
            _ => None,
        }
    }
}

impl SettingValue for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// How browser activity is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainPreference {
    /// Only the host (and a non-default port).
    Domain,
    /// The full address.
    Url,
}

impl DomainPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainPreference::Domain => "domain",
            DomainPreference::Url => "url",
        }
    }
}

impl Display for DomainPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SettingValue for DomainPreference {
    fn encode(&self) -> String {
        self.as_str().to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        match raw {
            "domain" => Some(DomainPreference::Domain),
            "url" => Some(DomainPreference::Url),
            _ => None,
        }
    }
}

/// Which of the two url lists is applied to browsed sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterType {
    Denylist,
    Allowlist,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Denylist => "denylist",
            FilterType::Allowlist => "allowlist",
        }
    }
}

impl Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SettingValue for FilterType {
    fn encode(&self) -> String {
        self.as_str().to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        match raw {
            "denylist" => Some(FilterType::Denylist),
            "allowlist" => Some(FilterType::Allowlist),
            _ => None,
        }
    }
}

/// Developer sites reported out of the box when the allowlist is active.
pub const DEFAULT_ALLOWLIST: &str = "https?://(\\w\\.)*github\\.com/\n\
                                     https?://(\\w\\.)*gitlab\\.com/\n\
                                     ^stackoverflow\\.com/\n\
                                     ^docs\\.python\\.org/\n\
                                     https?://(\\w\\.)*golang\\.org/\n\
                                     https?://(\\w\\.)*go\\.dev/\n\
                                     https?://(\\w\\.)*npmjs\\.com/\n\
                                     https?://localhost(:\\d+)?/";

#[cfg(test)]
mod tests {
    use super::{DomainPreference, FilterType, SettingValue};

    #[test]
    fn test_enum_values_decode_only_legal_text() {
        assert_eq!(DomainPreference::decode("url"), Some(DomainPreference::Url));
        assert_eq!(DomainPreference::decode("Url"), None);
        assert_eq!(FilterType::decode("allowlist"), Some(FilterType::Allowlist));
        assert_eq!(FilterType::decode("blocklist"), None);
        assert_eq!(bool::decode("true"), None);
        assert_eq!(true.encode(), "True");
    }
}
