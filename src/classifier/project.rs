use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

struct ProjectPattern {
    source: &'static str,
    /// Capture group holding the `owner/name` pair.
    group: usize,
}

const PROJECT_PATTERNS: &[ProjectPattern] = &[
    ProjectPattern {
        source: r"github\.com/([^/]+/[^/]+)/?.*$",
        group: 1,
    },
    ProjectPattern {
        source: r"bitbucket\.org/([^/]+/[^/]+)/?.*$",
        group: 1,
    },
    ProjectPattern {
        source: r"app\.circleci\.com/.*/?(github|bitbucket|gitlab)/([^/]+/[^/]+)/?.*$",
        group: 2,
    },
    ProjectPattern {
        source: r"app\.travis-ci\.com/(github|bitbucket|gitlab)/([^/]+/[^/]+)/?.*$",
        group: 2,
    },
    ProjectPattern {
        source: r"app\.travis-ci\.org/(github|bitbucket|gitlab)/([^/]+/[^/]+)/?.*$",
        group: 2,
    },
];

static COMPILED: LazyLock<Vec<(Regex, usize)>> = LazyLock::new(|| {
    PROJECT_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern.source) {
            Ok(regex) => Some((regex, pattern.group)),
            Err(e) => {
                warn!("Illegal project pattern {}: {e}", pattern.source);
                None
            }
        })
        .collect()
});

/// Repository an address belongs to, as `owner/name`. First matching pattern wins.
pub fn project_from_url(url: &str) -> Option<String> {
    COMPILED.iter().find_map(|(regex, group)| {
        regex
            .captures(url)
            .and_then(|captures| captures.get(*group))
            .map(|v| v.as_str().to_string())
    })
}
