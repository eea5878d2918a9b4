//! Line-oriented reader and writer for the `[section]` / `key = value` format.
//!
//! Both functions operate on the full text of a document. Lines that are not touched by a write
//! are emitted byte for byte, so rewriting a document only ever changes the targeted entry.

/// Returns the name of the section if the line is a `[section]` header.
fn section_name(line: &str) -> Option<&str> {
    let line = line.trim_end();
    if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
        Some(&line[1..line.len() - 1])
    } else {
        None
    }
}

/// Splits a `key = value` line on the first `=` and returns the trimmed key.
fn entry_key(line: &str) -> Option<&str> {
    line.split_once('=').map(|(key, _)| key.trim())
}

pub fn escape(value: &str) -> String {
    value.replace('\n', "\\n")
}

pub fn unescape(value: &str) -> String {
    value.replace("\\n", "\n")
}

fn entry_line(key: &str, value: &str) -> String {
    format!("{key} = {}", escape(value))
}

/// Finds the value of `key` inside `section`. The first matching line wins.
pub fn lookup(contents: &str, section: &str, key: &str) -> Option<String> {
    let mut current_section = "";
    for line in contents.split('\n') {
        if let Some(name) = section_name(line) {
            current_section = name;
            continue;
        }
        if current_section != section {
            continue;
        }
        if let Some((line_key, value)) = line.split_once('=') {
            if line_key.trim() == key {
                return Some(unescape(value.trim()));
            }
        }
    }
    None
}

/// Produces the new document text after storing `value` under `section`/`key`.
///
/// `contents` is `None` when the file doesn't exist yet, in which case the document consists of
/// the target section with a single entry.
pub fn rewrite(contents: Option<&str>, section: &str, key: &str, value: &str) -> String {
    let entry = entry_line(key, value);
    let header = format!("[{section}]");
    let Some(contents) = contents else {
        return format!("{header}\n{entry}");
    };

    let (body, trailing_newline) = match contents.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (contents, false),
    };

    let mut output: Vec<&str> = Vec::new();
    let mut current_section = "";
    let mut written = false;

    let lines = (!body.is_empty()).then(|| body.split('\n')).into_iter().flatten();
    for line in lines {
        if let Some(name) = section_name(line) {
            if current_section == section && !written {
                output.push(&entry);
                written = true;
            }
            output.push(line);
            current_section = name;
        } else if current_section == section && !written && entry_key(line) == Some(key) {
            output.push(&entry);
            written = true;
        } else {
            output.push(line);
        }
    }

    if !written {
        if current_section != section {
            output.push(&header);
        }
        output.push(&entry);
    }

    let mut result = output.join("\n");
    if trailing_newline {
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{lookup, rewrite};

    const DOCUMENT: &str = "[settings]\n\
                            api_key = abc\n\
                            debug = false\n\
                            \n\
                            [properties]\n\
                            filter_type = denylist\n";

    #[test]
    fn test_lookup_finds_key_in_section() {
        assert_eq!(lookup(DOCUMENT, "settings", "api_key").as_deref(), Some("abc"));
        assert_eq!(
            lookup(DOCUMENT, "properties", "filter_type").as_deref(),
            Some("denylist")
        );
    }

    #[test]
    fn test_lookup_respects_section_boundaries() {
        assert_eq!(lookup(DOCUMENT, "properties", "api_key"), None);
        assert_eq!(lookup(DOCUMENT, "missing", "api_key"), None);
        assert_eq!(lookup(DOCUMENT, "settings", "missing"), None);
    }

    #[test]
    fn test_lookup_splits_on_first_equals_and_unescapes() {
        let document = "[s]\nurl = https://a.com/?x=1\nlist = a\\nb\n";
        assert_eq!(lookup(document, "s", "url").as_deref(), Some("https://a.com/?x=1"));
        assert_eq!(lookup(document, "s", "list").as_deref(), Some("a\nb"));
    }

    #[test]
    fn test_lookup_first_duplicate_wins() {
        let document = "[s]\nkey = first\nkey = second\n";
        assert_eq!(lookup(document, "s", "key").as_deref(), Some("first"));
    }

    #[test]
    fn test_rewrite_missing_file() {
        assert_eq!(rewrite(None, "s", "key", "value"), "[s]\nkey = value");
    }

    #[test]
    fn test_rewrite_empty_file() {
        assert_eq!(rewrite(Some(""), "s", "key", "value"), "[s]\nkey = value");
    }

    #[test]
    fn test_rewrite_replaces_in_place() {
        let result = rewrite(Some(DOCUMENT), "settings", "debug", "true");
        assert_eq!(
            result,
            "[settings]\napi_key = abc\ndebug = true\n\n[properties]\nfilter_type = denylist\n"
        );
    }

    #[test]
    fn test_rewrite_inserts_before_next_section() {
        let result = rewrite(Some(DOCUMENT), "settings", "proxy", "none");
        assert_eq!(
            result,
            "[settings]\napi_key = abc\ndebug = false\n\nproxy = none\n[properties]\nfilter_type = denylist\n"
        );
    }

    #[test]
    fn test_rewrite_appends_to_last_section() {
        let result = rewrite(Some(DOCUMENT), "properties", "denylist", "x");
        assert_eq!(
            result,
            "[settings]\napi_key = abc\ndebug = false\n\n[properties]\nfilter_type = denylist\ndenylist = x\n"
        );
    }

    #[test]
    fn test_rewrite_creates_section_at_end() {
        let result = rewrite(Some(DOCUMENT), "monitoring", "is_/bin/a_monitored", "True");
        assert!(result.starts_with(DOCUMENT.trim_end_matches('\n')));
        assert!(result.ends_with("[monitoring]\nis_/bin/a_monitored = True\n"));
        assert_eq!(
            lookup(&result, "monitoring", "is_/bin/a_monitored").as_deref(),
            Some("True")
        );
    }

    #[test]
    fn test_rewrite_only_touches_first_duplicate() {
        let document = "[s]\nkey = one\nkey = two\n[t]\nkey = three";
        let result = rewrite(Some(document), "s", "key", "new");
        assert_eq!(result, "[s]\nkey = new\nkey = two\n[t]\nkey = three");
        assert_eq!(lookup(&result, "s", "key").as_deref(), Some("new"));
        assert_eq!(lookup(&result, "t", "key").as_deref(), Some("three"));
    }

    #[test]
    fn test_rewrite_escapes_newlines() {
        let result = rewrite(None, "s", "list", "^a\\.com/\n^b\\.com/");
        assert_eq!(result, "[s]\nlist = ^a\\.com/\\n^b\\.com/");
        assert_eq!(
            lookup(&result, "s", "list").as_deref(),
            Some("^a\\.com/\n^b\\.com/")
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        for (section, key) in [("settings", "debug"), ("settings", "new"), ("fresh", "key")] {
            let once = rewrite(Some(DOCUMENT), section, key, "a=b\nc");
            let twice = rewrite(Some(&once), section, key, "a=b\nc");
            assert_eq!(once, twice);
            assert_eq!(lookup(&twice, section, key).as_deref(), Some("a=b\nc"));
        }
    }

    #[test]
    fn test_rewrite_keeps_unrelated_lines_verbatim() {
        let document = "; comment\n[settings]\n  weird line without equals\napi_key=raw\n";
        let result = rewrite(Some(document), "other", "key", "v");
        assert_eq!(
            result,
            "; comment\n[settings]\n  weird line without equals\napi_key=raw\n[other]\nkey = v\n"
        );
    }
}
