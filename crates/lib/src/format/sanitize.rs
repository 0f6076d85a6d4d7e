//! Redaction of local paths and token-like strings from question text.

use regex::Regex;
use std::sync::OnceLock;

/// A compiled redaction rule.
struct RedactionRule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules() -> &'static [RedactionRule] {
    static RULES: OnceLock<Vec<RedactionRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        // ASCII word classes and boundaries: accented letters never extend a match.
        [
            // Windows paths: C:\Users\me\project
            (r"(?i-u)[A-Z]:\\[\w\\\-.]+", "[PATH]"),
            // Unix paths: /home/me/project/file.rs
            (r"(?-u)/[\w/\-.]+", "[PATH]"),
            // API keys and other long alphanumeric tokens.
            (r"(?-u)\b[A-Za-z0-9]{32,}\b", "[REDACTED]"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(pattern) => Some(RedactionRule {
                pattern,
                replacement,
            }),
            Err(e) => {
                log::warn!("invalid redaction pattern {}: {}", pattern, e);
                None
            }
        })
        .collect()
    })
}

/// Replace path-like substrings with `[PATH]` and long token-like runs with `[REDACTED]`.
/// Applying it twice gives the same result as applying it once.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();
    for rule in rules() {
        result = rule
            .pattern
            .replace_all(&result, rule.replacement)
            .into_owned();
    }
    result
}
