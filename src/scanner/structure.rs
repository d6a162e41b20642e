//! Structured-fragment detection: `.env` lines, embedded JSON blocks, and
//! YAML `key: value` lines whose key name alone signals a secret, without
//! regard to the value's shape. This is the family of checks that catches
//! `SOME_RANDOM_VAR=plaintext` style leaks that no pattern or entropy check
//! would otherwise flag.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AlertLevel, DataFamily, ScanResult, Span};

const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "password", "passwd", "pwd", "secret", "key", "token", "auth", "credential",
    "private", "bearer", "api", "access", "aadhaar", "aadhar", "pan", "phone", "email",
    "card", "cvv", "bank", "account", "ifsc", "swift", "db", "database", "redis", "host", "dsn",
];

fn key_looks_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEY_FRAGMENTS.iter().any(|frag| lower.contains(frag))
}

/// Environment-variable-shaped lines: an uppercase identifier, up to 61
/// chars, with no whitespace around the `=`.
static ENV_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Z][A-Z0-9_]{1,60})=(.+?)\s*$").unwrap());

/// `.env`-style `KEY=value` lines where the key name is sensitive.
pub fn scan_env(text: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    for captures in ENV_LINE_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let key = captures.get(1).unwrap().as_str();
        let value = captures.get(2).unwrap().as_str().trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() || value.starts_with('#') || !key_looks_sensitive(key) {
            continue;
        }
        results.push(
            ScanResult::new(
                value.to_string(),
                "STRUCTURED_SECRET",
                DataFamily::Secrets,
                Some(Span { start: whole.start(), end: whole.end() }),
                0.72,
                AlertLevel::Critical,
                "STRUCTURE",
            )
            .with_field_name(key.to_string()),
        );
    }
    results
}

/// Balanced `{...}` blocks between 20 and 2000 chars — wide enough to catch
/// a pasted JSON fragment, narrow enough not to swallow unrelated braces.
static JSON_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]{20,2000}\}").unwrap());

/// YAML-shaped `key: value` lines: a lowercase identifier, up to 61 chars,
/// a colon, required whitespace, then a value of at least 4 chars.
static YAML_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^[ \t]*([a-z_][a-z0-9_]{1,60}):\s+([^\n]{4,})$").unwrap());

/// Recursively flatten a JSON value into `(path, value_as_string)` pairs,
/// the way the source's `_flatten()` walks nested objects before checking
/// key names.
fn flatten_json(value: &serde_json::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let path = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten_json(v, &path, out);
            }
        }
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        serde_json::Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
        serde_json::Value::Bool(b) => out.push((prefix.to_string(), b.to_string())),
        _ => {}
    }
}

/// Embedded `{...}` JSON fragments within free text, flattened and checked
/// for sensitive key names.
pub fn scan_json(text: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    for m in JSON_BLOCK_RE.find_iter(text) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) else {
            continue;
        };
        let mut flattened = Vec::new();
        flatten_json(&value, "", &mut flattened);
        for (path, field_value) in flattened {
            let leaf = path.rsplit('.').next().unwrap_or(&path);
            if !key_looks_sensitive(leaf) || field_value.is_empty() {
                continue;
            }
            results.push(
                ScanResult::new(
                    field_value,
                    "STRUCTURED_SECRET",
                    DataFamily::Secrets,
                    Some(Span { start: m.start(), end: m.end() }),
                    0.72,
                    AlertLevel::Critical,
                    "STRUCTURE",
                )
                .with_field_name(path),
            );
        }
    }
    results
}

/// YAML-style `key: value` lines (not full YAML parsing — a line-oriented
/// heuristic matching the same shape the source's structure engine uses).
pub fn scan_yaml(text: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    for captures in YAML_LINE_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let key = captures.get(1).unwrap().as_str();
        let value = captures.get(2).unwrap().as_str().trim();
        if value.is_empty() || !key_looks_sensitive(key) {
            continue;
        }
        results.push(
            ScanResult::new(
                value.to_string(),
                "STRUCTURED_SECRET",
                DataFamily::Secrets,
                Some(Span { start: whole.start(), end: whole.end() }),
                0.72,
                AlertLevel::Critical,
                "STRUCTURE",
            )
            .with_field_name(key.to_string()),
        );
    }
    results
}

/// Run all three structured extractors.
pub fn scan(text: &str) -> Vec<ScanResult> {
    let mut results = scan_env(text);
    results.extend(scan_json(text));
    results.extend(scan_yaml(text));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_line_with_sensitive_key_is_flagged() {
        let text = "DATABASE_PASSWORD=correcthorsebatterystaple\nPORT=8080";
        let results = scan_env(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, "correcthorsebatterystaple");
    }

    #[test]
    fn env_line_with_benign_key_is_ignored() {
        let text = "PORT=8080\nLOG_LEVEL=debug";
        assert!(scan_env(text).is_empty());
    }

    #[test]
    fn flattens_nested_json_and_flags_sensitive_leaf() {
        let text = r#"config: {"db": {"api_key": "abcd1234efgh"}}"#;
        let results = scan_json(text);
        assert!(results.iter().any(|r| r.value == "abcd1234efgh"));
    }

    #[test]
    fn yaml_line_with_sensitive_key_is_flagged() {
        let text = "service:\n  secret_token: abcde12345\n  port: 9090";
        let results = scan_yaml(text);
        assert!(results.iter().any(|r| r.value == "abcde12345"));
    }
}
