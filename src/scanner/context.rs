//! Context-driven detection: a boost pass that raises confidence for
//! pattern hits sitting near a sensitive keyword, plus two independent
//! extraction passes — structured `key = value` pairs and natural-language
//! credential mentions — that pattern matching alone would miss.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AlertLevel, DataFamily, ScanResult, Span};

const SENSITIVE_KEYWORDS: &[&str] = &[
    "password", "passwd", "pwd", "secret", "token", "key", "credential",
    "auth", "apikey", "api_key", "private", "confidential", "ssn", "aadhaar",
    "account", "pin", "cvv",
];

/// Raise confidence (capped) for any pattern-engine result sitting within
/// 80 chars of a sensitive keyword, appending `+CONTEXT` to its strategy
/// label so callers can tell a boosted hit from a bare one.
pub fn boost(text: &str, results: &mut [ScanResult]) {
    let lower = text.to_lowercase();
    for r in results.iter_mut() {
        let Some(pos) = r.position else { continue };
        let window_start = pos.start.saturating_sub(80);
        let window_end = (pos.end + 80).min(text.len());
        let Some(window) = lower.get(window_start..window_end) else { continue };
        if SENSITIVE_KEYWORDS.iter().any(|kw| window.contains(kw)) {
            r.confidence = (r.confidence + 0.12).min(1.0);
            r.strategy = format!("{}+CONTEXT", r.strategy);
        }
    }
}

/// Field/variable-name keywords that make a `key = value` assignment worth
/// extracting independently of whether any pattern already matched it.
const SENSITIVE_FIELD_WORDS: &[&str] = &[
    "password", "passwd", "pwd", "secret", "api_key", "apikey",
    "token", "auth", "credential", "private_key", "privatekey",
    "access_key", "accesskey", "bearer", "oauth", "jwt",
    "aadhaar", "aadhar", "pan", "passport", "phone", "mobile",
    "email", "address", "dob", "birth", "ssn", "npi",
    "credit_card", "card_number", "cvv", "cvc", "bank",
    "account_number", "ifsc", "swift", "routing",
    "db_password", "database_url", "database_password",
    "redis_url", "connection_string", "dsn",
];

static FIELD_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)\b({})\b", SENSITIVE_FIELD_WORDS.join("|"));
    Regex::new(&pattern).unwrap()
});

/// `key = value` / `key: value` / `key := value` / `key => value`
/// assignments, independent of the pattern engine: catches secrets with no
/// recognizable shape at all, as long as the key name is sensitive.
static ASSIGNMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?P<key>[A-Za-z_][A-Za-z0-9_]{1,60})\s*(?:=|:=?|=>)\s*["'`]?(?P<value>[^\s"'`\n,;)(]{4,})["'`]?"#).unwrap());

/// Infer `(family, alert_level)` from a field name's semantics, the way a
/// human would guess what kind of secret a variable named `bank_account` or
/// `aadhaar_number` holds.
fn infer_family_from_key(key: &str) -> (DataFamily, AlertLevel) {
    let key_lower = key.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| key_lower.contains(w));
    if contains_any(&["api", "token", "secret", "password", "credential", "bearer", "oauth", "jwt", "key"]) {
        (DataFamily::Secrets, AlertLevel::Critical)
    } else if contains_any(&["card", "cvv", "bank", "account", "ifsc", "swift"]) {
        (DataFamily::Financial, AlertLevel::Critical)
    } else if contains_any(&["db", "database", "redis", "host", "dsn", "connection"]) {
        (DataFamily::Infra, AlertLevel::Critical)
    } else if contains_any(&["aadhaar", "aadhar", "pan", "phone", "email", "address", "passport"]) {
        (DataFamily::Pii, AlertLevel::High)
    } else {
        (DataFamily::Secrets, AlertLevel::High)
    }
}

/// Best-guess type label from a field name.
fn infer_type_from_key(key: &str) -> &'static str {
    const MAPPING: &[(&str, &str)] = &[
        ("password", "GENERIC_PASSWORD"),
        ("passwd", "GENERIC_PASSWORD"),
        ("pwd", "GENERIC_PASSWORD"),
        ("api_key", "UNKNOWN_API_KEY"),
        ("apikey", "UNKNOWN_API_KEY"),
        ("token", "UNKNOWN_TOKEN"),
        ("secret", "UNKNOWN_SECRET"),
        ("email", "EMAIL"),
        ("phone", "PHONE"),
        ("aadhaar", "AADHAAR"),
        ("pan", "PAN"),
    ];
    let key_lower = key.to_lowercase();
    for (fragment, label) in MAPPING {
        if key_lower.contains(fragment) {
            return label;
        }
    }
    "SENSITIVE_FIELD_VALUE"
}

pub fn extract_key_value(text: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();
    for captures in ASSIGNMENT_RE.captures_iter(text) {
        let key = captures.name("key").unwrap().as_str();
        if !FIELD_KEYWORD_RE.is_match(key) {
            continue;
        }
        let value_match = captures.name("value").unwrap();
        let value = value_match.as_str().trim_matches(|c| c == '"' || c == '\'' || c == '`');
        if value.len() < 4 {
            continue;
        }

        let (family, alert_level) = infer_family_from_key(key);
        let snippet_start = value_match.start().saturating_sub(40);
        let snippet_end = (value_match.end() + 40).min(text.len());
        let snippet = text[snippet_start..snippet_end].replace(['\n', '\r'], " ");

        results.push(
            ScanResult::new(
                value.to_string(),
                infer_type_from_key(key),
                family,
                Some(Span { start: value_match.start(), end: value_match.end() }),
                0.78,
                alert_level,
                "CONTEXT",
            )
            .with_field_name(key.to_string())
            .with_context_snippet(snippet),
        );
    }
    results
}

/// Does `value` look like a password rather than an ordinary word: at least
/// two of {digit, uppercase, lowercase, special char} and length >= 4.
fn looks_like_a_password(value: &str) -> bool {
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_special = value.chars().any(|c| !c.is_ascii_alphanumeric());
    let categories = [has_digit, has_upper, has_lower, has_special].into_iter().filter(|&b| b).count();
    categories >= 2 && value.len() >= 4
}

static CONNECT_TO_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bconnect(?:ing)?\s+to\s+([A-Za-z0-9_.-]+(?::\d{2,5})?)\s+using\s+([A-Za-z0-9_.@+-]+)\s+and\s+([^\s.,;!?]{4,200})").unwrap()
});

static WITH_USER_AND_PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwith\s+user\s+([A-Za-z0-9_.@+-]+)\s+and\s+password\s+([^\s.,;!?]{4,200})").unwrap());

static CREDENTIALS_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcredentials?:\s*([A-Za-z0-9_.@+-]+)\s*/\s*([^\s.,;!?]{4,200})").unwrap());

static BARE_HOST_PORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:connect|login|log in|ssh|access)\s+(?:to\s+)?([A-Za-z0-9_.-]+:\d{2,5})\b").unwrap());

static GENERIC_USING_AND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\busing\s+([A-Za-z0-9_.@+-]+)\s+and\s+([^\s.,;!?]{4,200})").unwrap());

fn push(results: &mut Vec<ScanResult>, whole: Span, value: &str, data_type: &str, family: DataFamily) {
    results.push(ScanResult::new(value.to_string(), data_type, family, Some(whole), 0.75, AlertLevel::Critical, "CONTEXT-NL"));
}

/// Natural-language credential mentions: sentence shapes a pattern or
/// key=value extractor wouldn't catch because there's no `=` or `:` in
/// sight — just prose describing how to connect to something.
pub fn extract_natural_language(text: &str) -> Vec<ScanResult> {
    let mut results = Vec::new();

    for captures in CONNECT_TO_HOST_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let span = Span { start: whole.start(), end: whole.end() };
        push(&mut results, span, captures.get(1).unwrap().as_str(), "CONTEXT_HOST", DataFamily::Infra);
        push(&mut results, span, captures.get(2).unwrap().as_str(), "CONTEXT_USERNAME", DataFamily::Secrets);
        push(&mut results, span, captures.get(3).unwrap().as_str(), "CONTEXT_PASSWORD", DataFamily::Secrets);
    }

    for captures in WITH_USER_AND_PASSWORD_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let span = Span { start: whole.start(), end: whole.end() };
        push(&mut results, span, captures.get(1).unwrap().as_str(), "CONTEXT_USERNAME", DataFamily::Secrets);
        push(&mut results, span, captures.get(2).unwrap().as_str(), "CONTEXT_PASSWORD", DataFamily::Secrets);
    }

    for captures in CREDENTIALS_SLASH_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let span = Span { start: whole.start(), end: whole.end() };
        push(&mut results, span, captures.get(1).unwrap().as_str(), "CONTEXT_USERNAME", DataFamily::Secrets);
        push(&mut results, span, captures.get(2).unwrap().as_str(), "CONTEXT_PASSWORD", DataFamily::Secrets);
    }

    for captures in BARE_HOST_PORT_RE.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let host = captures.get(1).unwrap();
        push(&mut results, Span { start: host.start(), end: host.end() }, host.as_str(), "CONTEXT_HOST", DataFamily::Infra);
        let _ = whole;
    }

    for captures in GENERIC_USING_AND_RE.captures_iter(text) {
        let password = captures.get(2).unwrap().as_str();
        if !looks_like_a_password(password) {
            continue;
        }
        let whole = captures.get(0).unwrap();
        let span = Span { start: whole.start(), end: whole.end() };
        push(&mut results, span, captures.get(1).unwrap().as_str(), "CONTEXT_USERNAME", DataFamily::Secrets);
        push(&mut results, span, password, "CONTEXT_PASSWORD", DataFamily::Secrets);
    }

    results
}
