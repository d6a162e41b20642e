//! Shannon-entropy scoring: catches high-entropy tokens (API keys, random
//! secrets) that don't match any known pattern shape.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AlertLevel, DataFamily, ScanResult, Span};

/// Candidate runs: base64/hex-ish alphabets, 16-512 chars long.
static CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/=_\-.]{16,512}").unwrap());

/// Words near a high-entropy run that raise confidence it's a real secret.
const CONTEXT_WORDS: &[&str] = &[
    "key", "secret", "token", "password", "passwd", "pwd", "credential", "auth",
    "apikey", "api_key", "access", "private", "signature", "hash",
];

/// Sensitivity-adjusted entropy floor, applied on top of the configured base
/// threshold: `low` tolerates only very high entropy, `paranoid` flags
/// anything mildly random-looking.
fn entropy_threshold(base_threshold: f64, sensitivity: &str) -> f64 {
    let adjustment = match sensitivity {
        "low" => 0.7,
        "high" => -0.3,
        "paranoid" => -0.5,
        _ => 0.0, // medium
    };
    base_threshold + adjustment
}

/// Shannon entropy of `s`, in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts = [0u32; 256];
    let mut len = 0u32;
    for byte in s.bytes() {
        counts[byte as usize] += 1;
        len += 1;
    }
    let len = len as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Scan for high-entropy runs. `base_threshold` is the configured entropy
/// floor before sensitivity adjustment (default 3.5).
pub fn scan(text: &str, sensitivity: &str, base_threshold: f64, min_length: usize, max_length: usize, require_context: bool) -> Vec<ScanResult> {
    let entropy_floor = entropy_threshold(base_threshold, sensitivity);
    let lower = text.to_lowercase();
    let mut results = Vec::new();
    let mut seen_values = std::collections::HashSet::new();

    for m in CANDIDATE_RE.find_iter(text) {
        let value = m.as_str();
        if value.len() < min_length || value.len() > max_length {
            continue;
        }

        let entropy = shannon_entropy(value);
        if entropy < entropy_floor {
            continue;
        }

        if require_context {
            let window_start = m.start().saturating_sub(100);
            let window_end = (m.end() + 100).min(text.len());
            let context_window = &lower[window_start..window_end];
            if !CONTEXT_WORDS.iter().any(|w| context_window.contains(w)) {
                continue;
            }
        }

        if !seen_values.insert(value.to_string()) {
            continue;
        }

        let confidence = (0.45 + (entropy - 3.0) * 0.15).min(0.95);

        let snippet_start = m.start().saturating_sub(40);
        let snippet_end = (m.end() + 40).min(text.len());
        let snippet = text[snippet_start..snippet_end].replace(['\n', '\r'], " ");

        results.push(
            ScanResult::new(
                value.to_string(),
                "UNKNOWN_SECRET",
                DataFamily::Secrets,
                Some(Span { start: m.start(), end: m.end() }),
                confidence,
                AlertLevel::Critical,
                "ENTROPY",
            )
            .with_context_snippet(snippet),
        );
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_random_looking_token() {
        let text = "api_key: 9fK3mQ7zLpR2vXcT8hWbN4jY6sD1aE5g";
        let results = scan(text, "medium", 3.5, 16, 512, false);
        assert!(results.iter().any(|r| r.value.contains("9fK3mQ7zLpR2vXcT")));
        assert!(results.iter().all(|r| r.data_type == "UNKNOWN_SECRET" && r.alert_level == AlertLevel::Critical));
    }

    #[test]
    fn ignores_low_entropy_repeated_text() {
        let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let results = scan(text, "medium", 3.5, 16, 512, false);
        assert!(results.is_empty());
    }

    #[test]
    fn require_context_filters_out_contextless_matches() {
        let text = "9fK3mQ7zLpR2vXcT8hWbN4jY6sD1aE5gH0iJ";
        let without_context = scan(text, "medium", 3.5, 16, 512, false);
        let with_required_context = scan(text, "medium", 3.5, 16, 512, true);
        assert!(!without_context.is_empty());
        assert!(with_required_context.is_empty());
    }

    #[test]
    fn paranoid_sensitivity_lowers_the_effective_floor() {
        assert_eq!(entropy_threshold(3.5, "paranoid"), 3.0);
        assert_eq!(entropy_threshold(3.5, "low"), 4.2);
        assert_eq!(entropy_threshold(3.5, "medium"), 3.5);
    }

    #[test]
    fn shannon_entropy_of_empty_string_is_zero() {
        assert_eq!(shannon_entropy(""), 0.0);
    }
}
