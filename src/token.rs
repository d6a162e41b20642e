//! Generates and recognizes the `⟨TKN_{TYPE}_{HEX}⟩` tokens that replace
//! real values in protected content. Tokens carry their data type in the
//! clear (useful for downstream routing/metrics) but never the value
//! itself — the hex suffix is random, not derived from the secret.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

const OPEN: char = '\u{27E8}';
const CLOSE: char = '\u{27E9}';

/// Matches any well-formed token: `⟨TKN_{TYPE}_{8 hex digits}⟩`.
pub static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x{27E8}TKN_([A-Z0-9_]+)_([0-9A-F]{8})\x{27E9}").unwrap());

/// A parsed token: its data type label and hex suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub data_type: String,
    pub suffix: String,
}

/// Sanitize a data type label for embedding in a token: uppercase,
/// non-alphanumeric runs collapsed to `_`, trimmed to 40 chars so a
/// pathological type name can't produce an unbounded token.
fn sanitize_type(data_type: &str) -> String {
    let mut out = String::new();
    let mut last_was_sep = false;
    for ch in data_type.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out.truncate(40);
    if out.is_empty() {
        "UNKNOWN".to_string()
    } else {
        out
    }
}

/// Generate a fresh token for `data_type`. The suffix is 4 random bytes,
/// hex-encoded and uppercased, matching `secrets.token_hex(4).upper()` —
/// here drawn from a v4 UUID's own random bits rather than a separate RNG
/// dependency.
pub fn generate(data_type: &str) -> String {
    let sanitized = sanitize_type(data_type);
    let random = Uuid::new_v4();
    let suffix = random.simple().to_string()[..8].to_ascii_uppercase();
    format!("{OPEN}TKN_{sanitized}_{suffix}{CLOSE}")
}

/// Whether `candidate` is exactly one well-formed token and nothing else.
pub fn validate(candidate: &str) -> bool {
    match TOKEN_RE.find(candidate) {
        Some(m) => m.start() == 0 && m.end() == candidate.len(),
        None => false,
    }
}

/// Parse a single token string into its components.
pub fn parse(candidate: &str) -> Option<ParsedToken> {
    let captures = TOKEN_RE.captures(candidate)?;
    if captures.get(0)?.as_str() != candidate {
        return None;
    }
    Some(ParsedToken {
        data_type: captures.get(1)?.as_str().to_string(),
        suffix: captures.get(2)?.as_str().to_string(),
    })
}

/// Find every token occurring anywhere in `text`, in order.
pub fn find_all(text: &str) -> Vec<ParsedToken> {
    TOKEN_RE
        .captures_iter(text)
        .map(|c| ParsedToken {
            data_type: c.get(1).unwrap().as_str().to_string(),
            suffix: c.get(2).unwrap().as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_validates() {
        let token = generate("OPENAI_KEY");
        assert!(validate(&token));
        assert!(token.contains("TKN_OPENAI_KEY_"));
    }

    #[test]
    fn sanitizes_type_with_punctuation_and_lowercase() {
        let token = generate("some weird-type!!");
        assert!(token.contains("TKN_SOME_WEIRD_TYPE_"));
    }

    #[test]
    fn parse_roundtrips_generated_token() {
        let token = generate("AADHAAR");
        let parsed = parse(&token).unwrap();
        assert_eq!(parsed.data_type, "AADHAAR");
        assert_eq!(parsed.suffix.len(), 8);
    }

    #[test]
    fn find_all_locates_multiple_tokens_in_text() {
        let a = generate("AADHAAR");
        let b = generate("OPENAI_KEY");
        let text = format!("here is {a} and also {b} inline");
        let found = find_all(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].data_type, "AADHAAR");
        assert_eq!(found[1].data_type, "OPENAI_KEY");
    }

    #[test]
    fn validate_rejects_partial_or_malformed_tokens() {
        assert!(!validate("not a token"));
        assert!(!validate("TKN_AADHAAR_12345678"));
        let token = generate("PAN");
        assert!(!validate(&format!("prefix {token}")));
    }
}
