//! Multi-strategy scanning: pattern matching, entropy scoring, context
//! extraction, structured-fragment parsing, and optional NLP, orchestrated
//! by [`UniversalScanner`] in the same fixed order the source runs them so
//! later strategies can lean on earlier results (context boosting needs
//! pattern hits to already exist) before a final dedup pass.

pub mod context;
pub mod detector;
mod entropy;
pub mod nlp;
pub mod patterns;
pub mod structure;
pub mod validators;

use crate::types::{Content, DataFamily, FamilySet, ScanResult};
use nlp::{NlpBackend, UnavailableNlpBackend};

/// Config knobs the scanner needs, mirroring `scanner_config()`'s slice of
/// the overall gateway configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub families: FamilySet,
    pub sensitivity: String,
    pub safe_fields: Vec<String>,
    pub entropy_enabled: bool,
    pub entropy_threshold: f64,
    pub entropy_min_length: usize,
    pub entropy_max_length: usize,
    pub entropy_require_context: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            families: FamilySet::all(),
            sensitivity: "medium".to_string(),
            safe_fields: Vec::new(),
            entropy_enabled: true,
            entropy_threshold: 3.5,
            entropy_min_length: 16,
            entropy_max_length: 512,
            entropy_require_context: false,
        }
    }
}

/// Runs every detection strategy over text or structured content and
/// returns a single deduplicated, non-overlapping result set.
pub struct UniversalScanner {
    config: ScannerConfig,
    nlp_backend: Box<dyn NlpBackend>,
}

impl UniversalScanner {
    pub fn new(config: ScannerConfig) -> Self {
        UniversalScanner {
            config,
            nlp_backend: Box::new(UnavailableNlpBackend),
        }
    }

    /// Swap in a real NER backend. Scanners default to
    /// [`UnavailableNlpBackend`] and never require this call.
    pub fn with_nlp_backend(mut self, backend: Box<dyn NlpBackend>) -> Self {
        self.nlp_backend = backend;
        self
    }

    fn family_enabled(&self, family: DataFamily) -> bool {
        self.config.families.contains(family)
    }

    fn is_safe_field(&self, field_name: &str) -> bool {
        self.config.safe_fields.iter().any(|f| f.eq_ignore_ascii_case(field_name))
    }

    /// Scan a single string of free text, running every enabled strategy in
    /// order and deduplicating the combined result set.
    pub fn scan_text(&self, text: &str) -> Vec<ScanResult> {
        let mut results = detector::scan(text, &self.config.sensitivity, |f| self.family_enabled(f));

        if self.config.entropy_enabled && self.family_enabled(DataFamily::Secrets) {
            results.extend(entropy::scan(
                text,
                &self.config.sensitivity,
                self.config.entropy_threshold,
                self.config.entropy_min_length,
                self.config.entropy_max_length,
                self.config.entropy_require_context,
            ));
        }

        context::boost(text, &mut results);

        results.extend(context::extract_key_value(text).into_iter().filter(|r| self.family_enabled(r.family)));
        results.extend(context::extract_natural_language(text).into_iter().filter(|r| self.family_enabled(r.family)));

        if self.family_enabled(DataFamily::Secrets) {
            results.extend(structure::scan(text));
        }

        if self.nlp_backend.is_available() {
            results.extend(nlp::scan(text, self.nlp_backend.as_ref()));
        }

        detector::deduplicate(results)
    }

    /// Scan [`Content`], recursing into lists and maps the way the source's
    /// scanner walks a `str | dict` union — string leaves are scanned
    /// directly, map keys become each hit's `field_name`. Keys matching the
    /// configured safe-field allowlist (case-insensitive) are skipped
    /// entirely, along with whatever they contain.
    pub fn scan_content(&self, content: &Content) -> Vec<ScanResult> {
        match content {
            Content::Text(s) => self.scan_text(s),
            Content::List(items) => items.iter().flat_map(|c| self.scan_content(c)).collect(),
            Content::Map(map) => {
                let mut results = Vec::new();
                for (key, value) in map {
                    if self.is_safe_field(key) {
                        continue;
                    }
                    results.extend(self.scan_content(value).into_iter().map(|r| r.with_field_name(key.clone())));
                }
                results
            }
            Content::Other(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_text_for_secrets() {
        let scanner = UniversalScanner::new(ScannerConfig::default());
        let results = scanner.scan_text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        assert!(results.iter().any(|r| r.data_type == "OPENAI_KEY"));
    }

    #[test]
    fn disabled_family_is_never_scanned() {
        let mut config = ScannerConfig::default();
        config.families = FamilySet::from_families([DataFamily::Pii]);
        let scanner = UniversalScanner::new(config);
        let results = scanner.scan_text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        assert!(results.is_empty());
    }

    #[test]
    fn safe_field_is_skipped_case_insensitively() {
        use std::collections::BTreeMap;
        let mut config = ScannerConfig::default();
        config.safe_fields = vec!["Example_Key".to_string()];
        let mut map = BTreeMap::new();
        map.insert(
            "example_key".to_string(),
            Content::text("sk-proj-abcdefghijklmnopqrstuvwxyz0123456789"),
        );
        let scanner = UniversalScanner::new(config);
        let results = scanner.scan_content(&Content::Map(map));
        assert!(results.is_empty());
    }

    #[test]
    fn scans_nested_map_content_and_tags_field_name() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(
            "api_key".to_string(),
            Content::text("sk-proj-abcdefghijklmnopqrstuvwxyz0123456789"),
        );
        let content = Content::Map(map);
        let scanner = UniversalScanner::new(ScannerConfig::default());
        let results = scanner.scan_content(&content);
        assert!(results.iter().any(|r| r.field_name.as_deref() == Some("api_key")));
    }
}
