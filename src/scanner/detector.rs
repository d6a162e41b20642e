//! Runs the compiled pattern table against text, applying the sensitivity
//! pre-filter, validator confidence adjustment, and per-engine
//! deduplication — the Rust shape of the original pattern-matching loop.

use crate::types::{ScanResult, Span};

use super::patterns::{sensitivity_threshold, COMPILED_PATTERNS};

/// Scan `text` for every pattern in the registry whose family is enabled,
/// at the given sensitivity.
pub fn scan(text: &str, sensitivity: &str, enabled: impl Fn(crate::types::DataFamily) -> bool) -> Vec<ScanResult> {
    let threshold = sensitivity_threshold(sensitivity);
    let mut results = Vec::new();

    for compiled in COMPILED_PATTERNS.iter() {
        let spec = compiled.spec;
        if !enabled(spec.family) {
            continue;
        }
        if spec.base_confidence < threshold {
            continue;
        }

        for captures in compiled.regex.captures_iter(text) {
            let whole = captures.get(0).unwrap();
            // Prefer the first capturing group, exactly as the source's
            // `match.group(1) if match.lastindex else match.group(0)` does —
            // except AADHAAR, which is defined with a single group spanning
            // the whole payload precisely so this extraction can't truncate
            // the digits the validator needs.
            let matched = captures.get(1).unwrap_or(whole);
            let value = matched.as_str().trim();
            if value.is_empty() {
                continue;
            }

            let mut confidence = spec.base_confidence;
            if let Some(validator) = spec.validator {
                if validator.validate(value) {
                    confidence = (spec.base_confidence + 0.15).min(1.0);
                } else {
                    confidence = spec.base_confidence * 0.3;
                    // A failed checksum is still worth surfacing at paranoid
                    // sensitivity, deliberately reduced in confidence rather
                    // than dropped — paranoid means "show me even the
                    // probably-invalid ones".
                    if confidence < threshold && sensitivity != "paranoid" {
                        continue;
                    }
                }
            }

            let snippet_start = whole.start().saturating_sub(40);
            let snippet_end = (whole.end() + 40).min(text.len());
            let snippet = text[snippet_start..snippet_end].replace(['\n', '\r'], " ");

            results.push(
                ScanResult::new(
                    value.to_string(),
                    spec.type_name,
                    spec.family,
                    Some(Span { start: whole.start(), end: whole.end() }),
                    confidence,
                    spec.alert_level,
                    "PATTERN",
                )
                .with_context_snippet(snippet),
            );
        }
    }

    deduplicate(results)
}

/// Two-phase deduplication, applied at every engine boundary:
/// 1. Group by exact value, keep the highest-confidence occurrence.
/// 2. Sort by `(start, -confidence)` and greedily discard overlaps.
pub fn deduplicate(mut results: Vec<ScanResult>) -> Vec<ScanResult> {
    use std::collections::HashMap;

    let mut best_by_value: HashMap<String, usize> = HashMap::new();
    let mut keep = vec![true; results.len()];
    for (i, r) in results.iter().enumerate() {
        match best_by_value.get(&r.value) {
            Some(&existing) if results[existing].confidence >= r.confidence => {
                keep[i] = false;
            }
            Some(&existing) => {
                keep[existing] = false;
                best_by_value.insert(r.value.clone(), i);
            }
            None => {
                best_by_value.insert(r.value.clone(), i);
            }
        }
    }

    let mut survivors: Vec<ScanResult> = results
        .drain(..)
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(_, r)| r)
        .collect();

    survivors.sort_by(|a, b| {
        let a_start = a.position.map(|p| p.start).unwrap_or(0);
        let b_start = b.position.map(|p| p.start).unwrap_or(0);
        a_start
            .cmp(&b_start)
            .then(b.confidence.partial_cmp(&a.confidence).unwrap())
    });

    let mut final_results = Vec::with_capacity(survivors.len());
    let mut last_end: Option<usize> = None;
    for r in survivors {
        let start = r.position.map(|p| p.start);
        let end = r.position.map(|p| p.end);
        if let (Some(start), Some(last)) = (start, last_end) {
            if start < last {
                continue;
            }
        }
        last_end = end.or(last_end);
        final_results.push(r);
    }

    final_results
}
