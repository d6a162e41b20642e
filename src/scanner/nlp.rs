//! Optional named-entity recognition pass. No NER model ships with this
//! crate — [`UnavailableNlpBackend`] is the only implementation, always
//! returning an empty result set, the same posture the source takes when
//! the optional NLP dependency fails to import. Anyone who wants real NER
//! can implement [`NlpBackend`] against a model of their choosing and hand
//! it to the scanner; nothing else in this module needs to change.

use crate::types::ScanResult;

/// Minimum confidence an entity must carry before it's emitted at all.
pub const EMIT_THRESHOLD: f64 = 0.60;

/// Entity kinds the resolver that consumes this pass knows how to map onto
/// [`crate::types::DataFamily`]. Kept here so a real backend and the
/// orchestrator agree on vocabulary without depending on a specific model's
/// label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Money,
    Date,
}

/// One entity as reported by a backend, before family/confidence mapping.
pub struct RawEntity {
    pub text: String,
    pub kind: EntityKind,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

/// Pluggable NER backend. The scanner calls `recognize` once per scan and
/// folds whatever comes back into the rest of its results; an empty `Vec`
/// is always a valid, non-error answer.
pub trait NlpBackend: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<RawEntity>;
    fn is_available(&self) -> bool;
}

/// Default backend: no model loaded, nothing detected. This is what every
/// scanner uses unless a caller explicitly wires in a real backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableNlpBackend;

impl NlpBackend for UnavailableNlpBackend {
    fn recognize(&self, _text: &str) -> Vec<RawEntity> {
        Vec::new()
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Map a backend's raw entities into scan results, applying the emit
/// threshold and a small confidence boost for entities sitting near a
/// relevant keyword (`_BOOST_KEYWORDS` in the source).
pub fn scan(text: &str, backend: &dyn NlpBackend) -> Vec<ScanResult> {
    use crate::types::{AlertLevel, DataFamily, Span};

    const BOOST_KEYWORDS: &[&str] = &["patient", "customer", "client", "employee", "applicant"];
    // Entities of these kinds are too noisy standalone; only emit them when
    // a boost keyword is nearby.
    const SKIP_WITHOUT_CONTEXT: &[EntityKind] = &[EntityKind::Organization, EntityKind::Location];

    if !backend.is_available() {
        return Vec::new();
    }

    let lower = text.to_lowercase();
    let mut results = Vec::new();
    for entity in backend.recognize(text) {
        let window_start = entity.start.saturating_sub(120);
        let window_end = (entity.end + 120).min(text.len());
        let has_context = lower
            .get(window_start..window_end)
            .map(|w| BOOST_KEYWORDS.iter().any(|kw| w.contains(kw)))
            .unwrap_or(false);

        if SKIP_WITHOUT_CONTEXT.contains(&entity.kind) && !has_context {
            continue;
        }

        let mut confidence = entity.score;
        if has_context {
            confidence = (confidence + 0.15).min(1.0);
        }
        if confidence < EMIT_THRESHOLD {
            continue;
        }

        let (data_type, family) = match entity.kind {
            EntityKind::Person => ("PERSON_NAME", DataFamily::Pii),
            EntityKind::Organization => ("ORGANIZATION", DataFamily::Business),
            EntityKind::Location => ("LOCATION", DataFamily::Pii),
            EntityKind::Money => ("MONETARY_AMOUNT", DataFamily::Financial),
            EntityKind::Date => ("DATE_MENTION", DataFamily::Pii),
        };

        results.push(ScanResult::new(
            entity.text,
            data_type,
            family,
            Some(Span { start: entity.start, end: entity.end }),
            confidence,
            AlertLevel::Medium,
            "NLP",
        ));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_backend_reports_unavailable_and_empty() {
        let backend = UnavailableNlpBackend;
        assert!(!backend.is_available());
        assert!(backend.recognize("Jane Doe works here").is_empty());
    }

    #[test]
    fn scan_with_unavailable_backend_returns_empty() {
        let backend = UnavailableNlpBackend;
        assert!(scan("Jane Doe works here", &backend).is_empty());
    }

    struct StubBackend(Vec<RawEntity>);
    impl NlpBackend for StubBackend {
        fn recognize(&self, _text: &str) -> Vec<RawEntity> {
            self.0
                .iter()
                .map(|e| RawEntity {
                    text: e.text.clone(),
                    kind: e.kind,
                    start: e.start,
                    end: e.end,
                    score: e.score,
                })
                .collect()
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn organization_without_context_is_skipped() {
        let backend = StubBackend(vec![RawEntity {
            text: "Acme Corp".into(),
            kind: EntityKind::Organization,
            start: 0,
            end: 9,
            score: 0.80,
        }]);
        let text = "Acme Corp announced quarterly earnings.";
        assert!(scan(text, &backend).is_empty());
    }

    #[test]
    fn person_below_threshold_is_skipped() {
        let backend = StubBackend(vec![RawEntity {
            text: "Jane".into(),
            kind: EntityKind::Person,
            start: 0,
            end: 4,
            score: 0.40,
        }]);
        assert!(scan("Jane said hello", &backend).is_empty());
    }
}
