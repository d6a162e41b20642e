//! Core data types shared across every component: the enums from
//! `DataFamily`/`AlertLevel`, the per-finding [`ScanResult`], audit and alert
//! records, and the [`Content`] union used for both `protect` input and
//! `restore` input/output.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity assigned to a detected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertLevel::Low => "LOW",
            AlertLevel::Medium => "MEDIUM",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

impl AlertLevel {
    /// Parse the canonical uppercase form used on the wire and in config.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Some(AlertLevel::Low),
            "MEDIUM" => Some(AlertLevel::Medium),
            "HIGH" => Some(AlertLevel::High),
            "CRITICAL" => Some(AlertLevel::Critical),
            _ => None,
        }
    }
}

/// Broad category used for filtering and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFamily {
    Pii,
    Secrets,
    Financial,
    Infra,
    Business,
}

impl fmt::Display for DataFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataFamily::Pii => "PII",
            DataFamily::Secrets => "SECRETS",
            DataFamily::Financial => "FINANCIAL",
            DataFamily::Infra => "INFRA",
            DataFamily::Business => "BUSINESS",
        };
        write!(f, "{s}")
    }
}

impl DataFamily {
    /// Parse the canonical uppercase form used on the wire and in config.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PII" => Some(DataFamily::Pii),
            "SECRETS" => Some(DataFamily::Secrets),
            "FINANCIAL" => Some(DataFamily::Financial),
            "INFRA" => Some(DataFamily::Infra),
            "BUSINESS" => Some(DataFamily::Business),
            _ => None,
        }
    }

    /// All five families, the scanner default.
    pub fn all() -> [DataFamily; 5] {
        [
            DataFamily::Pii,
            DataFamily::Secrets,
            DataFamily::Financial,
            DataFamily::Infra,
            DataFamily::Business,
        ]
    }
}

/// The set of families a scan pass should consider. Disabled families are
/// excluded at each engine's scan boundary, per the universal scanner's
/// family-filter rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySet(HashSet<DataFamily>);

impl FamilySet {
    /// All five families enabled — the default.
    pub fn all() -> Self {
        FamilySet(DataFamily::all().into_iter().collect())
    }

    /// Build from an explicit list of enabled families.
    pub fn from_families(families: impl IntoIterator<Item = DataFamily>) -> Self {
        FamilySet(families.into_iter().collect())
    }

    /// Whether `family` is enabled in this set.
    pub fn contains(&self, family: DataFamily) -> bool {
        self.0.contains(&family)
    }
}

impl Default for FamilySet {
    fn default() -> Self {
        FamilySet::all()
    }
}

/// Byte-offset span of a detected value within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One detected confidential substring, produced by a single detection
/// strategy and later merged/deduplicated by the universal scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// The exact substring that was detected.
    pub value: String,
    /// Narrow type label, e.g. `AADHAAR`, `OPENAI_KEY`.
    pub data_type: String,
    /// Broad family.
    pub family: DataFamily,
    /// Byte range in the source text; `None` for structured-field scans
    /// without a flat text position.
    pub position: Option<Span>,
    /// Detection confidence, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
    /// Severity.
    pub alert_level: AlertLevel,
    /// Which strategy produced this result (`PATTERN`, `ENTROPY`,
    /// `CONTEXT`, `CONTEXT-NL`, `STRUCTURE`, `NLP`), possibly with a
    /// `+CONTEXT` suffix applied by the context engine's boost pass.
    pub strategy: String,
    /// For structured/mapping input, the key under which the value was found.
    pub field_name: Option<String>,
    /// Display string: roughly ±40 chars of surrounding text.
    pub context_snippet: Option<String>,
}

impl ScanResult {
    /// Build a new result, clamping confidence into `[0.0, 1.0]` exactly as
    /// the originating dataclass does in its `__post_init__`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        value: impl Into<String>,
        data_type: impl Into<String>,
        family: DataFamily,
        position: Option<Span>,
        confidence: f64,
        alert_level: AlertLevel,
        strategy: impl Into<String>,
    ) -> Self {
        ScanResult {
            value: value.into(),
            data_type: data_type.into(),
            family,
            position,
            confidence: confidence.clamp(0.0, 1.0),
            alert_level,
            strategy: strategy.into(),
            field_name: None,
            context_snippet: None,
        }
    }

    /// Attach a field name (structured/mapping input).
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Attach a context snippet.
    pub fn with_context_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.context_snippet = Some(snippet.into());
        self
    }
}

/// Who is asking the vault for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    /// The code path holding the session id from the `protect` call.
    Owner,
    /// The internal token resolver.
    Resolver,
    /// The AI model itself (never allowed).
    Ai,
    /// An external integration (never allowed).
    External,
    /// No identified caller (never allowed).
    Anonymous,
    /// Anything else (never allowed).
    Other,
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Caller::Owner => "OWNER",
            Caller::Resolver => "RESOLVER",
            Caller::Ai => "AI",
            Caller::External => "EXTERNAL",
            Caller::Anonymous => "ANONYMOUS",
            Caller::Other => "OTHER",
        };
        write!(f, "{s}")
    }
}

/// One vault mutation or access attempt, independent of outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Store,
    Retrieve,
    Revoke,
    Purge,
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditOperation::Store => "store",
            AuditOperation::Retrieve => "retrieve",
            AuditOperation::Revoke => "revoke",
            AuditOperation::Purge => "purge",
        };
        write!(f, "{s}")
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Denied,
    Revoked,
    Expired,
    NotFound,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Denied => "denied",
            AuditOutcome::Revoked => "revoked",
            AuditOutcome::Expired => "expired",
            AuditOutcome::NotFound => "not_found",
        };
        write!(f, "{s}")
    }
}

/// One append-only audit log entry. Tokens and session ids are stored
/// pre-masked so the audit surface itself cannot leak identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    /// Masked token: first 16 characters + ellipsis.
    pub token_masked: String,
    /// Masked session id: first 12 characters + ellipsis.
    pub session_masked: String,
    pub caller: String,
    pub result: String,
    pub data_type: Option<String>,
    pub family: Option<String>,
    pub count: Option<usize>,
}

/// A CRITICAL-exposure notification, fired synchronously from the alert
/// engine on `store`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub severity: AlertLevel,
    pub data_type: String,
    pub family: DataFamily,
    pub token_masked: String,
    pub session_masked: String,
    pub message: String,
    pub recommendation: Option<String>,
}

/// Summary attached to a `protect` call: counts by family, the distinct
/// types seen, and the session/timestamp for convenience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub families: BTreeMap<String, usize>,
    pub types: Vec<String>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Either a plain string, a list, or a mapping from field name to nested
/// content. Generalizes the source's `str | dict` union: `List` supports
/// the resolver's "list-of-string elements of a mapping are resolved"
/// behavior, and `Other` passes non-string, non-container JSON scalars
/// through untouched (numbers, bools, null) since no detector scans them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    List(Vec<Content>),
    Map(BTreeMap<String, Content>),
    Other(serde_json::Value),
}

impl Content {
    /// Convenience constructor for the common plain-text case.
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// Borrow as a plain string, if this is the `Text` variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

/// Returned by [`crate::gateway::ConfidentialDataGateway::protect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectResult {
    /// Tokenized content — safe to send to any AI.
    pub safe_content: Content,
    /// Use this when calling `restore`.
    pub session_id: String,
    /// How many distinct confidential items were intercepted.
    pub items_vaulted: usize,
    /// Human-readable summary of what was found / vaulted.
    pub audit_summary: AuditSummary,
    /// CRITICAL alerts fired while vaulting.
    pub alerts: Vec<Alert>,
    /// Full list of scan results, for advanced callers.
    pub scan_results: Vec<ScanResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_result_clamps_confidence() {
        let r = ScanResult::new("x", "TEST", DataFamily::Pii, None, 1.4, AlertLevel::Low, "PATTERN");
        assert_eq!(r.confidence, 1.0);
        let r2 = ScanResult::new("x", "TEST", DataFamily::Pii, None, -0.4, AlertLevel::Low, "PATTERN");
        assert_eq!(r2.confidence, 0.0);
    }

    #[test]
    fn family_set_default_is_all_five() {
        let set = FamilySet::default();
        for family in DataFamily::all() {
            assert!(set.contains(family));
        }
    }

    #[test]
    fn alert_level_parse_roundtrips_display() {
        for lvl in [AlertLevel::Low, AlertLevel::Medium, AlertLevel::High, AlertLevel::Critical] {
            assert_eq!(AlertLevel::parse(&lvl.to_string()), Some(lvl));
        }
    }
}
