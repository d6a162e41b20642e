//! Configuration loading and validation. A [`GatewayConfig`] can be built
//! from a named preset, a YAML file on disk, or an already-parsed
//! [`serde_yaml::Value`] — the same three-way dispatch the source's
//! `load_config()` performs, collapsed into one Rust entry point.

pub mod validator;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::scanner::ScannerConfig;
use crate::types::{AlertLevel, DataFamily, FamilySet};
use validator::{validate, RawConfig};

const BANKING_PRESET: &str = include_str!("presets/banking.yaml");
const MEDICAL_PRESET: &str = include_str!("presets/medical.yaml");
const DEVELOPER_PRESET: &str = include_str!("presets/developer.yaml");
const LEGAL_PRESET: &str = include_str!("presets/legal.yaml");

fn preset_yaml(name: &str) -> Option<&'static str> {
    match name {
        "banking" => Some(BANKING_PRESET),
        "medical" => Some(MEDICAL_PRESET),
        "developer" => Some(DEVELOPER_PRESET),
        "legal" => Some(LEGAL_PRESET),
        _ => None,
    }
}

/// Entropy sub-config, mirroring the source's `entropy` config block.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EntropySettings {
    pub enabled: bool,
    pub threshold: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub require_context: bool,
}

impl Default for EntropySettings {
    fn default() -> Self {
        EntropySettings {
            enabled: true,
            threshold: 3.5,
            min_length: 16,
            max_length: 512,
            require_context: false,
        }
    }
}

/// Raw, serde-deserializable shape of a configuration document — a preset
/// YAML, a user-supplied YAML file, or an inline value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct RawDocument {
    families: Vec<String>,
    sensitivity: String,
    safe_fields: Vec<String>,
    entropy: EntropySettings,
    backend: String,
    backend_config: BTreeMap<String, String>,
    token_expiry_minutes: i64,
    encryption_enabled: bool,
    alerts_enabled: bool,
    critical_families: Vec<String>,
    on_critical: String,
    recommend_rotation: bool,
    strict_session: bool,
    leave_unresolved: bool,
}

impl Default for RawDocument {
    fn default() -> Self {
        RawDocument {
            families: DataFamily::all().iter().map(|f| f.to_string()).collect(),
            sensitivity: "medium".to_string(),
            safe_fields: Vec::new(),
            entropy: EntropySettings::default(),
            backend: "memory".to_string(),
            backend_config: BTreeMap::new(),
            token_expiry_minutes: 60,
            encryption_enabled: true,
            alerts_enabled: true,
            critical_families: vec!["SECRETS".to_string(), "FINANCIAL".to_string()],
            on_critical: "log".to_string(),
            recommend_rotation: true,
            strict_session: true,
            leave_unresolved: true,
        }
    }
}

/// Fully resolved, validated gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub families: FamilySet,
    pub sensitivity: String,
    pub safe_fields: Vec<String>,
    pub entropy: EntropySettings,
    pub backend: String,
    pub backend_config: BTreeMap<String, String>,
    pub token_expiry_minutes: Option<i64>,
    pub encryption_enabled: bool,
    pub alerts_enabled: bool,
    pub critical_families: Vec<DataFamily>,
    pub on_critical: String,
    pub recommend_rotation: bool,
    pub strict_session: bool,
    pub leave_unresolved: bool,
}

impl GatewayConfig {
    /// Build from `source`: `None` for all defaults, `Some(name)` for one of
    /// the four built-in presets (`banking`/`medical`/`developer`/`legal`),
    /// or a path to a YAML file on disk.
    pub fn from_source(source: Option<&str>) -> Result<Self> {
        let raw_yaml = match source {
            None => None,
            Some(name) => match preset_yaml(name) {
                Some(yaml) => Some(yaml.to_string()),
                None => Some(Self::read_file(name)?),
            },
        };

        let document: RawDocument = match raw_yaml {
            Some(yaml) => serde_yaml::from_str(&yaml).map_err(|e| GatewayError::config(format!("failed to parse configuration: {e}")))?,
            None => RawDocument::default(),
        };

        Self::from_document(document)
    }

    /// Build directly from an already-parsed [`serde_yaml::Value`], for
    /// callers assembling configuration programmatically rather than from a
    /// file or preset name.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self> {
        let document: RawDocument = serde_yaml::from_value(value).map_err(|e| GatewayError::config(format!("failed to parse configuration: {e}")))?;
        Self::from_document(document)
    }

    fn read_file(path: &str) -> Result<String> {
        std::fs::read_to_string(Path::new(path)).map_err(|e| GatewayError::config(format!("failed to read config file '{path}': {e}")))
    }

    fn from_document(document: RawDocument) -> Result<Self> {
        let raw = RawConfig {
            families: Some(document.families.clone()),
            sensitivity: Some(document.sensitivity.clone()),
            backend: Some(document.backend.clone()),
            on_critical: Some(document.on_critical.clone()),
            entropy_threshold: Some(document.entropy.threshold),
            token_expiry_minutes: Some(document.token_expiry_minutes),
            strict_session: Some(document.strict_session),
        };
        validate(&raw)?;

        let families = document
            .families
            .iter()
            .filter_map(|f| DataFamily::parse(f))
            .collect::<Vec<_>>();
        let critical_families = document
            .critical_families
            .iter()
            .filter_map(|f| DataFamily::parse(f))
            .collect::<Vec<_>>();

        Ok(GatewayConfig {
            families: FamilySet::from_families(families),
            sensitivity: document.sensitivity,
            safe_fields: document.safe_fields,
            entropy: document.entropy,
            backend: document.backend,
            backend_config: document.backend_config,
            token_expiry_minutes: if document.token_expiry_minutes > 0 { Some(document.token_expiry_minutes) } else { None },
            encryption_enabled: document.encryption_enabled,
            alerts_enabled: document.alerts_enabled,
            critical_families,
            on_critical: document.on_critical,
            recommend_rotation: document.recommend_rotation,
            strict_session: document.strict_session,
            leave_unresolved: document.leave_unresolved,
        })
    }

    /// The slice of configuration the scanner needs.
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            families: self.families.clone(),
            sensitivity: self.sensitivity.clone(),
            safe_fields: self.safe_fields.clone(),
            entropy_enabled: self.entropy.enabled,
            entropy_threshold: self.entropy.threshold,
            entropy_min_length: self.entropy.min_length,
            entropy_max_length: self.entropy.max_length,
            entropy_require_context: self.entropy.require_context,
        }
    }

    /// Default alert level used when building config-driven alert rules;
    /// critical families always alert regardless of this value.
    pub fn default_alert_level(&self) -> AlertLevel {
        AlertLevel::Critical
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::from_document(RawDocument::default()).expect("default configuration must validate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_all_families_at_medium_sensitivity() {
        let config = GatewayConfig::default();
        assert_eq!(config.sensitivity, "medium");
        for family in DataFamily::all() {
            assert!(config.families.contains(family));
        }
    }

    #[test]
    fn banking_preset_loads_and_validates() {
        let config = GatewayConfig::from_source(Some("banking")).unwrap();
        assert_eq!(config.sensitivity, "high");
        assert_eq!(config.on_critical, "block");
        assert_eq!(config.token_expiry_minutes, Some(15));
    }

    #[test]
    fn medical_preset_notifies_rather_than_blocks() {
        let config = GatewayConfig::from_source(Some("medical")).unwrap();
        assert_eq!(config.on_critical, "notify");
    }

    #[test]
    fn developer_preset_relaxes_strict_session() {
        let config = GatewayConfig::from_source(Some("developer")).unwrap();
        assert!(!config.strict_session);
    }

    #[test]
    fn legal_preset_runs_at_paranoid_sensitivity() {
        let config = GatewayConfig::from_source(Some("legal")).unwrap();
        assert_eq!(config.sensitivity, "paranoid");
    }

    #[test]
    fn unknown_preset_name_is_treated_as_a_missing_file() {
        let result = GatewayConfig::from_source(Some("not-a-real-preset-or-file.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn scanner_config_carries_safe_fields_and_entropy_threshold() {
        let value: serde_yaml::Value = serde_yaml::from_str("safe_fields: [\"ticket_id\"]\nentropy:\n  threshold: 4.0").unwrap();
        let config = GatewayConfig::from_value(value).unwrap();
        let scanner_config = config.scanner_config();
        assert_eq!(scanner_config.safe_fields, vec!["ticket_id".to_string()]);
        assert_eq!(scanner_config.entropy_threshold, 4.0);
    }

    #[test]
    fn invalid_sensitivity_in_source_document_is_rejected() {
        let value: serde_yaml::Value = serde_yaml::from_str("sensitivity: extreme").unwrap();
        assert!(GatewayConfig::from_value(value).is_err());
    }
}
