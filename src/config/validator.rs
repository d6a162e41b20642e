//! Schema validation for raw configuration values, run before a
//! [`super::GatewayConfig`] is built from them. Every rejection names the
//! valid alternatives so a misconfigured caller doesn't have to go spelunking.

use crate::error::{GatewayError, Result};

const VALID_FAMILIES: &[&str] = &["PII", "SECRETS", "FINANCIAL", "INFRA", "BUSINESS"];
const VALID_SENSITIVITY: &[&str] = &["low", "medium", "high", "paranoid"];
const VALID_BACKENDS: &[&str] = &["memory", "redis", "encrypted_db"];
const VALID_ON_CRITICAL: &[&str] = &["log", "notify", "block"];

/// The subset of raw config fields the validator needs to see. Each is
/// `Option` so callers can validate a partially-specified config (everything
/// unset falls back to defaults downstream).
#[derive(Debug, Default)]
pub struct RawConfig {
    pub families: Option<Vec<String>>,
    pub sensitivity: Option<String>,
    pub backend: Option<String>,
    pub on_critical: Option<String>,
    pub entropy_threshold: Option<f64>,
    pub token_expiry_minutes: Option<i64>,
    pub strict_session: Option<bool>,
}

/// Validate a [`RawConfig`], returning a descriptive [`GatewayError::Config`]
/// on the first problem found.
pub fn validate(raw: &RawConfig) -> Result<()> {
    if let Some(families) = &raw.families {
        for family in families {
            if !VALID_FAMILIES.contains(&family.as_str()) {
                return Err(GatewayError::config(format!(
                    "unknown family '{family}': expected one of {VALID_FAMILIES:?}"
                )));
            }
        }
    }

    if let Some(sensitivity) = &raw.sensitivity {
        if !VALID_SENSITIVITY.contains(&sensitivity.as_str()) {
            return Err(GatewayError::config(format!(
                "unknown sensitivity '{sensitivity}': expected one of {VALID_SENSITIVITY:?}"
            )));
        }
    }

    if let Some(backend) = &raw.backend {
        if !VALID_BACKENDS.contains(&backend.as_str()) {
            return Err(GatewayError::config(format!(
                "unknown backend '{backend}': expected one of {VALID_BACKENDS:?}"
            )));
        }
    }

    if let Some(on_critical) = &raw.on_critical {
        if !VALID_ON_CRITICAL.contains(&on_critical.as_str()) {
            return Err(GatewayError::config(format!(
                "unknown on_critical '{on_critical}': expected one of {VALID_ON_CRITICAL:?}"
            )));
        }
    }

    if let Some(threshold) = raw.entropy_threshold {
        if threshold <= 0.0 {
            return Err(GatewayError::config("entropy.threshold must be positive"));
        }
    }

    if let Some(minutes) = raw.token_expiry_minutes {
        if minutes < 0 {
            return Err(GatewayError::config("token_expiry_minutes must be non-negative"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_an_empty_config() {
        assert!(validate(&RawConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unknown_family() {
        let raw = RawConfig { families: Some(vec!["NOPE".to_string()]), ..Default::default() };
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown family"));
    }

    #[test]
    fn rejects_unknown_sensitivity() {
        let raw = RawConfig { sensitivity: Some("extreme".to_string()), ..Default::default() };
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn rejects_unknown_backend() {
        let raw = RawConfig { backend: Some("sqlite".to_string()), ..Default::default() };
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn rejects_non_positive_entropy_threshold() {
        let raw = RawConfig { entropy_threshold: Some(0.0), ..Default::default() };
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn rejects_negative_token_expiry() {
        let raw = RawConfig { token_expiry_minutes: Some(-5), ..Default::default() };
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn accepts_every_valid_sensitivity_level() {
        for level in VALID_SENSITIVITY {
            let raw = RawConfig { sensitivity: Some(level.to_string()), ..Default::default() };
            assert!(validate(&raw).is_ok());
        }
    }
}
