//! Fires a synchronous alert whenever a stored value is CRITICAL severity
//! or belongs to a critical family, and attaches a rotation recommendation
//! for types the operator should treat as compromised once they've passed
//! through an AI conversation at all.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use parking_lot::Mutex;

use super::access_control::mask;
use crate::types::{Alert, AlertLevel, DataFamily};

const TOKEN_MASK_VISIBLE: usize = 16;
const SESSION_MASK_VISIBLE: usize = 12;

/// Families that trigger an alert regardless of severity.
const DEFAULT_CRITICAL_FAMILIES: &[DataFamily] = &[DataFamily::Secrets, DataFamily::Financial];

/// Data types for which a rotation recommendation is attached to the alert.
const ROTATION_TYPES: &[&str] = &[
    "OPENAI_KEY",
    "AWS_ACCESS_KEY",
    "AWS_SECRET_KEY",
    "GITHUB_TOKEN",
    "GOOGLE_API_KEY",
    "STRIPE_KEY",
    "SLACK_TOKEN",
    "TWILIO_KEY",
    "JWT_TOKEN",
    "PRIVATE_RSA_KEY",
    "SSH_PRIVATE_KEY",
    "BEARER_TOKEN",
    "OAUTH_TOKEN",
    "GENERIC_PASSWORD",
    "CREDIT_CARD",
    "UPI_PIN",
    "DOCKER_SECRET",
    "KUBERNETES_SECRET",
];

fn rotation_recommendation(data_type: &str) -> Option<String> {
    if ROTATION_TYPES.contains(&data_type) {
        Some(format!("Treat this {data_type} as compromised; rotate it before reuse."))
    } else {
        None
    }
}

pub type AlertCallback = Box<dyn Fn(&Alert) + Send + Sync>;

/// Evaluates stored values against the critical-family/critical-severity
/// rule and, on a match, both records the alert and invokes the configured
/// callback (if any) under `catch_unwind` so a misbehaving callback can
/// never take the gateway down with it.
pub struct AlertEngine {
    critical_families: Vec<DataFamily>,
    on_alert: Option<AlertCallback>,
    alerts: Mutex<Vec<Alert>>,
}

impl AlertEngine {
    pub fn new(critical_families: Vec<DataFamily>, on_alert: Option<AlertCallback>) -> Self {
        AlertEngine {
            critical_families,
            on_alert,
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults(on_alert: Option<AlertCallback>) -> Self {
        AlertEngine::new(DEFAULT_CRITICAL_FAMILIES.to_vec(), on_alert)
    }

    /// Evaluate one stored value. Returns `Some(alert)` if it fired.
    pub fn check(&self, data_type: &str, family: DataFamily, alert_level: AlertLevel, token: &str, session_id: &str) -> Option<Alert> {
        let fires = alert_level == AlertLevel::Critical || self.critical_families.contains(&family);
        if !fires {
            return None;
        }

        let alert = Alert {
            timestamp: Utc::now(),
            severity: alert_level,
            data_type: data_type.to_string(),
            family,
            token_masked: mask(token, TOKEN_MASK_VISIBLE),
            session_masked: mask(session_id, SESSION_MASK_VISIBLE),
            message: format!("Confidential {data_type} ({family}) vaulted in session {}", mask(session_id, SESSION_MASK_VISIBLE)),
            recommendation: rotation_recommendation(data_type),
        };

        self.alerts.lock().push(alert.clone());

        if let Some(callback) = &self.on_alert {
            let result = catch_unwind(AssertUnwindSafe(|| callback(&alert)));
            if result.is_err() {
                tracing::warn!(data_type, "alert callback panicked; ignoring");
            }
        }

        Some(alert)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn clear(&self) {
        self.alerts.lock().clear();
    }
}
