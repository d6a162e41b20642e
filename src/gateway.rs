//! The public entry point: scans content, vaults whatever it finds behind
//! tokens, and restores tokens back to real values under session
//! authentication. Mirrors the source's `PrivacyDataSecurity` facade —
//! lazy-initialized collaborators, a single `on_alert` callback threaded
//! through to the vault, and the same `protect`/`restore`/`audit` surface.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::resolver::{ResolverConfig, TokenResolver};
use crate::scanner::UniversalScanner;
use crate::types::{Alert, AuditEntry, AuditSummary, Caller, Content, ProtectResult};
use crate::vault::alert_engine::AlertCallback;
use crate::vault::backend::MemoryBackend;
use crate::vault::Vault;

/// Framework-integration input, mirroring the source's `DataRecord`: a
/// pipeline stage hands the gateway a record, gets one back.
pub struct DataRecord {
    pub content: Content,
}

/// Framework-integration output, mirroring `ProcessedRecord`.
pub struct ProcessedRecord {
    pub content: Content,
    pub metadata: ProtectResult,
}

/// Minimal plug-in-pipeline contract a gateway can be embedded behind,
/// mirroring the source's `BaseModule` ABC closely enough that a framework
/// already built against that shape only needs to adapt signatures.
pub trait GatewayModule {
    fn layer_name(&self) -> &'static str;
    fn layer_version(&self) -> &'static str;
    fn run(&mut self, record: DataRecord) -> Result<ProcessedRecord>;
}

/// The confidential-data gateway. Construct with [`ConfidentialDataGateway::new`]
/// and call [`protect`](Self::protect) / [`restore`](Self::restore) as a pair
/// around whatever sits between your code and an AI model.
pub struct ConfidentialDataGateway {
    config: GatewayConfig,
    framework_secret: String,
    on_alert: Mutex<Option<AlertCallback>>,
    scanner: OnceLock<UniversalScanner>,
    vault: OnceLock<Vault>,
}

impl ConfidentialDataGateway {
    /// Build a gateway from a resolved configuration and the secret used to
    /// derive per-session vault encryption keys. Collaborators are
    /// constructed lazily on first use, matching the source's
    /// `initialize()` split from `__init__`.
    pub fn new(config: GatewayConfig, framework_secret: impl Into<String>) -> Self {
        ConfidentialDataGateway {
            config,
            framework_secret: framework_secret.into(),
            on_alert: Mutex::new(None),
            scanner: OnceLock::new(),
            vault: OnceLock::new(),
        }
    }

    /// Attach a callback invoked synchronously whenever a CRITICAL-severity
    /// or critical-family value is vaulted. Invoked under `catch_unwind` by
    /// the vault's alert engine, so a panicking callback cannot take the
    /// gateway down. Must be called before the first `protect`/`restore` —
    /// the vault is constructed lazily on first use and takes the callback
    /// with it.
    pub fn with_alert_callback(self, callback: AlertCallback) -> Self {
        *self.on_alert.lock() = Some(callback);
        self
    }

    fn scanner(&self) -> &UniversalScanner {
        self.scanner.get_or_init(|| UniversalScanner::new(self.config.scanner_config()))
    }

    fn vault(&self) -> &Vault {
        self.vault.get_or_init(|| {
            let callback = self.on_alert.lock().take();
            Vault::new(
                Box::new(MemoryBackend::new()),
                self.framework_secret.clone(),
                self.config.token_expiry_minutes,
                self.config.critical_families.clone(),
                callback,
            )
        })
    }

    /// Scan `content` for confidential values, vault each distinct real
    /// value behind a token under a freshly generated session id, and
    /// return the tokenized content plus a summary of what was found.
    pub fn protect(&self, content: &Content) -> Result<ProtectResult> {
        let session_id = format!("sess_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let scan_results = self.scanner().scan_content(content);

        if scan_results.is_empty() {
            return Ok(ProtectResult {
                safe_content: content.clone(),
                session_id: session_id.clone(),
                items_vaulted: 0,
                audit_summary: AuditSummary {
                    total: 0,
                    families: BTreeMap::new(),
                    types: Vec::new(),
                    session_id,
                    timestamp: chrono::Utc::now(),
                },
                alerts: Vec::new(),
                scan_results,
            });
        }

        let mut value_to_token: BTreeMap<String, String> = BTreeMap::new();
        let mut families_seen: BTreeMap<String, usize> = BTreeMap::new();
        let mut types_seen = Vec::new();

        for result in &scan_results {
            if value_to_token.contains_key(&result.value) {
                continue;
            }
            let token_str = self.vault().store(
                &result.value,
                &result.data_type,
                result.family,
                result.alert_level,
                &session_id,
                Caller::Owner,
            )?;
            value_to_token.insert(result.value.clone(), token_str);
            *families_seen.entry(result.family.to_string()).or_insert(0) += 1;
            if !types_seen.contains(&result.data_type) {
                types_seen.push(result.data_type.clone());
            }
        }

        let safe_content = substitute(content, &value_to_token);
        let items_vaulted = value_to_token.len();

        Ok(ProtectResult {
            safe_content,
            session_id: session_id.clone(),
            items_vaulted,
            audit_summary: AuditSummary {
                total: items_vaulted,
                families: families_seen,
                types: types_seen,
                session_id,
                timestamp: chrono::Utc::now(),
            },
            alerts: self.vault().alerts(),
            scan_results,
        })
    }

    /// Resolve every token in an AI response back to its real value, under
    /// the session that `protect` returned.
    pub fn restore(&self, ai_response: &Content, session_id: &str) -> Result<Content> {
        let resolver = TokenResolver::new(
            self.vault(),
            ResolverConfig {
                strict_session: self.config.strict_session,
                leave_unresolved: self.config.leave_unresolved,
            },
        );
        resolver.resolve(ai_response, session_id)
    }

    /// Every recorded audit entry for `session_id`.
    pub fn audit(&self, session_id: &str) -> Vec<AuditEntry> {
        self.vault().audit_entries(session_id)
    }

    /// Soft-revoke every vault entry belonging to `session_id`.
    pub fn revoke_session(&self, session_id: &str) -> Result<usize> {
        self.vault().revoke(session_id, Caller::Owner)
    }

    /// Permanently delete every vault entry belonging to `session_id`.
    pub fn purge_session(&self, session_id: &str) -> Result<usize> {
        self.vault().purge(session_id, Caller::Owner)
    }

    /// All CRITICAL alerts fired so far across every session.
    pub fn alerts(&self) -> Vec<Alert> {
        self.vault().alerts()
    }
}

impl GatewayModule for ConfidentialDataGateway {
    fn layer_name(&self) -> &'static str {
        "confidential_data_gateway"
    }

    fn layer_version(&self) -> &'static str {
        "1.0.0"
    }

    fn run(&mut self, record: DataRecord) -> Result<ProcessedRecord> {
        let metadata = self.protect(&record.content)?;
        Ok(ProcessedRecord {
            content: metadata.safe_content.clone(),
            metadata,
        })
    }
}

/// Replace every real value with its token, longest values first so a
/// value that's a substring of another can't get partially clobbered.
fn substitute(content: &Content, value_to_token: &BTreeMap<String, String>) -> Content {
    match content {
        Content::Text(text) => {
            let mut ordered: Vec<&String> = value_to_token.keys().collect();
            ordered.sort_by_key(|v| std::cmp::Reverse(v.len()));
            let mut result = text.clone();
            for value in ordered {
                if let Some(token_str) = value_to_token.get(value) {
                    result = result.replace(value.as_str(), token_str);
                }
            }
            Content::Text(result)
        }
        Content::List(items) => Content::List(items.iter().map(|c| substitute(c, value_to_token)).collect()),
        Content::Map(map) => Content::Map(map.iter().map(|(k, v)| (k.clone(), substitute(v, value_to_token))).collect()),
        Content::Other(value) => Content::Other(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn new_gateway() -> ConfidentialDataGateway {
        ConfidentialDataGateway::new(GatewayConfig::default(), "framework-secret")
    }

    #[test]
    fn protect_tokenizes_a_detected_secret() {
        let gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let result = gateway.protect(&content).unwrap();
        assert_eq!(result.items_vaulted, 1);
        assert!(!result.safe_content.as_text().unwrap().contains("sk-proj-"));
    }

    #[test]
    fn protect_on_clean_content_vaults_nothing() {
        let gateway = new_gateway();
        let content = Content::text("nothing sensitive here at all");
        let result = gateway.protect(&content).unwrap();
        assert_eq!(result.items_vaulted, 0);
        assert_eq!(result.safe_content, content);
    }

    #[test]
    fn protect_then_restore_roundtrips_the_real_value() {
        let gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let protected = gateway.protect(&content).unwrap();
        let restored = gateway.restore(&protected.safe_content, &protected.session_id).unwrap();
        assert_eq!(restored.as_text().unwrap(), content.as_text().unwrap());
    }

    #[test]
    fn restore_under_wrong_session_raises_under_default_strict_session() {
        let gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let protected = gateway.protect(&content).unwrap();
        let result = gateway.restore(&protected.safe_content, "sess_wrongwrong");
        assert!(result.is_err());
    }

    #[test]
    fn revoke_session_prevents_further_restoration() {
        let gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let protected = gateway.protect(&content).unwrap();
        gateway.revoke_session(&protected.session_id).unwrap();
        let restored = gateway.restore(&protected.safe_content, &protected.session_id).unwrap();
        assert!(restored.as_text().unwrap().contains("TKN_OPENAI_KEY"));
    }

    #[test]
    fn audit_records_at_least_the_store_call() {
        let gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let protected = gateway.protect(&content).unwrap();
        let entries = gateway.audit(&protected.session_id);
        assert!(!entries.is_empty());
    }

    #[test]
    fn run_as_a_gateway_module_produces_the_same_tokenization_as_protect() {
        let mut gateway = new_gateway();
        let content = Content::text("export OPENAI_API_KEY=sk-proj-abcdefghijklmnopqrstuvwxyz0123456789");
        let record = DataRecord { content: content.clone() };
        let processed = gateway.run(record).unwrap();
        assert_eq!(processed.metadata.items_vaulted, 1);
        assert_eq!(processed.content, processed.metadata.safe_content);
    }
}
