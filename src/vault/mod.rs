//! The vault: stores real values behind opaque tokens, encrypted per
//! session, and enforces the fixed OWNER/RESOLVER access rules on every
//! retrieval. Wires together [`backend`], [`crypto`], [`access_control`],
//! [`audit_log`], and [`alert_engine`] the way the source's `Vault` class
//! composes its collaborators.

pub mod access_control;
pub mod alert_engine;
pub mod audit_log;
pub mod backend;
pub mod crypto;

use chrono::{Duration, Utc};

use crate::error::{GatewayError, Result, VaultAccessReason};
use crate::token;
use crate::types::{Alert, AlertLevel, AuditEntry, AuditOperation, AuditOutcome, Caller, DataFamily};

use alert_engine::{AlertCallback, AlertEngine};
use audit_log::AuditLog;
use backend::{VaultBackend, VaultEntry};
use crypto::DecryptedSecret;

pub struct Vault {
    backend: Box<dyn VaultBackend>,
    audit_log: AuditLog,
    alert_engine: AlertEngine,
    framework_secret: String,
    token_expiry: Option<Duration>,
}

impl Vault {
    pub fn new(
        backend: Box<dyn VaultBackend>,
        framework_secret: impl Into<String>,
        token_expiry_minutes: Option<i64>,
        critical_families: Vec<DataFamily>,
        on_alert: Option<AlertCallback>,
    ) -> Self {
        Vault {
            backend,
            audit_log: AuditLog::new(),
            alert_engine: AlertEngine::new(critical_families, on_alert),
            framework_secret: framework_secret.into(),
            token_expiry: token_expiry_minutes.map(Duration::minutes),
        }
    }

    /// Encrypt `value` and store it under a freshly generated token. Only
    /// `OWNER` may call this — any other caller is rejected before a token
    /// is even minted.
    pub fn store(&self, value: &str, data_type: &str, family: DataFamily, alert_level: AlertLevel, session_id: &str, caller: Caller) -> Result<String> {
        if access_control::check_store(caller).is_err() {
            self.audit_log.record(
                AuditOperation::Store,
                "",
                session_id,
                caller,
                AuditOutcome::Denied,
                Some(data_type.to_string()),
                Some(family.to_string()),
            );
            return Err(GatewayError::vault_access("", access_control::mask(session_id, 12), VaultAccessReason::StoreNotAllowed));
        }

        let token_str = token::generate(data_type);
        let ciphertext = crypto::encrypt(&self.framework_secret, session_id, value)?;
        let now = Utc::now();
        let entry = VaultEntry {
            ciphertext,
            data_type: data_type.to_string(),
            family: family.to_string(),
            alert_level: alert_level.to_string(),
            session_id: session_id.to_string(),
            created_at: now,
            expires_at: self.token_expiry.map(|d| now + d),
            revoked: false,
        };
        self.backend.put(&token_str, entry)?;

        self.audit_log.record(
            AuditOperation::Store,
            &token_str,
            session_id,
            caller,
            AuditOutcome::Success,
            Some(data_type.to_string()),
            Some(family.to_string()),
        );

        self.alert_engine.check(data_type, family, alert_level, &token_str, session_id);

        Ok(token_str)
    }

    /// Retrieve and decrypt the value behind `token`, checking — in order —
    /// existence, access control, revocation, and expiry before decrypting.
    /// Each failure path records its own audit outcome before returning.
    pub fn retrieve(&self, token_str: &str, session_id: &str, caller: Caller) -> Result<DecryptedSecret> {
        let Some(entry) = self.backend.get(token_str)? else {
            self.audit_log.record(AuditOperation::Retrieve, token_str, session_id, caller, AuditOutcome::NotFound, None, None);
            return Err(GatewayError::vault_access(
                access_control::mask(token_str, 16),
                access_control::mask(session_id, 12),
                VaultAccessReason::NotFound,
            ));
        };

        if let Err(reason) = access_control::check_retrieve(caller, session_id, &entry.session_id) {
            self.audit_log.record(
                AuditOperation::Retrieve,
                token_str,
                session_id,
                caller,
                AuditOutcome::Denied,
                Some(entry.data_type.clone()),
                Some(entry.family.clone()),
            );
            if entry.session_id != session_id {
                // A session-mismatch denial is visible from the token's
                // owning session too, not only the (wrong) session that
                // attempted the retrieve.
                self.audit_log.record(
                    AuditOperation::Retrieve,
                    token_str,
                    &entry.session_id,
                    caller,
                    AuditOutcome::Denied,
                    Some(entry.data_type.clone()),
                    Some(entry.family.clone()),
                );
            }
            return Err(GatewayError::vault_access(access_control::mask(token_str, 16), access_control::mask(session_id, 12), reason));
        }

        if entry.revoked {
            self.audit_log.record(
                AuditOperation::Retrieve,
                token_str,
                session_id,
                caller,
                AuditOutcome::Revoked,
                Some(entry.data_type.clone()),
                Some(entry.family.clone()),
            );
            return Err(GatewayError::vault_access(access_control::mask(token_str, 16), access_control::mask(session_id, 12), VaultAccessReason::Revoked));
        }

        if let Some(expires_at) = entry.expires_at {
            if Utc::now() > expires_at {
                self.audit_log.record(
                    AuditOperation::Retrieve,
                    token_str,
                    session_id,
                    caller,
                    AuditOutcome::Expired,
                    Some(entry.data_type.clone()),
                    Some(entry.family.clone()),
                );
                return Err(GatewayError::token_expired(access_control::mask(token_str, 16), access_control::mask(session_id, 12)));
            }
        }

        let plaintext = crypto::decrypt(&self.framework_secret, session_id, &entry.ciphertext)?;
        self.audit_log.record(
            AuditOperation::Retrieve,
            token_str,
            session_id,
            caller,
            AuditOutcome::Success,
            Some(entry.data_type),
            Some(entry.family),
        );
        Ok(plaintext)
    }

    /// Soft-revoke every entry in `session_id`: subsequent retrievals fail
    /// with `Revoked`, but entries remain for audit purposes.
    pub fn revoke(&self, session_id: &str, caller: Caller) -> Result<usize> {
        let count = self.backend.revoke_session(session_id)?;
        self.audit_log.record_bulk(AuditOperation::Revoke, session_id, caller, AuditOutcome::Success, count);
        Ok(count)
    }

    /// Permanently remove every entry in `session_id`.
    pub fn purge(&self, session_id: &str, caller: Caller) -> Result<usize> {
        let count = self.backend.purge_session(session_id)?;
        self.audit_log.record_bulk(AuditOperation::Purge, session_id, caller, AuditOutcome::Success, count);
        Ok(count)
    }

    pub fn audit_entries(&self, session_id: &str) -> Vec<AuditEntry> {
        self.audit_log.entries_for_session(session_id)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alert_engine.alerts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::MemoryBackend;

    fn new_vault() -> Vault {
        Vault::new(Box::new(MemoryBackend::new()), "framework-secret", Some(30), vec![DataFamily::Secrets, DataFamily::Financial], None)
    }

    #[test]
    fn owner_can_store_and_retrieve_with_matching_session() {
        let vault = new_vault();
        let token_str = vault.store("sk-real-value", "OPENAI_KEY", DataFamily::Secrets, AlertLevel::Critical, "sess_abc", Caller::Owner).unwrap();
        let secret = vault.retrieve(&token_str, "sess_abc", Caller::Owner).unwrap();
        assert_eq!(secret.expose(), "sk-real-value");
    }

    #[test]
    fn non_owner_cannot_store() {
        let vault = new_vault();
        let result = vault.store("value", "OPENAI_KEY", DataFamily::Secrets, AlertLevel::Critical, "sess_abc", Caller::Ai);
        assert!(result.is_err());
    }

    #[test]
    fn resolver_can_retrieve_but_ai_cannot() {
        let vault = new_vault();
        let token_str = vault.store("value", "PAN", DataFamily::Pii, AlertLevel::High, "sess_abc", Caller::Owner).unwrap();
        assert!(vault.retrieve(&token_str, "sess_abc", Caller::Resolver).is_ok());
        assert!(vault.retrieve(&token_str, "sess_abc", Caller::Ai).is_err());
    }

    #[test]
    fn wrong_session_id_is_rejected() {
        let vault = new_vault();
        let token_str = vault.store("value", "PAN", DataFamily::Pii, AlertLevel::High, "sess_abc", Caller::Owner).unwrap();
        assert!(vault.retrieve(&token_str, "sess_xyz", Caller::Owner).is_err());
    }

    #[test]
    fn revoked_entry_cannot_be_retrieved() {
        let vault = new_vault();
        let token_str = vault.store("value", "PAN", DataFamily::Pii, AlertLevel::High, "sess_abc", Caller::Owner).unwrap();
        vault.revoke("sess_abc", Caller::Owner).unwrap();
        let result = vault.retrieve(&token_str, "sess_abc", Caller::Owner);
        assert!(result.unwrap_err().to_string().contains("revoked"));
    }

    #[test]
    fn purged_entry_is_gone_entirely() {
        let vault = new_vault();
        let token_str = vault.store("value", "PAN", DataFamily::Pii, AlertLevel::High, "sess_abc", Caller::Owner).unwrap();
        vault.purge("sess_abc", Caller::Owner).unwrap();
        let result = vault.retrieve(&token_str, "sess_abc", Caller::Owner);
        assert!(result.unwrap_err().to_string().contains("not_found"));
    }

    #[test]
    fn unknown_token_is_not_found() {
        let vault = new_vault();
        let result = vault.retrieve("\u{27E8}TKN_FAKE_00000000\u{27E9}", "sess_abc", Caller::Owner);
        assert!(result.is_err());
    }

    #[test]
    fn storing_a_critical_secret_fires_an_alert() {
        let vault = new_vault();
        vault.store("sk-real", "OPENAI_KEY", DataFamily::Secrets, AlertLevel::Critical, "sess_abc", Caller::Owner).unwrap();
        assert_eq!(vault.alerts().len(), 1);
    }

    #[test]
    fn audit_entries_are_recorded_for_both_store_and_retrieve() {
        let vault = new_vault();
        let token_str = vault.store("value", "PAN", DataFamily::Pii, AlertLevel::High, "sess_abc", Caller::Owner).unwrap();
        vault.retrieve(&token_str, "sess_abc", Caller::Owner).unwrap();
        let entries = vault.audit_entries("sess_abc");
        assert_eq!(entries.len(), 2);
    }
}
