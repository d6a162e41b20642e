//! Storage backends for encrypted vault entries. `MemoryBackend` is the
//! only implementation shipped here — a process-local, non-persistent
//! store suitable for a single gateway instance's lifetime. Anything
//! durable (Redis, an encrypted database) is a different crate's problem;
//! the trait exists so one can be dropped in without touching the vault
//! itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{GatewayError, Result};

/// One stored entry: the encrypted ciphertext plus the bookkeeping the
/// vault needs to enforce access control and expiry without decrypting.
#[derive(Debug, Clone)]
pub struct VaultEntry {
    pub ciphertext: String,
    pub data_type: String,
    pub family: String,
    pub alert_level: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

/// Storage contract the vault depends on. Every method is infallible
/// except where the backend itself can fail (a real network backend);
/// `MemoryBackend` never returns `Err`.
pub trait VaultBackend: Send + Sync {
    fn put(&self, token: &str, entry: VaultEntry) -> Result<()>;
    fn get(&self, token: &str) -> Result<Option<VaultEntry>>;
    fn revoke_session(&self, session_id: &str) -> Result<usize>;
    fn purge_session(&self, session_id: &str) -> Result<usize>;
}

/// In-memory, `HashMap`-backed [`VaultBackend`]. Mirrors the source's
/// dict-based store: storing the same value again under the same session
/// id is idempotent (same token returned), while the same value under a
/// different session id is treated as a distinct entry with its own token.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, VaultEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl VaultBackend for MemoryBackend {
    fn put(&self, token: &str, entry: VaultEntry) -> Result<()> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(token) {
            if existing.session_id == entry.session_id {
                return Ok(());
            }
            return Err(GatewayError::backend(format!("token collision: '{token}' already exists")));
        }
        entries.insert(token.to_string(), entry);
        Ok(())
    }

    fn get(&self, token: &str) -> Result<Option<VaultEntry>> {
        Ok(self.entries.lock().get(token).cloned())
    }

    fn revoke_session(&self, session_id: &str) -> Result<usize> {
        let mut entries = self.entries.lock();
        let mut count = 0;
        for entry in entries.values_mut() {
            if entry.session_id == session_id && !entry.revoked {
                entry.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    fn purge_session(&self, session_id: &str) -> Result<usize> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.session_id != session_id);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(session_id: &str) -> VaultEntry {
        VaultEntry {
            ciphertext: "cipher".to_string(),
            data_type: "OPENAI_KEY".to_string(),
            family: "SECRETS".to_string(),
            alert_level: "CRITICAL".to_string(),
            session_id: session_id.to_string(),
            created_at: Utc::now(),
            expires_at: None,
            revoked: false,
        }
    }

    #[test]
    fn put_then_get_roundtrips() {
        let backend = MemoryBackend::new();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        let fetched = backend.get("tok_1").unwrap().unwrap();
        assert_eq!(fetched.session_id, "sess_1");
    }

    #[test]
    fn storing_the_same_token_and_session_again_is_a_no_op() {
        let backend = MemoryBackend::new();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        assert_eq!(backend.get("tok_1").unwrap().unwrap().session_id, "sess_1");
    }

    #[test]
    fn storing_the_same_token_under_a_different_session_is_a_collision() {
        let backend = MemoryBackend::new();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        let result = backend.put("tok_1", sample_entry("sess_2"));
        assert!(result.is_err());
        assert_eq!(backend.get("tok_1").unwrap().unwrap().session_id, "sess_1");
    }

    #[test]
    fn get_missing_token_returns_none() {
        let backend = MemoryBackend::new();
        assert!(backend.get("nope").unwrap().is_none());
    }

    #[test]
    fn revoke_session_marks_entries_revoked_without_removing_them() {
        let backend = MemoryBackend::new();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        backend.put("tok_2", sample_entry("sess_2")).unwrap();
        let count = backend.revoke_session("sess_1").unwrap();
        assert_eq!(count, 1);
        assert!(backend.get("tok_1").unwrap().unwrap().revoked);
        assert!(!backend.get("tok_2").unwrap().unwrap().revoked);
    }

    #[test]
    fn purge_session_removes_entries_entirely() {
        let backend = MemoryBackend::new();
        backend.put("tok_1", sample_entry("sess_1")).unwrap();
        backend.put("tok_2", sample_entry("sess_2")).unwrap();
        let count = backend.purge_session("sess_1").unwrap();
        assert_eq!(count, 1);
        assert!(backend.get("tok_1").unwrap().is_none());
        assert!(backend.get("tok_2").unwrap().is_some());
    }
}
