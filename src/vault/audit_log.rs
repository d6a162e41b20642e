//! Append-only audit trail. Every store, retrieve, revoke, and purge is
//! recorded regardless of outcome, with tokens and session ids pre-masked
//! so the log itself never becomes a second place real identifiers leak
//! from.

use chrono::Utc;
use parking_lot::Mutex;

use super::access_control::mask;
use crate::types::{AuditEntry, AuditOperation, AuditOutcome, Caller};

const TOKEN_MASK_VISIBLE: usize = 16;
const SESSION_MASK_VISIBLE: usize = 12;

/// Thread-safe append-only log of [`AuditEntry`] records.
#[derive(Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        AuditLog::default()
    }

    /// Record one operation outcome.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        operation: AuditOperation,
        token: &str,
        session_id: &str,
        caller: Caller,
        outcome: AuditOutcome,
        data_type: Option<String>,
        family: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            token_masked: mask(token, TOKEN_MASK_VISIBLE),
            session_masked: mask(session_id, SESSION_MASK_VISIBLE),
            caller: caller.to_string(),
            result: outcome.to_string(),
            data_type,
            family,
            count: None,
        };
        self.entries.lock().push(entry);
    }

    /// Record a bulk operation (revoke/purge) with an item count instead of
    /// a single token.
    pub fn record_bulk(&self, operation: AuditOperation, session_id: &str, caller: Caller, outcome: AuditOutcome, count: usize) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            token_masked: String::new(),
            session_masked: mask(session_id, SESSION_MASK_VISIBLE),
            caller: caller.to_string(),
            result: outcome.to_string(),
            data_type: None,
            family: None,
            count: Some(count),
        };
        self.entries.lock().push(entry);
    }

    /// All entries for a given session id, matched against its masked form
    /// so callers never need to pass an unmasked identifier in to filter.
    pub fn entries_for_session(&self, session_id: &str) -> Vec<AuditEntry> {
        let masked = mask(session_id, SESSION_MASK_VISIBLE);
        self.entries
            .lock()
            .iter()
            .filter(|e| e.session_masked == masked)
            .cloned()
            .collect()
    }

    pub fn all_entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_masks_token_and_session() {
        let log = AuditLog::new();
        log.record(
            AuditOperation::Store,
            "\u{27E8}TKN_AADHAAR_ABCD1234\u{27E9}",
            "sess_1234567890abcdef",
            Caller::Owner,
            AuditOutcome::Success,
            Some("AADHAAR".to_string()),
            Some("PII".to_string()),
        );
        let entries = log.all_entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].token_masked.contains("ABCD1234"));
        assert!(entries[0].session_masked.ends_with("..."));
    }

    #[test]
    fn entries_for_session_filters_by_masked_session() {
        let log = AuditLog::new();
        log.record(AuditOperation::Store, "tok_a", "sess_aaaaaaaaaaaaaaaa", Caller::Owner, AuditOutcome::Success, None, None);
        log.record(AuditOperation::Store, "tok_b", "sess_bbbbbbbbbbbbbbbb", Caller::Owner, AuditOutcome::Success, None, None);
        let filtered = log.entries_for_session("sess_aaaaaaaaaaaaaaaa");
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let log = AuditLog::new();
        log.record(AuditOperation::Retrieve, "tok", "sess_x", Caller::Resolver, AuditOutcome::Denied, None, None);
        assert_eq!(log.count(), 1);
        log.clear();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn bulk_record_carries_a_count_instead_of_a_token() {
        let log = AuditLog::new();
        log.record_bulk(AuditOperation::Purge, "sess_x", Caller::Owner, AuditOutcome::Success, 7);
        let entries = log.all_entries();
        assert_eq!(entries[0].count, Some(7));
    }
}
