//! Hard-coded, non-configurable access rules: only `OWNER` may store; only
//! `OWNER` or `RESOLVER` may retrieve; and whichever of those callers is
//! allowed must also present the exact session id the entry was stored
//! under. No config flag can loosen either rule — these are the control
//! the whole gateway exists to enforce.

use crate::error::VaultAccessReason;
use crate::types::Caller;

const RETRIEVE_ALLOWED: &[Caller] = &[Caller::Owner, Caller::Resolver];

/// Mask a token or session id to its first N characters plus an ellipsis,
/// for embedding in error messages and audit entries.
pub fn mask(value: &str, visible: usize) -> String {
    if value.chars().count() <= visible {
        return value.to_string();
    }
    let prefix: String = value.chars().take(visible).collect();
    format!("{prefix}...")
}

/// Check whether `caller` may store a new vault entry at all. Only `OWNER`
/// may store — there's no session to match yet since none exists.
pub fn check_store(caller: Caller) -> Result<(), VaultAccessReason> {
    if caller == Caller::Owner {
        Ok(())
    } else {
        Err(VaultAccessReason::StoreNotAllowed)
    }
}

/// Check whether `caller` presenting `session_id` may retrieve an entry
/// that was stored under `entry_session_id`. Two independent checks, in
/// order: caller must be in the allowed set, then the session id must
/// match exactly.
pub fn check_retrieve(caller: Caller, session_id: &str, entry_session_id: &str) -> Result<(), VaultAccessReason> {
    if !RETRIEVE_ALLOWED.contains(&caller) {
        return Err(VaultAccessReason::CallerNotAllowed);
    }
    if session_id != entry_session_id {
        return Err(VaultAccessReason::SessionMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_may_store() {
        assert!(check_store(Caller::Owner).is_ok());
        assert_eq!(check_store(Caller::Ai).unwrap_err(), VaultAccessReason::StoreNotAllowed);
        assert_eq!(check_store(Caller::External).unwrap_err(), VaultAccessReason::StoreNotAllowed);
    }

    #[test]
    fn owner_and_resolver_may_retrieve_with_matching_session() {
        assert!(check_retrieve(Caller::Owner, "sess_1", "sess_1").is_ok());
        assert!(check_retrieve(Caller::Resolver, "sess_1", "sess_1").is_ok());
    }

    #[test]
    fn ai_caller_is_never_allowed_to_retrieve() {
        assert_eq!(
            check_retrieve(Caller::Ai, "sess_1", "sess_1").unwrap_err(),
            VaultAccessReason::CallerNotAllowed
        );
    }

    #[test]
    fn mismatched_session_is_rejected_even_for_allowed_caller() {
        assert_eq!(
            check_retrieve(Caller::Owner, "sess_1", "sess_2").unwrap_err(),
            VaultAccessReason::SessionMismatch
        );
    }

    #[test]
    fn caller_check_precedes_session_check() {
        // An anonymous caller with a genuinely matching session id must
        // still be rejected on caller identity, not slip through because
        // the session happens to match.
        assert_eq!(
            check_retrieve(Caller::Anonymous, "sess_1", "sess_1").unwrap_err(),
            VaultAccessReason::CallerNotAllowed
        );
    }

    #[test]
    fn mask_shortens_long_values_and_leaves_short_ones_alone() {
        assert_eq!(mask("sess_abcdef1234567890", 12), "sess_abcdef1...");
        assert_eq!(mask("short", 12), "short");
    }
}
