//! Error types for the privacy gateway.
//!
//! Every fallible operation in this crate returns [`GatewayError`]. Access
//! control failures are the only error surfaced to callers under default
//! configuration; everything else is either swallowed internally (per
//! malformed pattern, per alert callback) or gated behind an explicit
//! `strict` flag (the resolver).

use thiserror::Error;

/// Result type alias using [`GatewayError`] as the error type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Why a vault access attempt was denied.
///
/// Kept as a typed enum rather than a free-form string so callers can match
/// on the reason without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAccessReason {
    /// The caller is not in the allowed set for this operation.
    CallerNotAllowed,
    /// The requesting session id does not match the entry's session id.
    SessionMismatch,
    /// Only `OWNER` may store; some other caller attempted it.
    StoreNotAllowed,
    /// The entry was soft-revoked via `revoke_session`.
    Revoked,
    /// The entry's `expires_at` has passed.
    Expired,
    /// No entry exists for the given token.
    NotFound,
}

impl VaultAccessReason {
    /// Short machine-stable code, matching the reason codes carried in audit
    /// entries (`denied`/`revoked`/`expired`/`not_found`).
    pub fn code(&self) -> &'static str {
        match self {
            VaultAccessReason::CallerNotAllowed => "caller_not_allowed",
            VaultAccessReason::SessionMismatch => "session_mismatch",
            VaultAccessReason::StoreNotAllowed => "store_not_allowed",
            VaultAccessReason::Revoked => "revoked",
            VaultAccessReason::Expired => "expired",
            VaultAccessReason::NotFound => "not_found",
        }
    }
}

/// Main error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Vault access was denied. `TokenExpiredError` from the design notes is
    /// modeled here as `reason == Expired` rather than a distinct variant,
    /// preserving the "specialization of VaultAccessError" relationship
    /// without needing inheritance.
    #[error("vault access denied for token {token_masked}: {reason}", reason = reason.code())]
    VaultAccess {
        /// Masked token (first 16 chars + ellipsis), never the real value.
        token_masked: String,
        /// Masked session id (first 12 chars + ellipsis).
        session_masked: String,
        /// Why access was denied.
        reason: VaultAccessReason,
    },

    /// Configuration failed schema validation.
    #[error("invalid configuration: {message}")]
    Config {
        /// Human-readable description, naming valid alternatives where applicable.
        message: String,
    },

    /// The scanner hit an unrecoverable fault. Never raised for a single bad
    /// pattern — those are logged and skipped.
    #[error("scanner error: {message}")]
    Scanner {
        /// Description of the fault.
        message: String,
    },

    /// The resolver could not process a response (decryption or lookup
    /// failure), surfaced only when `leave_unresolved = false`.
    #[error("resolver error: {message}")]
    Resolver {
        /// Description of the fault.
        message: String,
    },

    /// The vault storage backend encountered an operational failure.
    #[error("vault backend error: {message}")]
    Backend {
        /// Description of the fault.
        message: String,
    },
}

impl GatewayError {
    /// Construct a `VaultAccess` error.
    pub fn vault_access(
        token_masked: impl Into<String>,
        session_masked: impl Into<String>,
        reason: VaultAccessReason,
    ) -> Self {
        GatewayError::VaultAccess {
            token_masked: token_masked.into(),
            session_masked: session_masked.into(),
            reason,
        }
    }

    /// Construct a `VaultAccess` error specifically for an expired token —
    /// the Rust analogue of the source's `TokenExpiredError` subtype.
    pub fn token_expired(token_masked: impl Into<String>, session_masked: impl Into<String>) -> Self {
        GatewayError::vault_access(token_masked, session_masked, VaultAccessReason::Expired)
    }

    /// Construct a `Config` error.
    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::Config {
            message: message.into(),
        }
    }

    /// Construct a `Scanner` error.
    pub fn scanner(message: impl Into<String>) -> Self {
        GatewayError::Scanner {
            message: message.into(),
        }
    }

    /// Construct a `Resolver` error.
    pub fn resolver(message: impl Into<String>) -> Self {
        GatewayError::Resolver {
            message: message.into(),
        }
    }

    /// Construct a `Backend` error.
    pub fn backend(message: impl Into<String>) -> Self {
        GatewayError::Backend {
            message: message.into(),
        }
    }

    /// True for any variant descending from vault access control —
    /// the coarse check most callers actually want.
    pub fn is_access_denial(&self) -> bool {
        matches!(self, GatewayError::VaultAccess { .. })
    }

    /// True specifically for an expired-token denial.
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            GatewayError::VaultAccess {
                reason: VaultAccessReason::Expired,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_access_error_message_contains_reason_code() {
        let error = GatewayError::vault_access("TKN_AADHAAR_A3F2", "sess_abc1", VaultAccessReason::SessionMismatch);
        assert!(error.to_string().contains("session_mismatch"));
        assert!(error.is_access_denial());
    }

    #[test]
    fn token_expired_is_an_access_denial_and_is_expired() {
        let error = GatewayError::token_expired("TKN_OPENAI_KEY_1", "sess_xyz9");
        assert!(error.is_access_denial());
        assert!(error.is_expired());
    }

    #[test]
    fn config_error_carries_message() {
        let error = GatewayError::config("unknown family: FOO");
        assert!(error.to_string().contains("unknown family"));
    }
}
