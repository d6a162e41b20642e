//! Resolves tokens embedded in AI responses back to their real values,
//! under the same session that vaulted them. Only the code path holding
//! that session id can ever see a restored value — the resolver calls the
//! vault as `Caller::Resolver`, never bypassing access control itself.

use std::collections::BTreeMap;

use crate::error::{GatewayError, Result, VaultAccessReason};
use crate::token;
use crate::types::{Caller, Content};
use crate::vault::Vault;

/// Controls what happens to a token the vault can't resolve (wrong
/// session, revoked, expired, unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// If true, a session id mismatch during resolution is treated as a
    /// hard error instead of leaving the token in place.
    pub strict_session: bool,
    /// If true, a token that can't be resolved is left as-is in the output
    /// rather than surfacing an error.
    pub leave_unresolved: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            strict_session: true,
            leave_unresolved: true,
        }
    }
}

pub struct TokenResolver<'v> {
    vault: &'v Vault,
    config: ResolverConfig,
}

impl<'v> TokenResolver<'v> {
    pub fn new(vault: &'v Vault, config: ResolverConfig) -> Self {
        TokenResolver { vault, config }
    }

    /// Resolve every token found in `content` back to its real value,
    /// recursing into lists and maps the same way the scanner does.
    pub fn resolve(&self, content: &Content, session_id: &str) -> Result<Content> {
        match content {
            Content::Text(text) => Ok(Content::Text(self.resolve_text(text, session_id)?)),
            Content::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve(item, session_id)?);
                }
                Ok(Content::List(resolved))
            }
            Content::Map(map) => {
                let mut resolved = BTreeMap::new();
                for (key, value) in map {
                    resolved.insert(key.clone(), self.resolve(value, session_id)?);
                }
                Ok(Content::Map(resolved))
            }
            Content::Other(value) => Ok(Content::Other(value.clone())),
        }
    }

    fn resolve_text(&self, text: &str, session_id: &str) -> Result<String> {
        let tokens = token::find_all(text);
        if tokens.is_empty() {
            return Ok(text.to_string());
        }

        // Re-scan with the actual regex so we have byte spans to replace,
        // not just parsed components.
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;
        for m in token::TOKEN_RE.find_iter(text) {
            result.push_str(&text[last_end..m.start()]);
            match self.lookup(m.as_str(), session_id) {
                Ok(Some(value)) => result.push_str(&value),
                Ok(None) => {
                    if self.config.leave_unresolved {
                        result.push_str(m.as_str());
                    }
                }
                Err(err) => {
                    if self.config.leave_unresolved {
                        result.push_str(m.as_str());
                    } else {
                        return Err(err);
                    }
                }
            }
            last_end = m.end();
        }
        result.push_str(&text[last_end..]);
        Ok(result)
    }

    /// A session mismatch or disallowed caller is a question of "is this the
    /// right party asking", gated by `strict_session`. Everything else
    /// (unknown token, revoked, expired, decryption failure) is a question
    /// of "is the data even still available", gated by `leave_unresolved`.
    fn lookup(&self, token_str: &str, session_id: &str) -> Result<Option<String>> {
        match self.vault.retrieve(token_str, session_id, Caller::Resolver) {
            Ok(secret) => Ok(Some(secret.expose().to_string())),
            Err(err) => {
                let is_identity_mismatch = matches!(
                    err,
                    GatewayError::VaultAccess {
                        reason: VaultAccessReason::SessionMismatch | VaultAccessReason::CallerNotAllowed,
                        ..
                    }
                );
                if is_identity_mismatch {
                    if self.config.strict_session {
                        Err(err)
                    } else {
                        Ok(None)
                    }
                } else if self.config.leave_unresolved {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}
