//! Per-session authenticated encryption for vaulted values.
//!
//! A key is derived per session via PBKDF2-HMAC-SHA256 (password = the
//! gateway's framework secret, salt = the session id, 100,000 iterations,
//! 32-byte output) so that no two sessions' vault entries are decryptable
//! with the same key even if the backend's storage is inspected directly.
//! Each encryption draws a fresh random 96-bit nonce; ciphertext is stored
//! as `base64(nonce ‖ ciphertext_with_tag)`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::fmt;

use crate::error::{GatewayError, Result};

const PBKDF2_ITERATIONS: u32 = 100_000;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

fn derive_key(framework_secret: &str, session_id: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(framework_secret.as_bytes(), session_id.as_bytes(), PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt `plaintext` under a key derived from `framework_secret` and
/// `session_id`. Returns `base64(nonce ‖ ciphertext_with_tag)`.
pub fn encrypt(framework_secret: &str, session_id: &str, plaintext: &str) -> Result<String> {
    let key = derive_key(framework_secret, session_id);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| GatewayError::backend(format!("key setup failed: {e}")))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| GatewayError::backend(format!("encryption failed: {e}")))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce.as_slice());
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Decrypt a value produced by [`encrypt`]. Any failure — bad base64, short
/// payload, or authentication-tag mismatch — is reported uniformly so a
/// tampered ciphertext can't be distinguished from a wrong key by timing or
/// error shape.
pub fn decrypt(framework_secret: &str, session_id: &str, encoded: &str) -> Result<DecryptedSecret> {
    let combined = BASE64
        .decode(encoded)
        .map_err(|_| GatewayError::backend("malformed ciphertext encoding"))?;
    if combined.len() < NONCE_LEN {
        return Err(GatewayError::backend("ciphertext too short to contain a nonce"));
    }
    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let key = derive_key(framework_secret, session_id);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| GatewayError::backend(format!("key setup failed: {e}")))?;
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| GatewayError::backend("decryption failed: wrong key or tampered ciphertext"))?;
    let text = String::from_utf8(plaintext).map_err(|_| GatewayError::backend("decrypted payload was not valid UTF-8"))?;
    Ok(DecryptedSecret(text))
}

/// A decrypted vault value. `Debug` and `Display` deliberately redact the
/// contents — logging or an accidental `{:?}` of a retrieved secret must
/// never write the real value anywhere.
pub struct DecryptedSecret(String);

impl DecryptedSecret {
    /// The only way to get at the real value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecryptedSecret(<redacted, {} bytes>)", self.0.len())
    }
}

impl fmt::Display for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let ciphertext = encrypt("framework-secret", "sess_abc123", "the real value").unwrap();
        let plaintext = decrypt("framework-secret", "sess_abc123", &ciphertext).unwrap();
        assert_eq!(plaintext.expose(), "the real value");
    }

    #[test]
    fn different_sessions_derive_different_keys() {
        let ciphertext = encrypt("framework-secret", "sess_abc123", "the real value").unwrap();
        let result = decrypt("framework-secret", "sess_other99", &ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let mut ciphertext = encrypt("framework-secret", "sess_abc123", "the real value").unwrap();
        ciphertext.push('A');
        let result = decrypt("framework-secret", "sess_abc123", &ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn debug_and_display_never_show_the_real_value() {
        let secret = DecryptedSecret("super-sensitive".to_string());
        assert!(!format!("{secret:?}").contains("super-sensitive"));
        assert!(!format!("{secret}").contains("super-sensitive"));
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let a = encrypt("framework-secret", "sess_abc123", "same plaintext").unwrap();
        let b = encrypt("framework-secret", "sess_abc123", "same plaintext").unwrap();
        assert_ne!(a, b);
    }
}
