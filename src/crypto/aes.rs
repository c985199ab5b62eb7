//! AES-256-GCM encryption for tenant data-store credentials
//!
//! Tenant database passwords are never stored in clear text. They are sealed
//! with a platform key before they reach the `tenant_databases` table and
//! opened again only when a connection descriptor is built.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use thiserror::Error;

/// Environment variable holding the base64-encoded credentials key
pub const CREDENTIALS_KEY_ENV: &str = "TENANT_CREDENTIALS_KEY";

/// Encryption key for AES-256-GCM
#[derive(Clone)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Encryption error types
#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Invalid key: must be exactly 32 bytes (256 bits)")]
    InvalidKeyLength,

    #[error("Missing credentials key: {0} is not set")]
    MissingKey(&'static str),

    #[error("Invalid base64 encoding: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Invalid ciphertext format")]
    InvalidCiphertextFormat,
}

impl From<EncryptionError> for crate::error::AppError {
    fn from(err: EncryptionError) -> Self {
        crate::error::AppError::Decryption(err.to_string())
    }
}

impl EncryptionKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Create encryption key from a base64-encoded string
    pub fn from_base64(encoded: &str) -> Result<Self, EncryptionError> {
        let bytes = BASE64.decode(encoded.trim())?;
        if bytes.len() != 32 {
            return Err(EncryptionError::InvalidKeyLength);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    pub fn from_env() -> Result<Self, EncryptionError> {
        let encoded = std::env::var(CREDENTIALS_KEY_ENV)
            .map_err(|_| EncryptionError::MissingKey(CREDENTIALS_KEY_ENV))?;
        Self::from_base64(&encoded)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Seal a credential. Output format is `base64(nonce):base64(ciphertext)`.
pub fn encrypt(key: &EncryptionKey, plaintext: &str) -> Result<String, EncryptionError> {
    let cipher =
        Aes256Gcm::new_from_slice(&key.key).map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut nonce_bytes = [0u8; 12];
    rand::thread_rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    Ok(format!(
        "{}:{}",
        BASE64.encode(nonce_bytes),
        BASE64.encode(&ciphertext)
    ))
}

/// Open a credential sealed by [encrypt]
pub fn decrypt(key: &EncryptionKey, encrypted: &str) -> Result<String, EncryptionError> {
    let (nonce_part, ciphertext_part) = encrypted
        .split_once(':')
        .ok_or(EncryptionError::InvalidCiphertextFormat)?;
    if ciphertext_part.contains(':') {
        return Err(EncryptionError::InvalidCiphertextFormat);
    }

    let nonce_bytes = BASE64.decode(nonce_part)?;
    if nonce_bytes.len() != 12 {
        return Err(EncryptionError::InvalidCiphertextFormat);
    }
    let ciphertext = BASE64.decode(ciphertext_part)?;

    let cipher =
        Aes256Gcm::new_from_slice(&key.key).map_err(|_| EncryptionError::DecryptionFailed)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| EncryptionError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| EncryptionError::DecryptionFailed)
}

#[cfg(test)]
pub(crate) fn test_key() -> EncryptionKey {
    EncryptionKey::new([
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,
        0x1e, 0x1f,
    ])
}
