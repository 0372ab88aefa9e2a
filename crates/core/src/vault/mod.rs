//! Symmetric encryption of long-lived credential strings.
//!
//! The vault encrypts credential fields at rest with an authenticated
//! cipher (ChaCha20-Poly1305, 256-bit key, 96-bit random nonce per call).
//! A blob is `base64(nonce || ciphertext)`; the nonce is fresh for every
//! encryption, so equal plaintexts never produce equal blobs.
//!
//! The key is process-wide configuration injected at construction. The
//! vault knows nothing about where blobs are stored; plaintext exists
//! only transiently inside a sync call and is never logged.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::constants::SECRET_KEY_ENV;
use crate::errors::{Error, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Vault over a single symmetric key.
pub struct SecretVault {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault").field("key", &"<redacted>").finish()
    }
}

impl SecretVault {
    /// Build a vault from the configured key string.
    ///
    /// Accepts a base64 key or a raw 32-byte ascii value. A missing or
    /// malformed key is a configuration error: the engine fails fast at
    /// startup rather than at the first sync.
    pub fn new(raw_key: &str) -> Result<Self> {
        Ok(Self {
            key: decode_encryption_key(raw_key)?,
        })
    }

    /// Build a vault from raw key bytes (tests, key rotation tooling).
    pub fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Encrypt a credential string into a transport-safe blob.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| Error::Unexpected("Failed to encrypt secret".to_string()))?;

        let mut blob = nonce_bytes.to_vec();
        blob.extend(ciphertext);
        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// A tampered blob or a wrong key fails authentication; this is a
    /// hard sync failure, never silently ignored.
    pub fn decrypt(&self, blob: &str) -> Result<String> {
        let raw = BASE64
            .decode(blob.trim())
            .map_err(|_| Error::Authentication("Stored secret is not valid base64".to_string()))?;

        if raw.len() < NONCE_LEN {
            return Err(Error::Authentication(
                "Stored secret is too short to contain a nonce".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher.decrypt(nonce, ciphertext).map_err(|_| {
            Error::Authentication("Failed to decrypt stored secret (tampered or wrong key)".to_string())
        })?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Authentication("Decrypted secret is not valid UTF-8".to_string()))
    }
}

/// Generate a fresh random key, base64-encoded.
///
/// Operational provisioning utility; not part of the runtime sync path.
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    BASE64.encode(key)
}

fn decode_encryption_key(raw: &str) -> Result<[u8; KEY_LEN]> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Configuration(format!(
            "{} must be set to encrypt broker credentials",
            SECRET_KEY_ENV
        )));
    }

    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(_) if trimmed.len() == KEY_LEN => trimmed.as_bytes().to_vec(),
        Err(_) => {
            return Err(Error::Configuration(format!(
                "{} must be a base64 string or 32-byte ascii value",
                SECRET_KEY_ENV
            )))
        }
    };

    if decoded.len() != KEY_LEN {
        return Err(Error::Configuration(format!(
            "{} must decode to exactly {} bytes",
            SECRET_KEY_ENV, KEY_LEN
        )));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&decoded);
    Ok(key)
}
