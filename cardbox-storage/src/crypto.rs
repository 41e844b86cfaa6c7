//! Content encryption at rest.
//!
//! Card descriptions are sealed with XChaCha20-Poly1305 under a key taken
//! from configuration as 64 hex characters. Each sealed value carries its
//! random 24-byte nonce as a prefix, so values are independently
//! decryptable and never share a nonce.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use cardbox_core::errors::{CardboxResult, StorageError, ValidationError};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Seals and opens card descriptions.
pub struct ContentCipher {
    cipher: XChaCha20Poly1305,
}

impl ContentCipher {
    /// Build a cipher from a 64-character hex key.
    pub fn from_hex_key(hex_key: &str) -> CardboxResult<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|_| ValidationError::InvalidContentKey { len: 0 })?;
        if bytes.len() != KEY_LEN {
            return Err(ValidationError::InvalidContentKey { len: bytes.len() }.into());
        }
        let cipher = XChaCha20Poly1305::new_from_slice(&bytes).map_err(|e| {
            StorageError::EncryptionFailed {
                reason: e.to_string(),
            }
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt a description. Output is `nonce || ciphertext`.
    pub fn seal(&self, plaintext: &str) -> CardboxResult<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| StorageError::EncryptionFailed {
                reason: e.to_string(),
            })?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a sealed description.
    pub fn open(&self, sealed: &[u8]) -> CardboxResult<String> {
        if sealed.len() < NONCE_LEN {
            return Err(StorageError::EncryptionFailed {
                reason: format!("sealed content too short: {} bytes", sealed.len()),
            }
            .into());
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| StorageError::EncryptionFailed {
                reason: "decryption failed: wrong key or tampered content".into(),
            })?;
        String::from_utf8(plaintext).map_err(|e| {
            StorageError::EncryptionFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }
}
