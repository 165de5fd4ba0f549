//! Symmetric encryption for the identity attribute, plus the secure
//! random generators used for OTP codes and session tokens.
//!
//! AES-256-GCM with a random 96-bit nonce per encryption; the stored
//! form is `base64(nonce || ciphertext)`. The key is process-wide and
//! comes from configuration.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::{Rng, RngCore};
use thiserror::Error;

/// Nonce size for AES-256-GCM (12 bytes / 96 bits).
const NONCE_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption failed")]
    Encryption,

    /// Malformed ciphertext, wrong key, or empty plaintext. Scanning
    /// callers treat this as "no match", never as fatal.
    #[error("Decryption failed")]
    Decryption,
}

/// Process-wide encryption and randomness primitives.
pub struct CipherStore {
    key: [u8; 32],
}

impl CipherStore {
    /// Create a store with a 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Create a store from a 64-character hex key string.
    pub fn from_hex(key_hex: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(key_hex)?;
        if bytes.len() != 32 {
            anyhow::bail!("encryption key must be exactly 32 bytes, got {}", bytes.len());
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Encrypt plaintext, returning base64(nonce || ciphertext).
    ///
    /// The nonce is random per call, so encrypting the same plaintext
    /// twice yields different ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::Encryption)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        use base64::Engine;
        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    /// Decrypt base64(nonce || ciphertext) back to plaintext.
    ///
    /// Fails on malformed input, a different key, or empty output.
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CipherError> {
        use base64::Engine;
        let combined = base64::engine::general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|_| CipherError::Decryption)?;

        if combined.len() < NONCE_SIZE {
            return Err(CipherError::Decryption);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::Decryption)?;

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::Decryption)?;

        let decoded = String::from_utf8(plaintext).map_err(|_| CipherError::Decryption)?;
        if decoded.is_empty() {
            return Err(CipherError::Decryption);
        }
        Ok(decoded)
    }

    /// Generate a 6-digit verification code, uniform over
    /// 100000..=999999, from the OS entropy source.
    pub fn generate_code(&self) -> String {
        let code: u32 = OsRng.gen_range(100_000..=999_999);
        code.to_string()
    }

    /// Generate an opaque bearer token: 32 random bytes, hex-encoded
    /// (256 bits of entropy).
    pub fn generate_token(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CipherStore {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        CipherStore::new(key)
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = store();
        let plaintext = "+15550102030";

        let encrypted = cipher.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);

        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn nonce_varies_between_encryptions() {
        let cipher = store();
        let a = cipher.encrypt("+15550102030").unwrap();
        let b = cipher.encrypt("+15550102030").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let cipher1 = store();
        let cipher2 = store();

        let encrypted = cipher1.encrypt("+15550102030").unwrap();
        assert!(cipher2.decrypt(&encrypted).is_err());
    }

    #[test]
    fn malformed_ciphertext_fails() {
        let cipher = store();
        assert!(cipher.decrypt("not base64 at all!!!").is_err());
        // Valid base64 but shorter than a nonce
        assert!(cipher.decrypt("AQID").is_err());
    }

    #[test]
    fn empty_plaintext_fails_decryption() {
        let cipher = store();
        let encrypted = cipher.encrypt("").unwrap();
        assert!(cipher.decrypt(&encrypted).is_err());
    }

    #[test]
    fn generated_codes_are_six_digits() {
        let cipher = store();
        for _ in 0..100 {
            let code = cipher.generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn generated_tokens_are_256_bit_hex() {
        let cipher = store();
        let token = cipher.generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, cipher.generate_token());
    }

    #[test]
    fn from_hex_rejects_bad_keys() {
        assert!(CipherStore::from_hex("deadbeef").is_err());
        assert!(CipherStore::from_hex(&"00".repeat(32)).is_ok());
    }
}
