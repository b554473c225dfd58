//! AES-256-GCM content cipher.
//!
//! Every pack draws a fresh data key and a fresh nonce from the OS CSPRNG, so
//! a (key, nonce) pair is never reused across blobs. Nothing here is derived
//! from the content.
//!
//! Blob layout: `nonce (12) || ciphertext || tag (16)`.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use eepack_core::defaults::{BLOB_OVERHEAD, DATA_KEY_LEN, NONCE_LEN};
use eepack_core::{PackError, PackResult};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Per-blob symmetric key with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; DATA_KEY_LEN]);

impl DataKey {
    /// Draw a fresh random key.
    pub fn generate() -> Self {
        Self(generate_random())
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; DATA_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; DATA_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a random nonce (12 bytes).
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    generate_random()
}

/// Encrypt with AES-256-GCM, binding `aad`.
///
/// Returns ciphertext with appended authentication tag (16 bytes).
pub fn aes_gcm_seal(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> PackResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| PackError::Encryption(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| PackError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt with AES-256-GCM, checking `aad`.
///
/// Returns `None` if the tag does not authenticate.
pub fn aes_gcm_open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Option<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key).ok()?;
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .ok()
        .map(Zeroizing::new)
}

/// Encrypt file content under a data key, producing the cipher blob.
pub fn encrypt_content(key: &DataKey, plaintext: &[u8]) -> PackResult<Vec<u8>> {
    let nonce = generate_nonce();
    let sealed = aes_gcm_seal(key.as_bytes(), &nonce, plaintext, &[])?;

    let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

/// Decrypt a cipher blob under a data key.
pub fn decrypt_content(key: &DataKey, blob: &[u8]) -> PackResult<Zeroizing<Vec<u8>>> {
    if blob.len() < BLOB_OVERHEAD {
        return Err(PackError::AuthenticationFailed);
    }
    let (nonce, sealed) = blob.split_at(NONCE_LEN);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce);

    aes_gcm_open(key.as_bytes(), &nonce_bytes, sealed, &[]).ok_or(PackError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eepack_core::defaults::TAG_LEN;

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_eq!(nonce1.len(), 12);
        assert_ne!(nonce1, nonce2); // Should be random
    }

    #[test]
    fn test_data_keys_are_fresh() {
        let k1 = DataKey::generate();
        let k2 = DataKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_content_roundtrip() {
        let key = DataKey::generate();
        let plaintext = b"this is some text 256";

        let blob = encrypt_content(&key, plaintext).unwrap();
        assert_eq!(blob.len(), plaintext.len() + BLOB_OVERHEAD);

        let decrypted = decrypt_content(&key, &blob).unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_same_content_different_blobs() {
        let key = DataKey::generate();
        let b1 = encrypt_content(&key, b"same").unwrap();
        let b2 = encrypt_content(&key, b"same").unwrap();
        assert_ne!(b1, b2);
    }

    #[test]
    fn test_empty_content() {
        let key = DataKey::generate();
        let blob = encrypt_content(&key, b"").unwrap();
        assert_eq!(blob.len(), BLOB_OVERHEAD);
        assert!(decrypt_content(&key, &blob).unwrap().is_empty());
    }

    #[test]
    fn test_tampered_blob_fails() {
        let key = DataKey::generate();
        let mut blob = encrypt_content(&key, b"Important data").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(matches!(
            decrypt_content(&key, &blob),
            Err(PackError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = encrypt_content(&DataKey::generate(), b"data").unwrap();
        assert!(decrypt_content(&DataKey::generate(), &blob).is_err());
    }

    #[test]
    fn test_short_blob_fails() {
        let key = DataKey::generate();
        assert!(decrypt_content(&key, &[0u8; BLOB_OVERHEAD - 1]).is_err());
    }

    #[test]
    fn test_aad_is_bound() {
        let key = [7u8; 32];
        let nonce = [1u8; 12];
        let sealed = aes_gcm_seal(&key, &nonce, b"secret", b"bob@foo.com").unwrap();
        assert_eq!(sealed.len(), 6 + TAG_LEN);

        assert!(aes_gcm_open(&key, &nonce, &sealed, b"bob@foo.com").is_some());
        assert!(aes_gcm_open(&key, &nonce, &sealed, b"eve@foo.com").is_none());
    }

    #[test]
    fn test_data_key_debug_redacted() {
        let debug = format!("{:?}", DataKey::from_bytes([42u8; 32]));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("42"));
    }
}
