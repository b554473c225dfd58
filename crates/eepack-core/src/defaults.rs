//! Centralized default constants for eepack.
//!
//! **This module is the single source of truth** for sizes and labels shared
//! between the packer and its callers. Changing any value here changes the
//! on-disk format of packed blobs and their metadata.

// =============================================================================
// CONTENT CIPHER
// =============================================================================

/// Length of the per-blob data key (AES-256).
pub const DATA_KEY_LEN: usize = 32;

/// Length of an AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Length of an AES-GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Bytes a packed blob adds on top of the plaintext (nonce + tag).
pub const BLOB_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

// =============================================================================
// KEY WRAPPING
// =============================================================================

/// Length of one wrapped data key: nonce || sealed key || tag.
pub const WRAPPED_KEY_LEN: usize = NONCE_LEN + DATA_KEY_LEN + TAG_LEN;

/// HKDF info prefix for wrapping keys.
pub const WRAP_LABEL: &[u8] = b"eepack/wrap/v1";

/// Prefix of every signed message.
pub const SIGN_LABEL: &[u8] = b"eepack/sign/v1";

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum number of readers (owner included) on one blob.
pub const MAX_READERS: usize = 1000;

/// Maximum byte length of a user name.
pub const MAX_USER_NAME_LEN: usize = 254;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_key_len() {
        assert_eq!(WRAPPED_KEY_LEN, 60);
    }

    #[test]
    fn test_blob_overhead() {
        assert_eq!(BLOB_OVERHEAD, 28);
    }

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(WRAP_LABEL, SIGN_LABEL);
    }
}
