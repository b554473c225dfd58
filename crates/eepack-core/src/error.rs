//! Error types for eepack.

use thiserror::Error;

use crate::models::{Packing, UserName};

/// Result type alias using eepack's error type.
pub type PackResult<T> = std::result::Result<T, PackError>;

/// Errors returned by packers, key codecs, and key lookup.
///
/// Nothing is recovered internally: every failure reaches the caller as-is.
#[derive(Error, Debug)]
pub enum PackError {
    /// Key material has the wrong shape, is not numeric, is not on the
    /// configured curve, or is out of the scalar range.
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// The key lookup service does not know this user.
    #[error("Identity not found: {0}")]
    IdentityNotFound(UserName),

    /// The key lookup service could not be reached or failed.
    #[error("Key lookup unavailable: {0}")]
    LookupUnavailable(String),

    /// The user has keys, but none of them is usable with the active packing.
    #[error("No key for {0} is compatible with this packing")]
    NoCompatibleKey(UserName),

    /// The caller has no wrapped key in this blob's metadata.
    #[error("Caller is not an authorized reader")]
    NotAuthorizedReader,

    /// A wrapped key failed to authenticate under the derived wrapping key.
    #[error("Failed to unwrap content key")]
    UnwrapFailed,

    /// The owner's signature does not match the blob, readers, and path.
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// Content ciphertext failed authentication.
    #[error("Authentication failed - data may be tampered")]
    AuthenticationFailed,

    /// Encryption failed (input exceeds cipher limits).
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Destination buffer is smaller than the operation needs.
    #[error("Buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    /// User name does not follow the `local@domain` shape.
    #[error("Invalid user name: {0}")]
    InvalidUserName(String),

    /// Path name is not rooted at a valid user name.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Metadata is structurally inconsistent.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Unknown packing name or code.
    #[error("Unknown packing: {0}")]
    UnknownPacking(String),

    /// The context selects a different packing than the packer implements.
    #[error("Context selects {context} but the packer is {packer}")]
    PackingMismatch { context: Packing, packer: Packing },

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PackError {
    /// Whether retrying the same call later could succeed.
    ///
    /// Only lookup outages qualify; the retry itself is the caller's job.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PackError::LookupUnavailable(_))
    }

    /// Whether the error signals tampering or forgery of a packed blob.
    pub fn is_tamper(&self) -> bool {
        matches!(
            self,
            PackError::UnwrapFailed | PackError::SignatureInvalid | PackError::AuthenticationFailed
        )
    }
}
