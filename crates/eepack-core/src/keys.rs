//! Textual key material.
//!
//! Keys travel between the packer, the key lookup service, and local key
//! storage in their canonical text form. These types hold that text without
//! interpreting it; decoding onto a curve happens in the packer, which knows
//! the active packing.
//!
//! - Public key: two decimal integers (point coordinates) separated by `\n`.
//! - Private key: one decimal integer (the scalar).

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Public key in canonical text form.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    /// Wrap public key text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(12).collect();
        write!(f, "PublicKey({}...)", prefix)
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Private key in canonical text form, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Wrap private key text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The key text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A user's key pair for one packing variant.
///
/// Packers reject a pair whose private half does not derive the public
/// half.
#[derive(Clone)]
pub struct KeyPair {
    /// The public key (can be shared).
    pub public: PublicKey,
    /// The private key (must be kept secret).
    pub private: PrivateKey,
}

impl KeyPair {
    /// Build a key pair from its two text halves.
    pub fn new(public: PublicKey, private: PrivateKey) -> Self {
        Self { public, private }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_debug_redacted() {
        let key = PrivateKey::new(
            "82201047360680847258309465671292633303992565667422607675215625927005262185934",
        );
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("8220"));
    }

    #[test]
    fn test_keypair_debug() {
        let kp = KeyPair::new(PublicKey::new("123\n456"), PrivateKey::new("789"));
        let debug = format!("{:?}", kp);
        assert!(debug.contains("KeyPair"));
        assert!(debug.contains("PublicKey"));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("789"));
    }

    #[test]
    fn test_public_key_serde_transparent() {
        let key = PublicKey::new("1\n2");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"1\\n2\"");
        let parsed: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
