//! Core data models for eepack.
//!
//! These types are shared by the packer and its callers and represent the
//! identities, names, and per-blob metadata the packer works on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::defaults::MAX_USER_NAME_LEN;
use crate::error::{PackError, PackResult};

// =============================================================================
// IDENTITIES AND NAMES
// =============================================================================

/// Globally unique, email-like user identity (`local@domain`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and wrap a user name.
    pub fn parse(s: &str) -> PackResult<Self> {
        if s.is_empty() || s.len() > MAX_USER_NAME_LEN {
            return Err(PackError::InvalidUserName(format!(
                "length must be 1..={} bytes, got {}",
                MAX_USER_NAME_LEN,
                s.len()
            )));
        }
        if s.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control()) {
            return Err(PackError::InvalidUserName(format!(
                "{:?} contains '/', whitespace, or control characters",
                s
            )));
        }
        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(PackError::InvalidUserName(format!(
                "{:?} is not of the form local@domain",
                s
            ))),
        }
    }

    /// The user name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The user name as bytes (used in canonical encodings).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserName {
    type Err = PackError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = PackError;
    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<UserName> for String {
    fn from(user: UserName) -> Self {
        user.0
    }
}

/// Path of a blob, rooted at its owner: `owner@domain/dir/file`.
///
/// Only the owner component is interpreted here; the rest of the path grammar
/// belongs to the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathName {
    full: String,
    owner: UserName,
}

impl PathName {
    /// Parse a path, validating its owner component.
    pub fn parse(s: &str) -> PackResult<Self> {
        let owner_part = s.split('/').next().unwrap_or_default();
        let owner = UserName::parse(owner_part)
            .map_err(|e| PackError::InvalidPath(format!("{:?}: {}", s, e)))?;
        Ok(Self {
            full: s.to_string(),
            owner,
        })
    }

    /// The user who owns this path.
    pub fn user(&self) -> &UserName {
        &self.owner
    }

    /// The full path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The full path as bytes (used in canonical encodings).
    pub fn as_bytes(&self) -> &[u8] {
        self.full.as_bytes()
    }
}

impl std::fmt::Display for PathName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

impl std::str::FromStr for PathName {
    type Err = PackError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// PACKING VARIANTS
// =============================================================================

/// Closed set of packing variants. Each tag binds one curve, hash, cipher,
/// and signature scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Packing {
    /// NIST P-256, SHA-256, AES-256-GCM, ECDSA.
    #[serde(rename = "ee.p256")]
    EeP256,
    /// NIST P-521, SHA-512, AES-256-GCM, ECDSA.
    #[serde(rename = "ee.p521")]
    EeP521,
}

impl Packing {
    /// Every supported packing, in code order.
    pub const ALL: [Packing; 2] = [Packing::EeP256, Packing::EeP521];

    /// Stable numeric code, bound into wrapping keys and signatures.
    pub fn code(self) -> u8 {
        match self {
            Self::EeP256 => 20,
            Self::EeP521 => 21,
        }
    }

    /// Look up a packing by numeric code.
    pub fn from_code(code: u8) -> PackResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or_else(|| PackError::UnknownPacking(code.to_string()))
    }
}

impl std::fmt::Display for Packing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EeP256 => write!(f, "ee.p256"),
            Self::EeP521 => write!(f, "ee.p521"),
        }
    }
}

impl std::str::FromStr for Packing {
    type Err = PackError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ee.p256" | "eep256" | "p256" => Ok(Self::EeP256),
            "ee.p521" | "eep521" | "p521" => Ok(Self::EeP521),
            _ => Err(PackError::UnknownPacking(s.to_string())),
        }
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// One reader's copy of the data key, wrapped under a key only that reader
/// (and the owner) can derive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Reader this entry is for.
    pub user: UserName,
    /// Wrapped data key bytes.
    #[serde(with = "base64_bytes_vec")]
    pub key: Vec<u8>,
}

/// Caller-owned metadata attached to one blob.
///
/// Created empty (apart from `readers`) before pack; populated by pack;
/// only read by unpack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Users allowed to read the blob. The owner is always included after pack.
    #[serde(default)]
    pub readers: Vec<UserName>,

    /// One wrapped data key per reader.
    #[serde(default)]
    pub wrapped_keys: Vec<WrappedKey>,

    /// Owner's signature over blob, wrapped keys, and path.
    #[serde(default, with = "base64_bytes_vec")]
    pub signature: Vec<u8>,
}

impl Metadata {
    /// Create metadata requesting the given readers.
    pub fn with_readers(readers: Vec<UserName>) -> Self {
        Self {
            readers,
            ..Default::default()
        }
    }

    /// Find the wrapped key for a user.
    pub fn wrapped_key_for(&self, user: &UserName) -> Option<&WrappedKey> {
        self.wrapped_keys.iter().find(|w| &w.user == user)
    }

    /// Users covered by wrapped keys, in canonical order.
    pub fn reader_names(&self) -> Vec<&UserName> {
        let set: BTreeSet<&UserName> = self.wrapped_keys.iter().map(|w| &w.user).collect();
        set.into_iter().collect()
    }

    /// Whether a user has a wrapped key (does not check the signature).
    pub fn can_unpack(&self, user: &UserName) -> bool {
        self.wrapped_key_for(user).is_some()
    }

    /// Whether `readers` and the wrapped-key identities name the same set.
    pub fn readers_match_wrapped_keys(&self) -> bool {
        let readers: BTreeSet<&UserName> = self.readers.iter().collect();
        let wrapped: BTreeSet<&UserName> = self.wrapped_keys.iter().map(|w| &w.user).collect();
        readers == wrapped
    }
}

/// Serde helper for base64-encoded byte vectors.
mod base64_bytes_vec {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}
