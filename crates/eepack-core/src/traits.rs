//! Core traits for eepack abstractions.
//!
//! These traits define the seams between the packer and the rest of the
//! storage system: the key lookup service it consumes and the packer
//! interface it provides.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::PackResult;
use crate::keys::PublicKey;
use crate::models::{Metadata, Packing, PathName, UserName};

// =============================================================================
// KEY LOOKUP
// =============================================================================

/// Network location of a service a user publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Transport name, e.g. "remote" or "inprocess".
    pub transport: String,
    /// Transport-specific address.
    pub address: String,
}

/// Everything the lookup service knows about one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKeys {
    /// Service endpoints. The packer ignores these.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Current public keys, most preferred first.
    pub public_keys: Vec<PublicKey>,
}

/// Resolves a user identity to its published public keys.
///
/// Implementations own any caching, timeouts, and retry policy. Errors should
/// be `IdentityNotFound` for unknown users and `LookupUnavailable` for
/// everything else.
#[async_trait]
pub trait KeyLookup: Send + Sync {
    /// Look up a user's endpoints and public keys.
    async fn lookup(&self, user: &UserName) -> PackResult<UserKeys>;
}

// =============================================================================
// PACKER
// =============================================================================

/// Encrypt-and-sign / verify-and-decrypt for one packing variant.
///
/// Packers hold no per-call state, so one instance serves concurrent calls
/// with different contexts.
#[async_trait]
pub trait Packer: Send + Sync {
    /// The packing variant this packer implements.
    fn packing(&self) -> Packing;

    /// Upper bound on the cipher length `pack` produces for a plaintext.
    fn pack_len(
        &self,
        ctx: &Context,
        plaintext_len: usize,
        meta: &Metadata,
        name: &PathName,
    ) -> usize;

    /// Upper bound on the plaintext length `unpack` produces for a cipher.
    fn unpack_len(&self, ctx: &Context, cipher_len: usize, meta: &Metadata) -> usize;

    /// Encrypt `plaintext` into `dst` for the owner and `meta.readers`.
    ///
    /// Populates `meta.readers`, `meta.wrapped_keys`, and `meta.signature`
    /// and returns the number of bytes written.
    async fn pack(
        &self,
        ctx: &Context,
        dst: &mut [u8],
        plaintext: &[u8],
        meta: &mut Metadata,
        name: &PathName,
    ) -> PackResult<usize>;

    /// Verify and decrypt `cipher` into `dst` as the context's user.
    ///
    /// Returns the number of plaintext bytes written. Nothing is written
    /// unless the owner's signature verifies.
    async fn unpack(
        &self,
        ctx: &Context,
        dst: &mut [u8],
        cipher: &[u8],
        meta: &Metadata,
        name: &PathName,
    ) -> PackResult<usize>;
}
