//! The `ee` packer: encrypt, wrap per reader, and sign.
//!
//! # Pack
//!
//! 1. Draw a fresh data key and encrypt the plaintext under it.
//! 2. For the owner and every requested reader, wrap the data key under an
//!    ECDH-derived key (see [`crate::wrap`]).
//! 3. Sign path, wrapped keys, and cipher with the owner's key.
//!
//! # Unpack
//!
//! 1. Resolve the owner's public key (the caller's own if the caller owns
//!    the path, otherwise one lookup).
//! 2. Verify the signature. Nothing is unwrapped or decrypted before this.
//! 3. Unwrap the caller's entry and decrypt.
//!
//! The owner is always a reader, even if `meta.readers` is empty.
//!
//! Both operations first check that the context selects this packer's
//! packing and that the caller's key pair decodes on its curve.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;
use eepack_core::defaults::{BLOB_OVERHEAD, MAX_READERS};
use eepack_core::{
    Context, Metadata, PackError, PackResult, Packer, Packing, PathName, UserName, WrappedKey,
};
use tracing::{debug, instrument, trace, warn};

use crate::cipher::{decrypt_content, encrypt_content, DataKey};
use crate::keys::{decode_private_key, decode_public_key};
use crate::lookup::KeyResolver;
use crate::sign::{sign_blob, verify_blob};
use crate::suite::{CurveSuite, P256Suite, P521Suite};
use crate::wrap::{decoy_unwrap, unwrap_key, wrap_key};

/// Generic `ee` packer over a curve suite.
pub struct EePacker<S: CurveSuite> {
    _suite: PhantomData<S>,
}

/// `ee.p256` packer.
pub type EeP256Packer = EePacker<P256Suite>;

/// `ee.p521` packer.
pub type EeP521Packer = EePacker<P521Suite>;

impl<S: CurveSuite> EePacker<S> {
    /// Create a packer. Packers are stateless.
    pub const fn new() -> Self {
        Self {
            _suite: PhantomData,
        }
    }
}

impl<S: CurveSuite> Default for EePacker<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CurveSuite> std::fmt::Debug for EePacker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EePacker")
            .field("packing", &S::PACKING)
            .finish()
    }
}

/// Owner plus requested readers, de-duplicated and sorted.
fn normalize_readers(owner: &UserName, requested: &[UserName]) -> PackResult<Vec<UserName>> {
    let set: BTreeSet<&UserName> = std::iter::once(owner).chain(requested).collect();
    if set.len() > MAX_READERS {
        return Err(PackError::InvalidMetadata(format!(
            "{} readers exceeds the limit of {}",
            set.len(),
            MAX_READERS
        )));
    }
    Ok(set.into_iter().cloned().collect())
}

fn check_packing<S: CurveSuite>(ctx: &Context) -> PackResult<()> {
    if ctx.packing != S::PACKING {
        return Err(PackError::PackingMismatch {
            context: ctx.packing,
            packer: S::PACKING,
        });
    }
    Ok(())
}

/// The caller's own key pair, decoded on the suite's curve.
///
/// A private key that does not belong to the public key is malformed: a
/// small scalar from a smaller curve is also a valid scalar on a larger one.
fn own_keys<S: CurveSuite>(ctx: &Context) -> PackResult<(S::SecretKey, S::PublicKey)> {
    let secret = decode_private_key::<S>(&ctx.key_pair.private)?;
    let public = decode_public_key::<S>(&ctx.key_pair.public)?;
    if S::public_to_sec1(&S::public_of(&secret)) != S::public_to_sec1(&public) {
        return Err(PackError::MalformedKey(format!(
            "private key does not match public key on {}",
            S::CURVE_NAME
        )));
    }
    Ok((secret, public))
}

#[async_trait]
impl<S: CurveSuite> Packer for EePacker<S> {
    fn packing(&self) -> Packing {
        S::PACKING
    }

    fn pack_len(
        &self,
        _ctx: &Context,
        plaintext_len: usize,
        _meta: &Metadata,
        _name: &PathName,
    ) -> usize {
        plaintext_len.saturating_add(BLOB_OVERHEAD)
    }

    fn unpack_len(&self, _ctx: &Context, cipher_len: usize, _meta: &Metadata) -> usize {
        cipher_len
    }

    #[instrument(skip_all, fields(
        subsystem = "pack",
        op = "pack",
        packing = %self.packing(),
        user = %ctx.user_name,
        plaintext_len = plaintext.len(),
    ))]
    async fn pack(
        &self,
        ctx: &Context,
        dst: &mut [u8],
        plaintext: &[u8],
        meta: &mut Metadata,
        name: &PathName,
    ) -> PackResult<usize> {
        check_packing::<S>(ctx)?;
        let start = Instant::now();
        let owner = name.user();
        if owner != &ctx.user_name {
            return Err(PackError::InvalidPath(format!(
                "{} cannot pack {}: only the owner can",
                ctx.user_name, name
            )));
        }

        let needed = self.pack_len(ctx, plaintext.len(), meta, name);
        if dst.len() < needed {
            return Err(PackError::BufferTooSmall {
                needed,
                got: dst.len(),
            });
        }

        let (owner_secret, owner_public) = own_keys::<S>(ctx)?;
        let readers = normalize_readers(owner, &meta.readers)?;

        let data_key = DataKey::generate();
        let cipher = encrypt_content(&data_key, plaintext)?;

        let mut resolver = KeyResolver::<S>::new(ctx.key_lookup.as_ref());
        let mut wrapped_keys = Vec::with_capacity(readers.len());
        for reader in &readers {
            let reader_public = if reader == owner {
                owner_public.clone()
            } else {
                resolver.resolve(reader).await?
            };
            let key = wrap_key::<S>(&owner_secret, &reader_public, owner, reader, &data_key)?;
            trace!(reader = %reader, "Wrapped data key");
            wrapped_keys.push(WrappedKey {
                user: reader.clone(),
                key,
            });
        }

        let signature = sign_blob::<S>(&owner_secret, name, &wrapped_keys, &cipher)?;

        dst[..cipher.len()].copy_from_slice(&cipher);
        meta.readers = readers;
        meta.wrapped_keys = wrapped_keys;
        meta.signature = signature;

        debug!(
            reader_count = meta.readers.len(),
            cipher_len = cipher.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Packed blob"
        );
        Ok(cipher.len())
    }

    #[instrument(skip_all, fields(
        subsystem = "pack",
        op = "unpack",
        packing = %self.packing(),
        user = %ctx.user_name,
        owner = %name.user(),
        cipher_len = cipher.len(),
    ))]
    async fn unpack(
        &self,
        ctx: &Context,
        dst: &mut [u8],
        cipher: &[u8],
        meta: &Metadata,
        name: &PathName,
    ) -> PackResult<usize> {
        check_packing::<S>(ctx)?;
        let start = Instant::now();
        let owner = name.user();
        let caller = &ctx.user_name;

        let needed = cipher.len().saturating_sub(BLOB_OVERHEAD);
        if dst.len() < needed {
            return Err(PackError::BufferTooSmall {
                needed,
                got: dst.len(),
            });
        }

        let (caller_secret, caller_public) = own_keys::<S>(ctx)?;
        let owner_public = if caller == owner {
            caller_public
        } else {
            KeyResolver::<S>::new(ctx.key_lookup.as_ref())
                .resolve(owner)
                .await?
        };

        if !meta.readers_match_wrapped_keys() {
            warn!("Reader list does not match wrapped keys");
            return Err(PackError::SignatureInvalid);
        }
        verify_blob::<S>(
            &owner_public,
            name,
            &meta.wrapped_keys,
            cipher,
            &meta.signature,
        )
        .map_err(|e| {
            warn!(error = %e, "Owner signature rejected");
            e
        })?;

        let Some(entry) = meta.wrapped_key_for(caller) else {
            decoy_unwrap::<S>(&caller_secret, &owner_public, owner, caller);
            debug!("Caller has no wrapped key");
            return Err(PackError::NotAuthorizedReader);
        };

        let data_key = unwrap_key::<S>(&caller_secret, &owner_public, owner, caller, &entry.key)
            .map_err(|e| {
                warn!(error = %e, "Wrapped key rejected");
                e
            })?;
        let plaintext = decrypt_content(&data_key, cipher)?;

        dst[..plaintext.len()].copy_from_slice(&plaintext);
        debug!(
            plaintext_len = plaintext.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Unpacked blob"
        );
        Ok(plaintext.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;
    use eepack_core::{KeyLookup, KeyPair, UserKeys};
    use std::sync::Arc;

    struct NoUsers;

    #[async_trait]
    impl KeyLookup for NoUsers {
        async fn lookup(&self, user: &UserName) -> PackResult<UserKeys> {
            Err(PackError::IdentityNotFound(user.clone()))
        }
    }

    fn user(s: &str) -> UserName {
        UserName::parse(s).unwrap()
    }

    fn ctx(name: &str, key_pair: KeyPair) -> Context {
        Context::new(user(name), key_pair, Packing::EeP256, Arc::new(NoUsers))
    }

    #[test]
    fn test_len_helpers() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/f").unwrap();
        let meta = Metadata::default();

        assert_eq!(packer.pack_len(&c, 0, &meta, &p), BLOB_OVERHEAD);
        assert_eq!(packer.pack_len(&c, 100, &meta, &p), 100 + BLOB_OVERHEAD);
        assert_eq!(packer.pack_len(&c, usize::MAX, &meta, &p), usize::MAX);
        assert_eq!(packer.unpack_len(&c, 128, &meta), 128);
        assert_eq!(packer.unpack_len(&c, 3, &meta), 3);
    }

    #[test]
    fn test_normalize_readers() {
        let owner = user("dude@google.com");
        let readers = normalize_readers(
            &owner,
            &[user("bob@foo.com"), owner.clone(), user("bob@foo.com")],
        )
        .unwrap();
        assert_eq!(readers, vec![user("bob@foo.com"), owner.clone()]);

        assert_eq!(normalize_readers(&owner, &[]).unwrap(), vec![owner]);
    }

    #[test]
    fn test_too_many_readers() {
        let owner = user("dude@google.com");
        let many: Vec<UserName> = (0..MAX_READERS)
            .map(|i| user(&format!("r{}@x.com", i)))
            .collect();
        assert!(matches!(
            normalize_readers(&owner, &many),
            Err(PackError::InvalidMetadata(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_only_pack_needs_no_lookup() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::default();
        let mut cipher = vec![0u8; packer.pack_len(&c, 5, &meta, &p)];

        let n = packer.pack(&c, &mut cipher, b"hello", &mut meta, &p).await.unwrap();
        assert_eq!(meta.readers, vec![user("user@google.com")]);
        assert_eq!(meta.wrapped_keys.len(), 1);

        let mut clear = vec![0u8; packer.unpack_len(&c, n, &meta)];
        let m = packer.unpack(&c, &mut clear, &cipher[..n], &meta, &p).await.unwrap();
        assert_eq!(&clear[..m], b"hello");
    }

    #[tokio::test]
    async fn test_pack_rejects_small_buffer_without_touching_metadata() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::with_readers(vec![user("bob@foo.com")]);
        let mut dst = vec![0u8; 10];

        let err = packer.pack(&c, &mut dst, b"hello", &mut meta, &p).await.unwrap_err();
        assert!(matches!(err, PackError::BufferTooSmall { needed: 33, got: 10 }));
        assert_eq!(meta, Metadata::with_readers(vec![user("bob@foo.com")]));
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_metadata_alone() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::with_readers(vec![user("ghost@x.com")]);
        let mut dst = vec![0u8; 64];

        let err = packer.pack(&c, &mut dst, b"hello", &mut meta, &p).await.unwrap_err();
        assert!(matches!(err, PackError::IdentityNotFound(_)));
        assert!(meta.wrapped_keys.is_empty());
        assert!(meta.signature.is_empty());
    }

    #[tokio::test]
    async fn test_only_owner_can_pack() {
        let packer = EeP256Packer::new();
        let c = ctx("bob@foo.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("dude@google.com/file").unwrap();
        let mut dst = vec![0u8; 64];

        let err = packer
            .pack(&c, &mut dst, b"x", &mut Metadata::default(), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_unpack_rejects_small_buffer() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::default();
        let mut cipher = vec![0u8; 64];
        let n = packer.pack(&c, &mut cipher, b"hello", &mut meta, &p).await.unwrap();

        let mut clear = vec![0u8; 4];
        let err = packer
            .unpack(&c, &mut clear, &cipher[..n], &meta, &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::BufferTooSmall { needed: 5, got: 4 }));
    }

    #[tokio::test]
    async fn test_reader_list_mismatch_is_invalid() {
        let packer = EeP256Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP256));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::default();
        let mut cipher = vec![0u8; 64];
        let n = packer.pack(&c, &mut cipher, b"hello", &mut meta, &p).await.unwrap();

        meta.readers.push(user("eve@evil.com"));
        let mut clear = vec![0u8; n];
        let err = packer
            .unpack(&c, &mut clear, &cipher[..n], &meta, &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_context_packing_must_match_packer() {
        let packer = EeP521Packer::new();
        let c = ctx("user@google.com", generate_key_pair(Packing::EeP521));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut meta = Metadata::default();
        let mut dst = vec![0u8; 64];

        let err = packer.pack(&c, &mut dst, b"x", &mut meta, &p).await.unwrap_err();
        assert!(matches!(
            err,
            PackError::PackingMismatch {
                context: Packing::EeP256,
                packer: Packing::EeP521,
            }
        ));
        assert_eq!(meta, Metadata::default());

        let err = packer.unpack(&c, &mut dst, &[0u8; 40], &meta, &p).await.unwrap_err();
        assert!(matches!(err, PackError::PackingMismatch { .. }));
    }

    #[tokio::test]
    async fn test_mismatched_key_pair_is_malformed() {
        let packer = EeP256Packer::new();
        let mine = generate_key_pair(Packing::EeP256);
        let other = generate_key_pair(Packing::EeP256);
        let c = ctx("user@google.com", KeyPair::new(mine.public, other.private));
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut dst = vec![0u8; 64];

        let err = packer
            .pack(&c, &mut dst, b"x", &mut Metadata::default(), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::MalformedKey(_)));

        let err = packer
            .unpack(&c, &mut dst, &[0u8; 40], &Metadata::default(), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::MalformedKey(_)));
    }

    #[tokio::test]
    async fn test_malformed_context_key() {
        let packer = EeP256Packer::new();
        let kp = generate_key_pair(Packing::EeP256);
        let c = ctx(
            "user@google.com",
            KeyPair::new(kp.public, eepack_core::PrivateKey::new("not a number")),
        );
        let p = PathName::parse("user@google.com/file").unwrap();
        let mut dst = vec![0u8; 64];

        let err = packer
            .pack(&c, &mut dst, b"x", &mut Metadata::default(), &p)
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::MalformedKey(_)));
    }
}
