//! Per-reader wrapping of the data key.
//!
//! # Protocol
//!
//! For pack, for each reader R (owner included):
//! 1. `S = ECDH(owner_secret, R_public)`
//! 2. Fresh 12-byte nonce
//! 3. `K_w = HKDF(salt = nonce, ikm = S, info = label || packing || owner || R)`
//! 4. Entry = `nonce || AES-256-GCM(K_w, nonce, data_key, aad = R)`
//!
//! For unpack, reader R computes `S = ECDH(R_secret, owner_public)`, which
//! equals the pack-time secret, and derives the same `K_w`. Readers never
//! need to share a secret with the owner in advance; they only need the
//! owner's public key.

use eepack_core::defaults::{DATA_KEY_LEN, NONCE_LEN, WRAPPED_KEY_LEN, WRAP_LABEL};
use eepack_core::{PackError, PackResult, Packing, UserName};

use crate::cipher::{aes_gcm_open, aes_gcm_seal, generate_nonce, DataKey};
use crate::suite::CurveSuite;

/// HKDF info binding the wrapping key to packing, owner, and reader.
fn wrap_info(packing: Packing, owner: &UserName, reader: &UserName) -> Vec<u8> {
    let mut info = Vec::with_capacity(
        WRAP_LABEL.len() + 1 + 4 + owner.as_bytes().len() + reader.as_bytes().len(),
    );
    info.extend_from_slice(WRAP_LABEL);
    info.push(packing.code());
    // User names are at most MAX_USER_NAME_LEN bytes.
    info.extend_from_slice(&(owner.as_bytes().len() as u16).to_be_bytes());
    info.extend_from_slice(owner.as_bytes());
    info.extend_from_slice(&(reader.as_bytes().len() as u16).to_be_bytes());
    info.extend_from_slice(reader.as_bytes());
    info
}

/// Wrap `data_key` for `reader`, as `owner`.
pub fn wrap_key<S: CurveSuite>(
    owner_secret: &S::SecretKey,
    reader_public: &S::PublicKey,
    owner: &UserName,
    reader: &UserName,
    data_key: &DataKey,
) -> PackResult<Vec<u8>> {
    let shared = S::diffie_hellman(owner_secret, reader_public);
    let nonce = generate_nonce();
    let kek = S::derive_key(&nonce, &shared, &wrap_info(S::PACKING, owner, reader));

    let sealed = aes_gcm_seal(&kek, &nonce, data_key.as_bytes(), reader.as_bytes())?;

    let mut wrapped = Vec::with_capacity(WRAPPED_KEY_LEN);
    wrapped.extend_from_slice(&nonce);
    wrapped.extend_from_slice(&sealed);
    Ok(wrapped)
}

/// Recover the data key from `reader`'s wrapped entry.
///
/// Fails with `UnwrapFailed` if the entry is malformed or does not
/// authenticate under the derived key.
pub fn unwrap_key<S: CurveSuite>(
    reader_secret: &S::SecretKey,
    owner_public: &S::PublicKey,
    owner: &UserName,
    reader: &UserName,
    wrapped: &[u8],
) -> PackResult<DataKey> {
    let shared = S::diffie_hellman(reader_secret, owner_public);

    let mut nonce = [0u8; NONCE_LEN];
    let sealed = if wrapped.len() == WRAPPED_KEY_LEN {
        nonce.copy_from_slice(&wrapped[..NONCE_LEN]);
        &wrapped[NONCE_LEN..]
    } else {
        &[][..]
    };

    let kek = S::derive_key(&nonce, &shared, &wrap_info(S::PACKING, owner, reader));
    let opened =
        aes_gcm_open(&kek, &nonce, sealed, reader.as_bytes()).ok_or(PackError::UnwrapFailed)?;

    let bytes: [u8; DATA_KEY_LEN] = opened
        .as_slice()
        .try_into()
        .map_err(|_| PackError::UnwrapFailed)?;
    Ok(DataKey::from_bytes(bytes))
}

/// Do the work of an unwrap for a caller that has no entry.
///
/// Keeps a missing entry from being distinguishable by timing from a
/// corrupt one.
pub fn decoy_unwrap<S: CurveSuite>(
    reader_secret: &S::SecretKey,
    owner_public: &S::PublicKey,
    owner: &UserName,
    reader: &UserName,
) {
    let decoy = [0u8; WRAPPED_KEY_LEN];
    let _ = std::hint::black_box(unwrap_key::<S>(
        reader_secret,
        owner_public,
        owner,
        reader,
        &decoy,
    ));
}
