//! Owner signatures over a packed blob.
//!
//! The signed message binds the blob to its path and to the exact set of
//! wrapped keys, so none of the three can be swapped independently:
//!
//! ```text
//! "eepack/sign/v1" || packing code
//!   || u16 BE path len || path
//!   || u64 BE list len || canonical wrapped-key list
//!   || H(cipher blob)
//! ```

use eepack_core::defaults::SIGN_LABEL;
use eepack_core::{PackError, PackResult, PathName, WrappedKey};

use crate::format::encode_wrapped_keys;
use crate::suite::CurveSuite;

/// Build the message the owner signs.
pub fn signed_message<S: CurveSuite>(
    path: &PathName,
    wrapped_keys: &[WrappedKey],
    cipher: &[u8],
) -> PackResult<Vec<u8>> {
    let encoded = encode_wrapped_keys(wrapped_keys)?;
    let path_len = u16::try_from(path.as_bytes().len())
        .map_err(|_| PackError::InvalidPath("path name too long".to_string()))?;
    let cipher_hash = S::digest(cipher);

    let mut msg = Vec::with_capacity(
        SIGN_LABEL.len() + 1 + 2 + path.as_bytes().len() + 8 + encoded.len() + cipher_hash.len(),
    );
    msg.extend_from_slice(SIGN_LABEL);
    msg.push(S::PACKING.code());
    msg.extend_from_slice(&path_len.to_be_bytes());
    msg.extend_from_slice(path.as_bytes());
    msg.extend_from_slice(&(encoded.len() as u64).to_be_bytes());
    msg.extend_from_slice(&encoded);
    msg.extend_from_slice(&cipher_hash);
    Ok(msg)
}

/// Sign a packed blob as its owner.
pub fn sign_blob<S: CurveSuite>(
    owner_secret: &S::SecretKey,
    path: &PathName,
    wrapped_keys: &[WrappedKey],
    cipher: &[u8],
) -> PackResult<Vec<u8>> {
    let msg = signed_message::<S>(path, wrapped_keys, cipher)?;
    S::sign(owner_secret, &msg)
}

/// Verify the owner's signature, failing with `SignatureInvalid`.
///
/// A list that cannot be canonically encoded (duplicates, oversized fields)
/// is reported as a bad signature too: the owner never signs such a list.
pub fn verify_blob<S: CurveSuite>(
    owner_public: &S::PublicKey,
    path: &PathName,
    wrapped_keys: &[WrappedKey],
    cipher: &[u8],
    signature: &[u8],
) -> PackResult<()> {
    let msg =
        signed_message::<S>(path, wrapped_keys, cipher).map_err(|_| PackError::SignatureInvalid)?;
    if S::verify(owner_public, &msg, signature) {
        Ok(())
    } else {
        Err(PackError::SignatureInvalid)
    }
}
