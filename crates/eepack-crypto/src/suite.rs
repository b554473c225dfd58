//! Curve parameter sets.
//!
//! Each packing variant fixes a curve, a hash, and a signature scheme. A
//! [`CurveSuite`] exposes exactly the primitive operations the generic packer
//! needs, so the protocol itself is written once in [`crate::packer`].
//!
//! | Suite | Curve | Hash | Signature |
//! |-------|-------|------|-----------|
//! | [`P256Suite`] | NIST P-256 | SHA-256 | ECDSA P-256 |
//! | [`P521Suite`] | NIST P-521 | SHA-512 | ECDSA P-521 |
//!
//! Scalar multiplication, ECDH, and signing go through the RustCrypto curve
//! crates, whose arithmetic is constant time.

use eepack_core::{PackError, PackResult, Packing};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

/// Primitive operations for one packing variant.
pub trait CurveSuite: Send + Sync + 'static {
    /// Packing tag this suite implements.
    const PACKING: Packing;
    /// Human-readable curve name.
    const CURVE_NAME: &'static str;
    /// Size of a field element / scalar in bytes.
    const FIELD_SIZE: usize;

    /// Validated curve point.
    type PublicKey: Clone + Send + Sync;
    /// Validated non-zero scalar.
    type SecretKey: Send + Sync;

    /// Parse an uncompressed SEC1 point, rejecting points not on the curve.
    fn public_from_sec1(bytes: &[u8]) -> Option<Self::PublicKey>;

    /// Encode a point as uncompressed SEC1 (`0x04 || x || y`).
    fn public_to_sec1(key: &Self::PublicKey) -> Vec<u8>;

    /// Parse a big-endian scalar of exactly `FIELD_SIZE` bytes in `[1, n)`.
    fn secret_from_be_bytes(bytes: &[u8]) -> Option<Self::SecretKey>;

    /// Encode a scalar as `FIELD_SIZE` big-endian bytes.
    fn secret_to_be_bytes(key: &Self::SecretKey) -> Zeroizing<Vec<u8>>;

    /// Draw a fresh scalar from the OS CSPRNG.
    fn random_secret() -> Self::SecretKey;

    /// The point `secret * G`.
    fn public_of(secret: &Self::SecretKey) -> Self::PublicKey;

    /// ECDH: x-coordinate of `secret * public`.
    fn diffie_hellman(secret: &Self::SecretKey, public: &Self::PublicKey) -> Zeroizing<Vec<u8>>;

    /// HKDF with the suite's hash, producing a 256-bit key.
    fn derive_key(salt: &[u8], ikm: &[u8], info: &[u8]) -> Zeroizing<[u8; 32]>;

    /// The suite's hash.
    fn digest(data: &[u8]) -> Vec<u8>;

    /// ECDSA-sign `msg` (hashed with the suite's hash), returning `r || s`.
    fn sign(secret: &Self::SecretKey, msg: &[u8]) -> PackResult<Vec<u8>>;

    /// Verify an `r || s` signature over `msg`.
    fn verify(public: &Self::PublicKey, msg: &[u8], signature: &[u8]) -> bool;
}

/// NIST P-256 with SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct P256Suite;

impl CurveSuite for P256Suite {
    const PACKING: Packing = Packing::EeP256;
    const CURVE_NAME: &'static str = "P-256";
    const FIELD_SIZE: usize = 32;

    type PublicKey = p256::PublicKey;
    type SecretKey = p256::SecretKey;

    fn public_from_sec1(bytes: &[u8]) -> Option<Self::PublicKey> {
        p256::PublicKey::from_sec1_bytes(bytes).ok()
    }

    fn public_to_sec1(key: &Self::PublicKey) -> Vec<u8> {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        key.to_encoded_point(false).as_bytes().to_vec()
    }

    fn secret_from_be_bytes(bytes: &[u8]) -> Option<Self::SecretKey> {
        if bytes.len() != Self::FIELD_SIZE {
            return None;
        }
        p256::SecretKey::from_slice(bytes).ok()
    }

    fn secret_to_be_bytes(key: &Self::SecretKey) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(key.to_bytes().to_vec())
    }

    fn random_secret() -> Self::SecretKey {
        p256::SecretKey::random(&mut OsRng)
    }

    fn public_of(secret: &Self::SecretKey) -> Self::PublicKey {
        secret.public_key()
    }

    fn diffie_hellman(secret: &Self::SecretKey, public: &Self::PublicKey) -> Zeroizing<Vec<u8>> {
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        Zeroizing::new(shared.raw_secret_bytes().to_vec())
    }

    fn derive_key(salt: &[u8], ikm: &[u8], info: &[u8]) -> Zeroizing<[u8; 32]> {
        let hkdf = Hkdf::<Sha256>::new(Some(salt), ikm);
        let mut key = Zeroizing::new([0u8; 32]);
        // HKDF expand cannot fail with a 32-byte output
        hkdf.expand(info, &mut key[..])
            .expect("HKDF expand failed - this should never happen with 32-byte output");
        key
    }

    fn digest(data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn sign(secret: &Self::SecretKey, msg: &[u8]) -> PackResult<Vec<u8>> {
        use p256::ecdsa::signature::Signer;
        let key = p256::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| PackError::MalformedKey(format!("unusable P-256 signing key: {}", e)))?;
        let signature: p256::ecdsa::Signature = key
            .try_sign(msg)
            .map_err(|e| PackError::MalformedKey(format!("P-256 signing failed: {}", e)))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(public: &Self::PublicKey, msg: &[u8], signature: &[u8]) -> bool {
        use p256::ecdsa::signature::Verifier;
        let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
            return false;
        };
        let Ok(key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(&Self::public_to_sec1(public))
        else {
            return false;
        };
        key.verify(msg, &signature).is_ok()
    }
}

/// NIST P-521 with SHA-512.
#[derive(Debug, Clone, Copy, Default)]
pub struct P521Suite;

impl CurveSuite for P521Suite {
    const PACKING: Packing = Packing::EeP521;
    const CURVE_NAME: &'static str = "P-521";
    const FIELD_SIZE: usize = 66;

    type PublicKey = p521::PublicKey;
    type SecretKey = p521::SecretKey;

    fn public_from_sec1(bytes: &[u8]) -> Option<Self::PublicKey> {
        p521::PublicKey::from_sec1_bytes(bytes).ok()
    }

    fn public_to_sec1(key: &Self::PublicKey) -> Vec<u8> {
        use p521::elliptic_curve::sec1::ToEncodedPoint;
        key.to_encoded_point(false).as_bytes().to_vec()
    }

    fn secret_from_be_bytes(bytes: &[u8]) -> Option<Self::SecretKey> {
        if bytes.len() != Self::FIELD_SIZE {
            return None;
        }
        p521::SecretKey::from_slice(bytes).ok()
    }

    fn secret_to_be_bytes(key: &Self::SecretKey) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(key.to_bytes().to_vec())
    }

    fn random_secret() -> Self::SecretKey {
        p521::SecretKey::random(&mut OsRng)
    }

    fn public_of(secret: &Self::SecretKey) -> Self::PublicKey {
        secret.public_key()
    }

    fn diffie_hellman(secret: &Self::SecretKey, public: &Self::PublicKey) -> Zeroizing<Vec<u8>> {
        let shared = p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        Zeroizing::new(shared.raw_secret_bytes().to_vec())
    }

    fn derive_key(salt: &[u8], ikm: &[u8], info: &[u8]) -> Zeroizing<[u8; 32]> {
        let hkdf = Hkdf::<Sha512>::new(Some(salt), ikm);
        let mut key = Zeroizing::new([0u8; 32]);
        // HKDF expand cannot fail with a 32-byte output
        hkdf.expand(info, &mut key[..])
            .expect("HKDF expand failed - this should never happen with 32-byte output");
        key
    }

    fn digest(data: &[u8]) -> Vec<u8> {
        Sha512::digest(data).to_vec()
    }

    fn sign(secret: &Self::SecretKey, msg: &[u8]) -> PackResult<Vec<u8>> {
        use p521::ecdsa::signature::Signer;
        let key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| PackError::MalformedKey(format!("unusable P-521 signing key: {}", e)))?;
        let signature: p521::ecdsa::Signature = key
            .try_sign(msg)
            .map_err(|e| PackError::MalformedKey(format!("P-521 signing failed: {}", e)))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(public: &Self::PublicKey, msg: &[u8], signature: &[u8]) -> bool {
        use p521::ecdsa::signature::Verifier;
        let Ok(signature) = p521::ecdsa::Signature::from_slice(signature) else {
            return false;
        };
        let Ok(key) = p521::ecdsa::VerifyingKey::from_sec1_bytes(&Self::public_to_sec1(public))
        else {
            return false;
        };
        key.verify(msg, &signature).is_ok()
    }
}
