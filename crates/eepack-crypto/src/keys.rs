//! Key representation: canonical text ⇄ curve keys.
//!
//! - Public key: `"<x>\n<y>"`, both decimal, no compression, no prefix.
//! - Private key: `"<d>"`, decimal.
//!
//! Decoding checks field count, digits, the point being on the suite's
//! curve, and the scalar being in `[1, n)`. Any failure is `MalformedKey`.
//! Encoding is total.

use eepack_core::{KeyPair, PackError, PackResult, Packing, PrivateKey, PublicKey};
use num_bigint::BigUint;
use zeroize::Zeroizing;

use crate::suite::{CurveSuite, P256Suite, P521Suite};

/// Decode public key text onto the suite's curve.
pub fn decode_public_key<S: CurveSuite>(key: &PublicKey) -> PackResult<S::PublicKey> {
    let text = key.as_str().trim_end();
    let fields: Vec<&str> = text.split('\n').collect();
    if fields.len() != 2 {
        return Err(PackError::MalformedKey(format!(
            "public key: expected 2 fields, got {}",
            fields.len()
        )));
    }

    let x = to_fixed_be(&parse_decimal(fields[0], "x coordinate")?, S::FIELD_SIZE, "x coordinate")?;
    let y = to_fixed_be(&parse_decimal(fields[1], "y coordinate")?, S::FIELD_SIZE, "y coordinate")?;

    let mut sec1 = Vec::with_capacity(1 + 2 * S::FIELD_SIZE);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);

    S::public_from_sec1(&sec1).ok_or_else(|| {
        PackError::MalformedKey(format!("public key is not a point on {}", S::CURVE_NAME))
    })
}

/// Decode private key text into a scalar for the suite's curve.
pub fn decode_private_key<S: CurveSuite>(key: &PrivateKey) -> PackResult<S::SecretKey> {
    let text = key.expose().trim_end();
    if text.contains('\n') {
        return Err(PackError::MalformedKey(
            "private key: expected 1 field".to_string(),
        ));
    }

    let scalar = parse_decimal(text, "private scalar")?;
    let bytes = Zeroizing::new(to_fixed_be(&scalar, S::FIELD_SIZE, "private scalar")?);

    S::secret_from_be_bytes(&bytes).ok_or_else(|| {
        PackError::MalformedKey(format!(
            "private scalar is out of range for {}",
            S::CURVE_NAME
        ))
    })
}

/// Encode a curve point as public key text.
pub fn encode_public_key<S: CurveSuite>(key: &S::PublicKey) -> PublicKey {
    let sec1 = S::public_to_sec1(key);
    let (x, y) = sec1[1..].split_at(S::FIELD_SIZE);
    PublicKey::new(format!(
        "{}\n{}",
        BigUint::from_bytes_be(x),
        BigUint::from_bytes_be(y)
    ))
}

/// Encode a scalar as private key text.
pub fn encode_private_key<S: CurveSuite>(key: &S::SecretKey) -> PrivateKey {
    let bytes = S::secret_to_be_bytes(key);
    PrivateKey::new(BigUint::from_bytes_be(&bytes).to_string())
}

/// Generate a fresh key pair on the suite's curve.
pub fn generate_key_pair_for<S: CurveSuite>() -> KeyPair {
    let secret = S::random_secret();
    let public = S::public_of(&secret);
    KeyPair::new(encode_public_key::<S>(&public), encode_private_key::<S>(&secret))
}

/// Generate a fresh key pair for a packing variant.
pub fn generate_key_pair(packing: Packing) -> KeyPair {
    match packing {
        Packing::EeP256 => generate_key_pair_for::<P256Suite>(),
        Packing::EeP521 => generate_key_pair_for::<P521Suite>(),
    }
}

/// Whether public key text decodes on the packing's curve.
pub fn is_compatible(packing: Packing, key: &PublicKey) -> bool {
    match packing {
        Packing::EeP256 => decode_public_key::<P256Suite>(key).is_ok(),
        Packing::EeP521 => decode_public_key::<P521Suite>(key).is_ok(),
    }
}

fn parse_decimal(field: &str, what: &str) -> PackResult<BigUint> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PackError::MalformedKey(format!(
            "{} is not a decimal integer",
            what
        )));
    }
    BigUint::parse_bytes(field.as_bytes(), 10)
        .ok_or_else(|| PackError::MalformedKey(format!("{} is not a decimal integer", what)))
}

/// Left-pad a big-endian integer to `size` bytes.
fn to_fixed_be(value: &BigUint, size: usize, what: &str) -> PackResult<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > size {
        return Err(PackError::MalformedKey(format!(
            "{} does not fit in {} bytes",
            what, size
        )));
    }
    let mut out = vec![0u8; size];
    out[size - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}
