//! # eepack-crypto
//!
//! Elliptic-curve end-to-end packer.
//!
//! A packed blob is readable only by the users its owner names, and any
//! change to the blob, its reader list, or its path is detected before a
//! single plaintext byte is released.
//!
//! ## Cryptographic Primitives
//!
//! - **Key agreement**: static-static ECDH on NIST P-256 or P-521
//! - **Symmetric cipher**: AES-256-GCM (AEAD), fresh key and nonce per blob
//! - **Key derivation**: HKDF-SHA256 / HKDF-SHA512, bound to owner and reader
//! - **Signatures**: ECDSA over path, wrapped keys, and blob hash
//! - **Random generation**: OS CSPRNG
//!
//! ## Packings
//!
//! | Packing | Curve | Hash |
//! |---------|-------|------|
//! | `ee.p256` | P-256 | SHA-256 |
//! | `ee.p521` | P-521 | SHA-512 |
//!
//! Keys are exchanged as decimal text: `"<x>\n<y>"` for public keys and
//! `"<d>"` for private keys.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use eepack_core::{Context, Metadata, Packer, Packing, PathName, UserName};
//! use eepack_crypto::{generate_key_pair, registry, KeyDirectory};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> eepack_core::PackResult<()> {
//! # let temp = tempfile::tempdir().unwrap();
//! let keys = KeyDirectory::new(temp.path());
//! let dude: UserName = "dude@google.com".parse()?;
//! let bob: UserName = "bob@foo.com".parse()?;
//!
//! let dude_keys = generate_key_pair(Packing::EeP256);
//! let bob_keys = generate_key_pair(Packing::EeP256);
//! keys.save_public_keys(&dude, &[dude_keys.public.clone()]).await?;
//! keys.save_public_keys(&bob, &[bob_keys.public.clone()]).await?;
//!
//! let packer = registry::lookup(Packing::EeP256);
//! let ctx = Context::new(dude, dude_keys, Packing::EeP256, Arc::new(keys));
//! let name: PathName = "dude@google.com/secret".parse()?;
//!
//! let mut meta = Metadata::with_readers(vec![bob.clone()]);
//! let mut cipher = vec![0u8; packer.pack_len(&ctx, 11, &meta, &name)];
//! let n = packer.pack(&ctx, &mut cipher, b"hello, bob!", &mut meta, &name).await?;
//!
//! let bob_ctx = ctx.as_user(bob, bob_keys);
//! let mut clear = vec![0u8; packer.unpack_len(&bob_ctx, n, &meta)];
//! let m = packer.unpack(&bob_ctx, &mut clear, &cipher[..n], &meta, &name).await?;
//! assert_eq!(&clear[..m], b"hello, bob!");
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod format;
pub mod key_dir;
pub mod keys;
mod lookup;
pub mod packer;
pub mod registry;
pub mod sign;
pub mod suite;
pub mod wrap;

// Re-export commonly used types
pub use key_dir::KeyDirectory;
pub use keys::{
    decode_private_key, decode_public_key, encode_private_key, encode_public_key,
    generate_key_pair, is_compatible,
};
pub use packer::{EeP256Packer, EeP521Packer, EePacker};
pub use suite::{CurveSuite, P256Suite, P521Suite};
