//! # eepack-core
//!
//! Core types, traits, and abstractions for the eepack end-to-end packer.
//!
//! This crate holds the vocabulary shared by packers and their callers:
//! user and path names, packing variants, textual key material, per-blob
//! metadata, the per-call [`Context`], and the [`KeyLookup`] and [`Packer`]
//! traits. It contains no cryptography.

pub mod context;
pub mod defaults;
pub mod error;
pub mod keys;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use context::Context;
pub use error::{PackError, PackResult};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use models::*;
pub use traits::*;
