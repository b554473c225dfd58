//! Per-call context for pack and unpack.

use std::sync::Arc;

use crate::keys::KeyPair;
use crate::models::{Packing, UserName};
use crate::traits::KeyLookup;

/// Who is calling, with which keys, under which packing, and how to find
/// other users' keys.
///
/// Supplied fresh for every call; packers never retain it.
#[derive(Clone)]
pub struct Context {
    /// The calling user.
    pub user_name: UserName,
    /// The calling user's key pair for `packing`.
    pub key_pair: KeyPair,
    /// Packing variant selected by the caller.
    pub packing: Packing,
    /// Key lookup service.
    pub key_lookup: Arc<dyn KeyLookup>,
}

impl Context {
    /// Build a context.
    pub fn new(
        user_name: UserName,
        key_pair: KeyPair,
        packing: Packing,
        key_lookup: Arc<dyn KeyLookup>,
    ) -> Self {
        Self {
            user_name,
            key_pair,
            packing,
            key_lookup,
        }
    }

    /// The same context acting as a different user with different keys.
    pub fn as_user(&self, user_name: UserName, key_pair: KeyPair) -> Self {
        Self {
            user_name,
            key_pair,
            packing: self.packing,
            key_lookup: Arc::clone(&self.key_lookup),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("user_name", &self.user_name)
            .field("key_pair", &self.key_pair)
            .field("packing", &self.packing)
            .finish_non_exhaustive()
    }
}
