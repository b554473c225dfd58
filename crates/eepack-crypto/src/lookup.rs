//! Per-call resolution of other users' public keys.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Instant;

use eepack_core::{KeyLookup, PackError, PackResult, UserName};
use tracing::{debug, warn};

use crate::keys::decode_public_key;
use crate::suite::CurveSuite;

/// Resolves user names to public keys on one curve for the duration of a
/// single pack or unpack.
///
/// Each distinct user is looked up at most once; nothing outlives the call.
pub(crate) struct KeyResolver<'a, S: CurveSuite> {
    lookup: &'a dyn KeyLookup,
    resolved: HashMap<UserName, S::PublicKey>,
    _suite: PhantomData<S>,
}

impl<'a, S: CurveSuite> KeyResolver<'a, S> {
    pub(crate) fn new(lookup: &'a dyn KeyLookup) -> Self {
        Self {
            lookup,
            resolved: HashMap::new(),
            _suite: PhantomData,
        }
    }

    /// The user's first published key that decodes on this curve.
    pub(crate) async fn resolve(&mut self, user: &UserName) -> PackResult<S::PublicKey> {
        if let Some(key) = self.resolved.get(user) {
            return Ok(key.clone());
        }

        let start = Instant::now();
        let keys = self.lookup.lookup(user).await.map_err(|e| {
            warn!(
                subsystem = "lookup",
                op = "lookup",
                user = %user,
                error = %e,
                "Key lookup failed"
            );
            e
        })?;

        let key = keys
            .public_keys
            .iter()
            .find_map(|k| decode_public_key::<S>(k).ok())
            .ok_or_else(|| PackError::NoCompatibleKey(user.clone()))?;

        debug!(
            subsystem = "lookup",
            op = "lookup",
            user = %user,
            key_count = keys.public_keys.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved public key"
        );

        self.resolved.insert(user.clone(), key.clone());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{encode_public_key, generate_key_pair};
    use crate::suite::{P256Suite, P521Suite};
    use async_trait::async_trait;
    use eepack_core::{Packing, PublicKey, UserKeys};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        keys: Vec<PublicKey>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KeyLookup for Canned {
        async fn lookup(&self, user: &UserName) -> PackResult<UserKeys> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user.as_str() == "ghost@x.com" {
                return Err(PackError::IdentityNotFound(user.clone()));
            }
            Ok(UserKeys {
                endpoints: vec![],
                public_keys: self.keys.clone(),
            })
        }
    }

    fn user(s: &str) -> UserName {
        UserName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_each_user_looked_up_once() {
        let kp = generate_key_pair(Packing::EeP256);
        let canned = Canned {
            keys: vec![kp.public.clone()],
            calls: AtomicUsize::new(0),
        };
        let mut resolver = KeyResolver::<P256Suite>::new(&canned);

        let first = resolver.resolve(&user("bob@foo.com")).await.unwrap();
        let again = resolver.resolve(&user("bob@foo.com")).await.unwrap();
        assert_eq!(
            encode_public_key::<P256Suite>(&first),
            encode_public_key::<P256Suite>(&again)
        );
        assert_eq!(canned.calls.load(Ordering::SeqCst), 1);

        resolver.resolve(&user("carol@foo.com")).await.unwrap();
        assert_eq!(canned.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_compatible_key_wins() {
        let p521 = generate_key_pair(Packing::EeP521);
        let first = generate_key_pair(Packing::EeP256);
        let second = generate_key_pair(Packing::EeP256);
        let canned = Canned {
            keys: vec![
                PublicKey::new("garbage"),
                p521.public.clone(),
                first.public.clone(),
                second.public.clone(),
            ],
            calls: AtomicUsize::new(0),
        };

        let key = KeyResolver::<P256Suite>::new(&canned)
            .resolve(&user("bob@foo.com"))
            .await
            .unwrap();
        assert_eq!(encode_public_key::<P256Suite>(&key), first.public);

        let key = KeyResolver::<P521Suite>::new(&canned)
            .resolve(&user("bob@foo.com"))
            .await
            .unwrap();
        assert_eq!(encode_public_key::<P521Suite>(&key), p521.public);
    }

    #[tokio::test]
    async fn test_no_compatible_key() {
        let canned = Canned {
            keys: vec![generate_key_pair(Packing::EeP256).public],
            calls: AtomicUsize::new(0),
        };
        let err = KeyResolver::<P521Suite>::new(&canned)
            .resolve(&user("bob@foo.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::NoCompatibleKey(u) if u.as_str() == "bob@foo.com"));
    }

    #[tokio::test]
    async fn test_lookup_errors_surface_unchanged() {
        let canned = Canned {
            keys: vec![],
            calls: AtomicUsize::new(0),
        };
        let err = KeyResolver::<P256Suite>::new(&canned)
            .resolve(&user("ghost@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::IdentityNotFound(_)));
    }
}
