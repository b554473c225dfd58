//! File-backed key directory.
//!
//! A directory holding one `<user>.pub` file per known user and, for local
//! users, a `<user>.key` file with the private scalar. A `.pub` file may
//! list several public keys separated by a blank line, most preferred
//! first.
//!
//! ```text
//! keys/
//! ├── dude@google.com.pub
//! ├── dude@google.com.key
//! └── bob@foo.com.pub
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eepack_core::{
    KeyLookup, KeyPair, PackError, PackResult, PrivateKey, PublicKey, UserKeys, UserName,
};
use tracing::debug;

/// Extension of public key files.
pub const PUBLIC_KEY_EXT: &str = "pub";

/// Extension of private key files.
pub const PRIVATE_KEY_EXT: &str = "key";

/// Key files under one root directory.
#[derive(Debug, Clone)]
pub struct KeyDirectory {
    root: PathBuf,
}

impl KeyDirectory {
    /// Key directory rooted at `root`. Nothing is created until a save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the key files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, user: &UserName, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{}", user, ext))
    }

    /// Write a user's public keys, most preferred first.
    pub async fn save_public_keys(&self, user: &UserName, keys: &[PublicKey]) -> PackResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let text = keys
            .iter()
            .map(|k| k.as_str().trim_end())
            .collect::<Vec<_>>()
            .join("\n\n");
        tokio::fs::write(self.path_for(user, PUBLIC_KEY_EXT), format!("{}\n", text)).await?;
        Ok(())
    }

    /// Write a local user's key pair. The private key file is owner-only on
    /// Unix.
    pub async fn save_key_pair(&self, user: &UserName, key_pair: &KeyPair) -> PackResult<()> {
        self.save_public_keys(user, std::slice::from_ref(&key_pair.public))
            .await?;

        let path = self.path_for(user, PRIVATE_KEY_EXT);
        tokio::fs::write(&path, format!("{}\n", key_pair.private.expose())).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }

    /// Load a local user's key pair. The first listed public key is used.
    pub async fn load_key_pair(&self, user: &UserName) -> PackResult<KeyPair> {
        let public = self
            .read_public_keys(user)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PackError::MalformedKey(format!("{} has an empty public key file", user))
            })?;
        let private = tokio::fs::read_to_string(self.path_for(user, PRIVATE_KEY_EXT)).await?;
        Ok(KeyPair::new(public, PrivateKey::new(private.trim())))
    }

    async fn read_public_keys(&self, user: &UserName) -> PackResult<Vec<PublicKey>> {
        let text = tokio::fs::read_to_string(self.path_for(user, PUBLIC_KEY_EXT)).await?;
        Ok(parse_public_keys(&text))
    }
}

/// Split a `.pub` file into its keys.
fn parse_public_keys(text: &str) -> Vec<PublicKey> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(PublicKey::new)
        .collect()
}

#[async_trait]
impl KeyLookup for KeyDirectory {
    async fn lookup(&self, user: &UserName) -> PackResult<UserKeys> {
        let public_keys = match self.read_public_keys(user).await {
            Ok(keys) => keys,
            Err(PackError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PackError::IdentityNotFound(user.clone()));
            }
            Err(PackError::Io(e)) => {
                return Err(PackError::LookupUnavailable(format!(
                    "{}: {}",
                    self.root.display(),
                    e
                )));
            }
            Err(e) => return Err(e),
        };
        if public_keys.is_empty() {
            return Err(PackError::IdentityNotFound(user.clone()));
        }

        debug!(
            subsystem = "lookup",
            component = "key_dir",
            user = %user,
            key_count = public_keys.len(),
            "Read public keys"
        );
        Ok(UserKeys {
            endpoints: vec![],
            public_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;
    use eepack_core::Packing;
    use tempfile::TempDir;

    fn user(s: &str) -> UserName {
        UserName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_key_pair() {
        let temp = TempDir::new().unwrap();
        let dir = KeyDirectory::new(temp.path().join("keys"));
        let kp = generate_key_pair(Packing::EeP256);

        dir.save_key_pair(&user("dude@google.com"), &kp).await.unwrap();
        let loaded = dir.load_key_pair(&user("dude@google.com")).await.unwrap();

        assert_eq!(loaded.public, kp.public);
        assert_eq!(loaded.private.expose(), kp.private.expose());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_private_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = KeyDirectory::new(temp.path());
        dir.save_key_pair(&user("dude@google.com"), &generate_key_pair(Packing::EeP256))
            .await
            .unwrap();

        let meta = std::fs::metadata(temp.path().join("dude@google.com.key")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_lookup_returns_all_keys_in_order() {
        let temp = TempDir::new().unwrap();
        let dir = KeyDirectory::new(temp.path());
        let k1 = generate_key_pair(Packing::EeP521).public;
        let k2 = generate_key_pair(Packing::EeP256).public;

        dir.save_public_keys(&user("bob@foo.com"), &[k1.clone(), k2.clone()])
            .await
            .unwrap();
        let found = dir.lookup(&user("bob@foo.com")).await.unwrap();
        assert_eq!(found.public_keys, vec![k1, k2]);
        assert!(found.endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let temp = TempDir::new().unwrap();
        let dir = KeyDirectory::new(temp.path());
        let err = dir.lookup(&user("ghost@x.com")).await.unwrap_err();
        assert!(matches!(err, PackError::IdentityNotFound(_)));
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_unavailable() {
        let temp = TempDir::new().unwrap();
        // A file where the directory should be.
        let not_a_dir = temp.path().join("keys");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let err = KeyDirectory::new(&not_a_dir)
            .lookup(&user("bob@foo.com"))
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "{:?}", err);
    }

    #[test]
    fn test_parse_public_keys() {
        let keys = parse_public_keys("1\n2\n\n\n3\n4\r\n\r\n5\n6\n");
        assert_eq!(
            keys,
            vec![
                PublicKey::new("1\n2"),
                PublicKey::new("3\n4"),
                PublicKey::new("5\n6")
            ]
        );
        assert!(parse_public_keys("\n\n").is_empty());
    }
}
