use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::config::parse_string_map;
use crate::{GatewayError, Result};

/// Static username -> secret mapping, read once at startup
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Load the credentials document at `path`.
    ///
    /// A missing file yields an empty store: the service still starts but
    /// every login fails. A file that exists but cannot be read or parsed is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Credentials file {} not found; logins will be rejected",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::ConfigError(format!(
                "Failed to read credentials {}: {}",
                path.display(),
                e
            ))
        })?;
        let users = parse_string_map(&text, path)?;

        info!("Loaded {} user(s) from {}", users.len(), path.display());

        Ok(Self { users })
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|secret| secret == password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            users: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(&dir.path().join("users.json")).unwrap();

        assert!(store.is_empty());
        assert!(!store.verify("alice", "p1"));
    }

    #[test]
    fn test_load_and_verify() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"alice": "p1", "bob": "p2"}}"#).unwrap();

        let store = CredentialStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.verify("alice", "p1"));
        assert!(!store.verify("alice", "p2"));
        assert!(!store.verify("carol", "p1"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alice:p1").unwrap();

        assert!(matches!(
            CredentialStore::load(file.path()),
            Err(GatewayError::ConfigError(_))
        ));
    }
}
