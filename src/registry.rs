//! Cluster registry
//!
//! Maps cluster names to the base URL of that cluster's agent. Loaded once at
//! startup and never written afterwards, so it is shared without locking.

use std::collections::BTreeMap;
use std::path::Path;

use reqwest::Url;
use tracing::info;

use crate::config::parse_string_map;
use crate::{GatewayError, Result};

#[derive(Debug, Clone, Default)]
pub struct ClusterRegistry {
    clusters: BTreeMap<String, Url>,
}

impl ClusterRegistry {
    /// Load the clusters document at `path`. Every failure is fatal: without
    /// the registry no cluster operation can be served.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::ConfigError(format!(
                "Failed to read cluster registry {}: {}",
                path.display(),
                e
            ))
        })?;

        let registry = Self::from_entries(parse_string_map(&text, path)?)?;
        info!(
            "Loaded {} cluster(s) from {}: {}",
            registry.len(),
            path.display(),
            registry.names().join(", ")
        );

        Ok(registry)
    }

    /// Build a registry from `(name, base address)` pairs
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut clusters = BTreeMap::new();

        for (name, address) in entries {
            let name = name.into();
            let url = parse_base_address(&name, address.as_ref())?;
            if clusters.insert(name.clone(), url).is_some() {
                return Err(GatewayError::ConfigError(format!(
                    "duplicate cluster `{}`",
                    name
                )));
            }
        }

        Ok(Self { clusters })
    }

    pub fn resolve(&self, name: &str) -> Result<&Url> {
        self.clusters
            .get(name)
            .ok_or_else(|| GatewayError::ClusterNotFound(name.to_string()))
    }

    /// Configured cluster names, sorted
    pub fn names(&self) -> Vec<String> {
        self.clusters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

fn parse_base_address(name: &str, address: &str) -> Result<Url> {
    let url = Url::parse(address).map_err(|e| {
        GatewayError::ConfigError(format!(
            "Invalid address for cluster `{}` ({}): {}",
            name, address, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(GatewayError::ConfigError(format!(
            "Address for cluster `{}` must be an http(s) URL, got {}",
            name, address
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = ClusterRegistry::from_entries([
            ("prod", "http://agent-prod:8000"),
            ("dev", "http://agent-dev:8000/"),
        ])
        .unwrap();

        assert_eq!(registry.names(), vec!["dev", "prod"]);
        assert_eq!(
            registry.resolve("prod").unwrap().as_str(),
            "http://agent-prod:8000/"
        );
        assert!(matches!(
            registry.resolve("staging"),
            Err(GatewayError::ClusterNotFound(name)) if name == "staging"
        ));
    }

    #[test]
    fn test_rejects_bad_addresses() {
        for address in ["agent-prod:8000", "not a url", "ftp://agent", "mailto:ops@example.com"] {
            assert!(
                ClusterRegistry::from_entries([("prod", address)]).is_err(),
                "{address}"
            );
        }
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err =
            ClusterRegistry::from_entries([("prod", "http://a:1"), ("prod", "http://b:1")])
                .unwrap_err();
        assert!(err.to_string().contains("duplicate cluster `prod`"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClusterRegistry::load(&dir.path().join("clusters.json")),
            Err(GatewayError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"prod": "http://agent-prod:8000", "dev": "http://agent-dev:8000"}}"#
        )
        .unwrap();

        let registry = ClusterRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("dev").is_ok());
    }
}
