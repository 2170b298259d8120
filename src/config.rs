use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::router::Timeouts;
use crate::{GatewayError, Result};

/// Longest session token lifetime accepted at startup
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Runtime configuration of the aggregator, resolved once at startup
#[derive(Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub secret: String,
    pub users_file: PathBuf,
    pub clusters_file: PathBuf,
    pub token_ttl: Duration,
    pub timeouts: Timeouts,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.secret.trim().is_empty() {
            return Err(GatewayError::ConfigError(
                "signing secret must not be empty".to_string(),
            ));
        }
        if self.token_ttl.is_zero() {
            return Err(GatewayError::ConfigError(
                "token TTL must be positive".to_string(),
            ));
        }
        if self.token_ttl > MAX_TOKEN_TTL {
            return Err(GatewayError::ConfigError(format!(
                "token TTL must not exceed {:?}",
                MAX_TOKEN_TTL
            )));
        }
        if self.timeouts.list.is_zero() || self.timeouts.restart.is_zero() {
            return Err(GatewayError::ConfigError(
                "agent timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("secret", &"<redacted>")
            .field("users_file", &self.users_file)
            .field("clusters_file", &self.clusters_file)
            .field("token_ttl", &self.token_ttl)
            .field("timeouts", &self.timeouts)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

/// JSON object of string values that refuses duplicate keys
struct UniqueStringMap(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for UniqueStringMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = UniqueStringMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object with string values")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if entries.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    entries.insert(key, value);
                }
                Ok(UniqueStringMap(entries))
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

/// Parse a `{"name": "value", ...}` document, rejecting duplicate names
pub(crate) fn parse_string_map(text: &str, source: &Path) -> Result<BTreeMap<String, String>> {
    serde_json::from_str::<UniqueStringMap>(text)
        .map(|m| m.0)
        .map_err(|e| GatewayError::ConfigError(format!("{}: {}", source.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_map() {
        let map = parse_string_map(r#"{"b": "2", "a": "1"}"#, Path::new("t.json")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
    }

    #[test]
    fn test_parse_string_map_rejects_duplicates() {
        let err = parse_string_map(r#"{"a": "1", "a": "2"}"#, Path::new("t.json")).unwrap_err();
        assert!(err.to_string().contains("duplicate key `a`"));
        assert!(err.to_string().contains("t.json"));
    }

    #[test]
    fn test_parse_string_map_rejects_non_string_values() {
        assert!(parse_string_map(r#"{"a": 1}"#, Path::new("t.json")).is_err());
        assert!(parse_string_map(r#"["a"]"#, Path::new("t.json")).is_err());
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = Config {
            listen: "127.0.0.1:8000".parse().unwrap(),
            secret: "hunter2".to_string(),
            users_file: PathBuf::from("/app/users.json"),
            clusters_file: PathBuf::from("/app/clusters.json"),
            token_ttl: Duration::from_secs(60),
            timeouts: Timeouts::default(),
            cors_origins: vec![],
        };

        assert!(!format!("{:?}", config).contains("hunter2"));
        assert!(config.validate().is_ok());

        let empty = Config {
            secret: " ".to_string(),
            ..config
        };
        assert!(empty.validate().is_err());
    }

    fn valid_config() -> Config {
        Config {
            listen: "127.0.0.1:8000".parse().unwrap(),
            secret: "hunter2".to_string(),
            users_file: PathBuf::from("/app/users.json"),
            clusters_file: PathBuf::from("/app/clusters.json"),
            token_ttl: Duration::from_secs(60),
            timeouts: Timeouts::default(),
            cors_origins: vec![],
        }
    }

    #[test]
    fn test_validate_bounds_token_ttl() {
        let at_limit = Config {
            token_ttl: MAX_TOKEN_TTL,
            ..valid_config()
        };
        assert!(at_limit.validate().is_ok());

        let too_long = Config {
            token_ttl: Duration::from_secs(u64::MAX),
            ..valid_config()
        };
        assert!(matches!(
            too_long.validate(),
            Err(GatewayError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        for timeouts in [
            Timeouts {
                list: Duration::ZERO,
                ..Timeouts::default()
            },
            Timeouts {
                restart: Duration::ZERO,
                ..Timeouts::default()
            },
        ] {
            let config = Config {
                timeouts,
                ..valid_config()
            };
            assert!(config.validate().is_err(), "{:?}", timeouts);
        }
    }
}
