//! Configuration system for Commons
//!
//! Settings are persisted as TOML and loaded from an explicit path or
//! from standard locations (./commons.toml, then the user config dir).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::DatabaseConfig;
use crate::error::{CoreError, Result};

/// Top-level configuration for Commons
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonsConfig {
    /// Session identity configuration
    #[serde(default)]
    pub user: UserConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Session identity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Contact address the session resolves to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Load configuration from a specific path
pub async fn load_config(path: &Path) -> Result<CommonsConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigLoadFailed {
            path: path.to_path_buf(),
            cause: Box::new(e),
        })?;

    toml::from_str(&content).map_err(|e| CoreError::ConfigLoadFailed {
        path: path.to_path_buf(),
        cause: Box::new(e),
    })
}

/// Load configuration from standard locations, falling back to defaults
/// when no file exists. Returns the config and the path it came from,
/// if any.
pub async fn load_config_from_standard_locations() -> Result<(CommonsConfig, Option<PathBuf>)> {
    for candidate in standard_config_paths() {
        if candidate.exists() {
            tracing::debug!("Loading config from {:?}", candidate);
            let config = load_config(&candidate).await?;
            return Ok((config, Some(candidate)));
        }
    }

    Ok((CommonsConfig::default(), None))
}

fn standard_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("commons.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("commons").join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = CommonsConfig::default();
        assert!(config.user.email.is_none());
        assert!(matches!(config.database, DatabaseConfig::Embedded { .. }));
    }

    #[test]
    fn test_parse_full_config() {
        let config: CommonsConfig = toml::from_str(
            r#"
            [user]
            email = "me@campus.edu"

            [database]
            type = "embedded"
            path = "/tmp/commons-test.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.user.email.as_deref(), Some("me@campus.edu"));
        match config.database {
            DatabaseConfig::Embedded { path } => assert_eq!(path, "/tmp/commons-test.db"),
            _ => panic!("Expected embedded database config"),
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CommonsConfig = toml::from_str("[user]\n").unwrap();
        assert!(config.user.email.is_none());
        assert!(matches!(config.database, DatabaseConfig::Embedded { .. }));
    }
}
