//! Config file discovery and loading

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ZettelConfig;
use crate::error::{ConfigError, ConfigResult};

/// File name looked up inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Loads [`ZettelConfig`] from TOML
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config location, `~/.config/zettel/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zettel").join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present, otherwise built-in defaults apply.
    pub async fn load(explicit: Option<&Path>) -> ConfigResult<ZettelConfig> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).await;
        }

        match Self::default_path() {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => {
                Self::load_from_file(&path).await
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(ZettelConfig::default())
            }
        }
    }

    /// Load and validate a specific file
    pub async fn load_from_file(path: &Path) -> ConfigResult<ZettelConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::load_from_str(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn load_from_str(content: &str) -> ConfigResult<ZettelConfig> {
        let config: ZettelConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicatePolicy, HashAlgorithm};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zettel.toml");
        tokio::fs::write(
            &path,
            r#"
[vault]
path = "/notes"

[frontmatter]
id_key = "zk"

[assets]
dir_name = "_attachments"
hash_algorithm = "sha256"
duplicate_policy = "rewrite-link"

[logging]
level = "debug"
"#,
        )
        .await
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).await.unwrap();
        assert_eq!(config.vault.path, Some(PathBuf::from("/notes")));
        assert_eq!(config.frontmatter.id_key, "zk");
        assert_eq!(config.assets.dir_name, "_attachments");
        assert_eq!(config.assets.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.assets.duplicate_policy, DuplicatePolicy::RewriteLink);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::load(Some(&dir.path().join("nope.toml"))).await;
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[tokio::test]
    async fn test_parse_error_carries_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[assets\nhash_algorithm = 1").await.unwrap();

        match ConfigLoader::load_from_file(&path).await {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_runs_on_load() {
        let result = ConfigLoader::load_from_str("[assets]\ndir_name = \"a/b\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = ConfigLoader::load_from_str("").unwrap();
        assert_eq!(config, ZettelConfig::default());
    }
}
