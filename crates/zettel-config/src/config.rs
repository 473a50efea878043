//! Configuration types
//!
//! Every section is optional in the TOML file; missing sections fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Default frontmatter key holding the note ID
pub const DEFAULT_ID_KEY: &str = "ID";

/// Default name of the per-folder asset directory
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZettelConfig {
    /// Vault location
    #[serde(default)]
    pub vault: VaultConfig,
    /// Frontmatter synchronization
    #[serde(default)]
    pub frontmatter: FrontmatterConfig,
    /// Asset deduplication
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vault configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Path to the vault directory (current directory when unset)
    pub path: Option<PathBuf>,
}

/// Frontmatter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontmatterConfig {
    /// Key written into the metadata block
    pub id_key: String,
}

/// Asset deduplication configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory created next to the note, holding one folder per prefix
    pub dir_name: String,
    /// Digest used to name deduplicated files
    pub hash_algorithm: HashAlgorithm,
    /// What happens when the canonical file already exists
    pub duplicate_policy: DuplicatePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `zettel_core=debug`
    pub level: Option<String>,
}

/// Digest algorithm used for canonical asset names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5, 32 hex characters; compatible with existing vault layouts
    #[default]
    Md5,
    /// SHA-256, 64 hex characters
    Sha256,
    /// BLAKE3, 64 hex characters
    Blake3,
}

/// Handling of a reference whose canonical copy already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Leave the file and the link alone, report the conflict
    #[default]
    Report,
    /// Point the note's embeds at the canonical copy; the duplicate file stays
    RewriteLink,
}

impl Default for FrontmatterConfig {
    fn default() -> Self {
        Self {
            id_key: DEFAULT_ID_KEY.to_string(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_ASSETS_DIR.to_string(),
            hash_algorithm: HashAlgorithm::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl ZettelConfig {
    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> ConfigResult<()> {
        let key = self.frontmatter.id_key.trim();
        if key.is_empty() {
            return Err(ConfigError::invalid("frontmatter.id_key must not be empty"));
        }
        if key.contains(':') || key != self.frontmatter.id_key {
            return Err(ConfigError::invalid(format!(
                "frontmatter.id_key '{}' must not contain ':' or surrounding whitespace",
                self.frontmatter.id_key
            )));
        }

        let dir = &self.assets.dir_name;
        if dir.is_empty() || dir == "." || dir == ".." {
            return Err(ConfigError::invalid(format!(
                "assets.dir_name '{}' is not a usable folder name",
                dir
            )));
        }
        if dir.contains('/') || dir.contains('\\') {
            return Err(ConfigError::invalid(format!(
                "assets.dir_name '{}' must be a single path component",
                dir
            )));
        }

        Ok(())
    }

    /// Vault root, falling back to the current directory
    pub fn vault_root(&self) -> PathBuf {
        self.vault
            .path
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl HashAlgorithm {
    /// Lower-case name as used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!(
                "unknown hash algorithm '{}' (expected md5, sha256 or blake3)",
                other
            )),
        }
    }
}

impl DuplicatePolicy {
    /// Kebab-case name as used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::RewriteLink => "rewrite-link",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "rewrite-link" | "rewrite" => Ok(Self::RewriteLink),
            other => Err(format!(
                "unknown duplicate policy '{}' (expected report or rewrite-link)",
                other
            )),
        }
    }
}
