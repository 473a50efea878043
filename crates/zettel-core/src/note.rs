//! Note identity within a vault

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{ZkError, ZkResult};
use crate::prefix::Prefix;

/// A note addressed by its vault-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteRef {
    path: PathBuf,
}

impl NoteRef {
    /// Reference a note by vault-relative path.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn new(path: impl Into<PathBuf>) -> ZkResult<Self> {
        let path = path.into();
        let path: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        if path.as_os_str().is_empty() {
            return Err(ZkError::InvalidPath("empty note path".to_string()));
        }
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ZkError::InvalidPath(format!(
                "{} is not a vault-relative path",
                path.display()
            )));
        }
        if path.file_name().is_none() {
            return Err(ZkError::InvalidPath(format!(
                "{} has no file name",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    /// Vault-relative path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension, e.g. `200101-120000 note.md`
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Containing folder, empty at the vault root
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Extension without the dot
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    /// Whether this is a markdown note
    pub fn is_markdown(&self) -> bool {
        self.extension() == Some("md")
    }

    /// Prefix carried by the file name, if any
    pub fn prefix(&self) -> Option<Prefix> {
        Prefix::extract(self.name())
    }

    /// Same folder, different file name
    pub fn with_name(&self, name: &str) -> ZkResult<Self> {
        Self::new(self.folder().join(name))
    }
}

impl fmt::Display for NoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Render a vault-relative path with `/` separators, as links are written
pub fn to_link_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
