//! Error types for convention enforcement and asset reconciliation

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the zettel core
#[derive(Error, Debug)]
pub enum ZkError {
    /// The note name does not carry a valid `DDDDDD-DDDDDD` prefix
    #[error("'{name}' does not follow the zk naming convention")]
    InvalidConvention {
        /// Offending note or file name
        name: String,
    },

    /// An embed could not be mapped to a file in the vault
    #[error("Unresolved reference: {link}")]
    UnresolvedReference {
        /// Link text as written in the note
        link: String,
    },

    /// The metadata block cannot be edited safely
    #[error("Malformed metadata block: {0}")]
    MalformedMetadata(String),

    /// A path expected to exist does not
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A move target is already occupied
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The path escapes the vault or is not representable
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration problem detected at runtime
    #[error("Configuration error: {0}")]
    Config(String),

    /// A command was invoked where it does not apply
    #[error("Command '{command}' is not applicable: {reason}")]
    NotApplicable {
        /// Command id
        command: String,
        /// Why the check failed
        reason: String,
    },

    /// A reconciliation task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(String),
}

/// Result type for zettel core operations
pub type ZkResult<T> = Result<T, ZkError>;

impl ZkError {
    /// Create an invalid convention error
    pub fn invalid_convention(name: impl Into<String>) -> Self {
        Self::InvalidConvention { name: name.into() }
    }

    /// Create a malformed metadata error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMetadata(msg.into())
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.as_ref().to_path_buf());
        }
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Failures that only affect a single reference of a batch
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedReference { .. }
                | Self::Io { .. }
                | Self::NotFound(_)
                | Self::DestinationExists(_)
                | Self::Task(_)
        )
    }
}
