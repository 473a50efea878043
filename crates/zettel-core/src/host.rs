//! Host abstraction
//!
//! The core never touches storage directly. Everything it needs from the
//! editing host (or the filesystem vault standing in for one) goes through
//! [`NoteHost`], so commands can run against a real vault or an in-memory
//! double in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::ZkResult;
use crate::frontmatter::MetadataBlock;
use crate::links::EmbeddedReference;
use crate::note::NoteRef;

/// Collaborator operations consumed by the core.
///
/// All paths are vault-relative.
#[async_trait]
pub trait NoteHost: Send + Sync {
    /// Whole text of a note
    async fn read_text(&self, note: &NoteRef) -> ZkResult<String>;

    /// Replace the whole text of a note
    async fn write_text(&self, note: &NoteRef, text: &str) -> ZkResult<()>;

    /// Parsed metadata block, if the note has one
    async fn metadata_block(&self, note: &NoteRef) -> ZkResult<Option<MetadataBlock>>;

    /// Embedded references in document order, duplicates included
    async fn embedded_references(&self, note: &NoteRef) -> ZkResult<Vec<EmbeddedReference>>;

    /// File a reference in `note` points at
    async fn resolve_reference(
        &self,
        note: &NoteRef,
        reference: &EmbeddedReference,
    ) -> ZkResult<Option<PathBuf>>;

    /// Raw bytes of a file
    async fn read_binary(&self, path: &Path) -> ZkResult<Vec<u8>>;

    /// Whether a file or folder exists
    async fn exists(&self, path: &Path) -> ZkResult<bool>;

    /// Create a folder and its parents; succeeds if it already exists
    async fn create_dir(&self, path: &Path) -> ZkResult<()>;

    /// Move `from` to `to` and rewrite every link in the vault that pointed
    /// at `from`
    async fn move_and_rewrite_backlinks(&self, from: &Path, to: &Path) -> ZkResult<()>;
}
