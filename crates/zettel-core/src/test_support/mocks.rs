//! In-memory [`NoteHost`] for testing
//!
//! Notes and binary files live in hash maps keyed by vault-relative path.
//! Operations are counted so tests can assert on write and move behavior,
//! and individual paths can be configured to fail on read.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{ZkError, ZkResult};
use crate::frontmatter::MetadataBlock;
use crate::host::NoteHost;
use crate::links::{extract_embeds, extract_links, splice, EmbeddedReference};
use crate::note::{to_link_path, NoteRef};

/// In-memory vault
#[derive(Debug, Default)]
pub struct MemoryHost {
    texts: Mutex<HashMap<PathBuf, String>>,
    binaries: Mutex<HashMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<HashSet<PathBuf>>,
    failing_reads: Mutex<HashSet<PathBuf>>,
    moves: Mutex<Vec<(PathBuf, PathBuf)>>,
    writes: AtomicUsize,
}

impl MemoryHost {
    /// Empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a note
    pub fn insert_text(&self, path: impl Into<PathBuf>, text: &str) {
        self.texts.lock().unwrap().insert(path.into(), text.to_string());
    }

    /// Add or replace a binary file
    pub fn insert_binary(&self, path: impl Into<PathBuf>, bytes: &[u8]) {
        self.binaries.lock().unwrap().insert(path.into(), bytes.to_vec());
    }

    /// Make reads of `path` fail with an I/O error
    pub fn fail_reads_of(&self, path: impl Into<PathBuf>) {
        self.failing_reads.lock().unwrap().insert(path.into());
    }

    /// Current text of a note
    pub fn text(&self, path: &Path) -> Option<String> {
        self.texts.lock().unwrap().get(path).cloned()
    }

    /// Whether a binary file exists at `path`
    pub fn has_binary(&self, path: &Path) -> bool {
        self.binaries.lock().unwrap().contains_key(path)
    }

    /// Number of `write_text` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Moves performed, in order
    pub fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
        self.moves.lock().unwrap().clone()
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.texts.lock().unwrap().contains_key(path)
            || self.binaries.lock().unwrap().contains_key(path)
    }

    fn all_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.texts.lock().unwrap().keys().cloned().collect();
        files.extend(self.binaries.lock().unwrap().keys().cloned());
        files.sort();
        files
    }

    fn resolve(&self, folder: &Path, link: &str) -> Option<PathBuf> {
        let relative = folder.join(link);
        if self.file_exists(&relative) {
            return Some(relative);
        }
        let absolute = PathBuf::from(link);
        if self.file_exists(&absolute) {
            return Some(absolute);
        }
        self.all_files()
            .into_iter()
            .find(|f| f.ends_with(link) || f.ends_with(format!("{}.md", link)))
    }
}

#[async_trait]
impl NoteHost for MemoryHost {
    async fn read_text(&self, note: &NoteRef) -> ZkResult<String> {
        self.text(note.path())
            .ok_or_else(|| ZkError::NotFound(note.path().to_path_buf()))
    }

    async fn write_text(&self, note: &NoteRef, text: &str) -> ZkResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert_text(note.path(), text);
        Ok(())
    }

    async fn metadata_block(&self, note: &NoteRef) -> ZkResult<Option<MetadataBlock>> {
        MetadataBlock::detect(&self.read_text(note).await?)
    }

    async fn embedded_references(&self, note: &NoteRef) -> ZkResult<Vec<EmbeddedReference>> {
        Ok(extract_embeds(&self.read_text(note).await?))
    }

    async fn resolve_reference(
        &self,
        note: &NoteRef,
        reference: &EmbeddedReference,
    ) -> ZkResult<Option<PathBuf>> {
        Ok(self.resolve(note.folder(), &reference.link))
    }

    async fn read_binary(&self, path: &Path) -> ZkResult<Vec<u8>> {
        if self.failing_reads.lock().unwrap().contains(path) {
            return Err(ZkError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected failure"),
            ));
        }
        self.binaries
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ZkError::NotFound(path.to_path_buf()))
    }

    async fn exists(&self, path: &Path) -> ZkResult<bool> {
        if self.file_exists(path) || self.dirs.lock().unwrap().contains(path) {
            return Ok(true);
        }
        Ok(self.all_files().iter().any(|f| f.starts_with(path)))
    }

    async fn create_dir(&self, path: &Path) -> ZkResult<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    async fn move_and_rewrite_backlinks(&self, from: &Path, to: &Path) -> ZkResult<()> {
        if self.file_exists(to) {
            return Err(ZkError::DestinationExists(to.to_path_buf()));
        }

        // collect backlinks before the move so resolution sees the old layout
        let notes: Vec<(PathBuf, String)> = self
            .texts
            .lock()
            .unwrap()
            .iter()
            .map(|(p, t)| (p.clone(), t.clone()))
            .collect();
        let new_link = to_link_path(to);
        let mut rewrites = Vec::new();
        for (path, text) in notes {
            let folder = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
            let replacements: Vec<_> = extract_links(&text)
                .into_iter()
                .filter(|l| self.resolve(&folder, &l.link).as_deref() == Some(from))
                .map(|l| (l.range.clone(), l.render_with_target(&new_link)))
                .collect();
            if !replacements.is_empty() {
                rewrites.push((path, splice(&text, replacements)));
            }
        }

        let bytes = self.binaries.lock().unwrap().remove(from);
        match bytes {
            Some(bytes) => {
                self.binaries.lock().unwrap().insert(to.to_path_buf(), bytes);
            }
            None => {
                let text = self.texts.lock().unwrap().remove(from);
                let text = text.ok_or_else(|| ZkError::NotFound(from.to_path_buf()))?;
                self.texts.lock().unwrap().insert(to.to_path_buf(), text);
            }
        }

        for (path, text) in rewrites {
            let path = if path == from { to.to_path_buf() } else { path };
            self.texts.lock().unwrap().insert(path, text);
        }

        self.moves
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }
}
