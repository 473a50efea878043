//! Filesystem-backed vault
//!
//! [`FsVault`] implements [`NoteHost`] over a directory tree. Every path it
//! accepts or returns is relative to the vault root; anything that would
//! escape the root is rejected before touching the disk.
//!
//! Link resolution mirrors how Obsidian picks a link destination:
//! 1. relative to the linking note's folder
//! 2. relative to the vault root
//! 3. any file whose path ends with the link, preferring the note's own
//!    folder, then the shallowest path, then path order
//!
//! Links without an extension also try `<link>.md`.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ZkError, ZkResult};
use crate::frontmatter::MetadataBlock;
use crate::host::NoteHost;
use crate::links::{extract_embeds, extract_links, splice, EmbeddedReference, LinkSyntax};
use crate::note::{to_link_path, NoteRef};

/// A vault rooted at a directory
#[derive(Debug)]
pub struct FsVault {
    root: PathBuf,
    // moves rewrite notes across the vault; two at once could lose an edit
    move_lock: Mutex<()>,
}

impl FsVault {
    /// Open the vault at `root`, which must be an existing directory
    pub async fn open(root: impl AsRef<Path>) -> ZkResult<Self> {
        let root = root.as_ref();
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| ZkError::io(root, e))?;
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| ZkError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(ZkError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        debug!("Opened vault at {}", root.display());
        Ok(Self {
            root,
            move_lock: Mutex::new(()),
        })
    }

    /// Absolute vault root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault-relative path
    pub fn absolute(&self, relative: &Path) -> ZkResult<PathBuf> {
        Ok(self.root.join(normalize(relative)?))
    }

    /// Turn user input into a note reference.
    ///
    /// Absolute paths must lie inside the vault; relative paths are taken as
    /// vault-relative.
    pub async fn note_ref(&self, input: impl AsRef<Path>) -> ZkResult<NoteRef> {
        let input = input.as_ref();
        if !input.is_absolute() {
            return NoteRef::new(normalize(input)?);
        }
        let absolute = tokio::fs::canonicalize(input)
            .await
            .map_err(|e| ZkError::io(input, e))?;
        let relative = absolute.strip_prefix(&self.root).map_err(|_| {
            ZkError::InvalidPath(format!(
                "{} is outside the vault {}",
                input.display(),
                self.root.display()
            ))
        })?;
        NoteRef::new(relative)
    }

    /// Every file in the vault, vault-relative and sorted; hidden folders
    /// are skipped
    pub async fn scan_files(&self) -> ZkResult<Vec<PathBuf>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan_files_blocking(&root))
            .await
            .map_err(|e| ZkError::Task(format!("vault scan: {e}")))?
    }

    /// Markdown notes in the vault
    pub async fn scan_notes(&self) -> ZkResult<Vec<NoteRef>> {
        self.scan_files()
            .await?
            .into_iter()
            .filter(|p| is_markdown_path(p))
            .map(NoteRef::new)
            .collect()
    }

    /// Text of a note, or `None` when it is not valid UTF-8
    async fn read_decodable(&self, relative: &Path) -> ZkResult<Option<String>> {
        let bytes = tokio::fs::read(self.absolute(relative)?)
            .await
            .map_err(|e| ZkError::io(relative, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(_) => {
                warn!("Skipping {}: not valid UTF-8", relative.display());
                Ok(None)
            }
        }
    }

    async fn is_file(&self, relative: &Path) -> bool {
        let Ok(absolute) = self.absolute(relative) else {
            return false;
        };
        tokio::fs::metadata(absolute)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

#[async_trait]
impl NoteHost for FsVault {
    async fn read_text(&self, note: &NoteRef) -> ZkResult<String> {
        let path = self.absolute(note.path())?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ZkError::io(note.path(), e))
    }

    async fn write_text(&self, note: &NoteRef, text: &str) -> ZkResult<()> {
        let path = self.absolute(note.path())?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| ZkError::io(note.path(), e))
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
        for candidate in direct_candidates(note.folder(), &reference.link) {
            if self.is_file(&candidate).await {
                return Ok(Some(candidate));
            }
        }
        let files = self.scan_files().await?;
        Ok(match_by_suffix(&files, note.folder(), &reference.link))
    }

    async fn read_binary(&self, path: &Path) -> ZkResult<Vec<u8>> {
        let absolute = self.absolute(path)?;
        tokio::fs::read(&absolute)
            .await
            .map_err(|e| ZkError::io(path, e))
    }

    async fn exists(&self, path: &Path) -> ZkResult<bool> {
        let absolute = self.absolute(path)?;
        tokio::fs::try_exists(&absolute)
            .await
            .map_err(|e| ZkError::io(path, e))
    }

    async fn create_dir(&self, path: &Path) -> ZkResult<()> {
        let absolute = self.absolute(path)?;
        tokio::fs::create_dir_all(&absolute)
            .await
            .map_err(|e| ZkError::io(path, e))
    }

    async fn move_and_rewrite_backlinks(&self, from: &Path, to: &Path) -> ZkResult<()> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        let _guard = self.move_lock.lock().await;

        if !self.exists(&from).await? {
            return Err(ZkError::NotFound(from));
        }
        if self.exists(&to).await? {
            return Err(ZkError::DestinationExists(to));
        }

        // resolve backlinks against the layout before the move
        let files = self.scan_files().await?;
        let index: BTreeSet<PathBuf> = files.iter().cloned().collect();
        let mut after: Vec<PathBuf> = files.iter().filter(|f| **f != from).cloned().collect();
        after.push(to.clone());
        let moved = Relink {
            index: &index,
            after: &after,
            from: &from,
            to: &to,
        };

        let mut linking = Vec::new();
        for path in files.iter().filter(|p| is_markdown_path(p)) {
            let Some(text) = self.read_decodable(path).await? else {
                continue;
            };
            if !moved.replacements(&text, path).is_empty() {
                linking.push(path.clone());
            }
        }

        if let Some(parent) = to.parent() {
            self.create_dir(parent).await?;
        }
        let (abs_from, abs_to) = (self.absolute(&from)?, self.absolute(&to)?);
        tokio::fs::rename(&abs_from, &abs_to)
            .await
            .map_err(|e| ZkError::io(&from, e))?;

        // rewrite from a fresh read so edits made since the scan survive
        let mut count = 0;
        for original in linking {
            let current = if original == from { to.clone() } else { original.clone() };
            let Some(text) = self.read_decodable(&current).await? else {
                continue;
            };
            let replacements = moved.replacements(&text, &original);
            if replacements.is_empty() {
                continue;
            }
            self.write_text(&NoteRef::new(current)?, &splice(&text, replacements))
                .await?;
            count += 1;
        }

        info!(
            "Moved {} -> {} ({} note(s) relinked)",
            from.display(),
            to.display(),
            count
        );
        Ok(())
    }
}

/// Lexically normalize a vault-relative path.
///
/// `.` is dropped and `..` pops a component; absolute paths and paths that
/// climb above the root are rejected.
pub fn normalize(path: &Path) -> ZkResult<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(ZkError::InvalidPath(format!(
                        "{} escapes the vault",
                        path.display()
                    )));
                }
            }
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::Prefix(_) => {
                return Err(ZkError::InvalidPath(format!(
                    "{} is not vault-relative",
                    path.display()
                )));
            }
        }
    }
    Ok(out)
}

/// Resolve `link` written in a note inside `folder` against a known file set
pub fn resolve_in(files: &BTreeSet<PathBuf>, folder: &Path, link: &str) -> Option<PathBuf> {
    direct_candidates(folder, link)
        .into_iter()
        .find(|c| files.contains(c))
        .or_else(|| {
            let files: Vec<PathBuf> = files.iter().cloned().collect();
            match_by_suffix(&files, folder, link)
        })
}

fn with_md(path: &Path) -> Option<PathBuf> {
    if path.extension().is_some() {
        return None;
    }
    let mut name = path.file_name()?.to_os_string();
    name.push(".md");
    Some(path.with_file_name(name))
}

fn direct_candidates(folder: &Path, link: &str) -> Vec<PathBuf> {
    if link.is_empty() {
        return Vec::new();
    }
    let mut candidates = Vec::new();
    for base in [folder.join(link), PathBuf::from(link)] {
        let Ok(path) = normalize(&base) else { continue };
        if path.as_os_str().is_empty() {
            continue;
        }
        let md = with_md(&path);
        candidates.push(path);
        candidates.extend(md);
    }
    candidates.dedup();
    candidates
}

fn match_by_suffix(files: &[PathBuf], folder: &Path, link: &str) -> Option<PathBuf> {
    let Ok(suffix) = normalize(Path::new(link)) else {
        return None;
    };
    if suffix.as_os_str().is_empty() {
        return None;
    }
    let md = with_md(&suffix);

    files
        .iter()
        .filter(|f| f.ends_with(&suffix) || md.as_ref().is_some_and(|m| f.ends_with(m)))
        .min_by_key(|f| {
            let same_folder = f.parent() == Some(folder);
            (!same_folder, f.components().count(), (*f).clone())
        })
        .cloned()
}

/// A pending move, resolved against the vault as it was before the move
struct Relink<'a> {
    index: &'a BTreeSet<PathBuf>,
    after: &'a [PathBuf],
    from: &'a Path,
    to: &'a Path,
}

impl Relink<'_> {
    /// Rewrites of the links in `text` that point at the moved file; `path`
    /// is where the note lived before the move
    fn replacements(&self, text: &str, path: &Path) -> Vec<(Range<usize>, String)> {
        let folder = path.parent().unwrap_or(Path::new(""));
        extract_links(text)
            .into_iter()
            .filter(|link| resolve_in(self.index, folder, &link.link).as_deref() == Some(self.from))
            .map(|link| {
                let target = relinked_target(&link, self.to, self.after);
                (link.range.clone(), link.render_with_target(&target))
            })
            .collect()
    }
}

/// Link text for a reference whose target moved to `to`.
///
/// Bare links stay bare while the new file name is unique in the vault;
/// otherwise the full vault-relative path is used. Wikilinks to notes keep
/// omitting `.md` when they did before.
fn relinked_target(link: &EmbeddedReference, to: &Path, files_after: &[PathBuf]) -> String {
    let name = to.file_name();
    let unique = files_after.iter().filter(|f| f.file_name() == name).count() <= 1;
    let bare = !link.link.contains('/');

    let target = match name.and_then(|n| n.to_str()) {
        Some(name) if bare && unique => name.to_string(),
        _ => to_link_path(to),
    };

    if link.syntax == LinkSyntax::Wikilink
        && is_markdown_path(to)
        && !link.link.ends_with(".md")
    {
        if let Some(stripped) = target.strip_suffix(".md") {
            return stripped.to_string();
        }
    }
    target
}

fn is_markdown_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

fn scan_files_blocking(root: &Path) -> ZkResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            ZkError::io(path, std::io::Error::other(e.to_string()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
