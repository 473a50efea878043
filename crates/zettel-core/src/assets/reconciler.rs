//! Content-addressed asset reconciliation
//!
//! For each unique embed of a note the reconciler runs
//! resolve → read → hash → ensure folder → move-or-skip as one task. Tasks
//! of the same note run concurrently; the existence check and move for a
//! given canonical path run under a per-path lock, so two pipelines can never
//! both move onto the same name.

use dashmap::DashMap;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::report::{AssetOutcome, AssetStatus, ReconcileReport};
use crate::error::{ZkError, ZkResult};
use crate::hashing::ContentHasher;
use crate::host::NoteHost;
use crate::links::{extract_embeds, splice, unique_by_link, EmbeddedReference};
use crate::note::{to_link_path, NoteRef};
use crate::prefix::Prefix;
use zettel_config::{AssetsConfig, DuplicatePolicy, DEFAULT_ASSETS_DIR};

/// Reconciler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Folder next to the note holding one subfolder per prefix
    pub assets_dir: String,
    /// Handling of already-deduplicated content
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            duplicate_policy: DuplicatePolicy::Report,
        }
    }
}

impl From<&AssetsConfig> for ReconcileOptions {
    fn from(config: &AssetsConfig) -> Self {
        Self {
            assets_dir: config.dir_name.clone(),
            duplicate_policy: config.duplicate_policy,
        }
    }
}

type LockTable = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Moves a note's embedded assets to `<folder>/<assets>/<prefix>/<digest>.<ext>`
pub struct AssetReconciler {
    host: Arc<dyn NoteHost>,
    hasher: Arc<dyn ContentHasher>,
    options: ReconcileOptions,
    locks: Arc<LockTable>,
}

impl AssetReconciler {
    /// Create a reconciler over `host`
    pub fn new(
        host: Arc<dyn NoteHost>,
        hasher: Arc<dyn ContentHasher>,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            host,
            hasher,
            options,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Settings in use
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// `<note folder>/<assets dir>/<prefix>`
    pub fn destination_folder(&self, note: &NoteRef, prefix: &Prefix) -> PathBuf {
        destination_folder(note, prefix, &self.options.assets_dir)
    }

    /// Start reconciling `note`.
    ///
    /// Fails fast with [`ZkError::InvalidConvention`] when `prefix` is
    /// `None`. Otherwise one task per unique embed is spawned on the current
    /// tokio runtime and the handles are returned as a batch; the tasks
    /// keep running whether or not the batch is awaited.
    pub async fn reconcile(
        &self,
        note: &NoteRef,
        prefix: Option<&Prefix>,
    ) -> ZkResult<ReconcileBatch> {
        let prefix = prefix
            .cloned()
            .ok_or_else(|| ZkError::invalid_convention(note.name()))?;

        let references = self.host.embedded_references(note).await?;
        let unique = unique_by_link(references);
        info!(
            "Reconciling {} embedded asset(s) of {} into {}",
            unique.len(),
            note,
            self.destination_folder(note, &prefix).display()
        );

        let tasks = unique
            .into_iter()
            .map(|reference| {
                let link = reference.link.clone();
                let pipeline = Pipeline {
                    host: Arc::clone(&self.host),
                    hasher: Arc::clone(&self.hasher),
                    locks: Arc::clone(&self.locks),
                    note: note.clone(),
                    prefix: prefix.clone(),
                    assets_dir: self.options.assets_dir.clone(),
                };
                let handle = tokio::spawn(async move {
                    let status = pipeline.run(&reference).await;
                    AssetOutcome::new(reference.link, status)
                });
                (link, handle)
            })
            .collect();

        Ok(ReconcileBatch {
            host: Arc::clone(&self.host),
            note: note.clone(),
            prefix,
            policy: self.options.duplicate_policy,
            tasks,
        })
    }
}

/// `<note folder>/<assets dir>/<prefix>`
pub fn destination_folder(note: &NoteRef, prefix: &Prefix, assets_dir: &str) -> PathBuf {
    note.folder().join(assets_dir).join(prefix.as_str())
}

/// `<digest>.<ext>`, or just the digest for extension-less files
pub fn canonical_file_name(digest: &str, source: &Path) -> String {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", digest, ext),
        _ => digest.to_string(),
    }
}

/// Everything one reference's task needs, owned
struct Pipeline {
    host: Arc<dyn NoteHost>,
    hasher: Arc<dyn ContentHasher>,
    locks: Arc<LockTable>,
    note: NoteRef,
    prefix: Prefix,
    assets_dir: String,
}

impl Pipeline {
    async fn run(&self, reference: &EmbeddedReference) -> AssetStatus {
        match self.process(reference).await {
            Ok(status) => status,
            Err(ZkError::UnresolvedReference { link }) => {
                warn!("Skipping unresolved embed '{}' in {}", link, self.note);
                AssetStatus::Unresolved
            }
            Err(e) => {
                warn!("Asset '{}' in {} failed: {}", reference.link, self.note, e);
                AssetStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn process(&self, reference: &EmbeddedReference) -> ZkResult<AssetStatus> {
        let source = self
            .host
            .resolve_reference(&self.note, reference)
            .await?
            .ok_or_else(|| ZkError::UnresolvedReference {
                link: reference.link.clone(),
            })?;

        if source.extension().is_some_and(|e| e == "md") {
            debug!("'{}' embeds a note, not an asset", reference.link);
            return Ok(AssetStatus::NotAnAsset { path: source });
        }

        let bytes = self.host.read_binary(&source).await?;
        let digest = self.hasher.hash_bytes(&bytes);

        let folder = destination_folder(&self.note, &self.prefix, &self.assets_dir);
        self.host.create_dir(&folder).await?;

        let destination = folder.join(canonical_file_name(&digest, &source));
        if destination == source {
            return Ok(AssetStatus::AlreadyCanonical { path: source });
        }

        let lock = Arc::clone(self.locks.entry(destination.clone()).or_default().value());
        let status = {
            let _guard = lock.lock().await;
            if self.host.exists(&destination).await? {
                debug!(
                    "{} already exists; leaving {} in place",
                    destination.display(),
                    source.display()
                );
                AssetStatus::Duplicate {
                    source,
                    canonical: destination.clone(),
                    relinked: false,
                }
            } else {
                self.host
                    .move_and_rewrite_backlinks(&source, &destination)
                    .await?;
                info!("Moved {} -> {}", source.display(), destination.display());
                AssetStatus::Moved {
                    from: source,
                    to: destination.clone(),
                }
            }
        };
        drop(lock);
        self.locks
            .remove_if(&destination, |_, l| Arc::strong_count(l) == 1);

        Ok(status)
    }
}

/// Running reconciliation of one note
pub struct ReconcileBatch {
    host: Arc<dyn NoteHost>,
    note: NoteRef,
    prefix: Prefix,
    policy: DuplicatePolicy,
    tasks: Vec<(String, JoinHandle<AssetOutcome>)>,
}

impl ReconcileBatch {
    /// Note being reconciled
    pub fn note(&self) -> &NoteRef {
        &self.note
    }

    /// Number of unique references being processed
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the note embeds nothing
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Let the tasks finish on their own; outcomes are only logged.
    pub fn detach(self) {
        debug!("Detached {} asset task(s) for {}", self.tasks.len(), self.note);
    }

    /// Wait for every task and apply the duplicate policy
    pub async fn finish(self) -> ZkResult<ReconcileReport> {
        let (links, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let mut outcomes: Vec<AssetOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(links)
            .map(|(joined, link)| match joined {
                Ok(outcome) => outcome,
                Err(e) => AssetOutcome::new(
                    link,
                    AssetStatus::Failed {
                        error: ZkError::Task(e.to_string()).to_string(),
                    },
                ),
            })
            .collect();

        if self.policy == DuplicatePolicy::RewriteLink {
            relink_duplicates(self.host.as_ref(), &self.note, &mut outcomes).await?;
        }

        let report = ReconcileReport {
            note: self.note,
            prefix: self.prefix,
            outcomes,
        };
        if report.unresolved_duplicates() > 0 {
            warn!(
                "{} still embeds {} duplicate(s) of already-deduplicated assets",
                report.note,
                report.unresolved_duplicates()
            );
        }
        Ok(report)
    }
}

/// Point the note's embeds of duplicate files at their canonical copies.
///
/// Runs after all tasks finished: moves may have rewritten the note, so the
/// note is read again and its embeds are taken from that one read. All
/// replacements go out in one write. Only duplicates that had an embed
/// rewritten are marked as relinked.
async fn relink_duplicates(
    host: &dyn NoteHost,
    note: &NoteRef,
    outcomes: &mut [AssetOutcome],
) -> ZkResult<()> {
    let duplicates: Vec<(PathBuf, PathBuf)> = outcomes
        .iter()
        .filter_map(|o| match &o.status {
            AssetStatus::Duplicate {
                source, canonical, ..
            } => Some((source.clone(), canonical.clone())),
            _ => None,
        })
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }

    let text = host.read_text(note).await?;
    let mut replacements = Vec::new();
    let mut relinked_sources = HashSet::new();
    for reference in extract_embeds(&text) {
        let Some(resolved) = host.resolve_reference(note, &reference).await? else {
            continue;
        };
        if let Some((source, canonical)) = duplicates.iter().find(|(s, _)| *s == resolved) {
            let target = to_link_path(canonical);
            replacements.push((reference.range.clone(), reference.render_with_target(&target)));
            relinked_sources.insert(source.clone());
        }
    }
    if replacements.is_empty() {
        return Ok(());
    }

    let count = replacements.len();
    host.write_text(note, &splice(&text, replacements)).await?;
    info!("Relinked {} duplicate embed(s) in {}", count, note);

    for outcome in outcomes.iter_mut() {
        if let AssetStatus::Duplicate {
            source, relinked, ..
        } = &mut outcome.status
        {
            *relinked = relinked_sources.contains(source);
        }
    }
    Ok(())
}
