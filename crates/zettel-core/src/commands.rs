//! Command registry
//!
//! The three user-facing operations, addressable by stable id. A
//! [`CommandRunner`] checks whether a command applies to the active note and
//! runs it against a [`NoteHost`].

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assets::{AssetReconciler, ReconcileBatch, ReconcileOptions, ReconcileReport};
use crate::error::{ZkError, ZkResult};
use crate::frontmatter::{FrontMatterSynchronizer, SyncOutcome};
use crate::hashing::hasher_for;
use crate::host::NoteHost;
use crate::note::NoteRef;
use crate::prefix::{has_leading_prefix_token, prefixed_file_name, Prefix};
use zettel_config::ZettelConfig;

/// User-invocable commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZkCommand {
    /// Prefix the note name when missing, then sync the ID key
    UpdateFilenameByZk,
    /// Move embedded assets to their content-hash names
    UpdateAssetsByHash,
    /// Sync the ID key from an existing name prefix
    SyncFrontmatterId,
}

impl ZkCommand {
    /// Every command, in menu order
    pub const ALL: [ZkCommand; 3] = [
        Self::UpdateFilenameByZk,
        Self::UpdateAssetsByHash,
        Self::SyncFrontmatterId,
    ];

    /// Stable id
    pub fn id(self) -> &'static str {
        match self {
            Self::UpdateFilenameByZk => "update-filename-by-zk",
            Self::UpdateAssetsByHash => "update-assets-in-md-by-md5",
            Self::SyncFrontmatterId => "sync-frontmatter-id",
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::UpdateFilenameByZk => "Update filename by zk prefix",
            Self::UpdateAssetsByHash => "Update assets in note by content hash",
            Self::SyncFrontmatterId => "Sync frontmatter ID with name prefix",
        }
    }

    /// Look up a command by id or alias
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "update-assets-by-hash" => Some(Self::UpdateAssetsByHash),
            _ => Self::ALL.into_iter().find(|c| c.id() == id),
        }
    }
}

impl fmt::Display for ZkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ZkCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| {
            let ids: Vec<&str> = Self::ALL.iter().map(|c| c.id()).collect();
            format!("unknown command '{}' (expected one of: {})", s, ids.join(", "))
        })
    }
}

/// What a command sees: the active note, if any
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Currently active document
    pub note: Option<NoteRef>,
}

impl CommandContext {
    /// Context with `note` active
    pub fn new(note: NoteRef) -> Self {
        Self { note: Some(note) }
    }
}

/// Result of a successful command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The note received a prefix and was renamed
    Renamed {
        /// Old location
        from: NoteRef,
        /// New location
        to: NoteRef,
        /// Prefix given to the note
        prefix: Prefix,
        /// Metadata change on the renamed note
        sync: SyncOutcome,
    },
    /// The ID key was synced, no rename
    Synced {
        /// Note
        note: NoteRef,
        /// Prefix from the name
        prefix: Prefix,
        /// Metadata change
        sync: SyncOutcome,
    },
    /// Assets were reconciled
    Assets(ReconcileReport),
}

/// Source of fresh prefixes
pub type Clock = Arc<dyn Fn() -> Prefix + Send + Sync>;

/// Runs commands against one host
pub struct CommandRunner {
    host: Arc<dyn NoteHost>,
    synchronizer: FrontMatterSynchronizer,
    reconciler: Arc<AssetReconciler>,
    clock: Clock,
}

impl CommandRunner {
    /// Runner configured from `config`, using the local wall clock
    pub fn new(host: Arc<dyn NoteHost>, config: &ZettelConfig) -> Self {
        let synchronizer =
            FrontMatterSynchronizer::new(Arc::clone(&host), config.frontmatter.id_key.clone());
        let reconciler = AssetReconciler::new(
            Arc::clone(&host),
            hasher_for(config.assets.hash_algorithm),
            ReconcileOptions::from(&config.assets),
        );
        Self {
            host,
            synchronizer,
            reconciler: Arc::new(reconciler),
            clock: Arc::new(Prefix::now),
        }
    }

    /// Replace the prefix source
    pub fn with_clock(mut self, clock: impl Fn() -> Prefix + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Shared asset reconciler
    pub fn reconciler(&self) -> Arc<AssetReconciler> {
        Arc::clone(&self.reconciler)
    }

    /// Whether `command` can run in `ctx`
    pub fn check(&self, command: ZkCommand, ctx: &CommandContext) -> bool {
        self.applicable_note(command, ctx).is_ok()
    }

    /// The note `command` would act on, or why it does not apply
    pub fn applicable_note<'a>(
        &self,
        command: ZkCommand,
        ctx: &'a CommandContext,
    ) -> ZkResult<&'a NoteRef> {
        let not_applicable = |reason: String| ZkError::NotApplicable {
            command: command.id().to_string(),
            reason,
        };

        let note = ctx
            .note
            .as_ref()
            .ok_or_else(|| not_applicable("no active note".to_string()))?;
        if !note.is_markdown() {
            return Err(not_applicable(format!("{} is not a markdown note", note)));
        }
        if command == ZkCommand::SyncFrontmatterId && note.prefix().is_none() {
            return Err(not_applicable(format!("{} has no zk prefix", note.name())));
        }
        Ok(note)
    }

    /// Run `command` on the active note and wait for it to complete
    pub async fn run(&self, command: ZkCommand, ctx: &CommandContext) -> ZkResult<CommandOutcome> {
        let note = self.applicable_note(command, ctx)?;
        info!("Running {} on {}", command, note);

        match command {
            ZkCommand::UpdateFilenameByZk => self.update_filename(note).await,
            ZkCommand::SyncFrontmatterId => self.sync_frontmatter(note).await,
            ZkCommand::UpdateAssetsByHash => {
                let report = self.update_assets(note).await?.finish().await?;
                Ok(CommandOutcome::Assets(report))
            }
        }
    }

    /// Give `note` a prefix if its name lacks one, then sync the ID key
    pub async fn update_filename(&self, note: &NoteRef) -> ZkResult<CommandOutcome> {
        if has_leading_prefix_token(note.name()) {
            return self.sync_frontmatter(note).await;
        }

        let prefix = (self.clock)();
        let renamed = note.with_name(&prefixed_file_name(&prefix, note.name()))?;
        self.host
            .move_and_rewrite_backlinks(note.path(), renamed.path())
            .await?;
        info!("Renamed {} -> {}", note, renamed);

        let sync = match self.synchronizer.sync(&renamed, &prefix).await {
            Ok(sync) => sync,
            Err(e) => {
                warn!("{} was renamed to {} but its ID was not synced: {}", note, renamed, e);
                return Err(e);
            }
        };
        Ok(CommandOutcome::Renamed {
            from: note.clone(),
            to: renamed,
            prefix,
            sync,
        })
    }

    /// Sync the ID key from the prefix already in the name
    pub async fn sync_frontmatter(&self, note: &NoteRef) -> ZkResult<CommandOutcome> {
        let prefix = note
            .prefix()
            .ok_or_else(|| ZkError::invalid_convention(note.name()))?;
        let sync = self.synchronizer.sync(note, &prefix).await?;
        Ok(CommandOutcome::Synced {
            note: note.clone(),
            prefix,
            sync,
        })
    }

    /// Start asset reconciliation; the batch may be awaited or detached
    pub async fn update_assets(&self, note: &NoteRef) -> ZkResult<ReconcileBatch> {
        self.reconciler.reconcile(note, note.prefix().as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryHost;
    use std::path::Path;
    use test_case::test_case;

    const FIXED: &str = "240315-093000";

    fn runner(host: Arc<MemoryHost>) -> CommandRunner {
        CommandRunner::new(host, &ZettelConfig::default())
            .with_clock(|| Prefix::parse(FIXED).unwrap())
    }

    fn ctx(path: &str) -> CommandContext {
        CommandContext::new(NoteRef::new(path).unwrap())
    }

    #[test_case("update-filename-by-zk", Some(ZkCommand::UpdateFilenameByZk))]
    #[test_case("update-assets-in-md-by-md5", Some(ZkCommand::UpdateAssetsByHash))]
    #[test_case("update-assets-by-hash", Some(ZkCommand::UpdateAssetsByHash))]
    #[test_case("sync-frontmatter-id", Some(ZkCommand::SyncFrontmatterId))]
    #[test_case("rename", None)]
    fn test_from_id(id: &str, expected: Option<ZkCommand>) {
        assert_eq!(ZkCommand::from_id(id), expected);
    }

    #[test]
    fn test_check() {
        let runner = runner(Arc::new(MemoryHost::new()));

        assert!(!runner.check(ZkCommand::UpdateFilenameByZk, &CommandContext::default()));
        assert!(!runner.check(ZkCommand::UpdateFilenameByZk, &ctx("pic.png")));
        assert!(runner.check(ZkCommand::UpdateFilenameByZk, &ctx("My Note.md")));
        assert!(runner.check(ZkCommand::UpdateAssetsByHash, &ctx("My Note.md")));
        assert!(!runner.check(ZkCommand::SyncFrontmatterId, &ctx("My Note.md")));
        assert!(runner.check(ZkCommand::SyncFrontmatterId, &ctx("200101-120000 n.md")));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_rename_reports_the_new_name_when_sync_fails() {
        let host = Arc::new(MemoryHost::new());
        host.insert_text("My Note.md", "---\nID: a\nID: b\n---\n");

        let result = runner(host.clone())
            .run(ZkCommand::UpdateFilenameByZk, &ctx("My Note.md"))
            .await;

        assert!(matches!(result, Err(ZkError::MalformedMetadata(_))));
        assert_eq!(host.moves().len(), 1);
        assert!(host.text(Path::new("240315-093000 My Note.md")).is_some());
        assert!(logs_contain("was renamed to 240315-093000 My Note.md"));
    }

    #[tokio::test]
    async fn test_rename_then_idempotent() {
        let host = Arc::new(MemoryHost::new());
        host.insert_text("My Note.md", "# My Note\n");
        host.insert_text("index.md", "[[My Note.md]]");
        let runner = runner(host.clone());

        let outcome = runner
            .run(ZkCommand::UpdateFilenameByZk, &ctx("My Note.md"))
            .await
            .unwrap();
        let CommandOutcome::Renamed { to, sync, .. } = outcome else {
            panic!("expected a rename");
        };
        assert_eq!(to.path(), Path::new("240315-093000 My Note.md"));
        assert_eq!(sync, SyncOutcome::InsertedBlock);
        assert_eq!(
            host.text(to.path()).unwrap(),
            "---\nID: 240315-093000\n---\n# My Note\n"
        );
        assert_eq!(
            host.text(Path::new("index.md")).unwrap(),
            "[[240315-093000 My Note.md]]"
        );

        let second = runner
            .run(ZkCommand::UpdateFilenameByZk, &CommandContext::new(to.clone()))
            .await
            .unwrap();
        assert!(matches!(
            second,
            CommandOutcome::Synced {
                sync: SyncOutcome::Unchanged,
                ..
            }
        ));
        assert_eq!(host.moves().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_updates_stale_id() {
        let host = Arc::new(MemoryHost::new());
        host.insert_text("200101-120000 n.md", "---\nID: 191231-000000\n---\nbody");
        let runner = runner(host.clone());

        let outcome = runner
            .run(ZkCommand::SyncFrontmatterId, &ctx("200101-120000 n.md"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::Synced {
                sync: SyncOutcome::Updated { .. },
                ..
            }
        ));
        assert_eq!(
            host.text(Path::new("200101-120000 n.md")).unwrap(),
            "---\nID: 200101-120000\n---\nbody"
        );
    }

    #[tokio::test]
    async fn test_assets_need_prefix() {
        let host = Arc::new(MemoryHost::new());
        host.insert_text("My Note.md", "![[a.png]]");
        host.insert_binary("a.png", b"a");

        let result = runner(host.clone())
            .run(ZkCommand::UpdateAssetsByHash, &ctx("My Note.md"))
            .await;
        assert!(matches!(result, Err(ZkError::InvalidConvention { .. })));
        assert!(host.moves().is_empty());
    }

    #[tokio::test]
    async fn test_not_applicable_is_reported() {
        let result = runner(Arc::new(MemoryHost::new()))
            .run(ZkCommand::SyncFrontmatterId, &ctx("My Note.md"))
            .await;
        assert!(matches!(result, Err(ZkError::NotApplicable { .. })));
    }
}
