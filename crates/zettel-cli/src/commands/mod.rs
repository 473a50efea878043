pub mod assets;
pub mod hash;
pub mod note;
pub mod prefix;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use zettel_config::ZettelConfig;
use zettel_core::{FsVault, NoteRef};

/// Open the vault named by `--vault`, the config, or the current directory
pub async fn open_vault(flag: Option<&Path>, config: &ZettelConfig) -> Result<Arc<FsVault>> {
    let root = flag
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.vault_root());
    let vault = FsVault::open(&root)
        .await
        .with_context(|| format!("Failed to open vault at {}", root.display()))?;
    debug!("Using vault {}", vault.root().display());
    Ok(Arc::new(vault))
}

/// Map a note argument to a vault note.
///
/// A relative path is read as vault-relative unless only the
/// working-directory reading names an existing file.
pub async fn note_arg(vault: &FsVault, input: &Path) -> Result<NoteRef> {
    let cwd_only = input.is_relative()
        && !tokio::fs::try_exists(vault.root().join(input))
            .await
            .unwrap_or(false)
        && tokio::fs::try_exists(input).await.unwrap_or(false);
    let input: PathBuf = if cwd_only {
        std::env::current_dir()
            .context("Failed to read the current directory")?
            .join(input)
    } else {
        input.to_path_buf()
    };

    vault
        .note_ref(&input)
        .await
        .with_context(|| format!("{} is not a note in {}", input.display(), vault.root().display()))
}
