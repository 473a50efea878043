use anyhow::Result;
use std::path::Path;
use zettel_config::{DuplicatePolicy, HashAlgorithm, ZettelConfig};
use zettel_core::ZkCommand;

use crate::cli::OutputFormat;

/// `zk assets`: reconcile with per-invocation overrides
pub async fn execute(
    config: &ZettelConfig,
    vault: Option<&Path>,
    note: &Path,
    algorithm: Option<HashAlgorithm>,
    duplicates: Option<DuplicatePolicy>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(algorithm) = algorithm {
        config.assets.hash_algorithm = algorithm;
    }
    if let Some(policy) = duplicates {
        config.assets.duplicate_policy = policy;
    }

    super::note::run(&config, vault, ZkCommand::UpdateAssetsByHash, note, format).await
}
