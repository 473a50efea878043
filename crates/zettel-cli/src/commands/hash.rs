use anyhow::{Context, Result};
use std::path::Path;
use zettel_config::HashAlgorithm;
use zettel_core::hasher_for;

use crate::cli::OutputFormat;
use crate::output::print_json;

/// `zk hash`: digest of a file as the reconciler would name it
pub async fn execute(file: &Path, algorithm: HashAlgorithm, format: OutputFormat) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let hasher = hasher_for(algorithm);
    let digest = hasher.hash_bytes(&bytes);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": file,
            "algorithm": hasher.algorithm_name(),
            "digest": digest,
        })),
        OutputFormat::Table => {
            println!("{}  {}", digest, file.display());
            Ok(())
        }
    }
}
