use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zettel_config::ZettelConfig;
use zettel_core::{CommandContext, CommandRunner, NoteHost, ZkCommand};

use super::{note_arg, open_vault};
use crate::cli::OutputFormat;
use crate::output;

/// `zk rename`, `zk sync` and `zk run`
pub async fn run(
    config: &ZettelConfig,
    vault: Option<&Path>,
    command: ZkCommand,
    note: &Path,
    format: OutputFormat,
) -> Result<()> {
    let fs = open_vault(vault, config).await?;
    let ctx = CommandContext::new(note_arg(&fs, note).await?);
    let host: Arc<dyn NoteHost> = fs;

    let outcome = CommandRunner::new(host, config).run(command, &ctx).await?;
    output::print_outcome(&outcome, format)
}

/// `zk check`: whether `command` applies, plus the reason when it does not
pub async fn check(
    config: &ZettelConfig,
    vault: Option<&Path>,
    command: ZkCommand,
    note: Option<&PathBuf>,
) -> Result<bool> {
    let fs = open_vault(vault, config).await?;
    let ctx = match note {
        Some(note) => CommandContext::new(note_arg(&fs, note).await?),
        None => CommandContext::default(),
    };
    let host: Arc<dyn NoteHost> = fs;
    let runner = CommandRunner::new(host, config);

    match runner.applicable_note(command, &ctx) {
        Ok(note) => {
            println!("{} applies to {}", command, note);
            Ok(true)
        }
        Err(e) => {
            println!("{}", e);
            Ok(false)
        }
    }
}
