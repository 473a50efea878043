use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use zettel_config::ConfigLoader;
use zettel_core::ZkCommand;

use zettel_cli::cli::{Cli, Commands};
use zettel_cli::{commands, logging, output};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    logging::init(logging::effective_level(
        cli.log_level,
        cli.verbose,
        config.logging.level.as_deref(),
    ));
    debug!("Configuration: {:?}", config);

    let vault = cli.vault.as_deref();
    let format = cli.format;

    match cli.command {
        Commands::Rename { note } => {
            commands::note::run(&config, vault, ZkCommand::UpdateFilenameByZk, &note, format)
                .await?
        }

        Commands::Sync { note } => {
            commands::note::run(&config, vault, ZkCommand::SyncFrontmatterId, &note, format)
                .await?
        }

        Commands::Assets {
            note,
            algorithm,
            duplicates,
        } => {
            commands::assets::execute(&config, vault, &note, algorithm, duplicates, format).await?
        }

        Commands::Run { command, note } => {
            commands::note::run(&config, vault, command, &note, format).await?
        }

        Commands::Check { command, note } => {
            if !commands::note::check(&config, vault, command, note.as_ref()).await? {
                std::process::exit(1);
            }
        }

        Commands::Commands => output::print_commands(format)?,

        Commands::Prefix { name } => commands::prefix::execute(name.as_deref(), format)?,

        Commands::Hash { file, algorithm } => {
            let algorithm = algorithm.unwrap_or(config.assets.hash_algorithm);
            commands::hash::execute(&file, algorithm, format).await?
        }
    }

    Ok(())
}
