//! # Zettel Configuration Library
//!
//! Typed configuration for the zettel tooling: where the vault lives, which
//! frontmatter key carries the note ID, and how embedded assets are
//! deduplicated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zettel_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load(None).await?;
//!     println!("assets go to {}/<prefix>", config.assets.dir_name);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use loader::*;
