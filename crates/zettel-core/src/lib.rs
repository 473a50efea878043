//! # Zettel Core
//!
//! Enforces the zk note convention over a markdown vault:
//!
//! - notes are named `<yyMMdd-HHmmss> <title>.md` ([`prefix`])
//! - the same prefix is mirrored into the note's frontmatter ([`frontmatter`])
//! - embedded attachments are moved to `<folder>/assets/<prefix>/<digest>.<ext>`
//!   so identical files collapse onto one name ([`assets`])
//!
//! Storage is reached only through the [`NoteHost`] trait. [`FsVault`] is the
//! filesystem implementation; [`commands::CommandRunner`] wires everything
//! together for the three user-facing commands.

#![warn(missing_docs)]

pub mod assets;
pub mod commands;
pub mod error;
pub mod frontmatter;
pub mod hashing;
pub mod host;
pub mod links;
pub mod note;
pub mod prefix;
pub mod vault;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use assets::{
    AssetOutcome, AssetReconciler, AssetStatus, ReconcileBatch, ReconcileOptions, ReconcileReport,
};
pub use commands::{CommandContext, CommandOutcome, CommandRunner, ZkCommand};
pub use error::{ZkError, ZkResult};
pub use frontmatter::{FrontMatterSynchronizer, MetadataBlock, MetadataEntry, SyncOutcome};
pub use hashing::{hasher_for, ContentHasher, HashAlgorithm};
pub use host::NoteHost;
pub use links::{EmbeddedReference, LinkSyntax};
pub use note::NoteRef;
pub use prefix::{has_leading_prefix_token, Prefix};
pub use vault::FsVault;
