//! Frontmatter ID synchronization
//!
//! Decides between four outcomes for a note and a target prefix:
//!
//! | block | key    | value        | result                                  |
//! |-------|--------|--------------|-----------------------------------------|
//! | no    | -      | -            | new three-line block at the top         |
//! | yes   | absent | -            | key line inserted after opening fence   |
//! | yes   | yes    | differs      | that one line rewritten                 |
//! | yes   | yes    | equal        | nothing written                         |
//!
//! Every other line, line endings included, is left byte-identical.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::block::{MetadataBlock, FENCE};
use crate::error::{ZkError, ZkResult};
use crate::host::NoteHost;
use crate::note::NoteRef;
use crate::prefix::Prefix;

/// What synchronization did (or would do) to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Note had no block; one was prepended
    InsertedBlock,
    /// Block existed without the key; the key line was added
    InsertedKey,
    /// Key held another value
    Updated {
        /// Value before the update
        previous: String,
    },
    /// Key already held the value
    Unchanged,
}

impl SyncOutcome {
    /// Whether the note text changes
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Result of planning a synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Transition taken
    pub outcome: SyncOutcome,
    /// New note text; `None` when unchanged
    pub text: Option<String>,
}

/// Compute the new text for `text` so that `key` holds `value`.
///
/// `block` is the host's view of the metadata block; it must match the
/// text or the plan fails with [`ZkError::MalformedMetadata`].
pub fn plan_sync(
    text: &str,
    block: Option<&MetadataBlock>,
    key: &str,
    value: &str,
) -> ZkResult<SyncPlan> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    let Some(block) = block else {
        let cr = line_ending_of(lines.first());
        let header = format!("{FENCE}{cr}\n{key}: {value}{cr}\n{FENCE}{cr}\n");
        return Ok(SyncPlan {
            outcome: SyncOutcome::InsertedBlock,
            text: Some(format!("{header}{text}")),
        });
    };

    {
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
        block.validate_against(&borrowed)?;
    }

    let outcome = match block.count(key) {
        0 => {
            let cr = line_ending_of(lines.get(block.start));
            lines.insert(block.start + 1, format!("{key}: {value}{cr}"));
            SyncOutcome::InsertedKey
        }
        1 => {
            let entry = block
                .get(key)
                .ok_or_else(|| ZkError::malformed(format!("key '{key}' vanished")))?;
            if entry.unquoted_value() == value {
                return Ok(SyncPlan {
                    outcome: SyncOutcome::Unchanged,
                    text: None,
                });
            }
            let cr = line_ending_of(lines.get(entry.line));
            lines[entry.line] = format!("{key}: {value}{cr}");
            SyncOutcome::Updated {
                previous: entry.unquoted_value().to_string(),
            }
        }
        n => {
            return Err(ZkError::malformed(format!(
                "key '{key}' appears {n} times in the metadata block"
            )))
        }
    };

    Ok(SyncPlan {
        outcome,
        text: Some(lines.join("\n")),
    })
}

fn line_ending_of(line: Option<&String>) -> &'static str {
    match line {
        Some(l) if l.ends_with('\r') => "\r",
        _ => "",
    }
}

/// Applies a prefix to the note's metadata block through a [`NoteHost`]
pub struct FrontMatterSynchronizer {
    host: Arc<dyn NoteHost>,
    id_key: String,
}

impl FrontMatterSynchronizer {
    /// Synchronizer writing `id_key`
    pub fn new(host: Arc<dyn NoteHost>, id_key: impl Into<String>) -> Self {
        Self {
            host,
            id_key: id_key.into(),
        }
    }

    /// Key this synchronizer maintains
    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    /// Make the note's ID key equal `prefix`, writing only when needed
    pub async fn sync(&self, note: &NoteRef, prefix: &Prefix) -> ZkResult<SyncOutcome> {
        let text = self.host.read_text(note).await?;
        let block = self.host.metadata_block(note).await?;

        let plan = plan_sync(&text, block.as_ref(), &self.id_key, prefix.as_str())?;

        match plan.text {
            Some(new_text) => {
                self.host.write_text(note, &new_text).await?;
                info!(
                    "Synced {} = {} in {} ({:?})",
                    self.id_key, prefix, note, plan.outcome
                );
            }
            None => debug!("{} already has {} = {}", note, self.id_key, prefix),
        }

        Ok(plan.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryHost;

    const PREFIX: &str = "200101-120000";

    fn plan(text: &str) -> ZkResult<SyncPlan> {
        let block = MetadataBlock::detect(text)?;
        plan_sync(text, block.as_ref(), "ID", PREFIX)
    }

    fn apply(text: &str) -> String {
        plan(text).unwrap().text.unwrap_or_else(|| text.to_string())
    }

    #[test]
    fn test_no_block_prepends() {
        let text = "# Title\n\nbody line\n";
        let plan = plan(text).unwrap();
        assert_eq!(plan.outcome, SyncOutcome::InsertedBlock);
        assert_eq!(
            plan.text.unwrap(),
            "---\nID: 200101-120000\n---\n# Title\n\nbody line\n"
        );
    }

    #[test]
    fn test_leading_thematic_break_gets_a_block_in_front() {
        let text = "---\nnot frontmatter\n";
        let plan = plan(text).unwrap();
        assert_eq!(plan.outcome, SyncOutcome::InsertedBlock);
        assert_eq!(
            plan.text.unwrap(),
            "---\nID: 200101-120000\n---\n---\nnot frontmatter\n"
        );
    }

    #[test]
    fn test_empty_note() {
        assert_eq!(apply(""), "---\nID: 200101-120000\n---\n");
    }

    #[test]
    fn test_block_without_key_inserts_after_fence() {
        let text = "---\ntitle: A\ntags: [x]\n---\nbody";
        let plan = plan(text).unwrap();
        assert_eq!(plan.outcome, SyncOutcome::InsertedKey);
        assert_eq!(
            plan.text.unwrap(),
            "---\nID: 200101-120000\ntitle: A\ntags: [x]\n---\nbody"
        );
    }

    #[test]
    fn test_empty_block_gets_key() {
        assert_eq!(apply("---\n---\nbody"), "---\nID: 200101-120000\n---\nbody");
    }

    #[test]
    fn test_update_in_place_changes_one_line() {
        let text = "---\ntitle: A\nID: 991231-235959\nalias: b\n---\nbody\n";
        let plan = plan(text).unwrap();
        assert_eq!(
            plan.outcome,
            SyncOutcome::Updated {
                previous: "991231-235959".to_string()
            }
        );
        let new_text = plan.text.unwrap();

        let before: Vec<&str> = text.split('\n').collect();
        let after: Vec<&str> = new_text.split('\n').collect();
        assert_eq!(before.len(), after.len());
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, vec![2]);
        assert_eq!(after[2], "ID: 200101-120000");
    }

    #[test]
    fn test_equal_value_is_noop() {
        let plan = plan("---\nID: 200101-120000\n---\nbody").unwrap();
        assert_eq!(plan.outcome, SyncOutcome::Unchanged);
        assert!(plan.text.is_none());
    }

    #[test]
    fn test_quoted_equal_value_is_noop() {
        let plan = plan("---\nID: \"200101-120000\"\n---\n").unwrap();
        assert_eq!(plan.outcome, SyncOutcome::Unchanged);
    }

    #[test]
    fn test_idempotent() {
        for text in [
            "",
            "body only",
            "---\n---\n",
            "---\na: 1\n---\nx",
            "---\nID: 1\n---\nx",
        ] {
            let once = apply(text);
            assert_eq!(apply(&once), once, "not idempotent for {:?}", text);
        }
    }

    #[test]
    fn test_crlf_preserved() {
        let text = "---\r\ntitle: A\r\n---\r\nbody\r\n";
        assert_eq!(
            apply(text),
            "---\r\nID: 200101-120000\r\ntitle: A\r\n---\r\nbody\r\n"
        );

        let text = "line one\r\nline two";
        assert_eq!(
            apply(text),
            "---\r\nID: 200101-120000\r\n---\r\nline one\r\nline two"
        );

        let text = "---\r\nID: 1\r\n---\r\n";
        assert_eq!(apply(text), "---\r\nID: 200101-120000\r\n---\r\n");
    }

    #[test]
    fn test_round_trip_keeps_original_lines() {
        let text = "first\n\n  indented\ttabs  \nlast";
        let new_text = apply(text);
        let block = MetadataBlock::detect(&new_text).unwrap().unwrap();
        assert_eq!(block.count("ID"), 1);
        assert_eq!(block.get("ID").unwrap().value, PREFIX);

        let rest: Vec<&str> = new_text.split('\n').skip(block.end).collect();
        let original: Vec<&str> = text.split('\n').collect();
        assert_eq!(rest, original);
    }

    #[test]
    fn test_duplicate_key_is_malformed() {
        let err = plan("---\nID: a\nID: b\n---\n").unwrap_err();
        assert!(matches!(err, ZkError::MalformedMetadata(_)));
    }

    #[test]
    fn test_block_mismatching_text_is_malformed() {
        let text = "no fences here\nat all";
        let stale = MetadataBlock {
            start: 0,
            end: 2,
            entries: vec![],
        };
        let err = plan_sync(text, Some(&stale), "ID", PREFIX).unwrap_err();
        assert!(matches!(err, ZkError::MalformedMetadata(_)));
    }

    #[test]
    fn test_custom_key() {
        let block = MetadataBlock::detect("---\nID: keep\n---\n").unwrap();
        let plan = plan_sync("---\nID: keep\n---\n", block.as_ref(), "zk", PREFIX).unwrap();
        assert_eq!(plan.text.unwrap(), "---\nzk: 200101-120000\nID: keep\n---\n");
    }

    #[tokio::test]
    async fn test_synchronizer_skips_write_when_unchanged() {
        let host = Arc::new(MemoryHost::new());
        let note = NoteRef::new("200101-120000 a.md").unwrap();
        host.insert_text(note.path(), "---\nID: 200101-120000\n---\nbody");

        let sync = FrontMatterSynchronizer::new(host.clone(), "ID");
        let prefix = Prefix::parse(PREFIX).unwrap();
        let outcome = sync.sync(&note, &prefix).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn test_synchronizer_writes_once() {
        let host = Arc::new(MemoryHost::new());
        let note = NoteRef::new("200101-120000 a.md").unwrap();
        host.insert_text(note.path(), "body");

        let sync = FrontMatterSynchronizer::new(host.clone(), "ID");
        let prefix = Prefix::parse(PREFIX).unwrap();
        assert_eq!(
            sync.sync(&note, &prefix).await.unwrap(),
            SyncOutcome::InsertedBlock
        );
        assert_eq!(
            sync.sync(&note, &prefix).await.unwrap(),
            SyncOutcome::Unchanged
        );
        assert_eq!(host.write_count(), 1);
        assert_eq!(
            host.text(note.path()).unwrap(),
            "---\nID: 200101-120000\n---\nbody"
        );
    }

    #[tokio::test]
    async fn test_synchronizer_malformed_does_not_write() {
        let host = Arc::new(MemoryHost::new());
        let note = NoteRef::new("200101-120000 a.md").unwrap();
        host.insert_text(note.path(), "---\nID: a\nID: b\n---\nbody");

        let sync = FrontMatterSynchronizer::new(host.clone(), "ID");
        let prefix = Prefix::parse(PREFIX).unwrap();
        assert!(sync.sync(&note, &prefix).await.is_err());
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_synchronizer_logs_the_write() {
        let host = Arc::new(MemoryHost::new());
        let note = NoteRef::new("200101-120000 a.md").unwrap();
        host.insert_text(note.path(), "---\nID: 191231-000000\n---\n");

        let sync = FrontMatterSynchronizer::new(host.clone(), "ID");
        let prefix = Prefix::parse(PREFIX).unwrap();
        sync.sync(&note, &prefix).await.unwrap();

        assert!(logs_contain("Synced ID = 200101-120000"));
    }
}
