//! Typed view of the fenced metadata block at the top of a note

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{ZkError, ZkResult};

/// Fence line delimiting the block
pub const FENCE: &str = "---";

/// One top-level `key: value` line of the block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Key, trimmed
    pub key: String,
    /// Raw value text after the colon, trimmed
    pub value: String,
    /// Zero-based line index in the note
    pub line: usize,
}

impl MetadataEntry {
    /// Value with one pair of matching surrounding quotes removed
    pub fn unquoted_value(&self) -> &str {
        let v = self.value.as_str();
        for quote in ['"', '\''] {
            if v.len() >= 2 && v.starts_with(quote) && v.ends_with(quote) {
                return &v[1..v.len() - 1];
            }
        }
        v
    }
}

/// Metadata block occupying lines `[start, end)`.
///
/// Lines `start` and `end - 1` are fences; entries keep document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    /// First line (opening fence)
    pub start: usize,
    /// One past the closing fence
    pub end: usize,
    /// Top-level entries in order
    pub entries: Vec<MetadataEntry>,
}

impl MetadataBlock {
    /// Find the block at the top of `text`.
    ///
    /// `Ok(None)` when the first line is not a fence, or when it is a lone
    /// `---` (a thematic break) that no later fence closes.
    pub fn detect(text: &str) -> ZkResult<Option<Self>> {
        let lines: Vec<&str> = text.split('\n').collect();
        if !lines.first().is_some_and(|l| is_fence(l)) {
            return Ok(None);
        }

        let Some(close) = lines
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, l)| is_fence(l))
            .map(|(i, _)| i)
        else {
            return Ok(None);
        };

        let entries = lines[1..close]
            .iter()
            .enumerate()
            .filter_map(|(offset, line)| parse_entry(line, offset + 1))
            .collect();

        Ok(Some(Self {
            start: 0,
            end: close + 1,
            entries,
        }))
    }

    /// Line range covered by the block, fences included
    pub fn line_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// First entry with `key`
    pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Number of entries with `key`
    pub fn count(&self, key: &str) -> usize {
        self.entries.iter().filter(|e| e.key == key).count()
    }

    /// Check that the block is consistent with `lines`
    pub fn validate_against(&self, lines: &[&str]) -> ZkResult<()> {
        if self.end < self.start + 2 || self.end > lines.len() {
            return Err(ZkError::malformed(format!(
                "block lines {}..{} do not fit a {}-line note",
                self.start,
                self.end,
                lines.len()
            )));
        }
        if !is_fence(lines[self.start]) || !is_fence(lines[self.end - 1]) {
            return Err(ZkError::malformed(format!(
                "lines {} and {} are not '---' fences",
                self.start,
                self.end - 1
            )));
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.line <= self.start || e.line >= self.end - 1)
        {
            return Err(ZkError::malformed(format!(
                "entry '{}' at line {} lies outside the block",
                entry.key, entry.line
            )));
        }
        Ok(())
    }
}

/// `---`, ignoring trailing whitespace and `\r`
pub fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

fn parse_entry(line: &str, index: usize) -> Option<MetadataEntry> {
    let line = line.trim_end_matches('\r');
    if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(MetadataEntry {
        key: key.to_string(),
        value: value.trim().to_string(),
        line: index,
    })
}
