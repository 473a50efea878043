//! Per-reference outcomes of an asset reconciliation

use serde::Serialize;
use std::path::PathBuf;

use crate::note::NoteRef;
use crate::prefix::Prefix;

/// What happened to one embedded reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
    /// Source moved to its canonical path, backlinks rewritten
    Moved {
        /// Previous location
        from: PathBuf,
        /// Canonical location
        to: PathBuf,
    },
    /// Source already sits at its canonical path
    AlreadyCanonical {
        /// Canonical location
        path: PathBuf,
    },
    /// The canonical path is taken by identical content; source left in place
    Duplicate {
        /// Non-canonical copy the note still references (unless relinked)
        source: PathBuf,
        /// Existing canonical copy
        canonical: PathBuf,
        /// The note's embeds were pointed at the canonical copy
        relinked: bool,
    },
    /// The link resolves to a note rather than an attachment
    NotAnAsset {
        /// Resolved note
        path: PathBuf,
    },
    /// The link does not resolve to any file
    Unresolved,
    /// I/O or task failure confined to this reference
    Failed {
        /// Error message
        error: String,
    },
}

/// Outcome for one unique link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetOutcome {
    /// Link text as written in the note
    pub link: String,
    /// Result
    #[serde(flatten)]
    pub status: AssetStatus,
}

impl AssetOutcome {
    pub(crate) fn new(link: impl Into<String>, status: AssetStatus) -> Self {
        Self {
            link: link.into(),
            status,
        }
    }
}

/// Collected outcomes of one reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Note whose embeds were processed
    pub note: NoteRef,
    /// Destination folder name
    pub prefix: Prefix,
    /// One entry per unique link, in document order
    pub outcomes: Vec<AssetOutcome>,
}

impl ReconcileReport {
    fn count(&self, pred: impl Fn(&AssetStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// References moved into place
    pub fn moved(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Moved { .. }))
    }

    /// References whose canonical copy already existed
    pub fn duplicates(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Duplicate { .. }))
    }

    /// Duplicates still referenced by a non-canonical link
    pub fn unresolved_duplicates(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Duplicate { relinked: false, .. }))
    }

    /// References that did not resolve
    pub fn unresolved(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Unresolved))
    }

    /// References that failed
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, AssetStatus::Failed { .. }))
    }

    /// No failures, no unresolved links, no dangling duplicates
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.unresolved() == 0 && self.unresolved_duplicates() == 0
    }

    /// Outcome for a link
    pub fn outcome(&self, link: &str) -> Option<&AssetStatus> {
        self.outcomes
            .iter()
            .find(|o| o.link == link)
            .map(|o| &o.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let report = ReconcileReport {
            note: NoteRef::new("200101-120000 n.md").unwrap(),
            prefix: Prefix::parse("200101-120000").unwrap(),
            outcomes: vec![
                AssetOutcome::new(
                    "a.png",
                    AssetStatus::Moved {
                        from: "a.png".into(),
                        to: "assets/200101-120000/x.png".into(),
                    },
                ),
                AssetOutcome::new(
                    "b.png",
                    AssetStatus::Duplicate {
                        source: "b.png".into(),
                        canonical: "assets/200101-120000/x.png".into(),
                        relinked: false,
                    },
                ),
                AssetOutcome::new("c.png", AssetStatus::Unresolved),
            ],
        };

        assert_eq!(report.moved(), 1);
        assert_eq!(report.duplicates(), 1);
        assert_eq!(report.unresolved_duplicates(), 1);
        assert_eq!(report.unresolved(), 1);
        assert_eq!(report.failed(), 0);
        assert!(!report.is_clean());
        assert_eq!(report.outcome("c.png"), Some(&AssetStatus::Unresolved));
    }

    #[test]
    fn test_serializes_flat() {
        let outcome = AssetOutcome::new("c.png", AssetStatus::Unresolved);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["link"], "c.png");
        assert_eq!(json["status"], "unresolved");
    }
}
