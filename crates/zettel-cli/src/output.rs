//! Rendering of command results
//!
//! Tables go to stdout via comfy-table; `--format json` prints the serde
//! representation of the same values instead.

use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use zettel_core::{AssetStatus, CommandOutcome, ReconcileReport, SyncOutcome, ZkCommand};

/// Pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a command outcome in the requested format
pub fn print_outcome(outcome: &CommandOutcome, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(outcome);
    }

    match outcome {
        CommandOutcome::Renamed {
            from,
            to,
            prefix,
            sync,
        } => {
            println!("{} {} -> {}", "renamed".green().bold(), from, to);
            println!("{}", describe_sync(sync, prefix.as_str()));
        }
        CommandOutcome::Synced { note, prefix, sync } => {
            println!("{} {}", note, describe_sync(sync, prefix.as_str()));
        }
        CommandOutcome::Assets(report) => print_report(report),
    }
    Ok(())
}

fn describe_sync(sync: &SyncOutcome, prefix: &str) -> String {
    match sync {
        SyncOutcome::InsertedBlock => format!("{} frontmatter with ID {}", "added".green(), prefix),
        SyncOutcome::InsertedKey => format!("{} ID {}", "added".green(), prefix),
        SyncOutcome::Updated { previous } => {
            format!("{} ID {} -> {}", "updated".yellow(), previous, prefix)
        }
        SyncOutcome::Unchanged => format!("{} ID {}", "unchanged".dimmed(), prefix),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// One row per unique embed
pub fn report_table(report: &ReconcileReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Link", "Status", "Detail"]);

    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.status {
            AssetStatus::Moved { to, .. } => ("moved", display(to)),
            AssetStatus::AlreadyCanonical { path } => ("canonical", display(path)),
            AssetStatus::Duplicate {
                canonical,
                relinked,
                ..
            } => {
                let status = if *relinked { "relinked" } else { "duplicate" };
                (status, display(canonical))
            }
            AssetStatus::NotAnAsset { path } => ("note", display(path)),
            AssetStatus::Unresolved => ("unresolved", String::new()),
            AssetStatus::Failed { error } => ("failed", error.clone()),
        };
        table.add_row(vec![outcome.link.clone(), status.to_string(), detail]);
    }
    table
}

fn print_report(report: &ReconcileReport) {
    if report.outcomes.is_empty() {
        println!("{} embeds no assets", report.note);
        return;
    }

    println!("{}", report_table(report));

    let summary = format!(
        "{} moved, {} duplicate, {} unresolved, {} failed",
        report.moved(),
        report.duplicates(),
        report.unresolved(),
        report.failed()
    );
    if report.is_clean() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
    if report.unresolved_duplicates() > 0 {
        println!(
            "{}",
            "hint: --duplicates rewrite-link points duplicate embeds at the canonical copy"
                .dimmed()
        );
    }
}

/// Command ids and names
pub fn print_commands(format: OutputFormat) -> Result<()> {
    #[derive(Serialize)]
    struct Entry {
        id: &'static str,
        name: &'static str,
    }

    let entries: Vec<Entry> = ZkCommand::ALL
        .iter()
        .map(|c| Entry {
            id: c.id(),
            name: c.name(),
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Id", "Name"]);
    for entry in entries {
        table.add_row(vec![entry.id, entry.name]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zettel_core::{AssetOutcome, NoteRef, Prefix};

    #[test]
    fn test_report_table_has_a_row_per_link() {
        let report = ReconcileReport {
            note: NoteRef::new("200101-120000 n.md").unwrap(),
            prefix: Prefix::parse("200101-120000").unwrap(),
            outcomes: vec![
                AssetOutcome {
                    link: "a.png".into(),
                    status: AssetStatus::Unresolved,
                },
                AssetOutcome {
                    link: "b.png".into(),
                    status: AssetStatus::Failed {
                        error: "denied".into(),
                    },
                },
            ],
        };

        let rendered = report_table(&report).to_string();
        assert!(rendered.contains("a.png"));
        assert!(rendered.contains("unresolved"));
        assert!(rendered.contains("denied"));
    }
}
