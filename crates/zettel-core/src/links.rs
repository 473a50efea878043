//! Link and embed extraction
//!
//! Supports the two link forms found in Obsidian-style vaults:
//! - Wikilinks: `[[target]]`, `[[target#heading|alias]]`, embeds `![[image.png|300]]`
//! - Markdown links: `[text](path)`, embeds `![alt](path%20with%20spaces.png "title")`
//!
//! Links inside fenced code blocks and inline code spans are ignored. Every
//! link keeps the byte range of its full source text so callers can splice
//! replacements into the original document.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\]\n]+)\]\]").expect("wikilink regex"));

// destination is either `<...>` plus an optional title, or text with
// one level of balanced parentheses
static MARKDOWN_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\]\n]*)\]\((<[^>\n]*>[^)\n]*|(?:[^()\n]|\([^()\n]*\))*)\)")
        .expect("markdown link regex")
});

static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[\s\S]*?^```|`[^`\n]+`").expect("code regex"));

/// Source syntax of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSyntax {
    /// `[[target]]`
    Wikilink,
    /// `[text](target)`
    Markdown,
}

/// A link found in note text.
///
/// Embedded asset references are links with `is_embed` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedReference {
    /// Link path as written, percent-decoded for markdown links
    pub link: String,
    /// `#heading` or `#^block` suffix, including the `#`
    pub subpath: Option<String>,
    /// Wikilink alias or markdown link text
    pub alias: Option<String>,
    /// Markdown link title, e.g. `"caption"`
    pub title: Option<String>,
    /// Link syntax
    pub syntax: LinkSyntax,
    /// `!` prefix present
    pub is_embed: bool,
    /// Byte range of the whole link in the note text
    pub range: Range<usize>,
}

impl EmbeddedReference {
    fn parse_wikilink(inner: &str, range: Range<usize>, is_embed: bool) -> Self {
        let (target, alias) = match inner.split_once('|') {
            Some((target, alias)) => (target, Some(alias.to_string())),
            None => (inner, None),
        };
        let (link, subpath) = split_subpath(target.trim());

        Self {
            link,
            subpath,
            alias,
            title: None,
            syntax: LinkSyntax::Wikilink,
            is_embed,
            range,
        }
    }

    fn parse_markdown(
        text: &str,
        destination: &str,
        range: Range<usize>,
        is_embed: bool,
    ) -> Option<Self> {
        let destination = destination.trim();
        let (target, title) = if let Some(rest) = destination.strip_prefix('<') {
            let end = rest.find('>')?;
            let title = rest[end + 1..].trim();
            (&rest[..end], (!title.is_empty()).then(|| title.to_string()))
        } else {
            match destination.split_once(char::is_whitespace) {
                Some((target, title)) => (target, Some(title.trim().to_string())),
                None => (destination, None),
            }
        };

        if target.is_empty() || is_external(target) {
            return None;
        }

        let decoded = urlencoding::decode(target)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| target.to_string());
        let (link, subpath) = split_subpath(&decoded);

        Some(Self {
            link,
            subpath,
            alias: Some(text.to_string()),
            title,
            syntax: LinkSyntax::Markdown,
            is_embed,
            range,
        })
    }

    /// Source text of this link pointing at `target` instead, keeping
    /// subpath, alias and title
    pub fn render_with_target(&self, target: &str) -> String {
        let bang = if self.is_embed { "!" } else { "" };
        let subpath = self.subpath.as_deref().unwrap_or_default();

        match self.syntax {
            LinkSyntax::Wikilink => match &self.alias {
                Some(alias) => format!("{}[[{}{}|{}]]", bang, target, subpath, alias),
                None => format!("{}[[{}{}]]", bang, target, subpath),
            },
            LinkSyntax::Markdown => {
                let encoded = encode_markdown_target(target);
                let text = self.alias.as_deref().unwrap_or_default();
                match &self.title {
                    Some(title) => format!("{}[{}]({}{} {})", bang, text, encoded, subpath, title),
                    None => format!("{}[{}]({}{})", bang, text, encoded, subpath),
                }
            }
        }
    }
}

/// All links in `content`, in document order
pub fn extract_links(content: &str) -> Vec<EmbeddedReference> {
    let code_spans: Vec<Range<usize>> = CODE_REGEX.find_iter(content).map(|m| m.range()).collect();
    let in_code = |offset: usize| code_spans.iter().any(|span| span.contains(&offset));

    let mut links = Vec::new();

    for cap in WIKILINK_REGEX.captures_iter(content) {
        let Some(full) = cap.get(0) else { continue };
        if in_code(full.start()) {
            continue;
        }
        let is_embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let inner = cap.get(2).map_or("", |m| m.as_str());
        let link = EmbeddedReference::parse_wikilink(inner, full.range(), is_embed);
        if !link.link.is_empty() {
            links.push(link);
        }
    }

    for cap in MARKDOWN_LINK_REGEX.captures_iter(content) {
        let Some(full) = cap.get(0) else { continue };
        if in_code(full.start()) {
            continue;
        }
        let is_embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let text = cap.get(2).map_or("", |m| m.as_str());
        let destination = cap.get(3).map_or("", |m| m.as_str());
        if let Some(link) =
            EmbeddedReference::parse_markdown(text, destination, full.range(), is_embed)
        {
            links.push(link);
        }
    }

    links.sort_by_key(|l| l.range.start);
    links
}

/// Embeds only, in document order
pub fn extract_embeds(content: &str) -> Vec<EmbeddedReference> {
    extract_links(content)
        .into_iter()
        .filter(|l| l.is_embed)
        .collect()
}

/// Keep the first reference for each distinct link text
pub fn unique_by_link(references: Vec<EmbeddedReference>) -> Vec<EmbeddedReference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert(r.link.clone()))
        .collect()
}

/// Replace byte ranges of `content`.
///
/// Ranges must not overlap; they are applied from the end so earlier
/// offsets stay valid.
pub fn splice(content: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut out = content.to_string();
    for (range, text) in replacements {
        out.replace_range(range, &text);
    }
    out
}

fn split_subpath(target: &str) -> (String, Option<String>) {
    match target.find('#') {
        Some(idx) => (
            target[..idx].trim().to_string(),
            Some(target[idx..].to_string()),
        ),
        None => (target.to_string(), None),
    }
}

fn is_external(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    ["http://", "https://", "mailto:", "data:", "file:", "obsidian:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn encode_markdown_target(target: &str) -> String {
    target
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('(', "%28")
        .replace(')', "%29")
}
