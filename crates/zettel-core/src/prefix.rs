//! Zettelkasten prefix derivation and validation
//!
//! A prefix is the 13-character `yyMMdd-HHmmss` token that identifies a note,
//! e.g. `200101-120000`. Notes following the convention are named
//! `<prefix> <title>.md`, and the same token is mirrored into the note's
//! frontmatter.

use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{ZkError, ZkResult};

/// Length of a prefix in characters
pub const PREFIX_LEN: usize = 13;

/// chrono format producing a prefix
pub const PREFIX_FORMAT: &str = "%y%m%d-%H%M%S";

static PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}-[0-9]{6}$").expect("prefix regex"));

static LEADING_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}-[0-9]{6} ").expect("leading token regex"));

/// A validated `DDDDDD-DDDDDD` note prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(String);

impl Prefix {
    /// Format an instant as `yyMMdd-HHmmss` in the instant's own timezone
    pub fn from_datetime<Tz>(instant: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(instant.format(PREFIX_FORMAT).to_string())
    }

    /// Prefix for the current local wall-clock time
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Read the prefix embedded at the start of a file name.
    ///
    /// Returns `None` when the name is shorter than 13 characters or its
    /// first 13 characters are not `DDDDDD-DDDDDD`.
    pub fn extract(name: &str) -> Option<Self> {
        let head: String = name.chars().take(PREFIX_LEN).collect();
        if head.chars().count() < PREFIX_LEN {
            return None;
        }
        PREFIX_REGEX.is_match(&head).then_some(Self(head))
    }

    /// Validate an exact prefix string
    pub fn parse(value: &str) -> ZkResult<Self> {
        if PREFIX_REGEX.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ZkError::invalid_convention(value))
        }
    }

    /// The prefix text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True when the name starts with `DDDDDD-DDDDDD ` (trailing space required).
///
/// This decides whether a note still needs renaming; [`Prefix::extract`]
/// is looser and only reads an existing ID.
pub fn has_leading_prefix_token(name: &str) -> bool {
    LEADING_TOKEN_REGEX.is_match(name)
}

/// `"<prefix> <name>"`
pub fn prefixed_file_name(prefix: &Prefix, name: &str) -> String {
    format!("{} {}", prefix, name)
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Prefix {
    type Error = ZkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.0
    }
}
