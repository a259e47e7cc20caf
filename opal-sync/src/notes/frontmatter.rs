//! Parse and generate the frontmatter block that carries sync metadata.
//!
//! Hand-rolled YAML subset (no serde_yaml): flat `field: value` scalars. Indented
//! or `- ` continuation lines are kept verbatim under the preceding field, so
//! fields this crate does not own survive a rewrite.

use super::model::NoteMetadata;
use chrono::{DateTime, Utc};
use opal_types::iso8601;
use std::fmt;

pub const ID_FIELD: &str = "id";
pub const LAST_MODIFIED_FIELD: &str = "lastModified";

const DELIMITER: &str = "---";

/// A frontmatter value
#[derive(Debug, Clone, PartialEq)]
pub enum FrontmatterValue {
    Text(String),
    Date(DateTime<Utc>),
    Bool(bool),
    Integer(i64),
    /// Nested YAML (lists, maps) kept as its raw lines
    Block(Vec<String>),
}

impl fmt::Display for FrontmatterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontmatterValue::Text(s) => f.write_str(s),
            FrontmatterValue::Date(dt) => f.write_str(&iso8601::format(dt)),
            FrontmatterValue::Bool(b) => write!(f, "{}", b),
            FrontmatterValue::Integer(n) => write!(f, "{}", n),
            FrontmatterValue::Block(lines) => f.write_str(&lines.join("\n")),
        }
    }
}

impl From<&str> for FrontmatterValue {
    fn from(s: &str) -> Self {
        FrontmatterValue::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for FrontmatterValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FrontmatterValue::Date(dt)
    }
}

impl FrontmatterValue {
    /// Parse a scalar the way it was written after `field:`
    fn parse_scalar(raw: &str) -> Self {
        let raw = raw.trim();
        if is_quoted(raw) {
            return FrontmatterValue::Text(unquote(raw));
        }
        match raw {
            "true" => return FrontmatterValue::Bool(true),
            "false" => return FrontmatterValue::Bool(false),
            _ => {}
        }
        // Only when it prints back identically, so `007` stays text
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return FrontmatterValue::Integer(n);
            }
        }
        FrontmatterValue::Text(raw.to_string())
    }
}

/// Parsed frontmatter block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    entries: Vec<(String, FrontmatterValue)>,
    /// Index of the closing `---` line in the file
    end_line: usize,
}

impl Frontmatter {
    /// The `id`/`lastModified` block written for a synced note
    pub fn from_metadata(metadata: &NoteMetadata) -> Self {
        Self {
            entries: vec![
                (ID_FIELD.to_string(), FrontmatterValue::from(metadata.id.as_str())),
                (
                    LAST_MODIFIED_FIELD.to_string(),
                    FrontmatterValue::Date(metadata.last_modified),
                ),
            ],
            end_line: 0,
        }
    }

    pub fn entries(&self) -> &[(String, FrontmatterValue)] {
        &self.entries
    }

    pub fn end_line(&self) -> usize {
        self.end_line
    }

    pub fn get(&self, field: &str) -> Option<&FrontmatterValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value)
    }

    /// Replace `field` in place, or append it when absent
    pub fn set(&mut self, field: &str, value: impl Into<FrontmatterValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| key == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field.to_string(), value)),
        }
    }

    /// Remote id, if the note has been synced
    pub fn id(&self) -> Option<String> {
        self.get(ID_FIELD)
            .map(|v| v.to_string())
            .filter(|id| !id.is_empty())
    }

    /// Cached remote timestamp, as written in the file
    pub fn last_modified(&self) -> Option<String> {
        self.get(LAST_MODIFIED_FIELD)
            .map(|v| v.to_string())
            .filter(|stamp| !stamp.is_empty())
    }

    pub fn encode(&self) -> String {
        encode(&self.entries)
    }
}

/// Parse the frontmatter block at the top of `content`.
/// Returns `None` when the first line is not `---` or the block is never closed.
pub fn parse_frontmatter(content: &str) -> Option<Frontmatter> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.first().map(|l| l.trim_end()) != Some(DELIMITER) {
        return None;
    }
    let end_line = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim_end() == DELIMITER)
        .map(|(idx, _)| idx)?;

    let mut entries: Vec<(String, FrontmatterValue)> = Vec::new();
    for line in &lines[1..end_line] {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let is_continuation = line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ");
        if is_continuation {
            if let Some((_, value)) = entries.last_mut() {
                match value {
                    FrontmatterValue::Block(block) => block.push(line.to_string()),
                    FrontmatterValue::Text(s) if s.is_empty() => {
                        *value = FrontmatterValue::Block(vec![line.to_string()]);
                    }
                    _ => {}
                }
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.push((key.to_string(), FrontmatterValue::parse_scalar(value)));
        }
    }

    Some(Frontmatter { entries, end_line })
}

/// Render a frontmatter block: `---\n` + `field: value` lines + `\n---\n`
pub fn encode(entries: &[(String, FrontmatterValue)]) -> String {
    let body = entries
        .iter()
        .map(|(key, value)| match value {
            FrontmatterValue::Block(_) => format!("{}:\n{}", key, value),
            _ => format!("{}: {}", key, value),
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{DELIMITER}\n{body}\n{DELIMITER}\n")
}

/// Body of a note file: every line after the frontmatter block, or the whole content without one
pub fn strip_frontmatter(content: &str, frontmatter: Option<&Frontmatter>) -> String {
    match frontmatter {
        Some(fm) => content
            .split('\n')
            .skip(fm.end_line + 1)
            .collect::<Vec<_>>()
            .join("\n"),
        None => content.to_string(),
    }
}

/// Re-encode `frontmatter` (parsed from `content`, possibly edited since) and keep the body
pub fn rewrite_frontmatter(content: &str, frontmatter: &Frontmatter) -> String {
    let mut out = frontmatter.encode();
    out.push_str(&strip_frontmatter(content, Some(frontmatter)));
    out
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

/// Remove surrounding quotes from a string
fn unquote(s: &str) -> String {
    let s = s.trim();
    if is_quoted(s) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
