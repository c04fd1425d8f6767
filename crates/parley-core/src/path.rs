//! Segmented paths into extracted metadata.
//!
//! Rules address metadata positionally: the first segment picks a fragment
//! out of the metadata list, later segments walk into the fragment. Both
//! dotted and bracketed spellings are understood:
//!
//! ```text
//! 0.a.0        fragment 0, key "a", element 0
//! [0].a[0]     same path
//! 1["x.y"]     fragment 1, key "x.y"
//! ```
//!
//! Parsing and resolution are total: a malformed path still parses into some
//! segments, and any segment that does not fit the data resolves to `None`.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

/// A parsed metadata path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPath {
    raw: String,
    segments: Vec<String>,
}

impl MetaPath {
    /// Parses a path expression. Never fails.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = raw.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !after_bracket {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    segments.push(read_bracket(&mut chars));
                    after_bracket = true;
                }
                other => {
                    after_bracket = false;
                    current.push(other);
                }
            }
        }

        if !after_bracket {
            segments.push(current);
        }

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// Returns the path as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves this path against a metadata list.
    ///
    /// The first segment must be an index into `list`. Returns `None` when any
    /// step is missing.
    pub fn resolve<'v>(&self, list: &'v [Value]) -> Option<&'v Value> {
        let (first, rest) = self.segments.split_first()?;
        let start = list.get(parse_index(first)?)?;
        rest.iter().try_fold(start, |value, segment| step(value, segment))
    }

    /// Resolves this path starting from a single JSON value.
    pub fn resolve_value<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| step(value, segment))
    }
}

/// Reads a bracketed segment up to and including its closing `]`.
fn read_bracket(chars: &mut Peekable<Chars<'_>>) -> String {
    let quote = chars.next_if(|c| *c == '"' || *c == '\'');
    let mut inner = String::new();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                chars.next_if_eq(&']');
                break;
            }
            None if c == ']' => break,
            _ => inner.push(c),
        }
    }
    inner
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Array(items) => items.get(parse_index(segment)?),
        Value::Object(map) => map.get(segment),
        _ => None,
    }
}

impl fmt::Display for MetaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for MetaPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for MetaPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}
