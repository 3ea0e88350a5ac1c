//! Path locators into a claims payload.
//!
//! A locator is a dotted key path with optional bracket segments:
//! `profile.name`, `roles[0]`, `roles.0`, `meta["dotted.key"]`. A locator
//! that names a literal top-level key is resolved as that key first, so a
//! claim literally called `"a.b"` is still reachable.

use std::mem;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    literal: Option<String>,
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn parse(locator: &str) -> Self {
        let segments = if locator.is_empty() {
            Vec::new()
        } else {
            split_segments(locator)
        };
        Self {
            literal: Some(locator.to_owned()),
            segments,
        }
    }

    /// Build a path from already-split segments; no literal-key lookup applies.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literal: None,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn resolve<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        if let Some(value) = self.literal.as_deref().and_then(|key| root.get(key)) {
            return Some(value);
        }

        let (first, rest) = self.segments.split_first()?;
        rest.iter()
            .try_fold(root.get(first)?, |current, segment| step(current, segment))
    }
}

impl From<&str> for PropertyPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for PropertyPath {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&PropertyPath> for PropertyPath {
    fn from(value: &PropertyPath) -> Self {
        value.clone()
    }
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    }
}

fn split_segments(locator: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    // Set right after a `]` so `a[0].b` does not yield an empty segment.
    let mut closed = false;
    let mut chars = locator.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !closed || !current.is_empty() {
                    segments.push(mem::take(&mut current));
                }
                closed = false;
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(mem::take(&mut current));
                }
                let quote = match chars.peek() {
                    Some('"') | Some('\'') => chars.next(),
                    _ => None,
                };
                let mut inner = String::new();
                while let Some(next) = chars.next() {
                    match (quote, next) {
                        (Some(q), c) if c == q && chars.peek() == Some(&']') => {
                            chars.next();
                            break;
                        }
                        (Some(_), '\\') => {
                            if let Some(escaped) = chars.next() {
                                inner.push(escaped);
                            }
                        }
                        (None, ']') => break,
                        (_, c) => inner.push(c),
                    }
                }
                segments.push(inner);
                closed = true;
            }
            other => current.push(other),
        }
    }

    if !closed || !current.is_empty() {
        segments.push(current);
    }
    segments
}
