//! Dotted/bracketed path parsing and evaluation.
//!
//! A path is a sequence of segments applied left to right:
//!
//! - `.identifier` (the leading dot is optional on the first segment)
//! - `[integer]`
//! - `[RANDOM]`
//!
//! For example `stories[0].tags[RANDOM]`.

use std::fmt;

use rand::Rng;

use crate::error::{RenderError, Result};
use crate::value::Value;

const RANDOM_INDEX: &str = "RANDOM";

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object field access.
    Key(String),
    /// List element access by position.
    Index(usize),
    /// Uniformly random list element.
    Random,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, ".{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Random => write!(f, "[{RANDOM_INDEX}]"),
        }
    }
}

/// A parsed path, keeping its source text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    text: String,
    segments: Vec<Segment>,
}

impl Path {
    /// Parses a path string.
    ///
    /// The empty string is a valid path addressing the root itself.
    ///
    /// ## Errors
    ///
    /// Returns `RenderError::InvalidPath` for empty identifiers, unclosed
    /// brackets, and bracket contents that are neither an unsigned integer
    /// nor `RANDOM`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_lib::{Path, Segment};
    ///
    /// let path = Path::parse("stories[0].tags[RANDOM]").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         Segment::Key("stories".into()),
    ///         Segment::Index(0),
    ///         Segment::Key("tags".into()),
    ///         Segment::Random,
    ///     ]
    /// );
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = |message: &str| RenderError::InvalidPath {
            path: text.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = text;
        let mut first = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let inner = after[..close].trim();
                let segment = if inner == RANDOM_INDEX {
                    Segment::Random
                } else {
                    inner
                        .parse::<usize>()
                        .map(Segment::Index)
                        .map_err(|_| invalid("index must be an unsigned integer or RANDOM"))?
                };
                segments.push(segment);
                rest = &after[close + 1..];
            } else {
                let body = match rest.strip_prefix('.') {
                    Some(after) => after,
                    None if first => rest,
                    None => return Err(invalid("expected '.' or '[' between segments")),
                };
                let end = body
                    .find(|c: char| c == '.' || c == '[' || c == ']' || c.is_whitespace())
                    .unwrap_or(body.len());
                let key = &body[..end];
                if key.is_empty() {
                    return Err(invalid("empty field name"));
                }
                segments.push(Segment::Key(key.to_string()));
                rest = &body[end..];
            }
            first = false;
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    /// The path's segments in evaluation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluates the path against `root`.
    ///
    /// `[RANDOM]` segments draw from `rng` at evaluation time.
    ///
    /// ## Errors
    ///
    /// - `PathNotFound` for a missing key or out-of-range index
    /// - `TypeMismatch` when a segment addresses the wrong shape
    /// - `EmptyArray` when `[RANDOM]` addresses an empty list
    pub fn evaluate<R: Rng + ?Sized>(&self, root: &Value, rng: &mut R) -> Result<Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => {
                    map.get(key).ok_or_else(|| self.not_found(segment))?
                }
                (Segment::Key(_), other) => {
                    return Err(RenderError::type_mismatch(
                        self.context(segment),
                        "object",
                        other.kind(),
                    ));
                }
                (Segment::Index(index), Value::List(items)) => {
                    items.get(*index).ok_or_else(|| self.not_found(segment))?
                }
                (Segment::Random, Value::List(items)) => {
                    if items.is_empty() {
                        return Err(RenderError::EmptyArray {
                            context: self.context(segment),
                        });
                    }
                    &items[rng.gen_range(0..items.len())]
                }
                (Segment::Index(_) | Segment::Random, other) => {
                    return Err(RenderError::type_mismatch(
                        self.context(segment),
                        "list",
                        other.kind(),
                    ));
                }
            };
        }
        Ok(current.clone())
    }

    fn context(&self, segment: &Segment) -> String {
        format!("path '{}' at '{}'", self.text, segment)
    }

    fn not_found(&self, segment: &Segment) -> RenderError {
        RenderError::PathNotFound {
            segment: segment.to_string(),
            context: format!("path '{}'", self.text),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
