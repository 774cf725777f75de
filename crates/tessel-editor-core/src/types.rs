//! Core editor types: editor identity, change sources, ranges and geometry.
//!
//! These types are framework-agnostic; every subsystem in the crate speaks in
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of one editor instance.
///
/// Several editors can live on the same page (main editor, comment editors)
/// and share one store. Everything they publish is tagged with this id so an
/// instance only ever clears or updates its own state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditorId(SmolStr);

impl EditorId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EditorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Who caused a change.
///
/// `User` is the local person typing or clicking. `Api` covers programmatic
/// and remote collaborator changes. `Silent` changes are internal bookkeeping
/// (attribute retagging, id stamping) that handlers are expected to skip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    User,
    Api,
    Silent,
}

impl Source {
    pub fn is_user(self) -> bool {
        self == Source::User
    }

    pub fn is_silent(self) -> bool {
        self == Source::Silent
    }
}

/// A range in the document as the engine reports it: start index plus length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub index: usize,
    pub length: usize,
}

impl Range {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// A collapsed range (cursor position).
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    /// Build from two positions in any order.
    pub fn spanning(a: usize, b: usize) -> Self {
        let start = a.min(b);
        Self {
            index: start,
            length: a.max(b) - start,
        }
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }

    /// Check if an index is within the range. End is exclusive.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.index && index < self.end()
    }

    /// Clamp the range so it fits in a document of `len`.
    pub fn clamp_to(self, len: usize) -> Self {
        let last = len.saturating_sub(1);
        let index = self.index.min(last);
        let end = self.end().min(last).max(index);
        Self {
            index,
            length: end - index,
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::spanning(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.index..r.end()
    }
}

/// Bounding box relative to the editor's scroll container, in px.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// A pointer position in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
