//! Anchored-index trackers.
//!
//! Each tracker holds one index into the document plus whatever transient UI
//! hangs off it. Local typing re-derives that state from the cursor; remote
//! changes carry the anchor through the change with
//! [`Delta::transform_position`] instead of re-reading the document.

mod mouse_over;
mod trigger;

use tessel_delta::{Delta, Insert, Op};

use crate::types::{Bounds, EditorId};

pub use mouse_over::MouseOverTracker;
pub use trigger::{TriggerKind, TriggerTracker};

/// State of a mention or emoji picker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub editor_id: EditorId,
    /// Index of the trigger char.
    pub anchor_index: usize,
    pub active: bool,
    /// Text typed after the trigger.
    pub query: String,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseOverState {
    pub editor_id: EditorId,
    pub node: crate::document::NodeId,
    pub index: usize,
    pub bounds: Option<Bounds>,
}

/// A change that typed or erased exactly one char.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleCharEdit {
    Insert { index: usize, ch: char },
    Delete { index: usize },
}

impl SingleCharEdit {
    /// Recognize `[retain(n), insert(c)]`, `[insert(c)]` and
    /// `[retain(n), delete(1)]`.
    pub fn from_delta(delta: &Delta) -> Option<Self> {
        match delta.ops() {
            [Op::Insert { insert, .. }] => single_char(insert).map(|ch| Self::Insert { index: 0, ch }),
            [Op::Retain { len, .. }, Op::Insert { insert, .. }] => {
                single_char(insert).map(|ch| Self::Insert { index: *len, ch })
            }
            [Op::Retain { len, .. }, Op::Delete(1)] => Some(Self::Delete { index: *len }),
            _ => None,
        }
    }
}

fn single_char(insert: &Insert) -> Option<char> {
    let mut chars = insert.as_text()?.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}
