//! Mention and emoji pickers opened by a trigger char.
//!
//! Activation looks backwards from the cursor after a single-char insert;
//! once open, the anchor follows remote edits through position transforms.

use regex::Regex;
use tessel_delta::Delta;

use super::{SingleCharEdit, TrackerState};
use crate::config::TriggerConfig;
use crate::document::BlockType;
use crate::editor::Editor;
use crate::error::ConfigError;
use crate::store::{Action, Store};
use crate::types::{EditorId, Range, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Mention,
    Emoji,
}

/// Opens a picker when a trigger char followed by a short word is typed, and
/// keeps its anchor on the trigger char while the document changes.
#[derive(Debug)]
pub struct TriggerTracker {
    kind: TriggerKind,
    config: TriggerConfig,
    /// Trigger at the start of the line or after whitespace, then the query,
    /// ending at the cursor.
    activation: Regex,
    /// What may follow the trigger while the picker is open.
    query: Regex,
    state: TrackerState,
}

impl TriggerTracker {
    pub fn new(editor_id: EditorId, kind: TriggerKind, config: &TriggerConfig) -> Result<Self, ConfigError> {
        let trigger = regex::escape(&config.trigger.to_string());
        let activation = Regex::new(&format!(
            r"(?:^|\s){trigger}([\w-]{{{},{}}})$",
            config.min_query, config.max_query
        ))?;
        let query = Regex::new(&format!(r"^[\w-]{{0,{}}}$", config.max_query))?;
        Ok(Self {
            kind,
            config: config.clone(),
            activation,
            query,
            state: TrackerState {
                editor_id,
                anchor_index: 0,
                active: false,
                query: String::new(),
                bounds: None,
            },
        })
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Code blocks and excluded block types never open a picker.
    fn is_inert(&self, editor: &Editor) -> bool {
        let Some(range) = editor.get_selection() else {
            return false;
        };
        editor.get_line(range.index).is_some_and(|(line, _)| {
            line.block_type() == BlockType::CodeBlock
                || self
                    .config
                    .excluded_block_types
                    .iter()
                    .any(|excluded| excluded == line.blot_name())
        })
    }

    pub fn on_text_change(&mut self, editor: &Editor, store: &Store, delta: &Delta, source: Source) {
        if source.is_silent() || self.is_inert(editor) {
            return;
        }
        let Some(cursor) = editor.get_selection().filter(Range::is_collapsed).map(|r| r.index) else {
            if self.state.active {
                self.deactivate(store);
            }
            return;
        };

        if !source.is_user() {
            if self.state.active {
                self.follow_remote(editor, store, delta, cursor);
            }
            return;
        }

        match SingleCharEdit::from_delta(delta) {
            Some(SingleCharEdit::Insert { index, .. }) if !self.state.active => {
                if index + 1 == cursor {
                    self.try_activate(editor, store, cursor);
                }
            }
            _ if self.state.active => self.refresh(editor, store, cursor),
            _ => {}
        }
    }

    /// Close when the user moves the cursor out of the query.
    pub fn on_selection_change(&mut self, store: &Store, range: Option<Range>, source: Source) {
        if !self.state.active || !source.is_user() {
            return;
        }
        let anchor = self.state.anchor_index;
        let query_end = anchor + 1 + self.state.query.chars().count();
        let inside = range.is_some_and(|r| r.is_collapsed() && r.index > anchor && r.index <= query_end);
        if !inside {
            self.deactivate(store);
        }
    }

    fn try_activate(&mut self, editor: &Editor, store: &Store, cursor: usize) {
        let Some((line, offset)) = editor.get_line(cursor) else {
            return;
        };
        let before: Vec<char> = line.aligned_text().chars().take(offset).collect();
        // Keep one char ahead of the window so `^` only matches at the real
        // line start, never at a window cut inside a word.
        let start = before.len().saturating_sub(self.config.window + 1);
        let window: String = before[start..].iter().collect();
        let Some(captures) = self.activation.captures(&window) else {
            return;
        };
        let query = captures.get(1).map_or("", |m| m.as_str()).to_string();
        let anchor = cursor - query.chars().count() - 1;
        tracing::debug!(target: "tessel::tracker", kind = ?self.kind, anchor, %query, "trigger activated");
        self.state.active = true;
        self.state.anchor_index = anchor;
        self.state.query = query;
        self.state.bounds = editor.get_bounds(anchor, 1);
        self.publish(store, Some(self.state.clone()));
    }

    /// Re-read the query between the anchor and the cursor.
    fn refresh(&mut self, editor: &Editor, store: &Store, cursor: usize) {
        let anchor = self.state.anchor_index;
        if cursor <= anchor {
            self.deactivate(store);
            return;
        }
        match self.typed_since_anchor(editor, anchor, cursor) {
            Some(query) if self.query.is_match(&query) => {
                self.state.query = query;
                self.state.bounds = editor.get_bounds(anchor, 1);
                self.publish(store, Some(self.state.clone()));
            }
            _ => self.deactivate(store),
        }
    }

    fn follow_remote(&mut self, editor: &Editor, store: &Store, delta: &Delta, cursor: usize) {
        let anchor = delta.transform_position(self.state.anchor_index, false);
        if cursor <= anchor || self.char_at(editor, anchor) != Some(self.config.trigger) {
            tracing::debug!(target: "tessel::tracker", kind = ?self.kind, anchor, "trigger lost to remote change");
            self.deactivate(store);
            return;
        }
        if anchor != self.state.anchor_index {
            tracing::trace!(target: "tessel::tracker", kind = ?self.kind, from = self.state.anchor_index, to = anchor, "anchor shifted");
            self.state.anchor_index = anchor;
            self.state.bounds = editor.get_bounds(anchor, 1);
            self.publish(store, Some(self.state.clone()));
        }
    }

    /// Chars after the trigger up to the cursor, or `None` when the trigger
    /// is gone or the span leaves the line.
    fn typed_since_anchor(&self, editor: &Editor, anchor: usize, cursor: usize) -> Option<String> {
        let (line, offset) = editor.get_line(anchor)?;
        let text: Vec<char> = line.aligned_text().chars().collect();
        let end = offset + (cursor - anchor);
        if text.get(offset) != Some(&self.config.trigger) || end > text.len() {
            return None;
        }
        Some(text[offset + 1..end].iter().collect())
    }

    fn char_at(&self, editor: &Editor, index: usize) -> Option<char> {
        let (line, offset) = editor.get_line(index)?;
        line.aligned_text().chars().nth(offset)
    }

    pub fn deactivate(&mut self, store: &Store) {
        if !self.state.active {
            return;
        }
        tracing::debug!(target: "tessel::tracker", kind = ?self.kind, "trigger deactivated");
        self.state.active = false;
        self.state.query.clear();
        self.state.bounds = None;
        self.publish(store, None);
    }

    fn publish(&self, store: &Store, state: Option<TrackerState>) {
        let editor_id = self.state.editor_id.clone();
        store.dispatch(match self.kind {
            TriggerKind::Mention => Action::SetMention { editor_id, state },
            TriggerKind::Emoji => Action::SetEmoji { editor_id, state },
        });
    }
}
