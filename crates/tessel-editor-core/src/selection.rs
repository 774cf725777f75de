//! Selection reconciliation.
//!
//! One selection is live across every editor in the process, held in the
//! [`Store`]. A selection is either a text range or a single block embed
//! acting as the cursor. [`SelectionManager`] keeps that state in step with
//! the engine: it reacts to selection changes, text changes and native
//! selection updates while the mouse is held, and it owns the set of embeds
//! highlighted because a text range covers them.

use std::collections::BTreeSet;

use smol_str::SmolStr;
use tessel_delta::{AttributeMap, Delta};

use crate::actions::{EmbedKeyAction, FocusTarget, KeyCombo, KeydownResult};
use crate::config::SelectionConfig;
use crate::document::{BlockType, EmbedBlot, NodeId, Scroll, format};
use crate::editor::Editor;
use crate::error::EditorError;
use crate::schedule::{Scheduler, Task};
use crate::store::{Action, Store};
use crate::types::{Bounds, EditorId, Range, Source};

/// Format key exposed to consumers in place of `code-block`.
pub const CODE_BLOCK_KEY: &str = "codeBlock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionType {
    Text,
    Embed,
}

/// The live selection as consumers see it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub editor_id: EditorId,
    pub main_editor: bool,
    /// The selected embed, for embed selections.
    pub active_embed: Option<NodeId>,
    pub index: usize,
    pub selection_length: usize,
    pub selection_type: SelectionType,
    /// Blot name of the line at `index`.
    pub blot_name: SmolStr,
    pub text: String,
    pub bounds: Option<Bounds>,
    pub format: AttributeMap,
    pub is_first_line: bool,
}

impl SelectionState {
    pub fn empty(editor_id: EditorId, selection_type: SelectionType) -> Self {
        Self {
            editor_id,
            main_editor: false,
            active_embed: None,
            index: 0,
            selection_length: 0,
            selection_type,
            blot_name: SmolStr::default(),
            text: String::new(),
            bounds: None,
            format: AttributeMap::new(),
            is_first_line: false,
        }
    }

    pub fn is_embed(&self) -> bool {
        self.selection_type == SelectionType::Embed
    }
}

/// Per-editor half of selection handling.
#[derive(Debug)]
pub struct SelectionManager {
    editor_id: EditorId,
    highlighted: BTreeSet<NodeId>,
    mouse_down_at: Option<f64>,
    mouse_down_delay: f64,
}

impl SelectionManager {
    pub fn new(editor_id: EditorId, config: &SelectionConfig) -> Self {
        Self {
            editor_id,
            highlighted: BTreeSet::new(),
            mouse_down_at: None,
            mouse_down_delay: config.mouse_down_delay_ms,
        }
    }

    /// Embeds currently highlighted by a text range.
    pub fn highlighted(&self) -> &BTreeSet<NodeId> {
        &self.highlighted
    }

    /// The live selection, if it belongs to this editor.
    fn own_selection(&self, store: &Store) -> Option<SelectionState> {
        store.with_state(|state| {
            state
                .selection
                .as_ref()
                .filter(|s| s.editor_id == self.editor_id)
                .cloned()
        })
    }

    // === Engine events ===

    pub fn on_selection_change(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        scheduler: &mut Scheduler,
        range: Option<Range>,
        source: Source,
    ) {
        let Some(range) = range else {
            if source.is_silent() {
                // An embed took the selection and blurred the engine itself.
                return;
            }
            tracing::debug!(target: "tessel::selection", editor = %self.editor_id, "selection cleared");
            store.dispatch(Action::ClearSelection {
                editor_id: self.editor_id.clone(),
            });
            self.unhighlight_all(editor.scroll_mut());
            return;
        };

        self.ensure_trailing_line(editor, range);
        store.dispatch(Action::SetSelection(text_state(editor, range)));

        self.unhighlight_all(editor.scroll_mut());
        if range.length > 0 {
            scheduler.next_tick(Task::HighlightSelection { range });
        }
    }

    pub fn on_text_change(&mut self, editor: &Editor, store: &Store, delta: &Delta, source: Source) {
        let Some(current) = self.own_selection(store) else {
            return;
        };
        match (source, current.selection_type) {
            (Source::Api, SelectionType::Embed) => {
                let index = delta.transform_position(current.index, false);
                if index != current.index {
                    tracing::trace!(target: "tessel::selection", from = current.index, to = index, "embed selection shifted");
                    store.dispatch(Action::UpdateSelectionIndex {
                        editor_id: self.editor_id.clone(),
                        index,
                    });
                }
            }
            (Source::User, SelectionType::Text) => {
                if let Some(range) = editor.get_selection() {
                    store.dispatch(Action::SetSelection(text_state(editor, range)));
                }
            }
            _ => {}
        }
    }

    /// Recompute a live text selection against the current layout.
    pub fn refresh(&self, editor: &Editor, store: &Store) {
        if let Some(current) = self.own_selection(store)
            && current.selection_type == SelectionType::Text
            && let Some(range) = editor.get_selection()
        {
            store.dispatch(Action::SetSelection(text_state(editor, range)));
        }
    }

    /// Main editor only: a caret at the end of a non-blank last line gets a
    /// fresh empty line after it.
    fn ensure_trailing_line(&self, editor: &mut Editor, range: Range) {
        let last = editor.length().saturating_sub(1);
        if !editor.is_main() || range.index != last {
            return;
        }
        let blank = editor.get_line(last).is_none_or(|(line, _)| line.is_blank());
        if !blank {
            tracing::debug!(target: "tessel::selection", "appending trailing line");
            editor.insert_text(editor.length(), "\n", AttributeMap::new(), Source::Api);
        }
    }

    // === Mouse ===

    pub fn mouse_down(&mut self, now: f64) {
        self.mouse_down_at = Some(now);
    }

    pub fn mouse_up(&mut self) {
        self.mouse_down_at = None;
    }

    /// Whether the button has been held long enough to count as a drag-select.
    pub fn is_mouse_down(&self, now: f64) -> bool {
        self.mouse_down_at
            .is_some_and(|at| now - at >= self.mouse_down_delay)
    }

    /// Live-highlight embeds under a drag-selection before the engine
    /// reports it.
    pub fn native_selection_change(&mut self, scroll: &mut Scroll, range: Range, now: f64) {
        if !self.is_mouse_down(now) {
            return;
        }
        scroll.batch_start();
        self.unhighlight_all(scroll);
        self.highlight_range(scroll, range);
        scroll.batch_end();
    }

    /// Apply a click of `count` at `index`.
    pub fn click(&mut self, editor: &mut Editor, index: usize, count: u8) {
        let range = match count {
            0 | 1 => Range::caret(index),
            2 => double_click_range(editor, index),
            _ => triple_click_range(editor, index),
        };
        editor.set_selection(Some(range), Source::User);
    }

    // === Embeds ===

    /// Click on an embed. With shift and a live selection the click extends
    /// it over both ends in one selection change.
    pub fn click_embed(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        node: NodeId,
        shift: bool,
    ) -> Result<(), EditorError> {
        let index = editor.get_index(node).ok_or(EditorError::UnknownNode(node))?;
        if shift && let Some(current) = self.own_selection(store) {
            let first = current.index.min(index);
            let last = (current.index + current.selection_length.max(1) - 1).max(index);
            editor.set_selection(Some(Range::new(first, last - first + 1)), Source::User);
            return Ok(());
        }
        self.select_embed(editor, store, node)
    }

    /// Make `node` the selection.
    pub fn select_embed(&mut self, editor: &mut Editor, store: &Store, node: NodeId) -> Result<(), EditorError> {
        let index = editor.get_index(node).ok_or(EditorError::UnknownNode(node))?;
        let scroll = editor.scroll_mut();
        scroll.batch_start();
        self.unhighlight_all(scroll);
        let highlighted = scroll.embed_mut(node).map(EmbedBlot::highlight);
        scroll.batch_end();
        highlighted?;
        self.highlighted.insert(node);

        let mut state = text_state(editor, Range::new(index, 1));
        state.selection_type = SelectionType::Embed;
        state.active_embed = Some(node);
        state.text.clear();
        tracing::debug!(target: "tessel::selection", editor = %self.editor_id, %node, index, "embed selected");
        store.dispatch(Action::SetSelection(state));
        editor.set_selection(None, Source::Silent);
        Ok(())
    }

    /// Land on `index`: select the embed there, or put a caret on it.
    pub fn select_at(&mut self, editor: &mut Editor, store: &Store, index: usize) -> Result<(), EditorError> {
        let index = index.min(editor.length().saturating_sub(1));
        match editor.get_leaf(index) {
            Some(leaf) if leaf.is_block_embed() => self.select_embed(editor, store, leaf.node),
            _ => {
                editor.set_selection(Some(Range::caret(index)), Source::User);
                Ok(())
            }
        }
    }

    /// Keys pressed while an embed of this editor holds the selection.
    pub fn keydown(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        combo: &KeyCombo,
    ) -> Result<KeydownResult, EditorError> {
        let Some(current) = self.own_selection(store).filter(SelectionState::is_embed) else {
            return Ok(KeydownResult::NotHandled);
        };
        let Some(action) = EmbedKeyAction::from_combo(combo) else {
            return Ok(KeydownResult::NotHandled);
        };
        let index = current.index;
        tracing::debug!(target: "tessel::selection", ?action, index, "embed keydown");
        match action {
            EmbedKeyAction::DeleteBackward => {
                editor.delete_text(index, 1, Source::User);
                self.select_at(editor, store, index.saturating_sub(1))?;
            }
            EmbedKeyAction::DeleteForward => {
                editor.delete_text(index, 1, Source::User);
                self.select_at(editor, store, index)?;
            }
            EmbedKeyAction::InsertLineBelow => {
                editor.insert_text(index + 1, "\n", AttributeMap::new(), Source::User);
                editor.set_selection(Some(Range::caret(index + 1)), Source::User);
            }
            EmbedKeyAction::MovePrevious => {
                if index > 0 {
                    self.select_at(editor, store, index - 1)?;
                }
            }
            EmbedKeyAction::MoveNext => {
                if index + 1 < editor.length() {
                    self.select_at(editor, store, index + 1)?;
                }
            }
            EmbedKeyAction::Deselect => self.clear(editor.scroll_mut(), store),
        }
        Ok(KeydownResult::Handled)
    }

    pub fn focus_changed(&mut self, scroll: &mut Scroll, store: &Store, target: &FocusTarget) {
        if matches!(target, FocusTarget::Body { keep_focus: false }) {
            self.clear(scroll, store);
        }
    }

    fn clear(&mut self, scroll: &mut Scroll, store: &Store) {
        store.dispatch(Action::ClearSelection {
            editor_id: self.editor_id.clone(),
        });
        self.unhighlight_all(scroll);
    }

    // === Highlighting ===

    /// Highlight every block embed starting inside `range`.
    pub fn highlight_range(&mut self, scroll: &mut Scroll, range: Range) {
        let covered: Vec<NodeId> = {
            let mut start = 0;
            let mut nodes = Vec::new();
            for line in scroll.lines() {
                if line.is_embed() && range.contains(start) {
                    nodes.push(line.node);
                }
                start += line.length();
                if start >= range.end() {
                    break;
                }
            }
            nodes
        };
        if covered.is_empty() {
            return;
        }
        batched(scroll, |scroll| {
            for node in covered {
                if scroll.embed_mut(node).map(EmbedBlot::highlight).is_ok() {
                    self.highlighted.insert(node);
                }
            }
        });
    }

    pub fn unhighlight_all(&mut self, scroll: &mut Scroll) {
        if self.highlighted.is_empty() {
            return;
        }
        let nodes = std::mem::take(&mut self.highlighted);
        batched(scroll, |scroll| {
            for node in nodes {
                // Nodes deleted since they were highlighted have nothing to reset.
                let _ = scroll.embed_mut(node).map(EmbedBlot::unhighlight);
            }
        });
    }
}

/// Run `f` inside a scroll batch unless one is already open.
fn batched(scroll: &mut Scroll, f: impl FnOnce(&mut Scroll)) {
    let nested = scroll.is_batching();
    if !nested {
        scroll.batch_start();
    }
    f(scroll);
    if !nested {
        scroll.batch_end();
    }
}

/// Selection metadata for a text range.
fn text_state(editor: &Editor, range: Range) -> SelectionState {
    let line = editor.get_line(range.index).map(|(line, _)| line);
    let is_first_line = editor.is_main()
        && line.is_some_and(|line| editor.scroll().lines().next().is_some_and(|first| first.node == line.node));
    SelectionState {
        editor_id: editor.id().clone(),
        main_editor: editor.is_main(),
        active_embed: None,
        index: range.index,
        selection_length: range.length,
        selection_type: SelectionType::Text,
        blot_name: line.map(|l| SmolStr::new(l.blot_name())).unwrap_or_default(),
        text: editor.get_text(range.index, range.length),
        bounds: editor.get_bounds(range.index, range.length),
        format: consumer_format(editor.get_format(range.index, range.length)),
        is_first_line,
    }
}

fn consumer_format(mut format: AttributeMap) -> AttributeMap {
    if let Some(value) = format.remove(format::CODE_BLOCK) {
        format.insert(CODE_BLOCK_KEY.into(), value);
    }
    format
}

/// The word under `index`, or a caret on an empty line.
fn double_click_range(editor: &Editor, index: usize) -> Range {
    let Some((line, offset)) = editor.get_line(index) else {
        return Range::caret(index);
    };
    if line.is_embed() || line.is_blank() {
        return Range::caret(index);
    }
    let chars: Vec<char> = line.aligned_text().chars().collect();
    let is_word = |c: &char| c.is_alphanumeric() || *c == '_';
    if !chars.get(offset).is_some_and(is_word) {
        return Range::caret(index);
    }
    let start = chars[..offset].iter().rev().take_while(|c| is_word(c)).count();
    let end = chars[offset..].iter().take_while(|c| is_word(c)).count();
    Range::new(index - start, start + end)
}

/// The whole line. Above a code block the trailing newline is left out so
/// the selection does not bleed into it.
fn triple_click_range(editor: &Editor, index: usize) -> Range {
    let Some((line, offset)) = editor.get_line(index) else {
        return Range::caret(index);
    };
    let start = index - offset;
    let length = line.length();
    let next_is_code = editor
        .scroll()
        .next_line(line.node)
        .and_then(|node| editor.scroll().line(node))
        .is_some_and(|next| next.block_type() == BlockType::CodeBlock);
    if next_is_code {
        Range::new(start, length - 1)
    } else {
        Range::new(start, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use serde_json::json;
    use tessel_delta::Embed;

    fn setup(contents: Delta) -> (Editor, SelectionManager, Store, Scheduler) {
        let config = EditorConfig::default();
        let editor = Editor::new(EditorId::new("main"), true, &contents, &config);
        let manager = SelectionManager::new(EditorId::new("main"), &config.selection);
        (editor, manager, Store::new(), Scheduler::new())
    }

    fn code() -> AttributeMap {
        serde_json::from_value(json!({"code-block": true})).expect("attrs")
    }

    #[test]
    fn test_text_state_renames_code_block() {
        let (editor, ..) = setup(Delta::new().insert("x\n").insert("let a").insert_with("\n", code()));
        let state = text_state(&editor, Range::new(3, 2));
        assert_eq!(state.format.get(CODE_BLOCK_KEY), Some(&json!(true)));
        assert!(state.format.get("code-block").is_none());
        assert_eq!(state.blot_name, "code-block");
        assert_eq!(state.text, "et");
        assert!(!state.is_first_line);
        assert!(text_state(&editor, Range::caret(0)).is_first_line);
    }

    #[test]
    fn test_triple_click_above_code_block() {
        let (mut editor, mut manager, ..) =
            setup(Delta::new().insert("plain\n").insert("code").insert_with("\n", code()).insert("end\n"));
        manager.click(&mut editor, 2, 3);
        assert_eq!(editor.get_selection(), Some(Range::new(0, 5)));
        manager.click(&mut editor, 7, 3);
        assert_eq!(editor.get_selection(), Some(Range::new(6, 5)));
    }

    #[test]
    fn test_double_click() {
        let (mut editor, mut manager, ..) = setup(Delta::new().insert("one two\n\nthree\n"));
        manager.click(&mut editor, 5, 2);
        assert_eq!(editor.get_selection(), Some(Range::new(4, 3)));
        manager.click(&mut editor, 8, 2);
        assert_eq!(editor.get_selection(), Some(Range::caret(8)));
    }

    #[test]
    fn test_trailing_line_appended_for_main_editor() {
        let (mut editor, mut manager, store, mut scheduler) = setup(Delta::new().insert("end\n"));
        manager.on_selection_change(&mut editor, &store, &mut scheduler, Some(Range::caret(3)), Source::User);
        assert_eq!(editor.get_text(0, editor.length()), "end\n\n");

        // The new last line is blank, so nothing more is added.
        manager.on_selection_change(&mut editor, &store, &mut scheduler, Some(Range::caret(4)), Source::User);
        assert_eq!(editor.length(), 5);
    }

    #[test]
    fn test_native_selection_needs_held_mouse() {
        let (mut editor, mut manager, ..) = setup(
            Delta::new()
                .insert("a\n")
                .insert_embed(Embed::new("image", json!({"src": "x"})), AttributeMap::new())
                .insert("b\n"),
        );
        let image = editor.scroll().lines().nth(1).map(|l| l.node).expect("image");

        manager.mouse_down(0.0);
        manager.native_selection_change(editor.scroll_mut(), Range::new(0, 4), 50.0);
        assert!(manager.highlighted().is_empty());

        let passes = editor.scroll().update_passes();
        manager.native_selection_change(editor.scroll_mut(), Range::new(0, 4), 150.0);
        assert!(manager.highlighted().contains(&image));
        assert!(editor.scroll().state(image).embed.highlighted);
        assert_eq!(editor.scroll().update_passes(), passes + 1);

        manager.mouse_up();
        manager.native_selection_change(editor.scroll_mut(), Range::new(0, 1), 200.0);
        assert!(manager.highlighted().contains(&image));
    }
}
