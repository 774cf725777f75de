//! Hovered-block anchor for the block toolbar.

use tessel_delta::Delta;

use super::MouseOverState;
use crate::document::NodeId;
use crate::editor::Editor;
use crate::store::{Action, Store};
use crate::types::{EditorId, Source};

/// Tracks the block under the pointer so hover UI can follow it.
#[derive(Debug)]
pub struct MouseOverTracker {
    editor_id: EditorId,
    state: Option<MouseOverState>,
}

impl MouseOverTracker {
    pub fn new(editor_id: EditorId) -> Self {
        Self {
            editor_id,
            state: None,
        }
    }

    pub fn state(&self) -> Option<&MouseOverState> {
        self.state.as_ref()
    }

    /// Pointer entered `node`, or left every block for `None`.
    pub fn hover(&mut self, editor: &Editor, store: &Store, node: Option<NodeId>) {
        let Some(node) = node else {
            self.close(store);
            return;
        };
        if self.state.as_ref().is_some_and(|s| s.node == node) {
            return;
        }
        match editor.get_index(node) {
            Some(index) => self.open(editor, store, node, index),
            None => self.close(store),
        }
    }

    pub fn on_text_change(&mut self, editor: &Editor, store: &Store, delta: &Delta, source: Source) {
        let Some((node, index)) = self.state.as_ref().map(|s| (s.node, s.index)) else {
            return;
        };
        if !editor.scroll().contains(node) {
            self.close(store);
            return;
        }
        match source {
            // Hover UI gets in the way of typing.
            Source::User => self.close(store),
            Source::Api => {
                let index = delta.transform_position(index, false);
                self.open(editor, store, node, index);
            }
            Source::Silent => self.refresh(editor, store),
        }
    }

    /// Re-derive index and bounds from the hovered node.
    pub fn refresh(&mut self, editor: &Editor, store: &Store) {
        let Some(node) = self.state.as_ref().map(|s| s.node) else {
            return;
        };
        match editor.get_index(node) {
            Some(index) => self.open(editor, store, node, index),
            None => self.close(store),
        }
    }

    fn open(&mut self, editor: &Editor, store: &Store, node: NodeId, index: usize) {
        let length = editor.scroll().line(node).map_or(1, |line| line.length());
        let state = MouseOverState {
            editor_id: self.editor_id.clone(),
            node,
            index,
            bounds: editor.get_bounds(index, length),
        };
        if self.state.as_ref() == Some(&state) {
            return;
        }
        tracing::trace!(target: "tessel::tracker", %node, index, "mouse over");
        self.state = Some(state.clone());
        store.dispatch(Action::SetMouseOver {
            editor_id: self.editor_id.clone(),
            state: Some(state),
        });
    }

    pub fn close(&mut self, store: &Store) {
        if self.state.take().is_some() {
            store.dispatch(Action::SetMouseOver {
                editor_id: self.editor_id.clone(),
                state: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use tessel_delta::AttributeMap;

    #[test]
    fn test_follows_remote_and_closes_on_typing() {
        let config = EditorConfig::default();
        let mut editor = Editor::new(EditorId::new("main"), true, &Delta::new().insert("a\nb\n"), &config);
        let store = Store::new();
        let mut tracker = MouseOverTracker::new(EditorId::new("main"));
        let b = editor.scroll().lines().nth(1).map(|l| l.node).expect("b");

        tracker.hover(&editor, &store, Some(b));
        assert_eq!(tracker.state().map(|s| s.index), Some(2));

        let delta = editor.insert_text(0, "xyz", AttributeMap::new(), Source::Api);
        tracker.on_text_change(&editor, &store, &delta, Source::Api);
        assert_eq!(tracker.state().map(|s| s.index), Some(5));
        assert_eq!(store.get_state().mouse_over.map(|s| s.index), Some(5));

        let delta = editor.insert_text(0, "q", AttributeMap::new(), Source::User);
        tracker.on_text_change(&editor, &store, &delta, Source::User);
        assert!(tracker.state().is_none());
        assert!(store.get_state().mouse_over.is_none());
    }

    #[test]
    fn test_closes_when_node_removed() {
        let config = EditorConfig::default();
        let mut editor = Editor::new(EditorId::new("main"), true, &Delta::new().insert("a\nb\n"), &config);
        let store = Store::new();
        let mut tracker = MouseOverTracker::new(EditorId::new("main"));
        let b = editor.scroll().lines().nth(1).map(|l| l.node).expect("b");
        tracker.hover(&editor, &store, Some(b));

        let delta = editor.delete_text(2, 2, Source::Api);
        tracker.on_text_change(&editor, &store, &delta, Source::Api);
        assert!(tracker.state().is_none());
    }
}
