//! Drag and drop reordering of blocks.
//!
//! A drag starts at a document index. [`classify`] works out which nodes move
//! together, the target tracker follows the pointer over line boxes, and the
//! drop splices the unit into its new place with the scroll's structural
//! operations. The item outlives the drop with `drag_over.end` set, which is
//! what keeps late throttled calls from doing anything.

mod classify;
mod drop;
mod file_drop;
mod target;

use crate::analytics::{AnalyticsEvent, Completion, DragContent};
use crate::config::DragConfig;
use crate::document::{ListFormat, NodeId, class};
use crate::editor::Editor;
use crate::error::EditorError;
use crate::schedule::{Scheduler, Task, TaskKey, Throttle, ThrottleCall};
use crate::store::{Action, Store};
use crate::types::EditorId;

pub use classify::{Classified, classify, mark_dragging, unmark_dragging};
pub use drop::DropOutcome;
pub use file_drop::FileDropTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragType {
    Line,
    List,
    TodoList,
    Embed,
    Divider,
    CodeBlock,
}

/// Todo items collected from one container.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedListRun {
    /// Format of the container the items came from, used to rebuild it on drop.
    pub container: ListFormat,
    pub items: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraggingNodes {
    Nodes(Vec<NodeId>),
    Nested(Vec<NestedListRun>),
}

impl DraggingNodes {
    /// Every dragged node in document order.
    pub fn all(&self) -> Vec<NodeId> {
        match self {
            DraggingNodes::Nodes(nodes) => nodes.clone(),
            DraggingNodes::Nested(runs) => runs.iter().flat_map(|run| run.items.iter().copied()).collect(),
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match self {
            DraggingNodes::Nodes(nodes) => nodes.contains(&node),
            DraggingNodes::Nested(runs) => runs.iter().any(|run| run.items.contains(&node)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DraggingNodes::Nodes(nodes) => nodes.len(),
            DraggingNodes::Nested(runs) => runs.iter().map(|run| run.items.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragOver {
    /// Current drop target.
    pub element: Option<NodeId>,
    /// Set once the drag is dropped or cancelled.
    pub end: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragItem {
    pub drag_over: DragOver,
    pub first_dragging_node: NodeId,
    pub dragging_nodes: DraggingNodes,
    pub drag_type: DragType,
    pub handler: Throttle,
    pub drag_handle: Option<NodeId>,
    /// Index the drag started from.
    pub origin_index: usize,
    pub content: DragContent,
}

/// What the rest of the app sees of a drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub editor_id: EditorId,
    pub drag_type: DragType,
    pub first_dragging_node: NodeId,
    pub target: Option<NodeId>,
}

/// Per-editor drag controller.
#[derive(Debug)]
pub struct DragEngine {
    editor_id: EditorId,
    config: DragConfig,
    item: Option<DragItem>,
}

impl DragEngine {
    pub fn new(editor_id: EditorId, config: &DragConfig) -> Self {
        Self {
            editor_id,
            config: config.clone(),
            item: None,
        }
    }

    pub fn item(&self) -> Option<&DragItem> {
        self.item.as_ref()
    }

    /// Whether a drag is live (started and not yet dropped or cancelled).
    pub fn is_dragging(&self) -> bool {
        self.item.as_ref().is_some_and(|item| !item.drag_over.end)
    }

    pub fn start(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        index: usize,
        drag_handle: Option<NodeId>,
    ) -> Result<&DragItem, EditorError> {
        let classified = classify(editor.scroll(), index)?;
        let nodes = classified.dragging_nodes.all();
        mark_dragging(editor.scroll_mut(), &nodes, self.config.dragging_opacity);

        let item = DragItem {
            drag_over: DragOver::default(),
            first_dragging_node: classified.first_dragging_node,
            dragging_nodes: classified.dragging_nodes,
            drag_type: classified.drag_type,
            handler: Throttle::new(self.config.throttle_ms),
            drag_handle,
            origin_index: index,
            content: classified.content,
        };
        tracing::debug!(target: "tessel::drag", editor = %self.editor_id, index, drag_type = ?item.drag_type, "drag start");
        store.dispatch(Action::SetDrag(Some(drag_state(&self.editor_id, &item))));
        Ok(self.item.insert(item))
    }

    /// Pointer moved during the drag. Throttled: runs now, or leaves a
    /// trailing evaluation on the scheduler.
    pub fn drag_over(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        scheduler: &mut Scheduler,
        client_y: f64,
        now: f64,
    ) -> Result<(), EditorError> {
        let item = self.item.as_mut().ok_or(EditorError::NoActiveDrag)?;
        if item.drag_over.end {
            return Ok(());
        }
        match item.handler.call(now) {
            ThrottleCall::Now => self.evaluate(editor, store, client_y),
            ThrottleCall::Trailing(at) => {
                scheduler.debounce(TaskKey::DragOver, at - now, Task::DragOverTrailing { client_y });
            }
            ThrottleCall::Coalesced => {
                scheduler.replace(TaskKey::DragOver, Task::DragOverTrailing { client_y });
            }
        }
        Ok(())
    }

    /// The trailing call left by the throttle. Inert once the drag ended.
    pub fn drag_over_trailing(&mut self, editor: &mut Editor, store: &Store, client_y: f64, now: f64) {
        let Some(item) = self.item.as_mut() else {
            return;
        };
        if item.drag_over.end {
            tracing::trace!(target: "tessel::drag", "stale drag-over ignored");
            return;
        }
        item.handler.fire_trailing(now);
        self.evaluate(editor, store, client_y);
    }

    fn evaluate(&mut self, editor: &mut Editor, store: &Store, client_y: f64) {
        let y = client_y + editor.scroll_top() - self.config.navbar_height;
        let Some(item) = self.item.as_mut() else {
            return;
        };
        if item.track(editor.scroll_mut(), y).is_some() {
            store.dispatch(Action::SetDrag(Some(drag_state(&self.editor_id, item))));
        }
    }

    /// Abandon the drag without moving anything.
    pub fn cancel(&mut self, editor: &mut Editor, store: &Store) -> Result<(), EditorError> {
        let item = self.item.as_mut().ok_or(EditorError::NoActiveDrag)?;
        if item.drag_over.end {
            return Err(EditorError::NoActiveDrag);
        }
        item.drag_over.end = true;
        let nodes = item.dragging_nodes.all();
        let target = item.drag_over.element.take();
        let content = item.content.clone();

        let scroll = editor.scroll_mut();
        if let Some(target) = target
            && scroll.contains(target)
        {
            scroll.state_mut(target).remove_class(class::DRAGOVER);
        }
        unmark_dragging(scroll, &nodes);
        tracing::debug!(target: "tessel::drag", editor = %self.editor_id, "drag cancelled");
        self.finish(store, content, Completion::Incomplete);
        Ok(())
    }

    /// Forget the ended drag. Until this runs, late throttled calls still
    /// reach the item and are ignored there.
    pub fn release(&mut self) {
        if self.item.as_ref().is_some_and(|item| item.drag_over.end) {
            self.item = None;
        }
    }

    fn finish(&self, store: &Store, content: DragContent, completion: Completion) {
        store.dispatch(Action::SetDrag(None));
        store.dispatch(Action::Track(AnalyticsEvent::DragAndDrop {
            editor_id: self.editor_id.clone(),
            content,
            completion,
        }));
    }
}

fn drag_state(editor_id: &EditorId, item: &DragItem) -> DragState {
    DragState {
        editor_id: editor_id.clone(),
        drag_type: item.drag_type,
        first_dragging_node: item.first_dragging_node,
        target: item.drag_over.element,
    }
}
