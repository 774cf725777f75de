//! Committing a drag: the structural splice and what runs after it.

use tessel_delta::Delta;

use super::classify::container_format;
use super::{DragEngine, DragItem, DragType, DraggingNodes, unmark_dragging};
use crate::analytics::Completion;
use crate::document::{Block, Location, NodeId, Scroll, class, format};
use crate::editor::Editor;
use crate::error::EditorError;
use crate::schedule::{Scheduler, Task};
use crate::store::Store;
use crate::types::Source;

/// What a drop did.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Dropped onto itself or onto the line right before it.
    Noop,
    Moved {
        /// The move as a change against the contents from before the drop.
        change: Delta,
        /// First dragged node, which gets the selection back.
        restore: NodeId,
    },
}

impl DragEngine {
    /// Commit the drag at its current target.
    ///
    /// `pointer_dy` is how far the pointer travelled over the gesture; small
    /// moves skip the gap-closing animation. Cleanup of emptied containers
    /// and selection restore are left on the scheduler, in that order.
    pub fn drop(
        &mut self,
        editor: &mut Editor,
        store: &Store,
        scheduler: &mut Scheduler,
        pointer_dy: f64,
    ) -> Result<DropOutcome, EditorError> {
        let item = self.item.as_mut().ok_or(EditorError::NoActiveDrag)?;
        if item.drag_over.end {
            return Err(EditorError::NoActiveDrag);
        }
        item.drag_over.end = true;
        let item = item.clone();
        let nodes = item.dragging_nodes.all();
        let first = item.first_dragging_node;

        let scroll = editor.scroll_mut();
        if let Some(target) = item.drag_over.element
            && scroll.contains(target)
        {
            scroll.state_mut(target).remove_class(class::DRAGOVER);
        }

        let target = item.drag_over.element.filter(|&target| {
            scroll.contains(target)
                && !item.dragging_nodes.contains(target)
                && scroll.previous_line(first) != Some(target)
        });
        let Some(target) = target else {
            unmark_dragging(scroll, &nodes);
            tracing::debug!(target: "tessel::drag", editor = %self.editor_id, "drop onto own position");
            scheduler.next_tick(Task::RestoreDropSelection { node: first });
            self.finish(store, item.content, Completion::Incomplete);
            return Ok(DropOutcome::Noop);
        };

        let vacated: f64 = scroll
            .layout()
            .iter()
            .filter(|line_box| nodes.contains(&line_box.node))
            .map(|line_box| line_box.client_height)
            .sum();
        let follower = nodes
            .last()
            .and_then(|&last| scroll.next_line(last))
            .filter(|node| !nodes.contains(node));

        let old_contents = editor.get_contents();
        let scroll = editor.scroll_mut();
        splice(scroll, &item, target)?;
        unmark_dragging(scroll, &nodes);

        if let Some(follower) = follower
            && pointer_dy.abs() >= self.config.animation_min_delta
            && scroll.contains(follower)
        {
            let state = scroll.state_mut(follower);
            let margin_top = state.margin_top;
            state.margin_top = margin_top + vacated;
            scheduler.after(
                self.config.animation_ms,
                Task::EndMarginJump {
                    node: follower,
                    margin_top,
                },
            );
        }

        let change = editor.commit_structure(old_contents, Source::Api);
        tracing::debug!(
            target: "tessel::drag",
            editor = %self.editor_id,
            drag_type = ?item.drag_type,
            %target,
            moved = nodes.len(),
            "drop committed"
        );
        scheduler.next_tick(Task::CleanupEmptyContainers);
        scheduler.next_tick(Task::RestoreDropSelection { node: first });
        self.finish(store, item.content, Completion::Complete);
        Ok(DropOutcome::Moved { change, restore: first })
    }
}

/// Move the dragged unit to follow `target`.
fn splice(scroll: &mut Scroll, item: &DragItem, target: NodeId) -> Result<(), EditorError> {
    let first = item.first_dragging_node;
    let target_is_item = matches!(scroll.locate(target), Some(Location::Item { .. }));

    match (&item.dragging_nodes, item.drag_type) {
        // A list run lands in a fresh container of its own format.
        (DraggingNodes::Nodes(nodes), DragType::List) => {
            let format = container_format(scroll, first).ok_or(EditorError::UnknownNode(first))?;
            let lines = nodes
                .iter()
                .map(|&node| scroll.take_line(node))
                .collect::<Result<Vec<_>, _>>()?;
            let list = scroll.new_list(format, lines);
            scroll.insert_block_after(target, list)
        }
        // One container per run, each after the last item of the one before.
        (DraggingNodes::Nested(runs), _) => {
            let mut anchor = target;
            for run in runs {
                let lines = run
                    .items
                    .iter()
                    .map(|&node| scroll.take_line(node))
                    .collect::<Result<Vec<_>, _>>()?;
                let last = lines.last().map(|line| line.node);
                let list = scroll.new_list(run.container, lines);
                scroll.insert_block_after(anchor, list)?;
                if let Some(last) = last {
                    anchor = last;
                }
            }
            Ok(())
        }
        // A plain line dropped on an item becomes an item like the target.
        (DraggingNodes::Nodes(_), DragType::Line) if target_is_item => {
            let target_format = scroll
                .line(target)
                .map(|line| line.format.clone())
                .ok_or(EditorError::UnknownNode(target))?;
            let mut line = scroll.take_line(first)?;
            let id = line.format.remove(format::ID);
            line.format = target_format;
            line.format.remove(format::ID);
            if let Some(id) = id {
                line.format.insert(format::ID.into(), id);
            }
            scroll.insert_item_after(target, line)
        }
        // Blocks that cannot live in a list split it at the target.
        (DraggingNodes::Nodes(_), DragType::Embed | DragType::Divider | DragType::CodeBlock) if target_is_item => {
            let line = scroll.take_line(first)?;
            if let Some(tail) = scroll.split_container_after(target)? {
                return scroll.insert_before(Block::Line(line), tail);
            }
            let Some(Location::Item { container, .. }) = scroll.locate(target) else {
                return Err(EditorError::UnknownNode(target));
            };
            match scroll.next_top_level(container) {
                Some(next) => scroll.insert_before(Block::Line(line), next),
                None => {
                    scroll.insert_into(Block::Line(line));
                    Ok(())
                }
            }
        }
        _ => {
            let line = scroll.take_line(first)?;
            scroll.insert_block_after(target, Block::Line(line))
        }
    }
}
