//! Which nodes move together when a drag starts.

use crate::analytics::DragContent;
use crate::document::{Block, BlockType, EmbedKind, Line, ListFormat, Location, NodeId, Scroll, class};
use crate::error::EditorError;

use super::{DragType, DraggingNodes, NestedListRun};

/// What moves when a drag starts at some index.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub first_dragging_node: NodeId,
    pub dragging_nodes: DraggingNodes,
    pub drag_type: DragType,
    pub content: DragContent,
}

/// Work out the drag unit for the block at `index`.
///
/// List items drag together with the deeper-indented items after them. For
/// todo items the run may continue into following todo containers, since
/// checked and unchecked items live in separate containers.
pub fn classify(scroll: &Scroll, index: usize) -> Result<Classified, EditorError> {
    let (line, _) = scroll.line_at(index).ok_or(EditorError::NoBlockAtIndex(index))?;
    let node = line.node;

    let (dragging_nodes, drag_type) = match (line.list_kind(), scroll.locate(node)) {
        (Some(kind), Some(Location::Item { container, item })) if kind.is_todo() => (
            DraggingNodes::Nested(todo_runs(scroll, container, item, line.indent())),
            DragType::TodoList,
        ),
        (Some(_), Some(Location::Item { container, item })) => {
            let items = match &scroll.blocks()[container] {
                Block::List(list) => nested_run(&list.items[item..], line.indent()),
                Block::Line(_) => vec![node],
            };
            (DraggingNodes::Nodes(items), DragType::List)
        }
        _ => (DraggingNodes::Nodes(vec![node]), single_type(line)),
    };

    tracing::debug!(target: "tessel::drag", %node, ?drag_type, nodes = dragging_nodes.len(), "classified drag");
    Ok(Classified {
        first_dragging_node: node,
        dragging_nodes,
        drag_type,
        content: content_of(line, drag_type),
    })
}

/// `items[0]` plus the contiguous items after it indented deeper than `indent`.
fn nested_run(items: &[Line], indent: u8) -> Vec<NodeId> {
    let mut run = vec![items[0].node];
    run.extend(
        items[1..]
            .iter()
            .take_while(|item| item.indent() > indent)
            .map(|item| item.node),
    );
    run
}

fn todo_runs(scroll: &Scroll, container: usize, item: usize, indent: u8) -> Vec<NestedListRun> {
    let blocks = scroll.blocks();
    let mut runs = Vec::new();
    let Block::List(first) = &blocks[container] else {
        return runs;
    };
    let items = nested_run(&first.items[item..], indent);
    let mut exhausted = item + items.len() == first.items.len();
    runs.push(NestedListRun {
        container: first.format,
        items,
    });

    for block in &blocks[container + 1..] {
        if !exhausted {
            break;
        }
        let Block::List(list) = block else {
            break;
        };
        if !list.format.is_todo() {
            break;
        }
        let items: Vec<NodeId> = list
            .items
            .iter()
            .take_while(|item| item.indent() > indent)
            .map(|item| item.node)
            .collect();
        if items.is_empty() {
            break;
        }
        exhausted = items.len() == list.items.len();
        runs.push(NestedListRun {
            container: list.format,
            items,
        });
    }
    runs
}

fn single_type(line: &Line) -> DragType {
    match line.block_type() {
        BlockType::Embed(EmbedKind::Divider) => DragType::Divider,
        BlockType::Embed(_) => DragType::Embed,
        BlockType::CodeBlock => DragType::CodeBlock,
        _ => DragType::Line,
    }
}

fn content_of(line: &Line, drag_type: DragType) -> DragContent {
    match drag_type {
        DragType::List | DragType::TodoList => DragContent::List,
        DragType::Line | DragType::Divider | DragType::CodeBlock => DragContent::Text,
        DragType::Embed => match line.as_embed() {
            Some(embed) => match embed.kind() {
                EmbedKind::Image => DragContent::Image,
                EmbedKind::Video => DragContent::Video,
                EmbedKind::File => DragContent::File,
                EmbedKind::Link => DragContent::ExternalLink(embed.service().unwrap_or("link").into()),
                EmbedKind::Divider => DragContent::Text,
                EmbedKind::Other => DragContent::ExternalLink(embed.embed.kind.clone()),
            },
            None => DragContent::Text,
        },
    }
}

/// Dim the dragged nodes and tag them `dragging`, in one update pass.
pub fn mark_dragging(scroll: &mut Scroll, nodes: &[NodeId], opacity: f32) {
    scroll.batch_start();
    for &node in nodes {
        let state = scroll.state_mut(node);
        state.opacity = opacity;
        state.add_class(class::DRAGGING);
    }
    scroll.batch_end();
}

pub fn unmark_dragging(scroll: &mut Scroll, nodes: &[NodeId]) {
    scroll.batch_start();
    for &node in nodes {
        if scroll.contains(node) {
            let state = scroll.state_mut(node);
            state.opacity = 1.0;
            state.remove_class(class::DRAGGING);
        }
    }
    scroll.batch_end();
}

/// Format of the container holding `node`, if it is a list item.
pub fn container_format(scroll: &Scroll, node: NodeId) -> Option<ListFormat> {
    scroll.container_of(node).map(|list| list.format)
}
