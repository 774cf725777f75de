//! The block tree behind an editor.
//!
//! [`Scroll`] owns the document as a list of top-level [`Block`]s: lines and
//! list containers holding lines. It plays the part a DOM plays for a browser
//! editor: every block has a stable [`NodeId`], presentation state hangs off
//! those ids, and layout is computed from the tree.
//!
//! Content edits go through [`Scroll::apply`], which composes the change into
//! the contents and rebuilds the tree while keeping line identities. Drag and
//! drop moves nodes directly with the structural operations and then reports
//! the result as a change.

mod layout;
mod line;
mod node;

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use smol_str::SmolStr;
use tessel_delta::{AttributeMap, Delta, Insert, Op};

use crate::config::{EditorConfig, LayoutConfig};
use crate::error::EditorError;

pub use layout::LineBox;
pub use line::{
    Block, BlockType, EmbedBlock, EmbedKind, Line, LineBody, ListContainer, ListFormat, ListKind,
    ListTag, OBJECT_REPLACEMENT, TextRun, format,
};
pub use node::{EmbedBlot, EmbedSize, EmbedState, NodeId, NodeState, class};

/// Where a node sits in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// A top-level block (a line or a list container).
    Top(usize),
    /// An item of the list container at `container`.
    Item { container: usize, item: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafKind {
    Text,
    InlineEmbed,
    BlockEmbed,
    /// The newline of an empty line.
    Break,
}

/// The innermost content at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leaf {
    /// Line the leaf belongs to.
    pub node: NodeId,
    pub kind: LeafKind,
    /// Offset of the position within the line.
    pub offset: usize,
}

impl Leaf {
    pub fn is_block_embed(&self) -> bool {
        self.kind == LeafKind::BlockEmbed
    }
}

#[derive(Debug, Clone)]
pub struct Scroll {
    blocks: Vec<Block>,
    states: HashMap<NodeId, NodeState>,
    next_node: u64,
    block_embeds: Vec<SmolStr>,
    geometry: LayoutConfig,
    batching: bool,
    batch_dirty: bool,
    update_passes: usize,
}

impl Scroll {
    /// An empty document: one blank line.
    pub fn new(config: &EditorConfig) -> Self {
        Self::from_delta(&Delta::new(), config)
    }

    pub fn from_delta(contents: &Delta, config: &EditorConfig) -> Self {
        let mut scroll = Self {
            blocks: Vec::new(),
            states: HashMap::new(),
            next_node: 0,
            block_embeds: config.block_embeds.clone(),
            geometry: config.layout.clone(),
            batching: false,
            batch_dirty: false,
            update_passes: 0,
        };
        scroll.rebuild(contents, &HashMap::new());
        scroll
    }

    // === Reading ===

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.blocks.iter().flat_map(|block| block.lines().iter())
    }

    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines().len()).sum()
    }

    pub fn length(&self) -> usize {
        self.lines().map(Line::length).sum()
    }

    pub fn contents(&self) -> Delta {
        let mut delta = Delta::new();
        for line in self.lines() {
            line.write_ops(&mut delta);
        }
        delta
    }

    pub fn is_block_embed(&self, kind: &str) -> bool {
        self.block_embeds.iter().any(|k| k == kind)
    }

    /// The line covering `index` and the offset of `index` inside it.
    pub fn line_at(&self, index: usize) -> Option<(&Line, usize)> {
        let mut start = 0;
        for line in self.lines() {
            let len = line.length();
            if index < start + len {
                return Some((line, index - start));
            }
            start += len;
        }
        None
    }

    pub fn leaf_at(&self, index: usize) -> Option<Leaf> {
        let (line, offset) = self.line_at(index)?;
        let kind = match &line.body {
            LineBody::Embed(_) => LeafKind::BlockEmbed,
            LineBody::Text(runs) => {
                let mut start = 0;
                let mut kind = LeafKind::Break;
                for run in runs {
                    let end = start + run.len();
                    if offset < end {
                        kind = match run.insert {
                            Insert::Text(_) => LeafKind::Text,
                            Insert::Embed(_) => LeafKind::InlineEmbed,
                        };
                        break;
                    }
                    start = end;
                }
                kind
            }
        };
        Some(Leaf {
            node: line.node,
            kind,
            offset,
        })
    }

    /// Document index where a node starts. Containers resolve to their first item.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        let mut start = 0;
        for block in &self.blocks {
            if block.node() == node {
                return block.lines().first().map(|_| start);
            }
            for line in block.lines() {
                if line.node == node {
                    return Some(start);
                }
                start += line.length();
            }
        }
        None
    }

    pub fn locate(&self, node: NodeId) -> Option<Location> {
        for (i, block) in self.blocks.iter().enumerate() {
            if block.node() == node {
                return Some(Location::Top(i));
            }
            if let Block::List(list) = block
                && let Some(item) = list.items.iter().position(|l| l.node == node)
            {
                return Some(Location::Item { container: i, item });
            }
        }
        None
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.locate(node).is_some()
    }

    pub fn line(&self, node: NodeId) -> Option<&Line> {
        self.lines().find(|line| line.node == node)
    }

    pub fn container_of(&self, node: NodeId) -> Option<&ListContainer> {
        match self.locate(node)? {
            Location::Item { container, .. } => match &self.blocks[container] {
                Block::List(list) => Some(list),
                Block::Line(_) => None,
            },
            Location::Top(_) => None,
        }
    }

    /// Line immediately before `node` in document order.
    pub fn previous_line(&self, node: NodeId) -> Option<NodeId> {
        let mut previous = None;
        for line in self.lines() {
            if line.node == node {
                return previous;
            }
            previous = Some(line.node);
        }
        None
    }

    pub fn next_line(&self, node: NodeId) -> Option<NodeId> {
        let mut lines = self.lines().skip_while(|line| line.node != node);
        lines.next()?;
        lines.next().map(|line| line.node)
    }

    /// Top-level block following the block at `position`.
    pub fn next_top_level(&self, position: usize) -> Option<NodeId> {
        self.blocks.get(position + 1).map(Block::node)
    }

    // === Presentation state ===

    pub fn state(&self, node: NodeId) -> NodeState {
        self.states.get(&node).cloned().unwrap_or_default()
    }

    /// Mutable presentation state of a node. Counts as a tree update.
    pub fn state_mut(&mut self, node: NodeId) -> &mut NodeState {
        self.note_update();
        self.states.entry(node).or_default()
    }

    pub fn embed_mut(&mut self, node: NodeId) -> Result<&mut EmbedState, EditorError> {
        let is_embed = self
            .line(node)
            .map(Line::is_embed)
            .ok_or(EditorError::UnknownNode(node))?;
        if !is_embed {
            return Err(EditorError::NotAnEmbed(node));
        }
        Ok(&mut self.state_mut(node).embed)
    }

    /// Suspend update passes until [`batch_end`](Self::batch_end).
    pub fn batch_start(&mut self) {
        self.batching = true;
    }

    /// Flush everything mutated since `batch_start` as a single update pass.
    pub fn batch_end(&mut self) {
        self.batching = false;
        if std::mem::take(&mut self.batch_dirty) {
            self.update_passes += 1;
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batching
    }

    /// How many update passes the tree has gone through.
    pub fn update_passes(&self) -> usize {
        self.update_passes
    }

    fn note_update(&mut self) {
        if self.batching {
            self.batch_dirty = true;
        } else {
            self.update_passes += 1;
        }
    }

    fn fresh_node(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    // === Content edits ===

    /// Compose `change` into the contents and rebuild the tree.
    ///
    /// A line keeps its node id when its terminator survives the change.
    pub fn apply(&mut self, change: &Delta) {
        let inherited = self.terminator_map(change);
        let contents = self.contents().compose(change);
        self.rebuild(&contents, &inherited);
        self.note_update();
        tracing::trace!(target: "tessel::engine", length = self.length(), "scroll rebuilt");
    }

    /// Map each surviving line terminator to its position after `change`.
    fn terminator_map(&self, change: &Delta) -> HashMap<usize, NodeId> {
        let mut terminators = Vec::with_capacity(self.line_count());
        let mut end = 0;
        for line in self.lines() {
            end += line.length();
            terminators.push((end - 1, line.node));
        }

        let mut map = HashMap::new();
        let mut pending = terminators.into_iter().peekable();
        let (mut old_pos, mut new_pos) = (0, 0);
        for op in change.ops() {
            match op {
                Op::Insert { insert, .. } => new_pos += insert.len(),
                Op::Retain { len, .. } => {
                    let end = old_pos + len;
                    while let Some(&(at, node)) = pending.peek() {
                        if at >= end {
                            break;
                        }
                        map.insert(new_pos + (at - old_pos), node);
                        pending.next();
                    }
                    old_pos = end;
                    new_pos += len;
                }
                Op::Delete(len) => {
                    let end = old_pos + len;
                    while pending.next_if(|&(at, _)| at < end).is_some() {}
                    old_pos = end;
                }
            }
        }
        for (at, node) in pending {
            map.insert(new_pos + (at - old_pos), node);
        }
        map
    }

    fn rebuild(&mut self, contents: &Delta, inherited: &HashMap<usize, NodeId>) {
        let mut lines: Vec<Line> = Vec::new();
        let mut runs: Vec<TextRun> = Vec::new();
        let mut pos = 0;

        for op in contents.ops() {
            let Op::Insert { insert, attributes } = op else {
                tracing::warn!(target: "tessel::engine", ?op, "non-insert op in document");
                continue;
            };
            match insert {
                Insert::Embed(embed) if self.is_block_embed(&embed.kind) => {
                    // A block embed ends any text before it.
                    if !runs.is_empty() {
                        let node = self.fresh_node();
                        lines.push(Line::text(node, std::mem::take(&mut runs), AttributeMap::new()));
                    }
                    let node = inherited.get(&pos).copied().unwrap_or_else(|| self.fresh_node());
                    lines.push(Line::embed(
                        node,
                        EmbedBlock {
                            embed: embed.clone(),
                            attributes: attributes.clone(),
                        },
                    ));
                    pos += 1;
                }
                Insert::Embed(_) => {
                    push_run(&mut runs, insert.clone(), attributes);
                    pos += 1;
                }
                Insert::Text(text) => {
                    for (i, segment) in text.split('\n').enumerate() {
                        if i > 0 {
                            let node = inherited.get(&pos).copied().unwrap_or_else(|| self.fresh_node());
                            lines.push(Line::text(node, std::mem::take(&mut runs), attributes.clone()));
                            pos += 1;
                        }
                        if !segment.is_empty() {
                            push_run(&mut runs, Insert::Text(segment.to_string()), attributes);
                            pos += segment.chars().count();
                        }
                    }
                }
            }
        }
        if !runs.is_empty() || lines.last().is_none_or(Line::is_embed) {
            let node = self.fresh_node();
            lines.push(Line::text(node, runs, AttributeMap::new()));
        }

        self.blocks = self.group(lines);
        let live: HashSet<NodeId> = self
            .blocks
            .iter()
            .flat_map(|block| std::iter::once(block.node()).chain(block.lines().iter().map(|l| l.node)))
            .collect();
        self.states.retain(|node, _| live.contains(node));
    }

    /// Group consecutive list items into containers, reusing container ids.
    fn group(&mut self, lines: Vec<Line>) -> Vec<Block> {
        let mut previous: HashMap<NodeId, NodeId> = HashMap::new();
        for block in &self.blocks {
            if let Block::List(list) = block {
                for item in &list.items {
                    previous.insert(item.node, list.node);
                }
            }
        }

        let mut used = HashSet::new();
        let mut blocks: Vec<Block> = Vec::new();
        for line in lines {
            let Some(kind) = line.list_kind() else {
                blocks.push(Block::Line(line));
                continue;
            };
            let format = kind.container_format();
            if let Some(Block::List(list)) = blocks.last_mut()
                && list.format == format
            {
                list.items.push(line);
                continue;
            }
            let node = match previous.get(&line.node) {
                Some(&node) if used.insert(node) => node,
                _ => self.fresh_node(),
            };
            blocks.push(Block::List(ListContainer {
                node,
                format,
                items: vec![line],
            }));
        }
        blocks
    }

    // === Structural edits ===

    /// Detach a line from wherever it sits. Containers left empty stay until
    /// [`optimize`](Self::optimize).
    pub fn take_line(&mut self, node: NodeId) -> Result<Line, EditorError> {
        let line = match self.locate(node).ok_or(EditorError::UnknownNode(node))? {
            Location::Top(i) => match &self.blocks[i] {
                Block::Line(_) => match self.blocks.remove(i) {
                    Block::Line(line) => line,
                    Block::List(_) => return Err(EditorError::UnknownNode(node)),
                },
                Block::List(_) => return Err(EditorError::UnknownNode(node)),
            },
            Location::Item { container, item } => match &mut self.blocks[container] {
                Block::List(list) => list.items.remove(item),
                Block::Line(_) => return Err(EditorError::UnknownNode(node)),
            },
        };
        self.note_update();
        Ok(line)
    }

    /// Insert `block` right after `target`. A target inside a list splits its
    /// container so the block lands between the two halves.
    pub fn insert_block_after(&mut self, target: NodeId, block: Block) -> Result<(), EditorError> {
        let position = match self.locate(target).ok_or(EditorError::UnknownNode(target))? {
            Location::Top(i) => i + 1,
            Location::Item { container, item } => {
                self.split_at(container, item + 1);
                container + 1
            }
        };
        self.blocks.insert(position, block);
        self.note_update();
        Ok(())
    }

    /// A fresh list container holding `items`, not yet placed in the tree.
    pub fn new_list(&mut self, format: ListFormat, items: Vec<Line>) -> Block {
        Block::List(ListContainer {
            node: self.fresh_node(),
            format,
            items,
        })
    }

    /// Insert a line into the container of `target`, right after it.
    pub fn insert_item_after(&mut self, target: NodeId, line: Line) -> Result<(), EditorError> {
        match self.locate(target).ok_or(EditorError::UnknownNode(target))? {
            Location::Item { container, item } => {
                if let Block::List(list) = &mut self.blocks[container] {
                    list.items.insert(item + 1, line);
                }
            }
            Location::Top(i) => self.blocks.insert(i + 1, Block::Line(line)),
        }
        self.note_update();
        Ok(())
    }

    /// Insert `block` before the top-level block `reference`.
    pub fn insert_before(&mut self, block: Block, reference: NodeId) -> Result<(), EditorError> {
        let position = match self.locate(reference).ok_or(EditorError::UnknownNode(reference))? {
            Location::Top(i) => i,
            Location::Item { container, item: 0 } => container,
            Location::Item { container, item } => {
                self.split_at(container, item);
                container + 1
            }
        };
        self.blocks.insert(position, block);
        self.note_update();
        Ok(())
    }

    /// Append `block` as the last top-level child.
    pub fn insert_into(&mut self, block: Block) {
        self.blocks.push(block);
        self.note_update();
    }

    /// Move every item after `target` into a new sibling container.
    ///
    /// Returns the new container, or `None` when `target` was the last item
    /// (or not a list item at all).
    pub fn split_container_after(&mut self, target: NodeId) -> Result<Option<NodeId>, EditorError> {
        match self.locate(target).ok_or(EditorError::UnknownNode(target))? {
            Location::Item { container, item } => Ok(self.split_at(container, item + 1)),
            Location::Top(_) => Ok(None),
        }
    }

    fn split_at(&mut self, container: usize, at: usize) -> Option<NodeId> {
        let (format, tail) = match &mut self.blocks[container] {
            Block::List(list) if at < list.items.len() => (list.format, list.items.split_off(at)),
            _ => return None,
        };
        let node = self.fresh_node();
        self.blocks.insert(
            container + 1,
            Block::List(ListContainer {
                node,
                format,
                items: tail,
            }),
        );
        Some(node)
    }

    pub fn empty_containers(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, Block::List(list) if list.items.is_empty()))
            .count()
    }

    /// Remove empty containers and merge neighbouring containers of the same format.
    pub fn optimize(&mut self) {
        let mut merged: Vec<Block> = Vec::with_capacity(self.blocks.len());
        for block in std::mem::take(&mut self.blocks) {
            if matches!(&block, Block::List(list) if list.items.is_empty()) {
                continue;
            }
            let joins = matches!(
                (merged.last(), &block),
                (Some(Block::List(prev)), Block::List(next)) if prev.format == next.format
            );
            if !joins {
                merged.push(block);
            } else if let (Some(Block::List(prev)), Block::List(next)) = (merged.last_mut(), block) {
                prev.items.extend(next.items);
            }
        }
        self.blocks = merged;
        if self.lines().last().is_none_or(Line::is_embed) {
            let node = self.fresh_node();
            self.blocks
                .push(Block::Line(Line::text(node, Vec::new(), AttributeMap::new())));
        }
        self.note_update();
    }

    /// One line per block, for debugging and snapshot tests.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Line(line) => self.outline_line(&mut out, line, ""),
                Block::List(list) => {
                    let tag = match (list.format.tag, list.format.checked) {
                        (_, Some(true)) => "ul checked",
                        (_, Some(false)) => "ul unchecked",
                        (ListTag::Ordered, None) => "ol",
                        (ListTag::Unordered, None) => "ul",
                    };
                    let _ = writeln!(out, "{tag}{}", self.outline_classes(list.node));
                    for item in &list.items {
                        self.outline_line(&mut out, item, "  ");
                    }
                }
            }
        }
        out
    }

    fn outline_line(&self, out: &mut String, line: &Line, prefix: &str) {
        let name = match line.list_kind() {
            Some(kind) if line.indent() > 0 => format!("{}.{}", kind.as_str(), line.indent()),
            Some(kind) => kind.as_str().to_string(),
            None => line.blot_name().to_string(),
        };
        let classes = self.outline_classes(line.node);
        if line.is_embed() {
            let _ = writeln!(out, "{prefix}{name}{classes}");
        } else {
            let _ = writeln!(out, "{prefix}{name} {:?}{classes}", line.aligned_text());
        }
    }

    fn outline_classes(&self, node: NodeId) -> String {
        self.states
            .get(&node)
            .map(|state| state.classes.iter().map(|c| format!(" .{c}")).collect())
            .unwrap_or_default()
    }
}

fn push_run(runs: &mut Vec<TextRun>, insert: Insert, attributes: &AttributeMap) {
    if let (Some(last), Insert::Text(text)) = (runs.last_mut(), &insert)
        && last.attributes == *attributes
        && let Insert::Text(existing) = &mut last.insert
    {
        existing.push_str(text);
        return;
    }
    runs.push(TextRun {
        insert,
        attributes: attributes.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;
    use tessel_delta::Embed;

    fn attrs(value: serde_json::Value) -> AttributeMap {
        serde_json::from_value(value).expect("attribute map")
    }

    fn scroll(contents: Delta) -> Scroll {
        Scroll::from_delta(&contents, &EditorConfig::default())
    }

    fn image() -> Embed {
        Embed::new("image", json!({"src": "a.png"}))
    }

    fn mixed() -> Scroll {
        scroll(
            Delta::new()
                .insert("Title\n")
                .insert("a")
                .insert_with("\n", attrs(json!({"list": "bullet"})))
                .insert("b")
                .insert_with("\n", attrs(json!({"list": "bullet", "indent": 1})))
                .insert("c")
                .insert_with("\n", attrs(json!({"list": "checked"})))
                .insert("d")
                .insert_with("\n", attrs(json!({"list": "unchecked"})))
                .insert_embed(image(), AttributeMap::new())
                .insert("tail\n"),
        )
    }

    #[test]
    fn test_outline_groups_lists() {
        let scroll = mixed();
        assert_snapshot!(scroll.outline(), @r#"
        block "Title"
        ul
          bullet "a"
          bullet.1 "b"
        ul checked
          checked "c"
        ul unchecked
          unchecked "d"
        image
        block "tail"
        "#);
        assert_eq!(scroll.length(), 6 + 2 + 2 + 2 + 2 + 1 + 5);
        assert_eq!(scroll.contents().length(), scroll.length());
    }

    #[test]
    fn test_trailing_embed_gets_a_line() {
        let scroll = scroll(Delta::new().insert("x").insert_embed(image(), AttributeMap::new()));
        // Text before a block embed is flushed into its own line, and the
        // document never ends on the embed.
        assert_snapshot!(scroll.outline(), @r#"
        block "x"
        image
        block ""
        "#);
        assert_eq!(scroll.length(), 4);
    }

    #[test]
    fn test_line_and_leaf_lookup() {
        let scroll = mixed();
        let (line, offset) = scroll.line_at(7).expect("line");
        assert_eq!(line.plain_text(), "a");
        assert_eq!(offset, 1);

        assert_eq!(scroll.line_at(scroll.length()), None);
        let image_index = 14;
        assert_eq!(scroll.leaf_at(image_index).map(|l| l.kind), Some(LeafKind::BlockEmbed));
        assert_eq!(scroll.leaf_at(0).map(|l| l.kind), Some(LeafKind::Text));
        assert_eq!(scroll.leaf_at(4).map(|l| l.kind), Some(LeafKind::Text));
        // A newline is not part of any run.
        assert_eq!(scroll.leaf_at(5).map(|l| l.kind), Some(LeafKind::Break));

        let node = scroll.leaf_at(image_index).map(|l| l.node).expect("leaf");
        assert_eq!(scroll.index_of(node), Some(image_index));
    }

    #[test]
    fn test_apply_keeps_line_identity() {
        let mut scroll = mixed();
        let ids: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();

        // Type into "Title" and delete the "b" line entirely.
        scroll.apply(&Delta::new().retain(2).insert("xx").retain(6).delete(2));

        let after: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();
        assert_eq!(after.len(), ids.len() - 1);
        assert_eq!(after[0], ids[0]);
        assert_eq!(after[1], ids[1]);
        assert_eq!(&after[2..], &ids[3..]);
        assert_eq!(scroll.line(ids[0]).map(Line::plain_text).as_deref(), Some("Tixxtle"));
    }

    #[test]
    fn test_split_newline_keeps_identity_on_tail() {
        let mut scroll = scroll(Delta::new().insert("hello\n"));
        let original = scroll.lines().next().map(|l| l.node).expect("line");

        scroll.apply(&Delta::new().retain(2).insert("\n"));

        let lines: Vec<&Line> = scroll.lines().collect();
        assert_eq!(lines.len(), 2);
        // The old newline now terminates "llo", so that line keeps the id.
        assert_ne!(lines[0].node, original);
        assert_eq!(lines[1].node, original);
        assert_eq!(lines[1].plain_text(), "llo");
    }

    #[test]
    fn test_structural_moves_and_optimize() {
        let mut scroll = mixed();
        let nodes: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();
        let (title, a, b) = (nodes[0], nodes[1], nodes[2]);

        let line = scroll.take_line(title).expect("take");
        scroll.insert_block_after(a, Block::Line(line)).expect("insert");
        assert_snapshot!(scroll.outline(), @r#"
        ul
          bullet "a"
        block "Title"
        ul
          bullet.1 "b"
        ul checked
          checked "c"
        ul unchecked
          unchecked "d"
        image
        block "tail"
        "#);

        let moved = scroll.take_line(nodes[5]).expect("take image");
        let next = scroll.next_top_level(0).expect("sibling");
        scroll.insert_before(Block::Line(moved), next).expect("insert before");
        let title = scroll.take_line(title).expect("take title");
        scroll.insert_into(Block::Line(title));
        scroll.optimize();
        assert_snapshot!(scroll.outline(), @r#"
        ul
          bullet "a"
        image
        ul
          bullet.1 "b"
        ul checked
          checked "c"
        ul unchecked
          unchecked "d"
        block "tail"
        block "Title"
        "#);
        assert_eq!(scroll.index_of(b), Some(3));
    }

    #[test]
    fn test_optimize_merges_and_drops_empty() {
        let mut scroll = mixed();
        let nodes: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();
        let title = scroll.take_line(nodes[0]).expect("take");
        let split = scroll.split_container_after(nodes[1]).expect("split");
        assert!(split.is_some());
        scroll.insert_block_after(nodes[1], Block::Line(title)).expect("insert");
        let title = scroll.take_line(nodes[0]).expect("take again");
        scroll.insert_block_after(nodes[6], Block::Line(title)).expect("insert at end");

        let _ = scroll.take_line(nodes[3]).expect("take checked item");
        assert_eq!(scroll.empty_containers(), 1);
        scroll.optimize();
        assert_eq!(scroll.empty_containers(), 0);
        assert_snapshot!(scroll.outline(), @r#"
        ul
          bullet "a"
          bullet.1 "b"
        ul unchecked
          unchecked "d"
        image
        block "tail"
        block "Title"
        "#);
    }

    #[test]
    fn test_batch_coalesces_updates() {
        let mut scroll = mixed();
        let nodes: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();
        let before = scroll.update_passes();

        scroll.batch_start();
        for node in &nodes {
            scroll.state_mut(*node).add_class(class::DRAGGING);
        }
        assert_eq!(scroll.update_passes(), before);
        scroll.batch_end();
        assert_eq!(scroll.update_passes(), before + 1);

        scroll.batch_start();
        scroll.batch_end();
        assert_eq!(scroll.update_passes(), before + 1);
    }

    #[test]
    fn test_state_dropped_with_node() {
        let mut scroll = scroll(Delta::new().insert("a\nb\n"));
        let b = scroll.lines().nth(1).map(|l| l.node).expect("b");
        scroll.state_mut(b).add_class(class::DRAGOVER);
        scroll.apply(&Delta::new().retain(2).delete(2));
        assert!(!scroll.contains(b));
        assert!(scroll.state(b).is_default());
    }
}
