//! Vertical layout of the block tree.
//!
//! Heights come from [`LayoutConfig`](crate::config::LayoutConfig): text
//! lines wrap at a fixed char width, embeds use their measured size when
//! they have one.

use super::{BlockType, EmbedKind, Line, NodeId, Scroll};
use crate::types::Bounds;

/// Box of one line relative to the top of the scroll container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineBox {
    pub node: NodeId,
    /// Document index of the line start.
    pub index: usize,
    pub offset_top: f64,
    pub client_height: f64,
}

impl LineBox {
    pub fn bottom(&self) -> f64 {
        self.offset_top + self.client_height
    }

    /// Whether `y` falls inside the box. The bottom edge belongs to the next box.
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.offset_top && y < self.bottom()
    }
}

impl Scroll {
    pub fn layout(&self) -> Vec<LineBox> {
        let mut boxes = Vec::with_capacity(self.line_count());
        let mut top = 0.0;
        let mut index = 0;
        for line in self.lines() {
            top += self.states.get(&line.node).map_or(0.0, |s| s.margin_top);
            let height = self.line_height(line);
            boxes.push(LineBox {
                node: line.node,
                index,
                offset_top: top,
                client_height: height,
            });
            top += height;
            index += line.length();
        }
        boxes
    }

    pub fn line_box(&self, node: NodeId) -> Option<LineBox> {
        self.layout().into_iter().find(|b| b.node == node)
    }

    pub fn content_height(&self) -> f64 {
        self.layout().last().map_or(0.0, LineBox::bottom)
    }

    pub fn set_content_width(&mut self, width: f64) {
        self.geometry.content_width = width;
        self.note_update();
    }

    pub fn content_width(&self) -> f64 {
        self.geometry.content_width
    }

    fn row_height(&self, line: &Line) -> f64 {
        match line.block_type() {
            BlockType::Header(level) => self.geometry.heading_height(level),
            BlockType::CodeBlock => self.geometry.code_line_height,
            _ => self.geometry.line_height,
        }
    }

    fn rows(&self, line: &Line) -> usize {
        let chars = line.length() - 1;
        chars.div_ceil(self.geometry.chars_per_row()).max(1)
    }

    pub fn line_height(&self, line: &Line) -> f64 {
        match line.block_type() {
            BlockType::Embed(EmbedKind::Divider) => self.geometry.divider_height,
            BlockType::Embed(_) => self
                .states
                .get(&line.node)
                .and_then(|s| s.embed.size)
                .map_or(self.geometry.embed_height, |size| size.height),
            _ => self.row_height(line) * self.rows(line) as f64,
        }
    }

    /// Bounds of a range relative to the scroll container.
    ///
    /// A collapsed range gives a zero-width caret box. A range spanning rows
    /// covers the full content width from the first row to the last.
    pub fn bounds(&self, index: usize, length: usize) -> Option<Bounds> {
        let start = self.caret_bounds(index)?;
        if length == 0 {
            return Some(start);
        }
        let end = self.caret_bounds(index + length - 1)?;
        if end.top == start.top {
            let right = if end.width > 0.0 {
                end.right()
            } else {
                (end.left + self.geometry.char_width).min(self.geometry.content_width)
            };
            return Some(Bounds::new(
                start.top,
                start.left,
                (right - start.left).max(0.0),
                start.height,
            ));
        }
        Some(Bounds::new(
            start.top,
            0.0,
            self.geometry.content_width,
            end.bottom() - start.top,
        ))
    }

    fn caret_bounds(&self, index: usize) -> Option<Bounds> {
        let (line, offset) = self.line_at(index)?;
        let line_box = self.line_box(line.node)?;
        if line.is_embed() {
            return Some(Bounds::new(
                line_box.offset_top,
                0.0,
                self.geometry.content_width,
                line_box.client_height,
            ));
        }
        let per_row = self.geometry.chars_per_row();
        let row_height = self.row_height(line);
        let row = (offset / per_row).min(self.rows(line) - 1);
        let column = offset - row * per_row;
        Some(Bounds::new(
            line_box.offset_top + row as f64 * row_height,
            (column as f64 * self.geometry.char_width).min(self.geometry.content_width),
            0.0,
            row_height,
        ))
    }
}
