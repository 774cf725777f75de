//! The editing engine: contents, selection and change events.
//!
//! [`Editor`] wraps a [`Scroll`] with the operations subsystems need: index
//! queries, sourced edits, and a selection that follows edits. Every edit and
//! selection change is queued as an [`EngineEvent`]; the session drains the
//! queue and routes events to handlers, which filter on [`Source`].

use tessel_delta::{AttributeMap, Delta, Embed, Insert, Op, Value};

use crate::config::EditorConfig;
use crate::document::{Leaf, Line, NodeId, Scroll};
use crate::types::{Bounds, EditorId, Range, Source};

/// Something the engine did.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TextChange {
        delta: Delta,
        old_contents: Delta,
        source: Source,
    },
    SelectionChange {
        range: Option<Range>,
        old_range: Option<Range>,
        source: Source,
    },
}

#[derive(Debug)]
pub struct Editor {
    id: EditorId,
    main: bool,
    scroll: Scroll,
    selection: Option<Range>,
    events: Vec<EngineEvent>,
    scroll_top: f64,
    viewport_height: f64,
}

impl Editor {
    pub fn new(id: EditorId, main: bool, contents: &Delta, config: &EditorConfig) -> Self {
        Self {
            id,
            main,
            scroll: Scroll::from_delta(contents, config),
            selection: None,
            events: Vec::new(),
            scroll_top: 0.0,
            viewport_height: 0.0,
        }
    }

    pub fn id(&self) -> &EditorId {
        &self.id
    }

    /// Whether this is the page's main document editor (as opposed to a
    /// comment or caption editor).
    pub fn is_main(&self) -> bool {
        self.main
    }

    pub fn scroll(&self) -> &Scroll {
        &self.scroll
    }

    /// Direct access to the tree for structural edits. Callers report what
    /// they did with [`commit_structure`](Self::commit_structure).
    pub fn scroll_mut(&mut self) -> &mut Scroll {
        &mut self.scroll
    }

    // === Queries ===

    pub fn length(&self) -> usize {
        self.scroll.length()
    }

    pub fn get_contents(&self) -> Delta {
        self.scroll.contents()
    }

    pub fn get_contents_range(&self, index: usize, length: usize) -> Delta {
        self.scroll.contents().slice(index, index + length)
    }

    /// Text in a range. Embeds are left out.
    pub fn get_text(&self, index: usize, length: usize) -> String {
        self.get_contents_range(index, length)
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn get_line(&self, index: usize) -> Option<(&Line, usize)> {
        self.scroll.line_at(index)
    }

    pub fn get_leaf(&self, index: usize) -> Option<Leaf> {
        self.scroll.leaf_at(index)
    }

    pub fn get_index(&self, node: NodeId) -> Option<usize> {
        self.scroll.index_of(node)
    }

    pub fn get_bounds(&self, index: usize, length: usize) -> Option<Bounds> {
        self.scroll.bounds(index, length)
    }

    /// Formats shared by the whole range: block formats of the lines it
    /// touches plus inline formats of the text it covers.
    pub fn get_format(&self, index: usize, length: usize) -> AttributeMap {
        let mut combined: Option<AttributeMap> = None;
        let mut intersect = |attrs: &AttributeMap| {
            combined = Some(match combined.take() {
                None => attrs.clone(),
                Some(acc) => acc
                    .into_iter()
                    .filter(|(k, v)| attrs.get(k) == Some(v))
                    .collect(),
            });
        };

        let end = index + length.max(1);
        let mut start = 0;
        for line in self.scroll.lines() {
            let line_end = start + line.length();
            if line_end > index && start < end {
                intersect(&line.format);
            }
            start = line_end;
            if start >= end {
                break;
            }
        }
        let mut inline: Option<AttributeMap> = None;
        let slice = if length == 0 {
            // A caret takes the formats of the char before it.
            self.get_contents_range(index.saturating_sub(1), usize::from(index > 0))
        } else {
            self.get_contents_range(index, length)
        };
        for op in slice.ops() {
            if let Op::Insert { insert, attributes } = op {
                if insert.as_text().is_some_and(|t| t.chars().all(|c| c == '\n')) {
                    continue;
                }
                inline = Some(match inline {
                    None => attributes.clone(),
                    Some(acc) => acc
                        .into_iter()
                        .filter(|(k, v)| attributes.get(k) == Some(v))
                        .collect::<AttributeMap>(),
                });
            }
        }

        let mut format = combined.unwrap_or_default();
        format.extend(inline.unwrap_or_default());
        format
    }

    // === Edits ===

    /// Apply a change and emit it. Returns the change as applied.
    pub fn update_contents(&mut self, change: Delta, source: Source) -> Delta {
        let change = change.chop();
        if change.is_empty() {
            return change;
        }
        let old_contents = self.scroll.contents();
        self.scroll.apply(&change);
        tracing::debug!(
            target: "tessel::engine",
            editor = %self.id,
            ?source,
            delta_len = change.change_length(),
            "text change"
        );
        self.shift_selection(&change, source);
        self.events.push(EngineEvent::TextChange {
            delta: change.clone(),
            old_contents,
            source,
        });
        change
    }

    pub fn insert_text(
        &mut self,
        index: usize,
        text: &str,
        attributes: AttributeMap,
        source: Source,
    ) -> Delta {
        self.update_contents(Delta::new().retain(index).insert_with(text, attributes), source)
    }

    pub fn insert_embed(
        &mut self,
        index: usize,
        embed: Embed,
        attributes: AttributeMap,
        source: Source,
    ) -> Delta {
        self.update_contents(Delta::new().retain(index).insert_embed(embed, attributes), source)
    }

    pub fn delete_text(&mut self, index: usize, length: usize, source: Source) -> Delta {
        self.update_contents(Delta::new().retain(index).delete(length), source)
    }

    /// Apply inline attributes to a range. Newlines are left alone.
    pub fn format_text(
        &mut self,
        index: usize,
        length: usize,
        attributes: AttributeMap,
        source: Source,
    ) -> Delta {
        let mut change = Delta::new().retain(index);
        for op in self.get_contents_range(index, length).ops() {
            let Op::Insert { insert, .. } = op else {
                continue;
            };
            match insert {
                Insert::Text(text) => {
                    for (i, segment) in text.split('\n').enumerate() {
                        if i > 0 {
                            change = change.retain(1);
                        }
                        let len = segment.chars().count();
                        change = change.retain_with(len, attributes.clone());
                    }
                }
                Insert::Embed(_) => change = change.retain_with(1, attributes.clone()),
            }
        }
        self.update_contents(change, source)
    }

    /// Apply block attributes to every line touched by the range.
    pub fn format_line(
        &mut self,
        index: usize,
        length: usize,
        attributes: AttributeMap,
        source: Source,
    ) -> Delta {
        let end = index + length;
        let mut change = Delta::new();
        let mut start = 0;
        let mut cursor = 0;
        for line in self.scroll.lines() {
            let line_end = start + line.length();
            let touched = line_end > index && (start < end || start == index);
            if touched && !line.is_embed() {
                let terminator = line_end - 1;
                change = change
                    .retain(terminator - cursor)
                    .retain_with(1, attributes.clone());
                cursor = line_end;
            }
            start = line_end;
        }
        self.update_contents(change, source)
    }

    /// Report structural edits made through [`scroll_mut`](Self::scroll_mut)
    /// as a text change against the contents from before the edit.
    pub fn commit_structure(&mut self, old_contents: Delta, source: Source) -> Delta {
        let new_contents = self.scroll.contents();
        let change = old_contents.diff(&new_contents);
        if change.is_empty() {
            return change;
        }
        tracing::debug!(target: "tessel::engine", editor = %self.id, ?source, "structural change");
        self.shift_selection(&change, source);
        self.events.push(EngineEvent::TextChange {
            delta: change.clone(),
            old_contents,
            source,
        });
        change
    }

    // === Selection ===

    pub fn get_selection(&self) -> Option<Range> {
        self.selection
    }

    pub fn set_selection(&mut self, range: Option<Range>, source: Source) {
        let range = range.map(|r| r.clamp_to(self.length()));
        if range == self.selection {
            return;
        }
        let old_range = std::mem::replace(&mut self.selection, range);
        tracing::trace!(target: "tessel::engine", editor = %self.id, ?range, ?source, "selection change");
        self.events.push(EngineEvent::SelectionChange {
            range,
            old_range,
            source,
        });
    }

    /// Carry the selection through a change. Only local changes push a caret
    /// sitting exactly at an insert.
    fn shift_selection(&mut self, change: &Delta, source: Source) {
        let Some(range) = self.selection else {
            return;
        };
        let priority = !source.is_user();
        let start = change.transform_position(range.index, priority);
        let end = change.transform_position(range.end(), priority);
        self.selection = Some(Range::spanning(start, end).clamp_to(self.length()));
    }

    // === Events ===

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // === Viewport ===

    pub fn set_viewport(&mut self, scroll_top: f64, height: f64) {
        self.scroll_top = scroll_top;
        self.viewport_height = height;
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }
}

/// `{"author": author}` attribute map.
pub fn author_attributes(author: &str) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert(
        crate::document::format::AUTHOR.into(),
        Value::String(author.to_string()),
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> AttributeMap {
        serde_json::from_value(value).expect("attribute map")
    }

    fn editor(contents: Delta) -> Editor {
        Editor::new(EditorId::new("main"), true, &contents, &EditorConfig::default())
    }

    #[test]
    fn test_edits_emit_text_changes() {
        let mut editor = editor(Delta::new().insert("hello\n"));
        editor.insert_text(5, " world", AttributeMap::new(), Source::User);
        editor.delete_text(0, 1, Source::Api);

        let events = editor.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            EngineEvent::TextChange { source: Source::User, old_contents, .. }
                if *old_contents == Delta::new().insert("hello\n")
        ));
        assert_eq!(editor.get_text(0, editor.length()), "ello world\n");
        assert!(!editor.has_pending_events());
    }

    #[test]
    fn test_selection_follows_edits() {
        let mut editor = editor(Delta::new().insert("abcdef\n"));
        editor.set_selection(Some(Range::caret(3)), Source::User);

        // A remote insert at the caret keeps the caret in place.
        editor.insert_text(3, "XY", AttributeMap::new(), Source::Api);
        assert_eq!(editor.get_selection(), Some(Range::caret(3)));

        // Local typing at the caret moves it past the insert.
        editor.insert_text(3, "Z", AttributeMap::new(), Source::User);
        assert_eq!(editor.get_selection(), Some(Range::caret(4)));

        // Deleting around it clamps to the deletion start.
        editor.delete_text(1, 5, Source::Api);
        assert_eq!(editor.get_selection(), Some(Range::caret(1)));

        // Only the explicit set_selection produced an event.
        let selection_events = editor
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::SelectionChange { .. }))
            .count();
        assert_eq!(selection_events, 1);
    }

    #[test]
    fn test_set_selection_dedupes_and_clamps() {
        let mut editor = editor(Delta::new().insert("abc\n"));
        editor.set_selection(Some(Range::new(2, 10)), Source::User);
        assert_eq!(editor.get_selection(), Some(Range::new(2, 1)));
        editor.set_selection(Some(Range::new(2, 1)), Source::User);
        editor.set_selection(None, Source::Silent);
        let events = editor.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            EngineEvent::SelectionChange { range: None, source: Source::Silent, .. }
        ));
    }

    #[test]
    fn test_format_text_skips_newlines() {
        let mut editor = editor(Delta::new().insert("ab\ncd\n"));
        let change = editor.format_text(1, 3, attrs(json!({"bold": true})), Source::User);
        assert_eq!(
            change,
            Delta::new()
                .retain(1)
                .retain_with(1, attrs(json!({"bold": true})))
                .retain(1)
                .retain_with(1, attrs(json!({"bold": true})))
        );
        assert_eq!(editor.get_format(3, 1).get("bold"), Some(&json!(true)));
        assert_eq!(editor.get_format(0, 1).get("bold"), None);
    }

    #[test]
    fn test_format_line_and_get_format() {
        let mut editor = editor(Delta::new().insert("one\ntwo\nthree\n"));
        editor.format_line(1, 5, attrs(json!({"code-block": true})), Source::User);

        let names: Vec<String> = editor.scroll().lines().map(|l| l.blot_name().to_string()).collect();
        assert_eq!(names, vec!["code-block", "code-block", "block"]);
        assert_eq!(editor.get_format(5, 0).get("code-block"), Some(&json!(true)));
        assert_eq!(editor.get_format(0, 10).get("code-block"), None);
    }

    #[test]
    fn test_commit_structure_reports_diff() {
        let mut editor = editor(Delta::new().insert("a\nb\n"));
        let old = editor.get_contents();
        let nodes: Vec<NodeId> = editor.scroll().lines().map(|l| l.node).collect();

        let line = editor.scroll_mut().take_line(nodes[0]).expect("take");
        editor
            .scroll_mut()
            .insert_block_after(nodes[1], crate::document::Block::Line(line))
            .expect("insert");
        let change = editor.commit_structure(old.clone(), Source::Api);

        assert_eq!(old.compose(&change), editor.get_contents());
        assert_eq!(editor.get_text(0, 4), "b\na\n");
        assert_eq!(editor.take_events().len(), 1);
    }
}
