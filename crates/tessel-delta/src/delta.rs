//! The delta type: builder, compose, slice, diff and position transforms.

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeMap, compose_attributes};
use crate::iter::OpIterator;
use crate::op::{Embed, Insert, Op, OpKind};

/// An ordered sequence of ops describing either a document or a change.
///
/// Builder methods keep the op list canonical: adjacent compatible ops are
/// merged, zero-length ops are dropped, and an insert is always placed before
/// a delete at the same position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a delta by pushing each op (merging as it goes).
    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        let mut delta = Self::new();
        for op in ops {
            delta.push(op);
        }
        delta
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn iter(&self) -> OpIterator<'_> {
        OpIterator::new(&self.ops)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn insert(self, text: impl Into<String>) -> Self {
        self.insert_with(text, AttributeMap::new())
    }

    pub fn insert_with(mut self, text: impl Into<String>, attributes: AttributeMap) -> Self {
        self.push(Op::Insert {
            insert: Insert::Text(text.into()),
            attributes,
        });
        self
    }

    pub fn insert_embed(mut self, embed: Embed, attributes: AttributeMap) -> Self {
        self.push(Op::Insert {
            insert: Insert::Embed(embed),
            attributes,
        });
        self
    }

    pub fn retain(self, len: usize) -> Self {
        self.retain_with(len, AttributeMap::new())
    }

    pub fn retain_with(mut self, len: usize, attributes: AttributeMap) -> Self {
        self.push(Op::Retain { len, attributes });
        self
    }

    pub fn delete(mut self, len: usize) -> Self {
        self.push(Op::Delete(len));
        self
    }

    /// Append an op, merging it into the previous one when possible.
    pub fn push(&mut self, op: Op) -> &mut Self {
        if op.is_empty() {
            return self;
        }

        if let (Some(Op::Delete(last)), Op::Delete(len)) = (self.ops.last_mut(), &op) {
            *last += *len;
            return self;
        }

        let mut index = self.ops.len();
        if op.is_insert() && matches!(self.ops.last(), Some(Op::Delete(_))) {
            index -= 1;
            if index == 0 {
                self.ops.insert(0, op);
                return self;
            }
        }

        if index > 0 {
            match (&mut self.ops[index - 1], &op) {
                (
                    Op::Insert {
                        insert: Insert::Text(last),
                        attributes: last_attrs,
                    },
                    Op::Insert {
                        insert: Insert::Text(text),
                        attributes,
                    },
                ) if *last_attrs == *attributes => {
                    last.push_str(text);
                    return self;
                }
                (
                    Op::Retain {
                        len: last,
                        attributes: last_attrs,
                    },
                    Op::Retain { len, attributes },
                ) if *last_attrs == *attributes => {
                    *last = last.saturating_add(*len);
                    return self;
                }
                _ => {}
            }
        }

        self.ops.insert(index, op);
        self
    }

    /// Drop a trailing plain retain, which is a no-op at the end of a change.
    pub fn chop(mut self) -> Self {
        if let Some(Op::Retain { attributes, .. }) = self.ops.last() {
            if attributes.is_empty() {
                self.ops.pop();
            }
        }
        self
    }

    /// Total length of all ops.
    pub fn length(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    /// Net change in document length when this delta is applied.
    pub fn change_length(&self) -> isize {
        self.ops.iter().fold(0isize, |acc, op| match op {
            Op::Insert { insert, .. } => acc + insert.len() as isize,
            Op::Delete(len) => acc - *len as isize,
            Op::Retain { .. } => acc,
        })
    }

    /// Whether this delta only inserts, i.e. describes a document.
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Op::is_insert)
    }

    /// Concatenate two deltas, merging at the seam.
    pub fn concat(&self, other: &Delta) -> Delta {
        let mut out = self.clone();
        for op in &other.ops {
            out.push(op.clone());
        }
        out
    }

    /// Ops covering `start..end` of this delta.
    pub fn slice(&self, start: usize, end: usize) -> Delta {
        let mut out = Delta::new();
        let mut iter = self.iter();
        let mut index = 0;
        while index < end && iter.has_next() {
            let op = if index < start {
                iter.next_len(start - index)
            } else {
                let op = iter.next_len(end - index);
                out.push(op.clone());
                op
            };
            index += op.len();
        }
        out
    }

    /// Apply `other` on top of `self`.
    pub fn compose(&self, other: &Delta) -> Delta {
        let mut this_iter = self.iter();
        let mut other_iter = other.iter();
        let mut out = Delta::new();

        // Fast path: a leading plain retain in `other` passes inserts through untouched.
        if let Some(Op::Retain { len, attributes }) = other_iter.peek() {
            if attributes.is_empty() {
                let mut first_left = *len;
                while this_iter.peek_kind() == OpKind::Insert && this_iter.peek_len() <= first_left
                {
                    first_left -= this_iter.peek_len();
                    out.ops.push(this_iter.next_op());
                }
                if *len - first_left > 0 {
                    other_iter.next_len(*len - first_left);
                }
            }
        }

        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek_kind() == OpKind::Insert {
                out.push(other_iter.next_op());
            } else if this_iter.peek_kind() == OpKind::Delete {
                out.push(this_iter.next_op());
            } else {
                let length = this_iter.peek_len().min(other_iter.peek_len());
                let this_op = this_iter.next_len(length);
                let other_op = other_iter.next_len(length);
                match other_op {
                    Op::Retain {
                        attributes: other_attrs,
                        ..
                    } => {
                        let new_op = match this_op {
                            Op::Retain { attributes, .. } => Op::Retain {
                                len: length,
                                attributes: compose_attributes(&attributes, &other_attrs, true),
                            },
                            Op::Insert { insert, attributes } => Op::Insert {
                                insert,
                                attributes: compose_attributes(&attributes, &other_attrs, false),
                            },
                            Op::Delete(_) => continue,
                        };
                        out.push(new_op.clone());
                        if !other_iter.has_next() && out.ops.last() == Some(&new_op) {
                            let rest = Delta::from_ops(this_iter.rest());
                            return out.concat(&rest).chop();
                        }
                    }
                    Op::Delete(len) => {
                        if this_op.is_retain() {
                            out.push(Op::Delete(len));
                        }
                    }
                    Op::Insert { .. } => {}
                }
            }
        }
        out.chop()
    }

    /// Where `index` lands after this delta is applied.
    ///
    /// Inserts before `index` shift it right. An insert exactly at `index`
    /// shifts it right unless `priority` is set. Deletes before `index` shift
    /// it left, clamped at the start of the deleted span.
    pub fn transform_position(&self, index: usize, priority: bool) -> usize {
        let mut iter = self.iter();
        let mut index = index;
        let mut offset = 0;
        while iter.has_next() && offset <= index {
            let length = iter.peek_len();
            let kind = iter.peek_kind();
            iter.next_op();
            match kind {
                OpKind::Delete => {
                    index -= length.min(index - offset);
                    continue;
                }
                OpKind::Insert if offset < index || !priority => {
                    index += length;
                }
                _ => {}
            }
            offset += length;
        }
        index
    }

    /// Change turning document `self` into document `other`.
    ///
    /// Works on the common prefix and suffix, so a moved block shows up as
    /// one delete plus one insert covering the span between its old and new
    /// positions.
    pub fn diff(&self, other: &Delta) -> Delta {
        let old = self.atoms();
        let new = other.atoms();

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let mut out = Delta::new()
            .retain(prefix)
            .delete(old.len() - prefix - suffix);
        for (atom, attributes) in &new[prefix..new.len() - suffix] {
            let insert = match atom {
                Atom::Char(ch) => Insert::Text(ch.to_string()),
                Atom::Embed(embed) => Insert::Embed((*embed).clone()),
            };
            out.push(Op::Insert {
                insert,
                attributes: (*attributes).clone(),
            });
        }
        out.chop()
    }

    fn atoms(&self) -> Vec<(Atom<'_>, &AttributeMap)> {
        let mut atoms = Vec::new();
        for op in &self.ops {
            if let Op::Insert { insert, attributes } = op {
                match insert {
                    Insert::Text(text) => {
                        atoms.extend(text.chars().map(|ch| (Atom::Char(ch), attributes)))
                    }
                    Insert::Embed(embed) => atoms.push((Atom::Embed(embed), attributes)),
                }
            }
        }
        atoms
    }
}

#[derive(Debug, PartialEq)]
enum Atom<'a> {
    Char(char),
    Embed(&'a Embed),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smol_str::SmolStr;

    fn attrs(key: &str, value: serde_json::Value) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert(SmolStr::new(key), value);
        map
    }

    #[test]
    fn test_push_merges_and_orders() {
        let delta = Delta::new().retain(2).retain(3).delete(1).insert("ab").insert("c");
        assert_eq!(
            delta.ops(),
            &[
                Op::Retain { len: 5, attributes: AttributeMap::new() },
                Op::Insert { insert: Insert::Text("abc".into()), attributes: AttributeMap::new() },
                Op::Delete(1),
            ]
        );
        assert_eq!(Delta::new().retain(0).insert("").delete(0), Delta::new());
    }

    #[test]
    fn test_compose_insert_then_delete() {
        let doc = Delta::new().insert("hello\n");
        let change = Delta::new().retain(1).delete(3);
        assert_eq!(doc.compose(&change), Delta::new().insert("ho\n"));
    }

    #[test]
    fn test_compose_formats_inserted_text() {
        let doc = Delta::new().insert("abc\n");
        let change = Delta::new().retain(1).retain_with(2, attrs("author", json!("u1")));
        assert_eq!(
            doc.compose(&change),
            Delta::new()
                .insert("a")
                .insert_with("bc", attrs("author", json!("u1")))
                .insert("\n")
        );
    }

    #[test]
    fn test_compose_null_attribute_removes() {
        let doc = Delta::new().insert_with("ab", attrs("bold", json!(true)));
        let change = Delta::new().retain_with(1, attrs("bold", serde_json::Value::Null));
        assert_eq!(
            doc.compose(&change),
            Delta::new().insert("a").insert_with("b", attrs("bold", json!(true)))
        );
    }

    #[test]
    fn test_compose_changes() {
        let a = Delta::new().retain(2).insert("x");
        let b = Delta::new().retain(4).delete(1);
        assert_eq!(a.compose(&b), Delta::new().retain(2).insert("x").retain(1).delete(1));
    }

    #[test]
    fn test_transform_position_insert() {
        let change = Delta::new().retain(3).insert("ab");
        assert_eq!(change.transform_position(2, false), 2);
        assert_eq!(change.transform_position(3, false), 5);
        assert_eq!(change.transform_position(3, true), 3);
        assert_eq!(change.transform_position(4, true), 6);
    }

    #[test]
    fn test_transform_position_delete() {
        let change = Delta::new().retain(2).delete(3);
        assert_eq!(change.transform_position(1, false), 1);
        assert_eq!(change.transform_position(3, false), 2);
        assert_eq!(change.transform_position(5, false), 2);
        assert_eq!(change.transform_position(9, false), 6);
    }

    #[test]
    fn test_slice() {
        let doc = Delta::new()
            .insert("ab")
            .insert_embed(Embed::new("image", json!({"src": "x"})), AttributeMap::new())
            .insert("cd\n");
        assert_eq!(doc.length(), 6);
        assert_eq!(
            doc.slice(1, 4),
            Delta::new()
                .insert("b")
                .insert_embed(Embed::new("image", json!({"src": "x"})), AttributeMap::new())
                .insert("c")
        );
    }

    #[test]
    fn test_diff_moved_line() {
        let old = Delta::new().insert("a\nb\nc\n");
        let new = Delta::new().insert("b\na\nc\n");
        let change = old.diff(&new);
        assert_eq!(old.compose(&change), new);
        assert_eq!(change, Delta::new().insert("b\na").delete(3));
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let doc = Delta::new().insert("same\n");
        assert!(doc.diff(&doc.clone()).is_empty());
    }

    #[test]
    fn test_change_length() {
        let change = Delta::new().retain(4).insert("abc").delete(5);
        assert_eq!(change.change_length(), -2);
        assert!(!change.is_document());
        assert!(Delta::new().insert("x").is_document());
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let delta = Delta::new()
            .retain(1)
            .insert_with("x", attrs("author", json!("u1")))
            .delete(2);
        let value = serde_json::to_value(&delta).expect("serialize");
        assert_eq!(
            value,
            json!({"ops": [
                {"retain": 1},
                {"insert": "x", "attributes": {"author": "u1"}},
                {"delete": 2}
            ]})
        );
        let back: Delta = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, delta);
    }
}
