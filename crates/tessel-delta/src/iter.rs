//! Length-aware iteration over delta ops.

use crate::attributes::AttributeMap;
use crate::op::{Insert, Op, OpKind, slice_chars};

/// Iterates ops in arbitrary length chunks, splitting ops as needed.
///
/// Past the end the iterator behaves like an infinite plain retain, which is
/// what compose and transform expect from an exhausted side.
#[derive(Debug, Clone)]
pub struct OpIterator<'a> {
    ops: &'a [Op],
    index: usize,
    offset: usize,
}

impl<'a> OpIterator<'a> {
    pub fn new(ops: &'a [Op]) -> Self {
        Self {
            ops,
            index: 0,
            offset: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    /// The op under the cursor, ignoring any partial offset.
    pub fn peek(&self) -> Option<&'a Op> {
        self.ops.get(self.index)
    }

    /// Remaining length of the current op, `usize::MAX` when exhausted.
    pub fn peek_len(&self) -> usize {
        match self.peek() {
            Some(op) => op.len() - self.offset,
            None => usize::MAX,
        }
    }

    pub fn peek_kind(&self) -> OpKind {
        self.peek().map(Op::kind).unwrap_or(OpKind::Retain)
    }

    /// Take up to `length` from the current op.
    pub fn next_len(&mut self, length: usize) -> Op {
        let Some(op) = self.ops.get(self.index) else {
            return Op::Retain {
                len: length,
                attributes: AttributeMap::new(),
            };
        };

        let offset = self.offset;
        let op_len = op.len();
        let length = if length >= op_len - offset {
            self.index += 1;
            self.offset = 0;
            op_len - offset
        } else {
            self.offset += length;
            length
        };

        match op {
            Op::Delete(_) => Op::Delete(length),
            Op::Retain { attributes, .. } => Op::Retain {
                len: length,
                attributes: attributes.clone(),
            },
            Op::Insert { insert, attributes } => {
                let insert = match insert {
                    Insert::Text(text) => Insert::Text(slice_chars(text, offset, length).to_string()),
                    Insert::Embed(embed) => Insert::Embed(embed.clone()),
                };
                Op::Insert {
                    insert,
                    attributes: attributes.clone(),
                }
            }
        }
    }

    /// Take the whole remainder of the current op.
    pub fn next_op(&mut self) -> Op {
        self.next_len(usize::MAX)
    }

    /// Everything not yet consumed, including the tail of a split op.
    pub fn rest(&self) -> Vec<Op> {
        if !self.has_next() {
            return Vec::new();
        }
        if self.offset == 0 {
            return self.ops[self.index..].to_vec();
        }
        let mut tail = self.clone();
        let mut rest = vec![tail.next_op()];
        rest.extend_from_slice(&self.ops[tail.index..]);
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Delta;

    #[test]
    fn test_split_text_insert() {
        let delta = Delta::new().insert("hello").retain(3).delete(2);
        let mut iter = OpIterator::new(delta.ops());

        assert_eq!(iter.peek_len(), 5);
        let first = iter.next_len(2);
        assert_eq!(first, Op::Insert { insert: Insert::Text("he".into()), attributes: Default::default() });
        assert_eq!(iter.peek_len(), 3);

        let rest = iter.rest();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].len(), 3);

        assert_eq!(iter.next_op().len(), 3);
        assert_eq!(iter.peek_kind(), OpKind::Retain);
        assert_eq!(iter.next_len(10).len(), 3);
        assert_eq!(iter.peek_kind(), OpKind::Delete);
        assert_eq!(iter.next_op(), Op::Delete(2));
        assert!(!iter.has_next());
        assert_eq!(iter.peek_len(), usize::MAX);
    }
}
