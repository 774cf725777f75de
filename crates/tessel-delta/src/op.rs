//! Delta operations and their JSON shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::attributes::AttributeMap;
use crate::error::DeltaError;

/// A non-text insert (image, divider, mention, ...). Always length 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    /// Embed type name, the single key of the JSON insert object.
    pub kind: SmolStr,
    /// Embed payload.
    pub value: Value,
}

impl Embed {
    pub fn new(kind: impl Into<SmolStr>, value: Value) -> Self {
        Self {
            kind: kind.into(),
            value,
        }
    }
}

/// Inserted content.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

impl Insert {
    /// Length in chars; embeds count as one.
    pub fn len(&self) -> usize {
        match self {
            Insert::Text(text) => text.chars().count(),
            Insert::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Insert::Text(text) => Some(text),
            Insert::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Insert::Text(_) => None,
            Insert::Embed(embed) => Some(embed),
        }
    }
}

/// The three op kinds, used when peeking an iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Retain,
    Delete,
}

/// A single delta operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOp", into = "RawOp")]
pub enum Op {
    Insert {
        insert: Insert,
        attributes: AttributeMap,
    },
    Retain {
        len: usize,
        attributes: AttributeMap,
    },
    Delete(usize),
}

impl Op {
    pub fn len(&self) -> usize {
        match self {
            Op::Insert { insert, .. } => insert.len(),
            Op::Retain { len, .. } => *len,
            Op::Delete(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Op::Insert { .. } => OpKind::Insert,
            Op::Retain { .. } => OpKind::Retain,
            Op::Delete(_) => OpKind::Delete,
        }
    }

    /// Attributes of an insert or retain; `None` for deletes.
    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => Some(attributes),
            Op::Delete(_) => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert { .. })
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete(_))
    }
}

/// Slice `len` chars of `text` starting at char `start`.
pub(crate) fn slice_chars(text: &str, start: usize, len: usize) -> &str {
    let mut indices = text.char_indices().map(|(i, _)| i).chain(Some(text.len()));
    let begin = indices.nth(start).unwrap_or(text.len());
    let end = if len == 0 {
        begin
    } else {
        indices.nth(len - 1).unwrap_or(text.len())
    };
    &text[begin..end]
}

/// Wire shape of an op: `{"insert": ..}`, `{"retain": n}` or `{"delete": n}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retain: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delete: Option<usize>,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    attributes: AttributeMap,
}

impl TryFrom<RawOp> for Op {
    type Error = DeltaError;

    fn try_from(raw: RawOp) -> Result<Self, Self::Error> {
        match (raw.insert, raw.retain, raw.delete) {
            (Some(value), None, None) => {
                let insert = match value {
                    Value::String(text) => Insert::Text(text),
                    Value::Object(map) if map.len() == 1 => {
                        let Some((kind, value)) = map.into_iter().next() else {
                            return Err(DeltaError::InvalidEmbed("empty object".into()));
                        };
                        Insert::Embed(Embed::new(kind, value))
                    }
                    other => return Err(DeltaError::InvalidEmbed(other.to_string())),
                };
                Ok(Op::Insert {
                    insert,
                    attributes: raw.attributes,
                })
            }
            (None, Some(len), None) => Ok(Op::Retain {
                len,
                attributes: raw.attributes,
            }),
            (None, None, Some(len)) => Ok(Op::Delete(len)),
            (None, None, None) => Err(DeltaError::EmptyOp),
            _ => Err(DeltaError::AmbiguousOp),
        }
    }
}

impl From<Op> for RawOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Insert { insert, attributes } => {
                let value = match insert {
                    Insert::Text(text) => Value::String(text),
                    Insert::Embed(embed) => {
                        let mut map = Map::new();
                        map.insert(embed.kind.to_string(), embed.value);
                        Value::Object(map)
                    }
                };
                RawOp {
                    insert: Some(value),
                    retain: None,
                    delete: None,
                    attributes,
                }
            }
            Op::Retain { len, attributes } => RawOp {
                insert: None,
                retain: Some(len),
                delete: None,
                attributes,
            },
            Op::Delete(len) => RawOp {
                insert: None,
                retain: None,
                delete: Some(len),
                attributes: AttributeMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slice_chars_multibyte() {
        assert_eq!(slice_chars("héllo", 1, 3), "éll");
        assert_eq!(slice_chars("héllo", 0, 0), "");
        assert_eq!(slice_chars("héllo", 4, 10), "o");
        assert_eq!(slice_chars("héllo", 5, 1), "");
    }

    #[test]
    fn test_op_json_shape() {
        let op: Op = serde_json::from_value(json!({"insert": {"image": {"src": "a.png"}}}))
            .expect("embed op");
        assert_eq!(op.len(), 1);
        assert!(matches!(&op, Op::Insert { insert: Insert::Embed(e), .. } if e.kind == "image"));

        let op: Op = serde_json::from_value(json!({"retain": 3, "attributes": {"bold": true}}))
            .expect("retain op");
        assert_eq!(op.kind(), OpKind::Retain);
        assert_eq!(
            serde_json::to_value(&op).expect("serialize"),
            json!({"retain": 3, "attributes": {"bold": true}})
        );
    }

    #[test]
    fn test_op_json_rejects_ambiguous() {
        let err = serde_json::from_value::<Op>(json!({"retain": 1, "delete": 1}));
        assert!(err.is_err());
        let err = serde_json::from_value::<Op>(json!({}));
        assert!(err.is_err());
    }
}
