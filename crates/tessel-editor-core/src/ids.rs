//! Stable line ids.
//!
//! Every newline a change inserts gets a fresh `id` line attribute. The
//! stamp is built from the shape of the inbound change alone, so lines the
//! change does not create keep their ids.

use serde_json::Value;
use smol_str::{SmolStr, format_smolstr};
use tessel_delta::{AttributeMap, Delta, Insert, Op};

use crate::document::format;

/// Where fresh line ids come from.
pub trait IdSource {
    fn fresh_id(&mut self) -> SmolStr;
}

/// Random v4 UUIDs in simple (unhyphenated) form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn fresh_id(&mut self) -> SmolStr {
        SmolStr::new(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Predictable ids (`prefix-1`, `prefix-2`, ...) for tests and fixtures.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: SmolStr,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdSource for SequentialIds {
    fn fresh_id(&mut self) -> SmolStr {
        self.next += 1;
        format_smolstr!("{}-{}", self.prefix, self.next)
    }
}

/// Retains assigning a fresh id to every newline `delta` inserts.
///
/// Ids already present on the inserted newlines are replaced. Returns `None`
/// when the change inserts no newline.
pub fn stamp_line_ids<I: IdSource + ?Sized>(delta: &Delta, ids: &mut I) -> Option<Delta> {
    let mut stamp = Delta::new();
    let mut stamped = false;
    for op in delta.ops() {
        match op {
            Op::Retain { len, .. } => stamp = stamp.retain(*len),
            Op::Delete(_) => {}
            Op::Insert {
                insert: Insert::Embed(_),
                ..
            } => stamp = stamp.retain(1),
            Op::Insert {
                insert: Insert::Text(text),
                ..
            } => {
                for (i, segment) in text.split('\n').enumerate() {
                    if i > 0 {
                        stamp = stamp.retain_with(1, id_attributes(ids.fresh_id()));
                        stamped = true;
                    }
                    stamp = stamp.retain(segment.chars().count());
                }
            }
        }
    }
    stamped.then_some(stamp)
}

fn id_attributes(id: SmolStr) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert(format::ID.into(), Value::String(id.to_string()));
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_stamp_literal_example() {
        let input = Delta::new().insert("a\nb\nc");
        let stamp = stamp_line_ids(&input, &mut SequentialIds::new("line")).expect("newlines inserted");
        assert_snapshot!(serde_json::to_string(&stamp).expect("json"), @r#"{"ops":[{"retain":1},{"retain":1,"attributes":{"id":"line-1"}},{"retain":1},{"retain":1,"attributes":{"id":"line-2"}},{"retain":1}]}"#);

        let composed = input.compose(&stamp);
        let lines: Vec<(String, Option<String>)> = composed
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    attributes,
                } => Some((
                    text.clone(),
                    attributes.get("id").and_then(Value::as_str).map(str::to_string),
                )),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![
                ("a".to_string(), None),
                ("\n".to_string(), Some("line-1".to_string())),
                ("b".to_string(), None),
                ("\n".to_string(), Some("line-2".to_string())),
                ("c".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_no_newline_no_stamp() {
        let mut ids = SequentialIds::new("line");
        assert_eq!(stamp_line_ids(&Delta::new().retain(3).insert("abc"), &mut ids), None);
        assert_eq!(stamp_line_ids(&Delta::new().retain(3).delete(1), &mut ids), None);
    }

    #[test]
    fn test_existing_ids_are_replaced() {
        let mut attributes = AttributeMap::new();
        attributes.insert("id".into(), Value::String("kept?".into()));
        let input = Delta::new().retain(4).insert_with("\n", attributes);
        let stamp = stamp_line_ids(&input, &mut SequentialIds::new("n")).expect("stamp");
        assert_eq!(stamp, Delta::new().retain(4).retain_with(1, id_attributes("n-1".into())));
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut source = UuidSource;
        let (a, b) = (source.fresh_id(), source.fresh_id());
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
