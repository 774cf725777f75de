//! Property tests for `Delta::transform_position`.

use proptest::prelude::*;
use tessel_delta::{Delta, Op};

#[derive(Debug, Clone)]
enum Step {
    Retain(usize),
    Insert(usize),
    Delete(usize),
}

fn steps() -> impl Strategy<Value = (usize, Vec<Step>)> {
    (0usize..24).prop_flat_map(|doc_len| {
        let step = prop_oneof![
            (1usize..6).prop_map(Step::Retain),
            (1usize..4).prop_map(Step::Insert),
            (1usize..6).prop_map(Step::Delete),
        ];
        (Just(doc_len), prop::collection::vec(step, 0..8))
    })
}

/// Build a valid change for a document of `doc_len`, clamping retains and
/// deletes to what is left.
fn build(doc_len: usize, steps: &[Step]) -> Delta {
    let mut remaining = doc_len;
    let mut delta = Delta::new();
    for step in steps {
        match *step {
            Step::Retain(n) => {
                let n = n.min(remaining);
                remaining -= n;
                delta = delta.retain(n);
            }
            Step::Delete(n) => {
                let n = n.min(remaining);
                remaining -= n;
                delta = delta.delete(n);
            }
            Step::Insert(n) => delta = delta.insert("x".repeat(n)),
        }
    }
    delta
}

/// Apply the change to a vector of original slot ids; inserted slots are `None`.
fn apply(doc_len: usize, delta: &Delta) -> Vec<Option<usize>> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for op in delta.ops() {
        match op {
            Op::Retain { len, .. } => {
                out.extend((cursor..cursor + len).map(Some));
                cursor += len;
            }
            Op::Delete(len) => cursor += len,
            Op::Insert { insert, .. } => out.extend(std::iter::repeat_n(None, insert.len())),
        }
    }
    out.extend((cursor..doc_len).map(Some));
    out
}

proptest! {
    #[test]
    fn position_follows_surviving_content((doc_len, steps) in steps(), pick in 0usize..32) {
        let delta = build(doc_len, &steps);
        let position = pick.min(doc_len);
        let after = apply(doc_len, &delta);

        // Without priority a position lands right before the first surviving
        // original char at or after it, past anything inserted in front of it.
        let expected = after
            .iter()
            .position(|slot| matches!(slot, Some(id) if *id >= position))
            .unwrap_or(after.len());

        prop_assert_eq!(delta.transform_position(position, false), expected);
    }

    #[test]
    fn single_insert_shifts_by_length(offset in 0usize..20, extra in 0usize..20, k in 1usize..6) {
        let position = offset + extra;
        let delta = Delta::new().retain(offset).insert("y".repeat(k));
        prop_assert_eq!(delta.transform_position(position, false), position + k);
    }

    #[test]
    fn single_delete_clamps_at_start(offset in 0usize..20, extra in 0usize..20, k in 1usize..10) {
        let position = offset + extra;
        let delta = Delta::new().retain(offset).delete(k);
        prop_assert_eq!(
            delta.transform_position(position, false),
            offset.max(position.saturating_sub(k))
        );
    }
}
