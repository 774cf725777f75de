//! Attribute maps carried by insert and retain ops.

use std::collections::BTreeMap;

use serde_json::Value;
use smol_str::SmolStr;

/// Formatting attributes. A `null` value inside a retain removes the key.
pub type AttributeMap = BTreeMap<SmolStr, Value>;

/// Compose two attribute maps, `b` winning over `a`.
///
/// With `keep_null` the removal markers from `b` survive (retain over retain),
/// otherwise they are dropped (retain over insert).
pub fn compose_attributes(a: &AttributeMap, b: &AttributeMap, keep_null: bool) -> AttributeMap {
    let mut out = a.clone();
    for (key, value) in b {
        out.insert(key.clone(), value.clone());
    }
    if !keep_null {
        out.retain(|_, value| !value.is_null());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (SmolStr::new(k), v.clone()))
            .collect()
    }

    #[test]
    fn test_compose_overrides_and_adds() {
        let a = attrs(&[("bold", json!(true)), ("color", json!("red"))]);
        let b = attrs(&[("color", json!("blue")), ("italic", json!(true))]);
        let out = compose_attributes(&a, &b, false);
        assert_eq!(
            out,
            attrs(&[
                ("bold", json!(true)),
                ("color", json!("blue")),
                ("italic", json!(true))
            ])
        );
    }

    #[test]
    fn test_compose_null_removes() {
        let a = attrs(&[("bold", json!(true))]);
        let b = attrs(&[("bold", Value::Null)]);
        assert!(compose_attributes(&a, &b, false).is_empty());
        assert_eq!(
            compose_attributes(&a, &b, true),
            attrs(&[("bold", Value::Null)])
        );
    }
}
