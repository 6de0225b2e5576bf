//! Dotted-key assignment into an owned JSON object.
//!
//! `context.user_id` writes `{"context": {"user_id": ...}}`, creating or
//! replacing intermediate objects as needed. Keys may come from user-authored
//! mapping configs and the objects end up in JavaScript clients, so segments that
//! address the object prototype are refused before anything is created.

use serde_json::{Map, Value};
use thiserror::Error;

const DENIED_SEGMENTS: [&str; 3] = ["__proto__", "constructor", "prototype"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Refusing to write key '{key}': segment '{segment}' is not allowed")]
pub struct UnsafeKeyError {
    pub key: String,
    pub segment: String,
}

fn is_denied(segment: &str) -> bool {
    DENIED_SEGMENTS.contains(&segment)
        || (segment.len() > 4 && segment.starts_with("__") && segment.ends_with("__"))
}

fn check_segments<'k>(key: &'k str) -> Result<Vec<&'k str>, UnsafeKeyError> {
    let segments: Vec<&str> = key.split('.').collect();
    if let Some(segment) = segments.iter().find(|s| is_denied(s)) {
        return Err(UnsafeKeyError {
            key: key.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(segments)
}

/// Assign `value` at `key`; dotted keys create nested objects.
pub fn set_value(
    target: &mut Map<String, Value>,
    key: &str,
    value: Value,
) -> Result<(), UnsafeKeyError> {
    let mut segments = check_segments(key)?;
    let Some(last) = segments.pop() else {
        return Ok(());
    };

    let mut current = target;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return Ok(());
        };
        current = map;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Remove whatever is stored at `key`, without creating intermediate objects.
///
/// Used when an entry resolves to no value: the key ends up absent, the same
/// as assigning `undefined` and serialising.
pub fn unset_value(target: &mut Map<String, Value>, key: &str) -> Result<(), UnsafeKeyError> {
    let mut segments = check_segments(key)?;
    let Some(last) = segments.pop() else {
        return Ok(());
    };

    let mut current = target;
    for segment in segments {
        current = match current.get_mut(segment) {
            Some(Value::Object(map)) => map,
            _ => return Ok(()),
        };
    }
    current.remove(last);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_key_creates_nested_objects() {
        let mut target = Map::new();
        set_value(&mut target, "context.user_id", json!("123")).unwrap();
        assert_eq!(Value::Object(target), json!({"context": {"user_id": "123"}}));
    }

    #[test]
    fn test_later_writes_overwrite_and_merge() {
        let mut target = Map::new();
        set_value(&mut target, "a.b", json!(1)).unwrap();
        set_value(&mut target, "a.c", json!(2)).unwrap();
        set_value(&mut target, "a.b", json!(3)).unwrap();
        assert_eq!(Value::Object(target), json!({"a": {"b": 3, "c": 2}}));
    }

    #[test]
    fn test_scalar_intermediate_is_replaced() {
        let mut target = Map::new();
        set_value(&mut target, "a", json!("flat")).unwrap();
        set_value(&mut target, "a.b", json!(true)).unwrap();
        assert_eq!(Value::Object(target), json!({"a": {"b": true}}));
    }

    #[test]
    fn test_prototype_segments_are_refused() {
        for key in [
            "__proto__",
            "__proto__.polluted",
            "a.constructor.prototype",
            "a.__defineGetter__",
        ] {
            let mut target = Map::new();
            let err = set_value(&mut target, key, json!(true)).unwrap_err();
            assert_eq!(err.key, key);
            assert!(target.is_empty(), "nothing may be created for {key}");
        }
    }

    #[test]
    fn test_unset_removes_without_creating() {
        let mut target = Map::new();
        set_value(&mut target, "a.b", json!(1)).unwrap();
        unset_value(&mut target, "a.b").unwrap();
        unset_value(&mut target, "x.y").unwrap();
        assert_eq!(Value::Object(target), json!({"a": {}}));
    }
}
