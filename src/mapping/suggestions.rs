//! Candidate path expressions for editor autocomplete.
//!
//! Walks a sample document and lists every path it could address. Arrays only
//! descend into their first element so large arrays stay cheap; the list
//! overestimates rather than guessing which paths are useful, so `[0]` and
//! `[*]` are listed even for an empty sample array.

use serde_json::Value;

/// Suggest paths under `prefix` for `data`; `None` and `null` suggest nothing.
pub fn suggest_paths(data: Option<&Value>, prefix: &str) -> Vec<String> {
    let mut paths = Vec::new();
    if let Some(value) = data {
        collect(value, prefix, &mut paths);
    }
    paths
}

/// Suggest paths rooted at `$`.
pub fn suggest_json_paths(data: &Value) -> Vec<String> {
    suggest_paths(Some(data), "$")
}

fn collect(value: &Value, prefix: &str, paths: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            let first_path = format!("{prefix}[0]");
            paths.push(first_path.clone());
            paths.push(format!("{prefix}[*]"));
            if let Some(first) = items.first() {
                collect(first, &first_path, paths);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let Some(child_path) = child_path(prefix, key) else {
                    continue;
                };
                paths.push(child_path.clone());
                collect(child, &child_path, paths);
            }
        }
        _ => {}
    }
}

/// Path to `key` under `prefix`, or `None` when no quoting the evaluator
/// accepts can address it.
fn child_path(prefix: &str, key: &str) -> Option<String> {
    if is_identifier(key) {
        return Some(format!("{prefix}.{key}"));
    }
    // The evaluator reads a quoted key up to the next matching quote and has
    // no general escape sequence.
    if key.ends_with('\\') {
        return None;
    }
    if !key.contains('\'') {
        Some(format!("{prefix}['{key}']"))
    } else if !key.contains('"') {
        Some(format!("{prefix}[\"{key}\"]"))
    } else {
        None
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
