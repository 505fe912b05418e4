use elicit_core::{ChangeKind, PathChange};
use serde_json::Value;

/// Structural diff between two compiled documents.
///
/// Objects are compared key by key in sorted key order; arrays are
/// compared positionally, index against index. Reordering of
/// semantically equivalent array elements therefore shows up as a
/// modification at each differing index, not as a move. That is a
/// deliberate, documented simplification of this engine, not a
/// best-effort heuristic.
///
/// Output order is the stable depth-first traversal order, so two
/// diffs of identical inputs are byte-identical.
pub fn diff_documents(a: &Value, b: &Value) -> Vec<PathChange> {
    let mut changes = Vec::new();
    diff_value("", Some(a), Some(b), &mut changes);
    changes
}

fn diff_value(path: &str, a: Option<&Value>, b: Option<&Value>, out: &mut Vec<PathChange>) {
    match (a, b) {
        (None, None) => {}
        (None, Some(after)) => out.push(PathChange {
            path: root_or(path),
            kind: ChangeKind::Added,
            before: None,
            after: Some(after.clone()),
        }),
        (Some(before), None) => out.push(PathChange {
            path: root_or(path),
            kind: ChangeKind::Removed,
            before: Some(before.clone()),
            after: None,
        }),
        (Some(before), Some(after)) => {
            if before == after {
                return;
            }
            match (before, after) {
                (Value::Object(left), Value::Object(right)) => {
                    let mut keys: Vec<&String> = left.keys().chain(right.keys()).collect();
                    keys.sort();
                    keys.dedup();
                    for key in keys {
                        let child = format!("{path}/{key}");
                        diff_value(&child, left.get(key), right.get(key), out);
                    }
                }
                (Value::Array(left), Value::Array(right)) => {
                    let len = left.len().max(right.len());
                    for index in 0..len {
                        let child = format!("{path}/{index}");
                        diff_value(&child, left.get(index), right.get(index), out);
                    }
                }
                // Scalars, or composites of different kinds: one
                // modification at this path.
                _ => out.push(PathChange {
                    path: root_or(path),
                    kind: ChangeKind::Modified,
                    before: Some(before.clone()),
                    after: Some(after.clone()),
                }),
            }
        }
    }
}

fn root_or(path: &str) -> String {
    if path.is_empty() { "/".to_string() } else { path.to_string() }
}
