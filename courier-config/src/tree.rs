// Conversion between nested configuration trees and dotted keys

use serde_json::{Map, Value};

/// Flatten a nested tree into `(dotted key, leaf)` pairs.
///
/// Top-level keys may themselves be dotted paths. Below the top level a key
/// containing `.` cannot be a path segment, so it is kept with its subtree as
/// a one-entry object under its parent's key, e.g.
/// `factories."payments.v2".base-url` yields
/// `("factories", {"payments.v2": {"base-url": ...}})`.
pub fn flatten(value: Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(String::new(), value, &mut out);
    out
}

fn flatten_into(prefix: String, value: Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                if prefix.is_empty() {
                    flatten_into(key, child, out);
                } else if key.contains('.') {
                    out.push((prefix.clone(), Value::Object(Map::from_iter([(key, child)]))));
                } else {
                    flatten_into(format!("{}.{}", prefix, key), child, out);
                }
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.push((prefix, leaf));
            }
        }
    }
}

/// Merge `value` into `target`. Objects merge key by key; anything else
/// replaces what was there.
pub fn merge(target: &mut Value, value: Value) {
    match (target, value) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, child) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, child),
                    None => {
                        existing.insert(key, child);
                    }
                }
            }
        }
        (target, value) => *target = value,
    }
}

/// Nest dotted keys into a tree. Later entries win on conflicts.
pub fn nest<'a, I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut root = Map::new();
    for (path, value) in entries {
        insert(&mut root, path, value.clone());
    }
    Value::Object(root)
}

fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            match node.get_mut(segment) {
                Some(existing) => merge(existing, value),
                None => {
                    node.insert(segment.to_string(), value);
                }
            }
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        let Value::Object(next) = child else {
            return;
        };
        node = next;
    }
}
