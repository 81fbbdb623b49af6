//! Leaf model shared by the store backends.
//!
//! A JSON value is kept as its leaves: every non-object value (arrays included)
//! keyed by its full slash path. Empty objects and nulls produce no leaves,
//! so they vanish the same way they do in a realtime database. A struct whose
//! fields are all `None` therefore reads back as absent.

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};

use super::path::join;

const PUSH_ALPHABET: &[u8] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Leaves of `value` rooted at `base`.
pub fn flatten(base: &str, value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(base, value, &mut out);
    out
}

fn flatten_into(base: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&join(base, key), child, out);
            }
        }
        leaf => out.push((base.to_string(), leaf.clone())),
    }
}

/// Strict ancestors of `path`, nearest last: `a/b/c` → `["a", "a/b"]`.
pub fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len()).map(|n| segments[..n].join("/")).collect()
}

/// True when `candidate` is `path` itself or lies beneath it.
pub fn within(path: &str, candidate: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    candidate == path
        || (candidate.len() > path.len()
            && candidate.starts_with(path)
            && candidate.as_bytes()[path.len()] == b'/')
}

/// Rebuild the subtree at `base` from leaves lying within it.
pub fn assemble<I>(base: &str, leaves: I) -> Option<Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Map::new();
    let mut found = false;

    for (path, value) in leaves {
        if path == base {
            return Some(value);
        }
        let relative = if base.is_empty() {
            path.as_str()
        } else {
            match path.strip_prefix(base).and_then(|rest| rest.strip_prefix('/')) {
                Some(rest) => rest,
                None => continue,
            }
        };
        insert_at(&mut root, relative, value);
        found = true;
    }

    found.then_some(Value::Object(root))
}

fn insert_at(root: &mut Map<String, Value>, relative: &str, value: Value) {
    let mut segments = relative.split('/').filter(|s| !s.is_empty()).peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = match child {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Time-ordered child key: 8 chars of millisecond timestamp followed by 12 random chars.
pub fn push_key() -> String {
    let mut millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut time_part = [0u8; 8];
    for slot in time_part.iter_mut().rev() {
        *slot = PUSH_ALPHABET[(millis % 64) as usize];
        millis /= 64;
    }
    let mut rng = rand::thread_rng();
    let random_part = (0..12).map(|_| PUSH_ALPHABET[rng.gen_range(0..64)] as char);
    time_part.iter().map(|&b| b as char).chain(random_part).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_skips_nulls_and_empty_objects() {
        let leaves = flatten("h2h/m1", &json!({"a": 1, "b": {"c": [1, 2]}, "d": null, "e": {}}));
        assert_eq!(
            leaves,
            vec![
                ("h2h/m1/a".to_string(), json!(1)),
                ("h2h/m1/b/c".to_string(), json!([1, 2])),
            ]
        );
    }

    #[test]
    fn assemble_inverts_flatten() {
        let value = json!({"status": "success", "counts": {"processed": 3, "pending": 0}});
        let leaves = flatten("health/h2h", &value);
        assert_eq!(assemble("health/h2h", leaves.clone()), Some(value.clone()));
        assert_eq!(assemble("health", leaves), Some(json!({"h2h": value})));
    }

    #[test]
    fn assemble_returns_scalar_leaf() {
        let leaves = vec![("a/b".to_string(), json!("x"))];
        assert_eq!(assemble("a/b", leaves.clone()), Some(json!("x")));
        assert_eq!(assemble("a/c", leaves), None);
    }

    #[test]
    fn within_respects_segment_boundaries() {
        assert!(within("h2h/m1", "h2h/m1"));
        assert!(within("h2h/m1", "h2h/m1/home_wins"));
        assert!(!within("h2h/m1", "h2h/m10"));
        assert!(within("", "anything"));
    }

    #[test]
    fn ancestors_are_strict_prefixes() {
        assert_eq!(ancestors("a/b/c"), vec!["a".to_string(), "a/b".to_string()]);
        assert!(ancestors("a").is_empty());
    }

    #[test]
    fn push_keys_sort_by_time() {
        let first = push_key();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = push_key();
        assert_eq!(first.len(), 20);
        assert!(first[..8] <= second[..8]);
    }
}
