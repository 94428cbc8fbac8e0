use serde_json::Value;

/// Collect every value stored under `key` anywhere in `tree`, in order of
/// first encounter (pre-order).
///
/// A matching map entry contributes its value and is not descended into
/// further, so a matched value that itself contains `key` yields only the
/// outer value. Sibling entries are still visited, lists are walked
/// element-wise, and scalars contribute nothing.
pub fn find_by_key<'a>(tree: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(tree, key, &mut found);
    found
}

fn collect<'a>(node: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                } else {
                    collect(v, key, found);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                collect(item, key, found);
            }
        },
        _ => {},
    }
}
