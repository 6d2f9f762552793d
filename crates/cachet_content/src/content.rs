//! The [`Content`] trait for cacheable values.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;

/// A value that can be held in a shared content cell.
///
/// The `Default` value is the cell's initial state before any fetch; it must
/// report [`is_empty`](Content::is_empty), because an empty cell is never a
/// cache hit.
pub trait Content: Clone + Default + Send + Sync + 'static {
    /// Returns true if this value holds nothing worth serving from cache.
    fn is_empty(&self) -> bool;
}

impl<T: Clone + Send + Sync + 'static> Content for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T: Clone + Send + Sync + 'static> Content for VecDeque<T> {
    fn is_empty(&self) -> bool {
        VecDeque::is_empty(self)
    }
}

impl<K, V, S> Content for HashMap<K, V, S>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Default + Send + Sync + 'static,
{
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

impl<K, V> Content for BTreeMap<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl Content for String {
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl<T: Clone + Send + Sync + 'static> Content for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

/// `null`, `[]`, `{}` and `""` count as empty; numbers and booleans do not.
impl Content for serde_json::Value {
    fn is_empty(&self) -> bool {
        use serde_json::Value;

        match self {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(fields) => fields.is_empty(),
            Value::String(text) => text.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn empty<C: Content>(value: &C) -> bool {
        Content::is_empty(value)
    }

    #[test]
    fn defaults_are_empty() {
        assert!(empty(&Vec::<u8>::default()));
        assert!(empty(&VecDeque::<u8>::default()));
        assert!(empty(&HashMap::<String, u8>::default()));
        assert!(empty(&BTreeMap::<String, u8>::default()));
        assert!(empty(&String::default()));
        assert!(empty(&Option::<u8>::default()));
        assert!(empty(&serde_json::Value::default()));
    }

    #[test]
    fn populated_values_are_not_empty() {
        assert!(!empty(&vec!["a".to_string()]));
        assert!(!empty(&"hello".to_string()));
        assert!(!empty(&Some(0u8)));
        assert!(!empty(&BTreeMap::from([("k", 1)])));
    }

    #[test]
    fn json_emptiness() {
        assert!(empty(&json!([])));
        assert!(empty(&json!({})));
        assert!(empty(&json!("")));
        assert!(!empty(&json!(0)));
        assert!(!empty(&json!(false)));
        assert!(!empty(&json!([{ "componentName": "Banner" }])));
    }
}
