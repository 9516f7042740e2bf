//! Loosely typed metadata values carried from descriptors into the ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata map (account properties, descriptor pass-through keys).
pub type Metadata = BTreeMap<String, Value>;

/// A metadata value: a scalar, a list, or a nested map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Map(Metadata),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Recursively merge `incoming` into `target`.
///
/// Keys holding a map on both sides are merged key by key; any other
/// conflict takes the incoming value.
pub fn deep_merge(target: &mut Metadata, incoming: Metadata) {
    for (key, value) in incoming {
        match value {
            Value::Map(nested) => {
                if let Some(Value::Map(existing)) = target.get_mut(&key) {
                    deep_merge(existing, nested);
                    continue;
                }
                target.insert(key, Value::Map(nested));
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, Value)]) -> Metadata {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_deep_merge_nested_maps() {
        let mut target = map(&[
            ("color", "red".into()),
            ("display", Value::Map(map(&[("width", 1.0.into()), ("style", "solid".into())]))),
        ]);
        let incoming = map(&[
            ("share", 0.5.into()),
            ("display", Value::Map(map(&[("width", 4.0.into())]))),
        ]);

        deep_merge(&mut target, incoming);

        assert_eq!(
            target,
            map(&[
                ("color", "red".into()),
                ("display", Value::Map(map(&[("width", 4.0.into()), ("style", "solid".into())]))),
                ("share", 0.5.into()),
            ])
        );
    }

    #[test]
    fn test_deep_merge_scalar_replaces_map() {
        let mut target = map(&[("display", Value::Map(map(&[("width", 1.0.into())])))]);
        deep_merge(&mut target, map(&[("display", "hidden".into())]));
        assert_eq!(target.get("display"), Some(&Value::Text("hidden".to_string())));
    }

    #[test]
    fn test_value_from_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, "b", null], "c": true}"#).unwrap();
        let m = value.as_map().unwrap();
        assert_eq!(m["c"], Value::Bool(true));
        assert_eq!(
            m["a"],
            Value::List(vec![Value::Number(1.0), Value::Text("b".into()), Value::Null])
        );
    }
}
