use serde::Serialize;
use serde_json::{Map, Value};

/// A single key/value pair attached to a handler or a record.
///
/// Keys are not required to be unique while a handler is being built up;
/// duplicates are resolved when the record is consolidated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attr {
    pub key: String,
    pub value: AttrValue,
}

/// Value of an [`Attr`]: either a JSON scalar/structure or a named group
/// of nested attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Value(Value),
    Group(Vec<Attr>),
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: AttrValue::Value(value.into()),
        }
    }

    /// Build a group attribute. A group with an empty key is inlined into
    /// its parent when consolidated.
    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Attr {
            key: key.into(),
            value: AttrValue::Group(attrs),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.value, AttrValue::Group(_))
    }

    /// Look up a nested attribute by a dotted path such as `"g.x"`.
    pub fn lookup<'a>(attrs: &'a [Attr], path: &str) -> Option<&'a AttrValue> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let found = attrs.iter().rev().find(|a| a.key == head)?;
        match (rest, &found.value) {
            (None, value) => Some(value),
            (Some(rest), AttrValue::Group(children)) => Attr::lookup(children, rest),
            (Some(_), AttrValue::Value(_)) => None,
        }
    }
}

/// Render an attribute tree as nested JSON objects.
pub fn attrs_to_map(attrs: &[Attr]) -> Map<String, Value> {
    let mut map = Map::with_capacity(attrs.len());
    for attr in attrs {
        let value = match &attr.value {
            AttrValue::Value(v) => v.clone(),
            AttrValue::Group(children) => Value::Object(attrs_to_map(children)),
        };
        map.insert(attr.key.clone(), value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_groups() {
        let attrs = vec![
            Attr::new("a", 1),
            Attr::group("g", vec![Attr::new("x", "y")]),
        ];
        assert_eq!(Attr::lookup(&attrs, "a"), Some(&AttrValue::Value(json!(1))));
        assert_eq!(Attr::lookup(&attrs, "g.x"), Some(&AttrValue::Value(json!("y"))));
        assert_eq!(Attr::lookup(&attrs, "a.x"), None);
        assert_eq!(Attr::lookup(&attrs, "missing"), None);
    }

    #[test]
    fn renders_nested_objects() {
        let attrs = vec![
            Attr::new("service", "auth"),
            Attr::group("req", vec![Attr::new("id", 7), Attr::new("ok", true)]),
        ];
        let map = attrs_to_map(&attrs);
        assert_eq!(
            Value::Object(map),
            json!({"service": "auth", "req": {"id": 7, "ok": true}})
        );
    }
}
