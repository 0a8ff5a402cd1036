//! Tagged wire values: the `{"BOOL": ..} | {"N": ..} | {"S": ..} | {"M": ..}`
//! item shape shared with the managed key-value store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A stored item: attribute name → tagged value. Absent attributes are omitted.
pub type WireItem = BTreeMap<String, TaggedValue>;

/// A single `(type-tag, payload)` pair.
///
/// Serializes externally tagged, so `TaggedValue::Number("123".into())`
/// becomes `{"N": "123"}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaggedValue {
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Decimal-string-encoded number.
    #[serde(rename = "N")]
    Number(String),
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "M")]
    Map(WireItem),
}

/// Wire type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Bool,
    Number,
    String,
    Map,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Bool => "BOOL",
            Tag::Number => "N",
            Tag::String => "S",
            Tag::Map => "M",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TaggedValue {
    pub fn tag(&self) -> Tag {
        match self {
            TaggedValue::Bool(_) => Tag::Bool,
            TaggedValue::Number(_) => Tag::Number,
            TaggedValue::String(_) => Tag::String,
            TaggedValue::Map(_) => Tag::Map,
        }
    }

    /// Identity string for a key value, or `None` if the tag cannot be a key.
    ///
    /// Only `N` and `S` values address items; the tag is part of the identity
    /// so `{"N": "5"}` and `{"S": "5"}` never collide.
    pub fn key_string(&self) -> Option<String> {
        match self {
            TaggedValue::Number(n) => Some(format!("N:{n}")),
            TaggedValue::String(s) => Some(format!("S:{s}")),
            TaggedValue::Bool(_) | TaggedValue::Map(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut intro = WireItem::new();
        intro.insert("name".to_string(), TaggedValue::String("Alex".to_string()));
        let mut item = WireItem::new();
        item.insert("user_id".to_string(), TaggedValue::Number("123".to_string()));
        item.insert("agreed".to_string(), TaggedValue::Bool(true));
        item.insert("intro".to_string(), TaggedValue::Map(intro));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            json!({
                "user_id": {"N": "123"},
                "agreed": {"BOOL": true},
                "intro": {"M": {"name": {"S": "Alex"}}},
            })
        );
    }

    #[test]
    fn test_parse_wire_shape() {
        let item: WireItem =
            serde_json::from_value(json!({"key": {"S": "5#10#20"}, "n": {"N": "-4"}})).unwrap();
        assert_eq!(item["key"], TaggedValue::String("5#10#20".to_string()));
        assert_eq!(item["n"], TaggedValue::Number("-4".to_string()));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let parsed = serde_json::from_value::<WireItem>(json!({"tags": {"SS": ["a"]}}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_key_string() {
        assert_eq!(
            TaggedValue::Number("5".to_string()).key_string().as_deref(),
            Some("N:5")
        );
        assert_eq!(
            TaggedValue::String("5".to_string()).key_string().as_deref(),
            Some("S:5")
        );
        assert!(TaggedValue::Bool(true).key_string().is_none());
        assert!(TaggedValue::Map(WireItem::new()).key_string().is_none());
    }
}
