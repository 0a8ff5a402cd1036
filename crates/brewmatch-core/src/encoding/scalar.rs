//! Tagged-value codec: one attribute value ↔ one [`TaggedValue`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use super::tagged::{TaggedValue, WireItem};
use crate::error::FormatError;
use crate::schema::{Attribute, AttrType, Fields, RecordSchema, Value};

/// Encode a present value. Nested records recurse through [`encode_fields`].
pub fn encode_scalar(value: &Value) -> TaggedValue {
    match value {
        Value::Bool(b) => TaggedValue::Bool(*b),
        Value::Int(n) => TaggedValue::Number(n.to_string()),
        Value::Str(s) => TaggedValue::String(s.clone()),
        Value::Timestamp(t) => TaggedValue::String(encode_timestamp(t)),
        Value::Record(fields) => TaggedValue::Map(encode_fields(fields)),
    }
}

/// Decode a tagged value against the attribute's declared type.
pub fn decode_scalar(tagged: TaggedValue, attribute: &Attribute) -> Result<Value, FormatError> {
    match (attribute.attr_type, tagged) {
        (AttrType::Bool, TaggedValue::Bool(b)) => Ok(Value::Bool(b)),
        (AttrType::Int, TaggedValue::Number(n)) => decode_integer(&n).map(Value::Int),
        (AttrType::Str, TaggedValue::String(s)) => Ok(Value::Str(s)),
        (AttrType::Timestamp, TaggedValue::String(s)) => decode_timestamp(&s).map(Value::Timestamp),
        (AttrType::Record(schema), TaggedValue::Map(item)) => {
            decode_fields(item, schema()).map(Value::Record)
        }
        (expected, actual) => Err(FormatError::TagMismatch {
            attribute: attribute.name.to_string(),
            expected: expected.tag().as_str(),
            actual: actual.tag().as_str(),
        }),
    }
}

/// Present fields → wire item. Absent attributes never appear in `fields`.
pub fn encode_fields(fields: &Fields) -> WireItem {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), encode_scalar(value)))
        .collect()
}

/// Wire item → present fields, for every attribute `schema` declares.
///
/// Declared names missing from `item` stay absent; undeclared names in `item`
/// are ignored.
pub fn decode_fields(mut item: WireItem, schema: &RecordSchema) -> Result<Fields, FormatError> {
    let mut fields = Fields::new();
    for attribute in schema.attributes {
        if let Some(tagged) = item.remove(attribute.name) {
            fields.insert(attribute.name, decode_scalar(tagged, attribute)?);
        }
    }
    Ok(fields)
}

pub fn decode_integer(s: &str) -> Result<i64, FormatError> {
    s.parse::<i64>().map_err(|_| FormatError::InvalidInteger {
        value: s.to_string(),
    })
}

/// RFC 3339, UTC, `Z` suffix, sub-second digits only when non-zero.
pub fn encode_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse RFC 3339 with any offset, or a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// taken as UTC.
///
/// Years outside `0000..=9999` are written with a sign and extra digits
/// (`+10000-01-01T00:00:00Z`); RFC 3339 has no room for them, so they go
/// through the naive form with the `Z` stripped.
pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>, FormatError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    let naive = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| FormatError::InvalidTimestamp {
            value: s.to_string(),
        })
}
