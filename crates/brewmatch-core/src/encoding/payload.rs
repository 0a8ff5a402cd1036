//! Compact payload codec: `prefix:field1:field2:...` strings for the
//! callback-data channel.
//!
//! Fields are positional in schema declaration order. An absent value is an
//! empty field. Only integer and string attributes are supported, and nothing
//! is escaped, so string values must not contain `:`.
//!
//! Decoding is lenient on length: missing trailing fields decode as absent and
//! surplus fields are ignored, so a payload type can grow new trailing fields
//! without breaking strings already handed out.

use tracing::warn;

use super::scalar::decode_integer;
use crate::error::FormatError;
use crate::schema::{AttrType, Fields, Record, RecordSchema, Value};

/// Separator between the prefix and each field.
pub const FIELD_DELIMITER: char = ':';

/// Length budget of the callback-data channel, in bytes. Advisory only.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// A flat record that travels as a compact payload.
pub trait Payload: Record {
    /// Dispatch prefix, consumed by the external router.
    const PREFIX: &'static str;
}

/// Encode a payload as `PREFIX:field:...`.
pub fn encode<P: Payload>(payload: &P) -> Result<String, FormatError> {
    encode_fields(P::PREFIX, P::schema(), &payload.to_fields())
}

/// Decode a payload string. The first token is discarded, whatever it is.
pub fn decode<P: Payload>(data: &str) -> Result<P, FormatError> {
    P::from_fields(decode_fields(data, P::schema())?)
}

pub fn encode_fields(
    prefix: &str,
    schema: &RecordSchema,
    fields: &Fields,
) -> Result<String, FormatError> {
    let mut out = String::from(prefix);
    for attribute in schema.attributes {
        check_supported(attribute.name, attribute.attr_type)?;
        out.push(FIELD_DELIMITER);
        match fields.get(attribute.name) {
            None => {}
            Some(Value::Int(n)) => out.push_str(&n.to_string()),
            Some(Value::Str(s)) => {
                if s.contains(FIELD_DELIMITER) {
                    warn!(
                        attribute = attribute.name,
                        value = %s,
                        "payload field contains the field delimiter"
                    );
                }
                out.push_str(s);
            }
            Some(_) => {
                return Err(FormatError::value_mismatch(
                    attribute.name,
                    &attribute.attr_type,
                ));
            }
        }
    }
    Ok(out)
}

pub fn decode_fields(data: &str, schema: &RecordSchema) -> Result<Fields, FormatError> {
    // Checked up front so a short payload fails the same way as a full one.
    for attribute in schema.attributes {
        check_supported(attribute.name, attribute.attr_type)?;
    }
    let mut fields = Fields::new();
    let tokens = data.split(FIELD_DELIMITER).skip(1);
    for (attribute, token) in schema.attributes.iter().zip(tokens) {
        if token.is_empty() {
            continue;
        }
        let value = match attribute.attr_type {
            AttrType::Int => Value::Int(decode_integer(token)?),
            _ => Value::Str(token.to_string()),
        };
        fields.insert(attribute.name, value);
    }
    Ok(fields)
}

/// The dispatch prefix: everything before the first `:`.
pub fn payload_prefix(data: &str) -> &str {
    match data.find(FIELD_DELIMITER) {
        Some(idx) => &data[..idx],
        None => data,
    }
}

pub fn fits_budget(data: &str) -> bool {
    data.len() <= MAX_PAYLOAD_LEN
}

fn check_supported(attribute: &str, attr_type: AttrType) -> Result<(), FormatError> {
    match attr_type {
        AttrType::Int | AttrType::Str => Ok(()),
        other => Err(FormatError::UnsupportedPayloadType {
            attribute: attribute.to_string(),
            attr_type: other.name(),
        }),
    }
}

/// Declare a payload type: a [`record!`](crate::record) plus its prefix.
#[macro_export]
macro_rules! payload {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident ($prefix:literal) {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::record! {
            $(#[$meta])*
            $vis struct $name {
                $( $(#[$field_meta])* $field : $ty, )*
            }
        }

        impl $crate::encoding::payload::Payload for $name {
            const PREFIX: &'static str = $prefix;
        }
    };
}
