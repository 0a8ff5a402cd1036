//! Record descriptors: the per-type attribute list consumed by the mapper and
//! the compact payload codec.
//!
//! Every record type carries a static [`RecordSchema`] (ordered list of
//! attribute name + [`AttrType`]) and converts itself to and from a sparse
//! [`Fields`] map. Types are normally declared with [`record!`](crate::record),
//! which generates the struct (every attribute wrapped in `Option`), the
//! schema, and both conversions.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::encoding::tagged::Tag;
use crate::error::FormatError;

/// Semantic type of a record attribute.
#[derive(Clone, Copy)]
pub enum AttrType {
    Bool,
    Int,
    Str,
    Timestamp,
    /// Nested record; the function returns the nested type's schema.
    Record(fn() -> &'static RecordSchema),
}

impl AttrType {
    /// Human-readable name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            AttrType::Bool => "boolean",
            AttrType::Int => "integer",
            AttrType::Str => "string",
            AttrType::Timestamp => "timestamp",
            AttrType::Record(_) => "record",
        }
    }

    /// The wire tag this type is stored under.
    pub fn tag(&self) -> Tag {
        match self {
            AttrType::Bool => Tag::Bool,
            AttrType::Int => Tag::Number,
            AttrType::Str | AttrType::Timestamp => Tag::String,
            AttrType::Record(_) => Tag::Map,
        }
    }
}

impl fmt::Debug for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Record(schema) => write!(f, "Record({})", schema().name),
            other => f.write_str(other.name()),
        }
    }
}

impl PartialEq for AttrType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrType::Bool, AttrType::Bool)
            | (AttrType::Int, AttrType::Int)
            | (AttrType::Str, AttrType::Str)
            | (AttrType::Timestamp, AttrType::Timestamp) => true,
            (AttrType::Record(a), AttrType::Record(b)) => a().name == b().name,
            _ => false,
        }
    }
}

impl Eq for AttrType {}

/// One declared attribute of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub attr_type: AttrType,
}

/// A named, ordered attribute list.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: &'static str,
    pub attributes: &'static [Attribute],
}

impl RecordSchema {
    /// Look up a declared attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// An in-memory attribute value. Absent values are never represented here;
/// they are simply missing from [`Fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Timestamp(DateTime<Utc>),
    Record(Fields),
}

/// Sparse name → value map holding only the present attributes of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<&'static str, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Remove `name` and convert it to `T`. A missing name yields `Ok(None)`.
    pub fn take<T: Attr>(&mut self, name: &str) -> Result<Option<T>, FormatError> {
        match self.0.remove(name) {
            Some(value) => T::from_value(value, name).map(Some),
            None => Ok(None),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A Rust type usable as a record attribute.
pub trait Attr: Sized {
    const ATTR_TYPE: AttrType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value, attribute: &str) -> Result<Self, FormatError>;
}

impl Attr for bool {
    const ATTR_TYPE: AttrType = AttrType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value, attribute: &str) -> Result<Self, FormatError> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(FormatError::value_mismatch(attribute, &Self::ATTR_TYPE)),
        }
    }
}

impl Attr for i64 {
    const ATTR_TYPE: AttrType = AttrType::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value, attribute: &str) -> Result<Self, FormatError> {
        match value {
            Value::Int(n) => Ok(n),
            _ => Err(FormatError::value_mismatch(attribute, &Self::ATTR_TYPE)),
        }
    }
}

impl Attr for String {
    const ATTR_TYPE: AttrType = AttrType::Str;

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value, attribute: &str) -> Result<Self, FormatError> {
        match value {
            Value::Str(s) => Ok(s),
            _ => Err(FormatError::value_mismatch(attribute, &Self::ATTR_TYPE)),
        }
    }
}

impl Attr for DateTime<Utc> {
    const ATTR_TYPE: AttrType = AttrType::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value, attribute: &str) -> Result<Self, FormatError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            _ => Err(FormatError::value_mismatch(attribute, &Self::ATTR_TYPE)),
        }
    }
}

/// A record type with a static schema.
pub trait Record: Sized {
    fn schema() -> &'static RecordSchema;

    /// Present attributes only.
    fn to_fields(&self) -> Fields;

    /// Build an instance; names missing from `fields` become `None`.
    fn from_fields(fields: Fields) -> Result<Self, FormatError>;
}

/// Declare a record type.
///
/// ```
/// brewmatch_core::record! {
///     /// A place.
///     pub struct Place {
///         name: String,
///         population: i64,
///     }
/// }
///
/// use brewmatch_core::schema::Record;
/// assert_eq!(Place::schema().attributes.len(), 2);
/// assert_eq!(Place::default().population, None);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: ::std::option::Option<$ty>,
            )*
        }

        impl $crate::schema::Record for $name {
            fn schema() -> &'static $crate::schema::RecordSchema {
                static SCHEMA: $crate::schema::RecordSchema = $crate::schema::RecordSchema {
                    name: stringify!($name),
                    attributes: &[
                        $(
                            $crate::schema::Attribute {
                                name: stringify!($field),
                                attr_type: <$ty as $crate::schema::Attr>::ATTR_TYPE,
                            },
                        )*
                    ],
                };
                &SCHEMA
            }

            fn to_fields(&self) -> $crate::schema::Fields {
                let mut fields = $crate::schema::Fields::new();
                $(
                    if let ::std::option::Option::Some(value) = &self.$field {
                        fields.insert(stringify!($field), $crate::schema::Attr::to_value(value));
                    }
                )*
                fields
            }

            fn from_fields(
                mut fields: $crate::schema::Fields,
            ) -> ::std::result::Result<Self, $crate::error::FormatError> {
                ::std::result::Result::Ok(Self {
                    $( $field: fields.take::<$ty>(stringify!($field))?, )*
                })
            }
        }

        impl $crate::schema::Attr for $name {
            const ATTR_TYPE: $crate::schema::AttrType =
                $crate::schema::AttrType::Record(<$name as $crate::schema::Record>::schema);

            fn to_value(&self) -> $crate::schema::Value {
                $crate::schema::Value::Record($crate::schema::Record::to_fields(self))
            }

            fn from_value(
                value: $crate::schema::Value,
                attribute: &str,
            ) -> ::std::result::Result<Self, $crate::error::FormatError> {
                match value {
                    $crate::schema::Value::Record(fields) => {
                        <$name as $crate::schema::Record>::from_fields(fields)
                    }
                    _ => ::std::result::Result::Err($crate::error::FormatError::value_mismatch(
                        attribute,
                        &<$name as $crate::schema::Attr>::ATTR_TYPE,
                    )),
                }
            }
        }
    };
}
