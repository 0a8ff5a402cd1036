//! Error types for all brewmatch-core operations.

use std::io;
use thiserror::Error;

use crate::schema::AttrType;

/// Top-level error type for brewmatch-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// A scalar payload that could not be decoded (or encoded) for its declared type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid integer literal: {value:?}")]
    InvalidInteger { value: String },

    #[error("invalid ISO-8601 timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    #[error("attribute '{attribute}': expected tag {expected}, found {actual}")]
    TagMismatch {
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("attribute '{attribute}': value is not a {expected}")]
    ValueMismatch {
        attribute: String,
        expected: &'static str,
    },

    #[error("attribute '{attribute}' of type {attr_type} cannot be carried in a compact payload")]
    UnsupportedPayloadType {
        attribute: String,
        attr_type: &'static str,
    },
}

impl FormatError {
    #[doc(hidden)]
    pub fn value_mismatch(attribute: &str, expected: &AttrType) -> Self {
        FormatError::ValueMismatch {
            attribute: attribute.to_string(),
            expected: expected.name(),
        }
    }
}

/// The store client's round trip failed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store disconnected")]
    Disconnected,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("store error: {code}: {message}")]
    Service { code: String, message: String },

    #[error("table not found: {0}")]
    TableNotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("table '{table}': missing key attribute '{attribute}'")]
    MissingKeyAttribute {
        table: &'static str,
        attribute: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
