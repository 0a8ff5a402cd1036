//! Wire encodings: tagged store values, composite keys, compact payloads.

pub mod key;
pub mod payload;
pub mod scalar;
pub mod tagged;

pub use key::{CompositeKey, KeyPart, build_key};
pub use tagged::{Tag, TaggedValue, WireItem};
