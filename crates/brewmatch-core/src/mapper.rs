//! Record mapper: record instance ↔ sparse wire item.

use crate::encoding::scalar::{decode_fields, encode_fields};
use crate::encoding::tagged::WireItem;
use crate::error::FormatError;
use crate::schema::Record;

/// Encode every present attribute; absent attributes get no key at all.
pub fn to_wire_item<R: Record>(record: &R) -> WireItem {
    encode_fields(&record.to_fields())
}

/// Decode `item` as an `R`.
///
/// Missing attributes decode as `None` and unknown attributes are ignored, so
/// this only fails on a malformed payload or a tag that disagrees with the
/// declared type.
pub fn from_wire_item<R: Record>(item: WireItem) -> Result<R, FormatError> {
    R::from_fields(decode_fields(item, R::schema())?)
}
