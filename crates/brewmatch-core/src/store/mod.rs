//! Store access: scan / get / put / delete of typed records through an
//! injected [`StoreClient`].
//!
//! Each operation is exactly one client round trip. Failures of that round
//! trip surface as [`StorageError`](crate::error::StorageError); nothing here
//! retries. Puts are unconditional overwrites (last write wins).

pub mod db;
pub mod memory;

use std::future::Future;

use tracing::debug;

use crate::encoding::key::CompositeKey;
use crate::encoding::tagged::{TaggedValue, WireItem};
use crate::error::{KeyError, Result, StorageError};
use crate::mapper::{from_wire_item, to_wire_item};
use crate::schema::Record;

pub use db::BotDb;
pub use memory::MemoryStoreClient;

/// The single-attribute key of a stored item, e.g. `{"user_id": {"N": "123"}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemKey {
    pub attribute: String,
    pub value: TaggedValue,
}

impl ItemKey {
    pub fn new(attribute: impl Into<String>, value: TaggedValue) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn to_item(&self) -> WireItem {
        let mut item = WireItem::new();
        item.insert(self.attribute.clone(), self.value.clone());
        item
    }
}

/// A key-value store client over named collections of tagged items.
pub trait StoreClient: Send + Sync {
    /// Every item in `table`, in no particular order.
    fn scan(&self, table: &str)
    -> impl Future<Output = std::result::Result<Vec<WireItem>, StorageError>> + Send;

    /// The item under `key`, or `None`.
    fn get_item(
        &self,
        table: &str,
        key: &ItemKey,
    ) -> impl Future<Output = std::result::Result<Option<WireItem>, StorageError>> + Send;

    /// Store `item`, replacing whatever was under the same key.
    fn put_item(
        &self,
        table: &str,
        item: WireItem,
    ) -> impl Future<Output = std::result::Result<(), StorageError>> + Send;

    /// Remove the item under `key`. Removing a missing item is not an error.
    fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
    ) -> impl Future<Output = std::result::Result<(), StorageError>> + Send;

    /// Release the underlying connection.
    fn close(&self) -> impl Future<Output = std::result::Result<(), StorageError>> + Send {
        async { Ok(()) }
    }
}

/// A rendered store key value.
pub trait StoreKey {
    fn to_tagged(&self) -> TaggedValue;
}

impl StoreKey for i64 {
    fn to_tagged(&self) -> TaggedValue {
        TaggedValue::Number(self.to_string())
    }
}

impl StoreKey for CompositeKey {
    fn to_tagged(&self) -> TaggedValue {
        TaggedValue::String(self.as_str().to_string())
    }
}

/// A record type stored in its own collection.
///
/// `KEY_ATTRIBUTE` is either one of the record's own attributes (natural key)
/// or a synthetic attribute that only exists on the wire, holding the
/// rendered composite key.
pub trait StoredRecord: Record {
    const TABLE: &'static str;
    const KEY_ATTRIBUTE: &'static str;

    type Key: StoreKey + Send + Sync;

    /// The record's key, or `None` if a key attribute is absent.
    fn key(&self) -> Option<Self::Key>;

    fn item_key(key: &Self::Key) -> ItemKey {
        ItemKey::new(Self::KEY_ATTRIBUTE, key.to_tagged())
    }
}

/// Typed CRUD over a [`StoreClient`].
pub struct Store<C> {
    client: C,
}

impl<C: StoreClient> Store<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Every stored `R`, in store order.
    pub async fn scan_all<R: StoredRecord>(&self) -> Result<Vec<R>> {
        let items = self.client.scan(R::TABLE).await?;
        debug!(table = R::TABLE, count = items.len(), "scanned");
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(from_wire_item(item)?);
        }
        Ok(records)
    }

    /// The `R` stored under `key`, or `None`.
    pub async fn get<R: StoredRecord>(&self, key: &R::Key) -> Result<Option<R>> {
        let item_key = R::item_key(key);
        let item = self.client.get_item(R::TABLE, &item_key).await?;
        debug!(table = R::TABLE, key = ?item_key.value, found = item.is_some(), "get");
        match item {
            Some(item) => Ok(Some(from_wire_item(item)?)),
            None => Ok(None),
        }
    }

    /// Write `record`, overwriting any item under the same key.
    pub async fn put<R: StoredRecord>(&self, record: &R) -> Result<()> {
        let key = record.key().ok_or(KeyError::MissingKeyAttribute {
            table: R::TABLE,
            attribute: R::KEY_ATTRIBUTE,
        })?;
        let mut item = to_wire_item(record);
        let item_key = R::item_key(&key);
        debug!(table = R::TABLE, key = ?item_key.value, "put");
        item.insert(item_key.attribute, item_key.value);
        self.client.put_item(R::TABLE, item).await?;
        Ok(())
    }

    /// Remove the `R` under `key`; a missing item is fine.
    pub async fn delete<R: StoredRecord>(&self, key: &R::Key) -> Result<()> {
        let item_key = R::item_key(key);
        debug!(table = R::TABLE, key = ?item_key.value, "delete");
        self.client.delete_item(R::TABLE, &item_key).await?;
        Ok(())
    }

    /// Close the client. The store is unusable afterwards.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::key::KeyPart;
    use crate::error::Error;

    crate::record! {
        struct Pairing {
            week: i64,
            left: i64,
            right: i64,
            note: String,
        }
    }

    impl StoredRecord for Pairing {
        const TABLE: &'static str = "pairings";
        const KEY_ATTRIBUTE: &'static str = "key";
        type Key = CompositeKey;

        fn key(&self) -> Option<CompositeKey> {
            Some(pairing_key(self.week?, self.left?, self.right?))
        }
    }

    fn pairing_key(week: i64, left: i64, right: i64) -> CompositeKey {
        CompositeKey::new(vec![
            KeyPart::Int(week),
            KeyPart::Int(left),
            KeyPart::Int(right),
        ])
    }

    fn store() -> Store<MemoryStoreClient> {
        let client = MemoryStoreClient::new();
        client.create_table("pairings", "key");
        Store::new(client)
    }

    #[tokio::test]
    async fn test_put_attaches_synthetic_key() {
        let store = store();
        let pairing = Pairing {
            week: Some(5),
            left: Some(10),
            right: Some(20),
            note: None,
        };
        store.put(&pairing).await.unwrap();

        let raw = store
            .client()
            .get_item(
                "pairings",
                &ItemKey::new("key", TaggedValue::String("5#10#20".to_string())),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw["key"], TaggedValue::String("5#10#20".to_string()));
        assert!(!raw.contains_key("note"));

        let fetched: Pairing = store.get(&pairing_key(5, 10, 20)).await.unwrap().unwrap();
        assert_eq!(fetched, pairing);
    }

    #[tokio::test]
    async fn test_put_without_key_fails_locally() {
        let store = store();
        let err = store
            .put(&Pairing {
                week: Some(1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Key(KeyError::MissingKeyAttribute {
                table: "pairings",
                attribute: "key",
            })
        ));
        assert!(store.scan_all::<Pairing>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let store = store();
        store.client().fail_next("ProvisionedThroughputExceeded");
        let err = store.get::<Pairing>(&pairing_key(1, 2, 3)).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Service { .. })));
        // Only the next call fails.
        assert!(store.get::<Pairing>(&pairing_key(1, 2, 3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_format_error_on_scan() {
        let store = store();
        let mut bad = WireItem::new();
        bad.insert("key".to_string(), TaggedValue::String("x".to_string()));
        bad.insert("week".to_string(), TaggedValue::Number("x".to_string()));
        store.client().put_item("pairings", bad).await.unwrap();
        let err = store.scan_all::<Pairing>().await.unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
