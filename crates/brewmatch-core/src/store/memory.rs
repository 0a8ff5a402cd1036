//! In-process [`StoreClient`] for tests and embedders.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use super::{ItemKey, StoreClient};
use crate::encoding::tagged::WireItem;
use crate::error::StorageError;
use crate::types::{
    CHATS_KEY, CHATS_TABLE, CONTACTS_KEY, CONTACTS_TABLE, MANUAL_MATCHES_KEY,
    MANUAL_MATCHES_TABLE, USERS_KEY, USERS_TABLE,
};

struct Table {
    key_attribute: String,
    items: HashMap<String, WireItem>,
}

/// Tables held in memory behind a lock. Same semantics as the socket client:
/// unknown tables fail, puts overwrite, deletes are idempotent.
#[derive(Default)]
pub struct MemoryStoreClient {
    tables: RwLock<HashMap<String, Table>>,
    injected_failure: Mutex<Option<String>>,
}

impl MemoryStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client with the bot's four tables already created.
    pub fn with_bot_tables() -> Self {
        let client = Self::new();
        client.create_table(USERS_TABLE, USERS_KEY);
        client.create_table(CONTACTS_TABLE, CONTACTS_KEY);
        client.create_table(CHATS_TABLE, CHATS_KEY);
        client.create_table(MANUAL_MATCHES_TABLE, MANUAL_MATCHES_KEY);
        client
    }

    /// Create `name` keyed by `key_attribute`. No-op if it already exists.
    pub fn create_table(&self, name: &str, key_attribute: &str) {
        self.tables
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Table {
                key_attribute: key_attribute.to_string(),
                items: HashMap::new(),
            });
    }

    /// Make the next operation fail with a service error carrying `code`.
    pub fn fail_next(&self, code: &str) {
        *self.injected_failure.lock() = Some(code.to_string());
    }

    pub fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .get(table)
            .map_or(0, |t| t.items.len())
    }

    fn check_injected(&self) -> Result<(), StorageError> {
        match self.injected_failure.lock().take() {
            Some(code) => Err(StorageError::Service {
                message: "injected failure".to_string(),
                code,
            }),
            None => Ok(()),
        }
    }
}

fn key_string(key: &ItemKey, table: &Table) -> Result<String, StorageError> {
    if key.attribute != table.key_attribute {
        return Err(validation_error(format!(
            "key attribute '{}' does not match table key '{}'",
            key.attribute, table.key_attribute
        )));
    }
    key.value
        .key_string()
        .ok_or_else(|| validation_error(format!("invalid key tag {}", key.value.tag())))
}

fn validation_error(message: String) -> StorageError {
    StorageError::Service {
        code: "ValidationError".to_string(),
        message,
    }
}

impl StoreClient for MemoryStoreClient {
    async fn scan(&self, table: &str) -> Result<Vec<WireItem>, StorageError> {
        self.check_injected()?;
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(t.items.values().cloned().collect())
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<WireItem>, StorageError> {
        self.check_injected()?;
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        let k = key_string(key, t)?;
        Ok(t.items.get(&k).cloned())
    }

    async fn put_item(&self, table: &str, item: WireItem) -> Result<(), StorageError> {
        self.check_injected()?;
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        let value = item.get(&t.key_attribute).cloned().ok_or_else(|| {
            validation_error(format!("item is missing key attribute '{}'", t.key_attribute))
        })?;
        let k = key_string(&ItemKey::new(t.key_attribute.clone(), value), t)?;
        t.items.insert(k, item);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), StorageError> {
        self.check_injected()?;
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        let k = key_string(key, t)?;
        t.items.remove(&k);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::tagged::TaggedValue;

    fn user_item(id: &str, name: &str) -> WireItem {
        let mut item = WireItem::new();
        item.insert("user_id".to_string(), TaggedValue::Number(id.to_string()));
        item.insert("username".to_string(), TaggedValue::String(name.to_string()));
        item
    }

    fn user_key(id: &str) -> ItemKey {
        ItemKey::new("user_id", TaggedValue::Number(id.to_string()))
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let client = MemoryStoreClient::with_bot_tables();
        client.put_item("users", user_item("1", "a")).await.unwrap();
        client.put_item("users", user_item("1", "b")).await.unwrap();
        assert_eq!(client.item_count("users"), 1);
        let item = client.get_item("users", &user_key("1")).await.unwrap().unwrap();
        assert_eq!(item["username"], TaggedValue::String("b".to_string()));
    }

    #[tokio::test]
    async fn test_delete_idempotent() {
        let client = MemoryStoreClient::with_bot_tables();
        client.put_item("users", user_item("1", "a")).await.unwrap();
        client.delete_item("users", &user_key("1")).await.unwrap();
        client.delete_item("users", &user_key("1")).await.unwrap();
        assert!(client.get_item("users", &user_key("1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_number_and_string_keys_distinct() {
        let client = MemoryStoreClient::with_bot_tables();
        client.put_item("users", user_item("1", "a")).await.unwrap();
        let as_string = ItemKey::new("user_id", TaggedValue::String("1".to_string()));
        assert!(client.get_item("users", &as_string).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let client = MemoryStoreClient::new();
        let err = client.scan("users").await.unwrap_err();
        assert!(matches!(err, StorageError::TableNotFound(t) if t == "users"));
    }

    #[tokio::test]
    async fn test_put_without_key_attribute() {
        let client = MemoryStoreClient::with_bot_tables();
        let mut item = WireItem::new();
        item.insert("username".to_string(), TaggedValue::String("a".to_string()));
        let err = client.put_item("users", item).await.unwrap_err();
        assert!(matches!(err, StorageError::Service { code, .. } if code == "ValidationError"));
    }
}
