//! Server-side item tables with optional snapshot persistence.
//!
//! Each table maps a rendered key (see [`TaggedValue::key_string`]) to one
//! item. Reads share the lock; writes take it exclusively and, when a snapshot
//! path is set, rewrite the snapshot before releasing it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use brewmatch_core::encoding::{TaggedValue, WireItem};
use brewmatch_core::types::{
    CHATS_KEY, CHATS_TABLE, CONTACTS_KEY, CONTACTS_TABLE, MANUAL_MATCHES_KEY,
    MANUAL_MATCHES_TABLE, USERS_KEY, USERS_TABLE,
};

use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Table {
    key_attribute: String,
    items: BTreeMap<String, WireItem>,
}

impl Tables {
    fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }
}

impl Table {
    /// Rendered identity of a `{attribute: value}` key.
    fn key_of(&self, key: &WireItem) -> Result<String> {
        if key.len() != 1 {
            return Err(StoreError::Validation(format!(
                "key must have exactly one attribute, got {}",
                key.len()
            )));
        }
        match key.get(&self.key_attribute) {
            Some(value) => render_key(&self.key_attribute, value),
            None => Err(StoreError::Validation(format!(
                "key must use attribute '{}'",
                self.key_attribute
            ))),
        }
    }

    fn key_of_item(&self, item: &WireItem) -> Result<String> {
        match item.get(&self.key_attribute) {
            Some(value) => render_key(&self.key_attribute, value),
            None => Err(StoreError::Validation(format!(
                "item is missing key attribute '{}'",
                self.key_attribute
            ))),
        }
    }
}

fn render_key(attribute: &str, value: &TaggedValue) -> Result<String> {
    value.key_string().ok_or_else(|| {
        StoreError::Validation(format!(
            "key attribute '{attribute}' has tag {}, expected N or S",
            value.tag()
        ))
    })
}

/// Put `previous` back under `key`, or clear the key if there was none.
fn restore(tables: &mut Tables, table: &str, key: String, previous: Option<WireItem>) {
    if let Some(t) = tables.tables.get_mut(table) {
        match previous {
            Some(item) => {
                t.items.insert(key, item);
            }
            None => {
                t.items.remove(&key);
            }
        }
    }
}

/// Shared handle to the server's tables.
#[derive(Clone, Default)]
pub struct ItemStore {
    inner: Arc<RwLock<Tables>>,
    snapshot: Option<PathBuf>,
}

impl ItemStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, loading the snapshot if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let tables: Tables = serde_json::from_slice(&bytes)?;
            info!(path = %path.display(), tables = tables.tables.len(), "snapshot loaded");
            tables
        } else {
            Tables::default()
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(tables)),
            snapshot: Some(path),
        })
    }

    /// Create the bot's users, contacts, chats and manual-matches tables.
    pub fn ensure_bot_tables(&self) -> Result<()> {
        self.create_table(USERS_TABLE, USERS_KEY)?;
        self.create_table(CONTACTS_TABLE, CONTACTS_KEY)?;
        self.create_table(CHATS_TABLE, CHATS_KEY)?;
        self.create_table(MANUAL_MATCHES_TABLE, MANUAL_MATCHES_KEY)?;
        Ok(())
    }

    /// Create a table. Re-creating with the same key attribute is a no-op.
    pub fn create_table(&self, name: &str, key_attribute: &str) -> Result<()> {
        let mut tables = self.inner.write();
        if let Some(existing) = tables.tables.get(name) {
            if existing.key_attribute == key_attribute {
                return Ok(());
            }
            return Err(StoreError::KeyAttributeConflict {
                table: name.to_string(),
                existing: existing.key_attribute.clone(),
                requested: key_attribute.to_string(),
            });
        }
        tables.tables.insert(
            name.to_string(),
            Table {
                key_attribute: key_attribute.to_string(),
                items: BTreeMap::new(),
            },
        );
        if let Err(e) = self.persist(&tables) {
            tables.tables.remove(name);
            return Err(e);
        }
        debug!(table = name, key = key_attribute, "table created");
        Ok(())
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.inner.read().tables.keys().cloned().collect()
    }

    pub fn scan(&self, table: &str) -> Result<Vec<WireItem>> {
        let tables = self.inner.read();
        Ok(tables.get(table)?.items.values().cloned().collect())
    }

    pub fn get_item(&self, table: &str, key: &WireItem) -> Result<Option<WireItem>> {
        let tables = self.inner.read();
        let t = tables.get(table)?;
        let k = t.key_of(key)?;
        Ok(t.items.get(&k).cloned())
    }

    /// Unconditional overwrite. If the snapshot cannot be written the
    /// previous item is restored.
    pub fn put_item(&self, table: &str, item: WireItem) -> Result<()> {
        let mut tables = self.inner.write();
        let t = tables.get_mut(table)?;
        let k = t.key_of_item(&item)?;
        let previous = t.items.insert(k.clone(), item);
        let persisted = self.persist(&tables);
        if persisted.is_err() {
            restore(&mut tables, table, k, previous);
        }
        persisted
    }

    /// Idempotent: removing a missing key succeeds.
    pub fn delete_item(&self, table: &str, key: &WireItem) -> Result<()> {
        let mut tables = self.inner.write();
        let t = tables.get_mut(table)?;
        let k = t.key_of(key)?;
        let Some(removed) = t.items.remove(&k) else {
            return Ok(());
        };
        let persisted = self.persist(&tables);
        if persisted.is_err() {
            restore(&mut tables, table, k, Some(removed));
        }
        persisted
    }

    fn persist(&self, tables: &Tables) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(tables)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
