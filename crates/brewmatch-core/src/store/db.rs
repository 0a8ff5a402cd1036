//! Bot-facing persistence: one method per read/write the handlers need.

use crate::encoding::key::CompositeKey;
use crate::error::Result;
use crate::model::{Chat, Contact, ManualMatch, User};

use super::{Store, StoreClient};

/// Typed accessors for the users, contacts, chats and manual-matches
/// collections.
pub struct BotDb<C> {
    store: Store<C>,
}

impl<C: StoreClient> BotDb<C> {
    pub fn new(client: C) -> Self {
        Self {
            store: Store::new(client),
        }
    }

    pub fn store(&self) -> &Store<C> {
        &self.store
    }

    pub async fn close(self) -> Result<()> {
        self.store.close().await
    }

    // -- users --

    pub async fn read_users(&self) -> Result<Vec<User>> {
        self.store.scan_all().await
    }

    pub async fn put_user(&self, user: &User) -> Result<()> {
        self.store.put(user).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.store.get::<User>(&user_id).await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        self.store.delete::<User>(&user_id).await
    }

    // -- contacts --

    pub async fn read_contacts(&self) -> Result<Vec<Contact>> {
        self.store.scan_all().await
    }

    pub async fn put_contact(&self, contact: &Contact) -> Result<()> {
        self.store.put(contact).await
    }

    pub async fn get_contact(&self, key: &CompositeKey) -> Result<Option<Contact>> {
        self.store.get::<Contact>(key).await
    }

    pub async fn delete_contact(&self, key: &CompositeKey) -> Result<()> {
        self.store.delete::<Contact>(key).await
    }

    // -- chat state --

    /// The pending interaction state of a chat, if any.
    pub async fn get_chat_state(&self, chat_id: i64) -> Result<Option<String>> {
        let chat = self.store.get::<Chat>(&chat_id).await?;
        Ok(chat.and_then(|c| c.state))
    }

    /// Store `state` for the chat. `None` keeps the chat item with no state.
    pub async fn set_chat_state(&self, chat_id: i64, state: Option<&str>) -> Result<()> {
        let chat = Chat {
            id: Some(chat_id),
            state: state.map(str::to_string),
        };
        self.store.put(&chat).await
    }

    // -- manual matches --

    pub async fn read_manual_matches(&self) -> Result<Vec<ManualMatch>> {
        self.store.scan_all().await
    }

    pub async fn put_manual_match(&self, manual_match: &ManualMatch) -> Result<()> {
        self.store.put(manual_match).await
    }

    pub async fn delete_manual_match(&self, key: &CompositeKey) -> Result<()> {
        self.store.delete::<ManualMatch>(key).await
    }
}
