//! # brewmatch-core
//!
//! Typed-record persistence and compact wire encodings for the brewmatch
//! random-coffee bot.
//!
//! - [`mapper`] turns a record into a sparse tagged item (`{"N": "123"}`,
//!   `{"S": ..}`, `{"BOOL": ..}`, `{"M": {..}}`) and back.
//! - [`encoding::key`] renders composite keys as `#`-joined strings.
//! - [`store`] provides scan / get / put / delete over an injected
//!   [`store::StoreClient`].
//! - [`encoding::payload`] packs small flat records into `prefix:a:b:c`
//!   strings for the callback-data channel.
//!
//! ## Quick Start
//!
//! ```
//! use brewmatch_core::encoding::payload;
//! use brewmatch_core::mapper::to_wire_item;
//! use brewmatch_core::model::{FeedbackData, Intro, User};
//!
//! let user = User {
//!     user_id: Some(123),
//!     intro: Some(Intro {
//!         name: Some("Alex".to_string()),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! let item = to_wire_item(&user);
//! assert_eq!(item.len(), 2);
//!
//! let data = FeedbackData {
//!     week_index: Some(3),
//!     partner_user_id: Some(456),
//!     state: None,
//!     feedback_score: Some("2".to_string()),
//! };
//! assert_eq!(payload::encode(&data).unwrap(), "feedback:3:456::2");
//! ```

pub mod encoding;
pub mod error;
pub mod mapper;
pub mod model;
pub mod schema;
pub mod store;
pub mod types;
pub mod week;

pub use error::{Error, FormatError, KeyError, Result, StorageError};
pub use schema::Record;
pub use store::{BotDb, Store, StoreClient, StoredRecord};
