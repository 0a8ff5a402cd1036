//! brewmatch item-store server and client library.
//!
//! Serves named tables of tagged items over a Unix socket (JSON lines), and
//! provides [`SocketStoreClient`], the [`StoreClient`](brewmatch_core::StoreClient)
//! the bot talks to.

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::SocketStoreClient;
pub use server::BrewmatchServer;
pub use store::ItemStore;
