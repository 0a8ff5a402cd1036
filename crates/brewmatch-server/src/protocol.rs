//! Wire protocol: JSON-over-newlines request/response types.
//!
//! Each request is a single JSON line; each response is a single JSON line.
//! Items and keys use the tagged item shape, e.g.
//! `{"op": "get_item", "table": "users", "key": {"user_id": {"N": "123"}}}`.

use serde::{Deserialize, Serialize};

use brewmatch_core::encoding::WireItem;

/// A request from a client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Scan {
        table: String,
    },
    GetItem {
        table: String,
        key: WireItem,
    },
    PutItem {
        table: String,
        item: WireItem,
    },
    DeleteItem {
        table: String,
        key: WireItem,
    },
    CreateTable {
        table: String,
        key_attribute: String,
    },
    ListTables,
}

/// A response sent back to the client.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok(OkResponse),
    Error(ErrorResponse),
}

/// Successful response variants.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OkResponse {
    Item {
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<WireItem>,
    },
    Items {
        ok: bool,
        items: Vec<WireItem>,
    },
    Tables {
        ok: bool,
        tables: Vec<String>,
    },
    Empty {
        ok: bool,
    },
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl Response {
    pub fn ok_empty() -> Self {
        Response::Ok(OkResponse::Empty { ok: true })
    }

    pub fn ok_item(item: Option<WireItem>) -> Self {
        Response::Ok(OkResponse::Item { ok: true, item })
    }

    pub fn ok_items(items: Vec<WireItem>) -> Self {
        Response::Ok(OkResponse::Items { ok: true, items })
    }

    pub fn ok_tables(tables: Vec<String>) -> Self {
        Response::Ok(OkResponse::Tables { ok: true, tables })
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            error: error.into(),
            message: message.into(),
        })
    }
}
