//! Client library for connecting to a `brewmatch-server` via Unix socket.
//!
//! Each method serializes a JSON-line request, sends it, reads a JSON-line
//! response, and returns the parsed result. One connection carries one request
//! at a time; concurrent callers queue on an async mutex.

use std::path::Path;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use brewmatch_core::encoding::WireItem;
use brewmatch_core::error::StorageError;
use brewmatch_core::store::{ItemKey, StoreClient};

use crate::protocol::Request;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, StorageError>;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line_buf: String,
    /// Set while a request is on the wire. Still set on entry means an
    /// earlier call was dropped before reading its reply.
    in_flight: bool,
}

/// Client for a brewmatch item-store server.
pub struct SocketStoreClient {
    conn: Mutex<Connection>,
}

impl SocketStoreClient {
    /// Connect to a server at the given Unix socket path.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            conn: Mutex::new(Connection {
                reader: BufReader::new(read_half),
                writer: BufWriter::new(write_half),
                line_buf: String::new(),
                in_flight: false,
            }),
        })
    }

    /// Create a table keyed by `key_attribute`.
    pub async fn create_table(&self, table: &str, key_attribute: &str) -> Result<()> {
        let resp = self
            .send_request(&Request::CreateTable {
                table: table.to_string(),
                key_attribute: key_attribute.to_string(),
            })
            .await?;
        check_error(&resp, table)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let resp = self.send_request(&Request::ListTables).await?;
        check_error(&resp, "")?;
        let tables = resp
            .get("tables")
            .and_then(|v| v.as_array())
            .ok_or_else(|| StorageError::Protocol("missing 'tables' in response".to_string()))?;
        Ok(tables
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn send_request(&self, req: &Request) -> Result<Value> {
        let mut data =
            serde_json::to_vec(req).map_err(|e| StorageError::Serialization(e.to_string()))?;
        data.push(b'\n');

        let mut conn = self.conn.lock().await;
        let Connection {
            reader,
            writer,
            line_buf,
            in_flight,
        } = &mut *conn;

        // The stream may hold an unread reply; nothing after it can be matched.
        if *in_flight {
            return Err(StorageError::Disconnected);
        }
        *in_flight = true;

        writer.write_all(&data).await?;
        writer.flush().await?;

        line_buf.clear();
        let n = reader.read_line(line_buf).await?;
        if n == 0 {
            return Err(StorageError::Disconnected);
        }
        *in_flight = false;

        serde_json::from_str(line_buf.trim()).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl StoreClient for SocketStoreClient {
    async fn scan(&self, table: &str) -> Result<Vec<WireItem>> {
        let resp = self
            .send_request(&Request::Scan {
                table: table.to_string(),
            })
            .await?;
        items_from_response(resp, table)
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<WireItem>> {
        let resp = self
            .send_request(&Request::GetItem {
                table: table.to_string(),
                key: key.to_item(),
            })
            .await?;
        item_from_response(resp, table)
    }

    async fn put_item(&self, table: &str, item: WireItem) -> Result<()> {
        let resp = self
            .send_request(&Request::PutItem {
                table: table.to_string(),
                item,
            })
            .await?;
        check_error(&resp, table)
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<()> {
        let resp = self
            .send_request(&Request::DeleteItem {
                table: table.to_string(),
                key: key.to_item(),
            })
            .await?;
        check_error(&resp, table)
    }

    async fn close(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.writer.shutdown().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn check_error(resp: &Value, table: &str) -> Result<()> {
    if let Some(err) = resp.get("error") {
        let code = err.as_str().unwrap_or("Unknown").to_string();
        if code == "TableNotFound" {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        let message = resp
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        return Err(StorageError::Service { code, message });
    }
    Ok(())
}

fn item_from_response(mut resp: Value, table: &str) -> Result<Option<WireItem>> {
    check_error(&resp, table)?;
    match resp.get_mut("item").map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(item) => serde_json::from_value(item)
            .map(Some)
            .map_err(|e| StorageError::Protocol(format!("malformed item: {e}"))),
    }
}

fn items_from_response(mut resp: Value, table: &str) -> Result<Vec<WireItem>> {
    check_error(&resp, table)?;
    let items = resp
        .get_mut("items")
        .map(Value::take)
        .ok_or_else(|| StorageError::Protocol("missing 'items' in response".to_string()))?;
    serde_json::from_value(items).map_err(|e| StorageError::Protocol(format!("malformed items: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmatch_core::encoding::TaggedValue;
    use serde_json::json;
    use tokio::net::UnixListener;
    use tokio::time::{Duration, sleep, timeout};

    use crate::protocol::Response;

    /// Serve `get_item` by echoing the requested key back as the item,
    /// after `delay`.
    fn spawn_slow_server(listener: UnixListener, delay: Duration) {
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                sleep(delay).await;
                let resp = match serde_json::from_str::<Request>(&line) {
                    Ok(Request::GetItem { key, .. }) => Response::ok_item(Some(key)),
                    _ => Response::error("ParseError", "unexpected request"),
                };
                let mut bytes = serde_json::to_vec(&resp).unwrap();
                bytes.push(b'\n');
                if writer.write_all(&bytes).await.is_err() {
                    return;
                }
            }
        });
    }

    fn user_key(id: &str) -> ItemKey {
        ItemKey::new("user_id", TaggedValue::Number(id.to_string()))
    }

    #[tokio::test]
    async fn test_sequential_requests_get_their_own_reply() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("slow.sock");
        spawn_slow_server(UnixListener::bind(&sock).unwrap(), Duration::from_millis(5));

        let client = SocketStoreClient::connect(&sock).await.unwrap();
        for id in ["1", "2", "3"] {
            let item = client.get_item("users", &user_key(id)).await.unwrap().unwrap();
            assert_eq!(item["user_id"], TaggedValue::Number(id.to_string()));
        }
    }

    #[tokio::test]
    async fn test_cancelled_request_poisons_connection() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("slow.sock");
        spawn_slow_server(UnixListener::bind(&sock).unwrap(), Duration::from_millis(100));

        let client = SocketStoreClient::connect(&sock).await.unwrap();
        let cancelled = timeout(
            Duration::from_millis(20),
            client.get_item("users", &user_key("1")),
        )
        .await;
        assert!(cancelled.is_err());

        // The late reply for user 1 must never be handed to the next caller.
        let err = client.get_item("users", &user_key("2")).await.unwrap_err();
        assert!(matches!(err, StorageError::Disconnected));
        sleep(Duration::from_millis(150)).await;
        assert!(matches!(
            client.get_item("users", &user_key("2")).await,
            Err(StorageError::Disconnected)
        ));
    }

    #[test]
    fn test_check_error_mapping() {
        let err = check_error(
            &json!({"error": "TableNotFound", "message": "table not found: users"}),
            "users",
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::TableNotFound(t) if t == "users"));

        let err = check_error(
            &json!({"error": "ValidationError", "message": "bad key"}),
            "users",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Service { code, message } if code == "ValidationError" && message == "bad key"
        ));

        assert!(check_error(&json!({"ok": true}), "users").is_ok());
    }

    #[test]
    fn test_item_from_response() {
        assert!(item_from_response(json!({"ok": true}), "users").unwrap().is_none());
        let item =
            item_from_response(json!({"ok": true, "item": {"id": {"N": "1"}}}), "chats")
                .unwrap()
                .unwrap();
        assert_eq!(item.len(), 1);
        assert!(matches!(
            item_from_response(json!({"ok": true, "item": {"id": {"X": 1}}}), "chats"),
            Err(StorageError::Protocol(_))
        ));
    }
}
