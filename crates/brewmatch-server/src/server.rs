//! Unix domain socket server that wraps an [`ItemStore`].
//!
//! Each connected client sends JSON-line requests and receives JSON-line
//! responses. Connections are served concurrently; the store's lock
//! serializes writes.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::protocol::{Request, Response};
use crate::store::ItemStore;

/// Longest request line accepted, excluding the newline. A client that
/// exceeds it gets a `RequestTooLarge` error and is disconnected.
pub const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Sent if a response itself fails to serialize.
const SERIALIZATION_FALLBACK: &[u8] =
    b"{\"error\":\"SerializationError\",\"message\":\"failed to serialize response\"}";

/// A brewmatch item-store server listening on a Unix socket.
pub struct BrewmatchServer {
    store: ItemStore,
    socket_path: PathBuf,
}

impl BrewmatchServer {
    pub fn new(store: ItemStore, socket_path: PathBuf) -> Self {
        Self { store, socket_path }
    }

    /// Run the server, accepting connections until a shutdown signal is received.
    ///
    /// On startup, removes any stale socket file and binds a new one.
    /// On shutdown (SIGINT or SIGTERM), removes the socket file before exiting.
    pub async fn run(&self) -> std::io::Result<()> {
        // A previous run that was killed leaves its socket file behind.
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "server listening");

        let accept_loop = async {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        let store = self.store.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(store, stream).await {
                                warn!(error = %e, "connection handler error");
                            }
                        });
                    }
                    // Transient (e.g. out of file descriptors); keep serving.
                    Err(e) => {
                        error!(error = %e, "accept error");
                    }
                }
            }
        };

        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_signal() => {
                info!("shutdown signal received");
            }
        }

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(error = %e, "failed to remove socket file on shutdown");
            } else {
                info!(path = %self.socket_path.display(), "socket file removed");
            }
        }

        Ok(())
    }
}

async fn handle_connection(store: ItemStore, stream: UnixStream) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        // One byte past the cap tells an oversized line from one that fits.
        let n = (&mut reader)
            .take(MAX_REQUEST_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            break;
        }

        if line.last() != Some(&b'\n') && line.len() > MAX_REQUEST_BYTES {
            warn!(limit = MAX_REQUEST_BYTES, "request line too large, closing connection");
            let resp = Response::error(
                "RequestTooLarge",
                format!("request exceeds {MAX_REQUEST_BYTES} bytes"),
            );
            write_response(&mut writer, &resp).await?;
            break;
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_slice::<Request>(trimmed) {
            Ok(req) => dispatch(&store, req),
            Err(e) => Response::error("ParseError", e.to_string()),
        };
        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut resp_bytes =
        serde_json::to_vec(response).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_vec());
    resp_bytes.push(b'\n');
    writer.write_all(&resp_bytes).await?;
    writer.flush().await
}

/// Execute one request against the store.
pub fn dispatch(store: &ItemStore, req: Request) -> Response {
    match req {
        Request::Scan { table } => match store.scan(&table) {
            Ok(items) => {
                debug!(%table, count = items.len(), "scan");
                Response::ok_items(items)
            }
            Err(e) => error_response(e),
        },
        Request::GetItem { table, key } => match store.get_item(&table, &key) {
            Ok(item) => Response::ok_item(item),
            Err(e) => error_response(e),
        },
        Request::PutItem { table, item } => match store.put_item(&table, item) {
            Ok(()) => Response::ok_empty(),
            Err(e) => error_response(e),
        },
        Request::DeleteItem { table, key } => match store.delete_item(&table, &key) {
            Ok(()) => Response::ok_empty(),
            Err(e) => error_response(e),
        },
        Request::CreateTable {
            table,
            key_attribute,
        } => match store.create_table(&table, &key_attribute) {
            Ok(()) => Response::ok_empty(),
            Err(e) => error_response(e),
        },
        Request::ListTables => Response::ok_tables(store.list_tables()),
    }
}

fn error_response(err: StoreError) -> Response {
    if let StoreError::Io(_) | StoreError::Snapshot(_) = &err {
        error!(error = %err, "store failure");
    }
    Response::error(err.code(), err.to_string())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmatch_core::encoding::{TaggedValue, WireItem};

    fn user_item(id: &str) -> WireItem {
        let mut item = WireItem::new();
        item.insert("user_id".to_string(), TaggedValue::Number(id.to_string()));
        item
    }

    fn to_json(resp: &Response) -> serde_json::Value {
        serde_json::to_value(resp).unwrap()
    }

    #[test]
    fn test_dispatch_put_get() {
        let store = ItemStore::in_memory();
        store.ensure_bot_tables().unwrap();

        let resp = dispatch(
            &store,
            Request::PutItem {
                table: "users".to_string(),
                item: user_item("5"),
            },
        );
        assert_eq!(to_json(&resp), serde_json::json!({"ok": true}));

        let resp = dispatch(
            &store,
            Request::GetItem {
                table: "users".to_string(),
                key: user_item("5"),
            },
        );
        assert_eq!(
            to_json(&resp),
            serde_json::json!({"ok": true, "item": {"user_id": {"N": "5"}}})
        );
    }

    #[tokio::test]
    async fn test_connection_serves_lines_in_order() {
        let store = ItemStore::in_memory();
        store.ensure_bot_tables().unwrap();
        let (client, server) = UnixStream::pair().unwrap();
        tokio::spawn(handle_connection(store, server));

        let (reader, mut writer) = client.into_split();
        writer
            .write_all(b"{\"op\":\"put_item\",\"table\":\"users\",\"item\":{\"user_id\":{\"N\":\"1\"}}}\n\nnot json\n")
            .await
            .unwrap();
        let mut lines = BufReader::new(reader).lines();
        let first: serde_json::Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first, serde_json::json!({"ok": true}));
        // The blank line is skipped; the garbage line gets a parse error.
        let second: serde_json::Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(second["error"], "ParseError");
    }

    #[tokio::test]
    async fn test_oversized_request_is_rejected() {
        let (client, server) = UnixStream::pair().unwrap();
        tokio::spawn(handle_connection(ItemStore::in_memory(), server));

        let (reader, mut writer) = client.into_split();
        writer
            .write_all(&vec![b'x'; MAX_REQUEST_BYTES + 1])
            .await
            .unwrap();
        let mut lines = BufReader::new(reader).lines();
        let resp: serde_json::Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(resp["error"], "RequestTooLarge");
        // The server hangs up afterwards.
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[test]
    fn test_dispatch_errors() {
        let store = ItemStore::in_memory();
        let resp = dispatch(
            &store,
            Request::Scan {
                table: "users".to_string(),
            },
        );
        assert_eq!(to_json(&resp)["error"], "TableNotFound");

        store.ensure_bot_tables().unwrap();
        let resp = dispatch(
            &store,
            Request::PutItem {
                table: "users".to_string(),
                item: WireItem::new(),
            },
        );
        assert_eq!(to_json(&resp)["error"], "ValidationError");
    }
}
