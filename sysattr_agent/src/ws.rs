//! WebSocket upgrade and per-connection handler. Each text request is
//! answered with one JSON text frame.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::StreamExt;
use serde::Serialize;
use serde_json::json;
use sysattr::UsageError;
use tracing::debug;

use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn error_json(msg: &str) -> String {
    json!({ "error": msg }).to_string()
}

fn to_json<T: Serialize>(res: Result<T, UsageError>) -> String {
    match res {
        Ok(v) => serde_json::to_string(&v).unwrap_or_else(|e| error_json(&e.to_string())),
        Err(e) => error_json(&e.to_string()),
    }
}

pub async fn respond(state: &AppState, request: &str) -> String {
    let source = state.source.as_ref();
    let registry = state.registry.as_ref();
    match request {
        "get_disk_usage" => {
            to_json(sysattr::disk_usage(source, registry, state.data_dir.as_path()).await)
        }
        "get_memory_usage" => to_json(sysattr::memory_usage(source, registry).await),
        "get_cpu_usage" => to_json(sysattr::cpu_usage(source, registry).await),
        "get_cpu_temperature" => to_json(sysattr::cpu_temperature(source).await),
        "get_device" => to_json(Ok(sysattr::detect_device(source).await)),
        "get_ip_addresses" => to_json(Ok(sysattr::ip_addresses(source).await)),
        _ => error_json("unknown request"),
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    while let Some(Ok(msg)) = socket.next().await {
        match msg {
            Message::Text(text) => {
                debug!(request = %text, "ws request");
                let reply = respond(&state, text.trim()).await;
                if socket.send(Message::Text(reply)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn unknown_request_is_an_error_reply() {
        let td = tempfile::tempdir().unwrap();
        let state = AppState::rooted_at(td.path(), None);
        let reply: Value = serde_json::from_str(&respond(&state, "bogus").await).unwrap();
        assert_eq!(reply, json!({ "error": "unknown request" }));
    }

    #[tokio::test]
    async fn failed_snapshot_is_an_error_reply() {
        // no proc tree under the root, so there is nothing to attribute
        let td = tempfile::tempdir().unwrap();
        let state = AppState::rooted_at(td.path(), None);
        let reply: Value =
            serde_json::from_str(&respond(&state, "get_memory_usage").await).unwrap();
        let msg = reply["error"].as_str().unwrap();
        assert!(msg.contains("process memory"), "{msg}");
        assert!(reply.get("apps").is_none());
    }

    #[tokio::test]
    async fn device_reply_is_camel_case_json() {
        let td = tempfile::tempdir().unwrap();
        let state = AppState::rooted_at(td.path(), None);
        let reply: Value = serde_json::from_str(&respond(&state, "get_device").await).unwrap();
        assert_eq!(reply["deviceId"], "unknown");
        assert!(reply.get("error").is_none());
    }
}
