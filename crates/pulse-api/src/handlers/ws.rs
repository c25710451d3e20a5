//! WebSocket upgrade handler and per-connection transport tasks.

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use pulse_core::principal::Principal;
use pulse_realtime::connection::authenticator::bearer_from_params;
use pulse_realtime::connection::heartbeat::run_heartbeat;

use crate::error::ApiError;
use crate::state::AppState;

/// Optional query parameters accepted at upgrade time.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer token, when not sent via the Authorization header.
    pub token: Option<String>,
}

/// GET /ws — WebSocket upgrade.
///
/// The bearer credential is taken from the `Authorization: Bearer <jwt>`
/// header or the `token` query parameter. Authentication happens before
/// the upgrade: a rejected credential closes the handshake with 401 and
/// no connection record is ever created.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut params = HashMap::new();
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        params.insert("authorization".to_string(), auth.to_string());
    }
    if let Some(token) = query.token {
        params.insert("token".to_string(), token);
    }

    let credential = bearer_from_params(&params);
    let principal = state
        .authenticator
        .authenticate(credential.as_deref())
        .await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(state, principal, socket)))
}

/// Drives an established WebSocket connection until teardown.
async fn handle_socket(state: AppState, principal: Principal, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.gateway.connections.register(principal);
    let conn_id = handle.id;
    let cancel = handle.cancellation();

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Outbound worker: drains the bounded queue onto the socket.
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let raw = match serde_json::to_string(&msg) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound frame");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(raw.into())).await.is_err() {
                break;
            }
        }
    });

    let heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        state.gateway.connections.heartbeat_config(),
    ));

    // Read loop: inbound subscribe/unsubscribe/pong frames. Teardown is
    // unconditional once the cancellation token fires.
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = ws_rx.next() => match maybe {
                Some(Ok(Message::Text(text))) => {
                    state
                        .gateway
                        .connections
                        .handle_inbound(conn_id, text.as_str())
                        .await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    state.gateway.connections.unregister(conn_id);
    outbound_task.abort();
    heartbeat_task.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
