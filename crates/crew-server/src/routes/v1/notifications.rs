//! Live notification socket.
//!
//! Browsers cannot set `Authorization` on a websocket upgrade, so the token
//! travels as `?token=` or as `Sec-WebSocket-Protocol: bearer, <token>`.
//! The credential is checked before the upgrade request itself, so a bad
//! token is the same 401 every other endpoint returns.

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message as Frame, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::SEC_WEBSOCKET_PROTOCOL;
use axum::response::{IntoResponse, Response};
use crew_auth::credential::{WS_BEARER_PROTOCOL, websocket_protocol_token};
use crew_core::identity::VerifiedIdentity;
use crew_core::message::Message;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TokenQuery>, QueryRejection>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let query_token = query.ok().and_then(|Query(q)| q.token);
    let protocol_header = headers
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok());
    let from_protocol = query_token.is_none();
    let raw = query_token
        .as_deref()
        .or_else(|| websocket_protocol_token(protocol_header));

    let identity = match raw.map(|raw| state.verifier.verify(raw)) {
        Some(Ok(identity)) => identity,
        Some(Err(error)) => {
            tracing::debug!(%error, "notification subscription rejected");
            return ApiError::unauthorized().into_response();
        }
        None => {
            tracing::debug!("notification subscription without credential");
            return ApiError::unauthorized().into_response();
        }
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return ApiError::validation(rejection.body_text()).into_response(),
    };
    // Echo the marker protocol so the browser accepts the handshake.
    let upgrade = if from_protocol {
        upgrade.protocols([WS_BEARER_PROTOCOL])
    } else {
        upgrade
    };

    upgrade.on_upgrade(move |socket| session(state, identity, socket))
}

async fn session(state: AppState, identity: VerifiedIdentity, socket: WebSocket) {
    let (connection, outbound) = state.broadcaster.connect(state.connection_buffer);
    let connection_id = state.broadcaster.register(&identity.user_id, connection);
    let span = tracing::info_span!("notifications", user = %identity.user_id, %connection_id);

    async {
        tracing::info!("subscriber connected");
        pump(socket, outbound).await;
        state.broadcaster.unregister(&identity.user_id, connection_id);
        tracing::info!("subscriber disconnected");
    }
    .instrument(span)
    .await;
}

/// Forward queued messages to the socket until either side goes away.
async fn pump(socket: WebSocket, mut outbound: mpsc::Receiver<Message>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(message) = next else { break };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::error!(%error, "failed to encode notification");
                        continue;
                    }
                };
                if let Err(error) = sink.send(Frame::Text(text.into())).await {
                    tracing::debug!(%error, "notification send failed");
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Frame::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    let _ = sink.close().await;
}
