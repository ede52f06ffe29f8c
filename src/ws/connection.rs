//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered bus traffic. A
//! connection that registers as the platform adapter also receives the
//! platform requests and answers them with `ack` commands.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{VzpEvent, VzpId};
use crate::platform::{AdapterHub, AdapterRequest, AdapterSession};
use crate::render::summary_line;
use crate::service::VzpService;

/// Per-connection state.
#[derive(Debug, Default)]
struct ConnectionState {
    subs: SubscriptionManager,
    adapter: Option<AdapterSession>,
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
/// - Forwards platform requests once the client registered as adapter.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<VzpEvent>,
    vzp_service: Arc<VzpService>,
    adapter_hub: Arc<AdapterHub>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut conn = ConnectionState::default();
    tracing::debug!("ws connection opened");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response =
                            handle_text_message(&text, &mut conn, &vzp_service, &adapter_hub).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(vzp_event) => {
                        if conn.subs.matches(vzp_event.vzp_id()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&vzp_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            request = next_request(&mut conn.adapter) => {
                match request {
                    Some(req) => {
                        let msg = WsMessage::new(
                            req.request_id.to_string(),
                            WsMessageType::Request,
                            serde_json::to_value(&req.request).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        tracing::warn!("adapter registration superseded");
                        conn.adapter = None;
                    }
                }
            }
        }
    }

    if let Some(session) = conn.adapter.take() {
        adapter_hub.unregister(session.link_id).await;
    }
    tracing::debug!("ws connection closed");
}

/// Waits for the next platform request; never resolves for a connection
/// that is not the adapter.
async fn next_request(session: &mut Option<AdapterSession>) -> Option<AdapterRequest> {
    match session {
        Some(session) => session.requests.recv().await,
        None => std::future::pending().await,
    }
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    conn: &mut ConnectionState,
    service: &VzpService,
    adapter_hub: &AdapterHub,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let reply = match command {
        WsCommand::Subscribe { vzp_ids } => {
            let wildcard = vzp_ids.iter().any(|s| s == "*");
            let ids = parse_ids(&vzp_ids);
            conn.subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids,
                    "count": conn.subs.count(),
                    "wildcard": conn.subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { vzp_ids } => {
            let ids = parse_ids(&vzp_ids);
            conn.subs.unsubscribe(&ids);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids,
                    "remaining_count": conn.subs.count(),
                }),
            )
        }
        WsCommand::GetState { vzp_id } => {
            let Some(id) = VzpId::parse(&vzp_id) else {
                return serde_json::to_string(&WsMessage::error(msg.id, 400, "invalid vzp id"))
                    .ok();
            };
            match (service.get(&id).await, service.rendered(&id).await) {
                (Ok(vzp), Ok(rendered)) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "vzp": vzp, "rendered": rendered }),
                ),
                (Err(err), _) | (_, Err(err)) => {
                    WsMessage::error(msg.id, err.status_code().as_u16(), &err.to_string())
                }
            }
        }
        WsCommand::ListVzps => {
            let vzps: Vec<serde_json::Value> = service
                .list()
                .await
                .iter()
                .map(|s| serde_json::json!({ "summary": s, "line": summary_line(s) }))
                .collect();
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({ "vzps": vzps }),
            )
        }
        WsCommand::RegisterAdapter { token } => {
            if let Some(session) = &conn.adapter {
                WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "registered": true, "link_id": session.link_id }),
                )
            } else {
                match adapter_hub.register(token.as_deref()).await {
                    Some(session) => {
                        let link_id = session.link_id;
                        conn.adapter = Some(session);
                        WsMessage::new(
                            msg.id,
                            WsMessageType::Response,
                            serde_json::json!({ "registered": true, "link_id": link_id }),
                        )
                    }
                    None => WsMessage::error(msg.id, 403, "adapter token rejected"),
                }
            }
        }
        WsCommand::Ack(ack) => {
            let Some(session) = &conn.adapter else {
                return serde_json::to_string(&WsMessage::error(
                    msg.id,
                    403,
                    "only the registered adapter may acknowledge requests",
                ))
                .ok();
            };
            let request_id = ack.request_id;
            let accepted = adapter_hub.acknowledge(session.link_id, ack).await;
            if !accepted {
                tracing::debug!(%request_id, "ack for unknown request");
            }
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({ "request_id": request_id, "accepted": accepted }),
            )
        }
    };
    serde_json::to_string(&reply).ok()
}

fn parse_ids(raw: &[String]) -> Vec<VzpId> {
    raw.iter()
        .filter(|s| s.as_str() != "*")
        .filter_map(|s| VzpId::parse(s))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::VzpConfig;
    use crate::domain::EventBus;
    use crate::persistence::SnapshotStore;
    use crate::platform::{Collaborators, MemberDirectory, Notifier, PlatformRequest};

    struct Fixture {
        service: VzpService,
        hub: Arc<AdapterHub>,
        _dir: tempfile::TempDir,
    }

    fn fixture(token: Option<&str>) -> Fixture {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let bus = EventBus::new(16);
        let hub = Arc::new(AdapterHub::new(
            Duration::from_secs(2),
            token.map(str::to_string),
        ));
        let collaborators =
            Collaborators::over_adapter(Arc::new(MemberDirectory::new()), Arc::clone(&hub));
        let service = VzpService::new(
            Arc::new(VzpConfig::default()),
            bus,
            collaborators,
            Arc::new(SnapshotStore::new(dir.path())),
        );
        Fixture {
            service,
            hub,
            _dir: dir,
        }
    }

    fn command(payload: serde_json::Value) -> String {
        let msg = WsMessage::new("req-1", WsMessageType::Command, payload);
        serde_json::to_string(&msg).unwrap_or_default()
    }

    async fn reply(text: &str, conn: &mut ConnectionState, fx: &Fixture) -> WsMessage {
        let Some(json) = handle_text_message(text, conn, &fx.service, &fx.hub).await else {
            panic!("expected a reply");
        };
        let Ok(msg) = serde_json::from_str::<WsMessage>(&json) else {
            panic!("reply is not a ws message");
        };
        msg
    }

    #[tokio::test]
    async fn subscribe_wildcard() {
        let fx = fixture(None);
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({ "command": "subscribe", "vzp_ids": ["*", "ABCD1234"] }));

        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.msg_type, WsMessageType::Response);
        assert_eq!(msg.payload["wildcard"], true);
        assert_eq!(msg.payload["count"], 1);
        assert!(conn.subs.is_subscribed_all());
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let fx = fixture(None);
        let mut conn = ConnectionState::default();
        let msg = reply("{oops", &mut conn, &fx).await;
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 400);
    }

    #[tokio::test]
    async fn get_state_of_unknown_vzp_is_not_found() {
        let fx = fixture(None);
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({ "command": "get_state", "vzp_id": "deadbeef" }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 404);
    }

    #[tokio::test]
    async fn list_is_empty_initially() {
        let fx = fixture(None);
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({ "command": "list_vzps" }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.payload["vzps"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn viewer_cannot_acknowledge() {
        let fx = fixture(None);
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({
            "command": "ack",
            "request_id": uuid::Uuid::new_v4(),
        }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 403);
    }

    #[tokio::test]
    async fn wrong_token_is_refused() {
        let fx = fixture(Some("s3cret"));
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({ "command": "register_adapter", "token": "nope" }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.payload["code"], 403);
        assert!(conn.adapter.is_none());
        assert!(!fx.hub.is_connected().await);
    }

    #[tokio::test]
    async fn registered_adapter_receives_and_acks_requests() {
        let fx = fixture(Some("s3cret"));
        let mut conn = ConnectionState::default();
        let text = command(serde_json::json!({ "command": "register_adapter", "token": "s3cret" }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.payload["registered"], true);

        let pending = {
            let hub = Arc::clone(&fx.hub);
            tokio::spawn(async move { hub.broadcast("@everyone").await })
        };
        let Some(request) = next_request(&mut conn.adapter).await else {
            panic!("request not forwarded");
        };
        let PlatformRequest::Broadcast { text: posted } = &request.request else {
            panic!("expected a broadcast");
        };
        assert_eq!(posted, "@everyone");

        let text = command(serde_json::json!({
            "command": "ack",
            "request_id": request.request_id,
        }));
        let msg = reply(&text, &mut conn, &fx).await;
        assert_eq!(msg.payload["accepted"], true);

        let Ok(result) = pending.await else {
            panic!("request task");
        };
        assert_eq!(result, Ok(()));
    }
}
