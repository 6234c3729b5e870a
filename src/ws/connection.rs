//! Read/write loop for one WebSocket connection.
//!
//! Client commands adjust the subscription filter; ticket events from the
//! bus are forwarded when their event id matches.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::messages::{WsCommand, WsMessage, WsMessageType, WsRequest};
use super::subscription::SubscriptionManager;
use crate::domain::{EventId, TicketEvent};

/// Runs the connection until the client closes it or the bus shuts down.
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<TicketEvent>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if let Some(json) = encode(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.event_id()) {
                            continue;
                        }
                        let Some(json) = event_message(&event).as_ref().and_then(encode) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "ws subscriber lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn encode(msg: &WsMessage) -> Option<String> {
    serde_json::to_string(msg).ok()
}

fn event_message(event: &TicketEvent) -> Option<WsMessage> {
    let payload = serde_json::to_value(event).ok()?;
    Some(WsMessage::new(
        Uuid::new_v4().to_string(),
        WsMessageType::Event,
        payload,
    ))
}

/// Splits raw ids into parsed event ids and the wildcard flag.
/// Unparseable ids are returned separately so the client can see them.
fn parse_ids(raw: &[String]) -> (Vec<EventId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut invalid = Vec::new();
    for value in raw {
        if value == "*" {
            wildcard = true;
        } else if let Ok(uuid) = value.parse::<Uuid>() {
            ids.push(EventId::from_uuid(uuid));
        } else {
            invalid.push(value.clone());
        }
    }
    (ids, wildcard, invalid)
}

/// Applies one client message and returns the reply.
pub(crate) fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let request = match serde_json::from_str::<WsRequest>(text) {
        Ok(request) => request,
        Err(e) => return WsMessage::error("", 400, &format!("invalid command: {e}")),
    };
    let id = request.id.unwrap_or_default();

    match request.command {
        WsCommand::Subscribe { event_ids } => {
            let (ids, wildcard, invalid) = parse_ids(&event_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "invalid": invalid,
                    "count": subs.count(),
                    "wildcard": subs.is_wildcard(),
                }),
            )
        }
        WsCommand::Unsubscribe { event_ids } => {
            let (ids, wildcard, invalid) = parse_ids(&event_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "invalid": invalid,
                    "count": subs.count(),
                    "wildcard": subs.is_wildcard(),
                }),
            )
        }
        WsCommand::Ping => WsMessage::new(
            id,
            WsMessageType::Response,
            serde_json::json!({ "pong": true }),
        ),
    }
}
