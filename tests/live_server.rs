//! End-to-end tests against a bound server.
//!
//! Starts the application on an ephemeral port over the in-memory store,
//! then talks to it with `reqwest` and `tokio-tungstenite`.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use event_ticketing::app_state::AppState;
use event_ticketing::domain::{
    EventBus, EventId, EventKind, EventSnapshot, Location, RandomIdentifiers, SystemClock,
    TicketingPolicy,
};
use event_ticketing::export::PlainTextExporter;
use event_ticketing::persistence::{EventDirectory, InMemoryEventDirectory, InMemoryTicketStore};
use event_ticketing::service::ServiceContext;

async fn spawn_server() -> (SocketAddr, Arc<InMemoryEventDirectory>) {
    let events = Arc::new(InMemoryEventDirectory::new());
    let ctx = ServiceContext {
        store: Arc::new(InMemoryTicketStore::new()),
        events: Arc::clone(&events) as Arc<dyn EventDirectory>,
        clock: Arc::new(SystemClock),
        policy: TicketingPolicy::default(),
        event_bus: EventBus::new(64),
    };
    let state = AppState::new(ctx, Arc::new(RandomIdentifiers), Arc::new(PlainTextExporter));
    let app = event_ticketing::build_app(state, StdDuration::from_secs(5));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, events)
}

async fn publish_event(events: &InMemoryEventDirectory) -> EventId {
    let starts_at = Utc::now() + Duration::minutes(30);
    let event = EventSnapshot {
        id: EventId::new(),
        title: "Night Market".to_string(),
        is_published: true,
        starts_at,
        ends_at: Some(starts_at + Duration::hours(5)),
        kind: EventKind::Free,
        ticket_price: None,
        capacity: Some(100),
        location: Location::Online { url: None },
    };
    let id = event.id;
    events.upsert(event).await;
    id
}

async fn next_json<S>(stream: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(StdDuration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for ws message")
            .expect("ws stream ended")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn health_over_http() {
    let (addr, _) = spawn_server().await;
    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn ws_subscribers_see_issuance_and_check_in() {
    let (addr, events) = spawn_server().await;
    let event_id = publish_event(&events).await;
    let unrelated = publish_event(&events).await;

    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut tx, mut rx) = ws.split();
    tx.send(Message::text(
        json!({ "id": "sub-1", "command": "subscribe", "event_ids": [event_id.to_string()] })
            .to_string(),
    ))
    .await
    .unwrap();
    let ack = next_json(&mut rx).await;
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["id"], "sub-1");
    assert_eq!(ack["payload"]["count"], 1);

    let client = reqwest::Client::new();
    let user = Uuid::new_v4().to_string();

    // Activity on an event nobody watches is filtered out server-side.
    let status = client
        .post(format!("http://{addr}/api/v1/tickets"))
        .header("x-user-id", &user)
        .header("x-user-name", "Lin Yu")
        .header("x-user-email", "lin@example.com")
        .json(&json!({ "eventId": unrelated.to_string() }))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::CREATED);

    let issued: Value = client
        .post(format!("http://{addr}/api/v1/tickets"))
        .header("x-user-id", &user)
        .header("x-user-name", "Lin Yu")
        .header("x-user-email", "lin@example.com")
        .json(&json!({ "eventId": event_id.to_string() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let event = next_json(&mut rx).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "ticket_issued");
    assert_eq!(event["payload"]["ticket_id"], issued["ticketId"]);

    let verdict: Value = client
        .post(format!("http://{addr}/api/v1/checkin/verify"))
        .header("x-user-id", Uuid::new_v4().to_string())
        .header("x-user-role", "staff")
        .json(&json!({ "scanCode": issued["scanCode"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(verdict["valid"], true);
    let attendee_id = verdict["ticket"]["attendees"][0]["id"].clone();

    let checked: Value = client
        .post(format!("http://{addr}/api/v1/checkin"))
        .header("x-user-id", Uuid::new_v4().to_string())
        .header("x-user-role", "staff")
        .json(&json!({ "ticketId": issued["ticketId"], "attendeeId": attendee_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(checked["allCheckedIn"], true);

    let checked_in = next_json(&mut rx).await;
    assert_eq!(checked_in["payload"]["event_type"], "attendee_checked_in");
    assert_eq!(checked_in["payload"]["all_checked_in"], true);
    let used = next_json(&mut rx).await;
    assert_eq!(used["payload"]["event_type"], "ticket_used");
}
