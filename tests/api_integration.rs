//! In-process HTTP tests for the ticketing API.
//!
//! Each test builds the full router over the in-memory store with a fixed
//! clock and drives it with `tower::ServiceExt::oneshot`.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use event_ticketing::app_state::AppState;
use event_ticketing::domain::{
    Clock, EventBus, EventId, EventKind, EventSnapshot, FixedClock, Location, RandomIdentifiers,
    TicketingPolicy,
};
use event_ticketing::export::PlainTextExporter;
use event_ticketing::persistence::{EventDirectory, InMemoryEventDirectory, InMemoryTicketStore};
use event_ticketing::service::ServiceContext;

const USER: &str = "";
const ADMIN: &str = "admin";
const STAFF: &str = "staff";

type Caller = Option<(Uuid, &'static str)>;

struct TestApp {
    router: Router,
    clock: Arc<FixedClock>,
    events: Arc<InMemoryEventDirectory>,
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

fn test_app() -> TestApp {
    let clock = Arc::new(FixedClock::new(epoch()));
    let events = Arc::new(InMemoryEventDirectory::new());
    let ctx = ServiceContext {
        store: Arc::new(InMemoryTicketStore::new()),
        events: Arc::clone(&events) as Arc<dyn EventDirectory>,
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
        policy: TicketingPolicy::default(),
        event_bus: EventBus::new(64),
    };
    let state = AppState::new(ctx, Arc::new(RandomIdentifiers), Arc::new(PlainTextExporter));
    TestApp {
        router: event_ticketing::build_app(state, StdDuration::from_secs(5)),
        clock,
        events,
    }
}

impl TestApp {
    async fn event(&self, kind: EventKind, price: Option<i64>, capacity: Option<u32>) -> EventId {
        let starts_at = epoch() + Duration::days(3);
        let event = EventSnapshot {
            id: EventId::new(),
            title: "Rooftop Cinema".to_string(),
            is_published: true,
            starts_at,
            ends_at: Some(starts_at + Duration::hours(3)),
            kind,
            ticket_price: price.map(Decimal::from),
            capacity,
            location: Location::Venue {
                name: "Skyline Deck".to_string(),
                address: "12 High St".to_string(),
                city: "Porto".to_string(),
            },
        };
        let id = event.id;
        self.events.upsert(event).await;
        id
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Caller,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes, _) = self.send_raw(method, uri, user, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        user: Caller,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder
                .header("x-user-id", id.to_string())
                .header("x-user-name", "Grace Hopper")
                .header("x-user-email", "grace@example.com");
            if !role.is_empty() {
                builder = builder.header("x-user-role", role);
            }
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec(), headers)
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["writable"], true);
    assert!(body.get("schema").is_none());
}

#[tokio::test]
async fn missing_identity_is_unauthenticated() {
    let app = test_app();
    let (status, body) = app.send("GET", "/api/v1/tickets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["reason"], "Unauthenticated");
}

#[tokio::test]
async fn free_ticket_flow_from_issue_to_used() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let event_id = app.event(EventKind::Free, None, None).await;

    let (status, issued) = app
        .send(
            "POST",
            "/api/v1/tickets",
            Some((owner, USER)),
            Some(json!({ "eventId": event_id.to_string(), "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issued["status"], "ACTIVE");
    assert_eq!(issued["paymentStatus"], "COMPLETED");
    assert_eq!(issued["quantity"], 2);
    let ticket_id = issued["ticketId"].as_str().unwrap().to_string();
    let scan_code = issued["scanCode"].as_str().unwrap().to_string();

    // Two days before start the gate is still closed.
    let (status, verdict) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "scanCode": scan_code })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["valid"], false);
    assert_eq!(verdict["reason"], "TooEarly");

    app.clock.set(epoch() + Duration::days(3));
    let (_, verdict) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "scanCode": scan_code })),
        )
        .await;
    assert_eq!(verdict["valid"], true);
    let attendees = verdict["ticket"]["attendees"].as_array().unwrap().clone();
    assert_eq!(attendees.len(), 2);
    assert_eq!(attendees[0]["fullName"], "Grace Hopper");

    let mut last = Value::Null;
    for attendee in &attendees {
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/checkin",
                Some((Uuid::new_v4(), STAFF)),
                Some(json!({ "ticketId": ticket_id, "attendeeId": attendee["id"] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["allCheckedIn"], true);

    let (status, again) = app
        .send(
            "POST",
            "/api/v1/checkin",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "ticketId": ticket_id, "attendeeId": attendees[0]["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"]["reason"], "AlreadyCheckedIn");

    let (_, ticket) = app
        .send(
            "GET",
            &format!("/api/v1/tickets/{ticket_id}"),
            Some((owner, USER)),
            None,
        )
        .await;
    assert_eq!(ticket["status"], "USED");

    let (_, verdict) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "scanCode": scan_code })),
        )
        .await;
    assert_eq!(verdict["reason"], "TicketNotActive");
}

#[tokio::test]
async fn unknown_scan_code_is_invalid() {
    let app = test_app();
    let (status, verdict) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "scanCode": "no-such-code" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["valid"], false);
    assert_eq!(verdict["reason"], "InvalidCode");
    assert!(verdict.get("ticket").is_none());
}

#[tokio::test]
async fn gate_endpoints_require_staff_or_admin() {
    let app = test_app();
    let scan = json!({ "scanCode": "no-such-code" });

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), USER)),
            Some(scan.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["reason"], "Forbidden");

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/checkin",
            Some((Uuid::new_v4(), USER)),
            Some(json!({ "ticketId": Uuid::new_v4(), "attendeeId": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, verdict) = app
        .send(
            "POST",
            "/api/v1/checkin/verify",
            Some((Uuid::new_v4(), ADMIN)),
            Some(scan),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["reason"], "InvalidCode");
}

#[tokio::test]
async fn malformed_requests_are_json_bad_requests() {
    let app = test_app();

    let (status, bytes, headers) = app
        .send_raw(
            "POST",
            "/api/v1/checkin",
            Some((Uuid::new_v4(), STAFF)),
            Some(json!({ "ticketId": "not-a-uuid", "attendeeId": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], 1001);
    assert_eq!(body["error"]["reason"], "InvalidRequest");

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/tickets",
            Some((Uuid::new_v4(), USER)),
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["reason"], "InvalidRequest");

    let (status, body) = app
        .send(
            "GET",
            "/api/v1/tickets/not-a-uuid",
            Some((Uuid::new_v4(), USER)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn ticketed_issue_stays_pending_until_payment_signal() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let event_id = app.event(EventKind::Ticketed, Some(25), None).await;

    let (status, issued) = app
        .send(
            "POST",
            "/api/v1/tickets",
            Some((owner, USER)),
            Some(json!({
                "eventId": event_id.to_string(),
                "attendees": [{ "fullName": "Alan Turing", "email": "alan@example.com" }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issued["paymentStatus"], "PENDING");
    assert_eq!(issued["totalAmount"], "25");
    let ticket_id = issued["ticketId"].clone();

    let signal = json!({ "ticketId": ticket_id, "signal": "completed", "reference": "pay_123" });
    let (status, _) = app
        .send(
            "POST",
            "/api/v1/payments/signal",
            Some((owner, USER)),
            Some(signal.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, ticket) = app
        .send("POST", "/api/v1/payments/signal", Some((admin, ADMIN)), Some(signal))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["paymentStatus"], "COMPLETED");
    assert_eq!(ticket["paymentRef"], "pay_123");
}

#[tokio::test]
async fn validation_errors_map_to_reason_codes() {
    let app = test_app();
    let owner = Some((Uuid::new_v4(), USER));

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/tickets",
            owner,
            Some(json!({ "eventId": Uuid::new_v4().to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["reason"], "EventNotFound");

    let event_id = app.event(EventKind::Free, None, Some(1)).await;
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/tickets",
            owner,
            Some(json!({ "eventId": event_id.to_string(), "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["reason"], "InvalidQuantity");

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/tickets",
            owner,
            Some(json!({ "eventId": event_id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/tickets",
            owner,
            Some(json!({ "eventId": event_id.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["reason"], "SoldOut");
}

#[tokio::test]
async fn owners_list_cancel_and_download_their_tickets() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let event_id = app.event(EventKind::Free, None, None).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, issued) = app
            .send(
                "POST",
                "/api/v1/tickets",
                Some((owner, USER)),
                Some(json!({ "eventId": event_id.to_string() })),
            )
            .await;
        ids.push(issued["ticketId"].as_str().unwrap().to_string());
        app.clock.advance(Duration::minutes(1));
    }

    let (status, page) = app
        .send(
            "GET",
            "/api/v1/tickets?page=1&per_page=2",
            Some((owner, USER)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["data"][0]["id"], ids[2].as_str());

    let (_, others) = app
        .send("GET", "/api/v1/tickets", Some((stranger, USER)), None)
        .await;
    assert_eq!(others["pagination"]["total"], 0);

    let cancel_uri = format!("/api/v1/tickets/{}/cancel", ids[0]);
    let (status, _) = app
        .send("POST", &cancel_uri, Some((stranger, USER)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancelled) = app
        .send("POST", &cancel_uri, Some((owner, USER)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (status, body) = app
        .send("POST", &cancel_uri, Some((owner, USER)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["reason"], "NotCancellable");

    let (status, bytes, headers) = app
        .send_raw(
            "GET",
            &format!("/api/v1/tickets/{}/download", ids[1]),
            Some((owner, USER)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment")
    );
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("Rooftop Cinema"));
    assert!(text.contains("Grace Hopper"));
}

#[tokio::test]
async fn purge_requires_admin_and_removes_tickets() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let event_id = app.event(EventKind::Free, None, None).await;
    for _ in 0..2 {
        app.send(
            "POST",
            "/api/v1/tickets",
            Some((owner, USER)),
            Some(json!({ "eventId": event_id.to_string() })),
        )
        .await;
    }

    let uri = format!("/api/v1/events/{event_id}/tickets");
    let (status, _) = app.send("DELETE", &uri, Some((owner, USER)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send("DELETE", &uri, Some((Uuid::new_v4(), ADMIN)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, list) = app
        .send("GET", "/api/v1/tickets", Some((owner, USER)), None)
        .await;
    assert_eq!(list["pagination"]["total"], 0);
}
