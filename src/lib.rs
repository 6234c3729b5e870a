//! # event-ticketing
//!
//! Ticket issuance, scan verification and attendee check-in for an event
//! discovery platform.
//!
//! Events are owned by a separate event-management service and read through
//! [`persistence::EventDirectory`]. This crate issues tickets against them,
//! enforces capacity, tracks per-attendee check-in at the gate and reports
//! every committed mutation on a live WebSocket feed.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Feed (ws/)
//!     │
//!     ├── Issuance / Lifecycle / Verification (service/)
//!     ├── Ticket export (export/)
//!     │
//!     ├── State machine, policy, identifiers, EventBus (domain/)
//!     │
//!     └── TicketStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod persistence;
pub mod service;
pub mod ws;

use axum::Router;
use axum::routing::get;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Assembles the full HTTP application: REST routes, `/ws` and middleware.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
