//! Ticketing error types with HTTP status code mapping.
//!
//! [`TicketingError`] is the central error type of the crate. Every variant
//! carries a stable machine-readable reason (for clients such as gate
//! scanners that branch on it), a numeric code, and an HTTP status.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AttendeeId, EventId, TicketId, TicketStatus};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3004,
///     "reason": "AlreadyCheckedIn",
///     "message": "attendee 6f1c… already checked in at 2026-05-01T18:03:11Z",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, reason and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`TicketingError`]).
    pub code: u32,
    /// Machine-readable reason, stable across releases.
    pub reason: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                  |
/// |-----------|------------------|------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request              |
/// | 2000–2999 | Not Found        | 404 Not Found                |
/// | 3000–3999 | State / Conflict | 400 Bad Request / 409 Conflict |
/// | 4000–4999 | Identity         | 401 / 403                    |
/// | 5000–5999 | Infrastructure   | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum TicketingError {
    /// Malformed or missing request fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Quantity outside `1..=max`.
    #[error("quantity must be between 1 and {max}, got {requested}")]
    InvalidQuantity {
        /// Quantity the caller asked for.
        requested: i64,
        /// Upper bound per ticket.
        max: u32,
    },

    /// Attendee list length differs from the quantity.
    #[error("expected {expected} attendees, got {provided}")]
    AttendeeCountMismatch {
        /// Requested quantity.
        expected: u32,
        /// Attendees supplied.
        provided: usize,
    },

    /// An attendee record failed validation.
    #[error("invalid attendee: {0}")]
    InvalidAttendee(String),

    /// The event exists but is not published.
    #[error("event {0} is not published")]
    EventNotPublished(EventId),

    /// The event cannot be ticketed as configured (e.g. no price).
    #[error("event {0} is misconfigured: {1}")]
    EventMisconfigured(EventId, String),

    /// Event lookup failed.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Ticket lookup failed.
    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The attendee does not belong to the ticket.
    #[error("attendee {attendee_id} not found on ticket {ticket_id}")]
    AttendeeNotFound {
        /// Ticket searched.
        ticket_id: TicketId,
        /// Attendee requested.
        attendee_id: AttendeeId,
    },

    /// The ticket is not in the `ACTIVE` state.
    #[error("ticket is not active (status {0})")]
    TicketNotActive(TicketStatus),

    /// Cancellation requested on a ticket that is not `ACTIVE`.
    #[error("ticket cannot be cancelled (status {0})")]
    NotCancellable(TicketStatus),

    /// Cancellation requested at or after the event start.
    #[error("event already started at {starts_at}")]
    EventAlreadyStarted {
        /// Event start instant.
        starts_at: DateTime<Utc>,
    },

    /// The attendee was already checked in.
    #[error("attendee {attendee_id} already checked in at {checked_in_at}")]
    AlreadyCheckedIn {
        /// Attendee scanned again.
        attendee_id: AttendeeId,
        /// Original check-in time (unchanged).
        checked_in_at: DateTime<Utc>,
    },

    /// Check-in window has not opened yet.
    #[error("check-in opens at {opens_at}")]
    TooEarly {
        /// Start of the check-in window.
        opens_at: DateTime<Utc>,
    },

    /// Check-in window has closed.
    #[error("event ended at {closed_at}")]
    EventEnded {
        /// End of the check-in window.
        closed_at: DateTime<Utc>,
    },

    /// Not enough capacity left for the requested quantity.
    #[error("event {event_id} has {remaining} admissions left")]
    SoldOut {
        /// Event requested.
        event_id: EventId,
        /// Admissions still available.
        remaining: u32,
    },

    /// Payment signal not applicable to the ticket's current state.
    #[error("payment signal {signal} not applicable (payment {payment}, ticket {status})")]
    InvalidPaymentTransition {
        /// Signal received.
        signal: &'static str,
        /// Current payment status.
        payment: crate::domain::PaymentStatus,
        /// Current ticket status.
        status: TicketStatus,
    },

    /// Ticket number or scan code already taken.
    #[error("duplicate ticket identifier: {0}")]
    DuplicateIdentifier(String),

    /// The store serves a legacy schema and refuses writes.
    #[error("store is running on the legacy registrations schema and is read-only")]
    LegacySchemaReadOnly,

    /// No authenticated identity on the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is not allowed to act on this resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Identifier generation kept colliding.
    #[error("ticket issuance failed after {attempts} attempts")]
    IssuanceFailed {
        /// Attempts made.
        attempts: u32,
    },

    /// Persistence layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TicketingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidQuantity { .. } => 1002,
            Self::AttendeeCountMismatch { .. } => 1003,
            Self::InvalidAttendee(_) => 1004,
            Self::EventNotPublished(_) => 1005,
            Self::EventMisconfigured(..) => 1006,
            Self::EventNotFound(_) => 2001,
            Self::TicketNotFound(_) => 2002,
            Self::AttendeeNotFound { .. } => 2003,
            Self::TicketNotActive(_) => 3001,
            Self::NotCancellable(_) => 3002,
            Self::EventAlreadyStarted { .. } => 3003,
            Self::AlreadyCheckedIn { .. } => 3004,
            Self::TooEarly { .. } => 3005,
            Self::EventEnded { .. } => 3006,
            Self::SoldOut { .. } => 3007,
            Self::InvalidPaymentTransition { .. } => 3008,
            Self::DuplicateIdentifier(_) => 3009,
            Self::LegacySchemaReadOnly => 3010,
            Self::Unauthenticated => 4001,
            Self::Forbidden(_) => 4003,
            Self::Internal(_) => 5000,
            Self::Storage(_) => 5001,
            Self::IssuanceFailed { .. } => 5002,
        }
    }

    /// Returns the machine-readable reason for this variant.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::InvalidQuantity { .. } => "InvalidQuantity",
            Self::AttendeeCountMismatch { .. } => "AttendeeCountMismatch",
            Self::InvalidAttendee(_) => "InvalidAttendee",
            Self::EventNotPublished(_) => "EventNotPublished",
            Self::EventMisconfigured(..) => "EventMisconfigured",
            Self::EventNotFound(_) => "EventNotFound",
            Self::TicketNotFound(_) => "TicketNotFound",
            Self::AttendeeNotFound { .. } => "AttendeeNotFound",
            Self::TicketNotActive(_) => "TicketNotActive",
            Self::NotCancellable(_) => "NotCancellable",
            Self::EventAlreadyStarted { .. } => "EventAlreadyStarted",
            Self::AlreadyCheckedIn { .. } => "AlreadyCheckedIn",
            Self::TooEarly { .. } => "TooEarly",
            Self::EventEnded { .. } => "EventEnded",
            Self::SoldOut { .. } => "SoldOut",
            Self::InvalidPaymentTransition { .. } => "InvalidPaymentTransition",
            Self::DuplicateIdentifier(_) => "DuplicateIdentifier",
            Self::LegacySchemaReadOnly => "LegacySchemaReadOnly",
            Self::Unauthenticated => "Unauthenticated",
            Self::Forbidden(_) => "Forbidden",
            Self::IssuanceFailed { .. } => "IssuanceFailed",
            Self::Storage(_) => "StorageError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidQuantity { .. }
            | Self::AttendeeCountMismatch { .. }
            | Self::InvalidAttendee(_)
            | Self::EventNotPublished(_)
            | Self::EventMisconfigured(..)
            | Self::NotCancellable(_)
            | Self::EventAlreadyStarted { .. }
            | Self::TooEarly { .. }
            | Self::EventEnded { .. } => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::TicketNotFound(_) | Self::AttendeeNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::TicketNotActive(_)
            | Self::AlreadyCheckedIn { .. }
            | Self::SoldOut { .. }
            | Self::InvalidPaymentTransition { .. }
            | Self::DuplicateIdentifier(_)
            | Self::LegacySchemaReadOnly => StatusCode::CONFLICT,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::IssuanceFailed { .. } | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured details for variants that carry data a client may
    /// branch on.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::TicketNotActive(status) | Self::NotCancellable(status) => {
                Some(serde_json::json!({ "status": status }))
            }
            Self::AlreadyCheckedIn {
                attendee_id,
                checked_in_at,
            } => Some(serde_json::json!({
                "attendee_id": attendee_id,
                "checked_in_at": checked_in_at,
            })),
            Self::TooEarly { opens_at } => Some(serde_json::json!({ "opens_at": opens_at })),
            Self::EventEnded { closed_at } => Some(serde_json::json!({ "closed_at": closed_at })),
            Self::SoldOut { remaining, .. } => Some(serde_json::json!({ "remaining": remaining })),
            _ => None,
        }
    }
}

impl From<JsonRejection> for TicketingError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for TicketingError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for TicketingError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for TicketingError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl IntoResponse for TicketingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                reason: self.reason().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
