//! Ticket DTOs for issue, list, get and cancel operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::{AttendeeDto, EventSummaryDto, PaginationMeta};
use crate::domain::{AttendeeDetails, EventId, Ticket};
use crate::service::{IssueRequest, TicketView};

/// Attendee details supplied at issuance.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeInput {
    /// Full name printed on the ticket.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Request body for `POST /tickets`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueTicketRequest {
    /// Event to admit to.
    pub event_id: Uuid,
    /// Admissions; defaults to 1.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// One entry per admission; omit to issue in the caller's name.
    #[serde(default)]
    pub attendees: Option<Vec<AttendeeInput>>,
    /// Payment reference from the payment processor.
    #[serde(default)]
    pub payment_ref: Option<String>,
}

impl From<IssueTicketRequest> for IssueRequest {
    fn from(req: IssueTicketRequest) -> Self {
        Self {
            event_id: EventId::from_uuid(req.event_id),
            quantity: req.quantity,
            attendees: req
                .attendees
                .unwrap_or_default()
                .into_iter()
                .map(|a| AttendeeDetails {
                    full_name: a.full_name,
                    email: a.email,
                    phone: a.phone.filter(|p| !p.trim().is_empty()),
                })
                .collect(),
            payment_ref: req.payment_ref,
        }
    }
}

/// Response body for `POST /tickets` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueTicketResponse {
    /// Ticket UUID.
    pub ticket_id: Uuid,
    /// Printed ticket number.
    pub ticket_number: String,
    /// Bearer code to encode in the QR image.
    pub scan_code: String,
    /// Admissions covered.
    pub quantity: u32,
    /// Decimal amount as a string.
    pub total_amount: String,
    /// `PENDING` or `COMPLETED`.
    pub payment_status: String,
    /// Always `ACTIVE` on issuance.
    pub status: String,
}

impl From<&Ticket> for IssueTicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: *ticket.id.as_uuid(),
            ticket_number: ticket.ticket_number.to_string(),
            scan_code: ticket.scan_code.to_string(),
            quantity: ticket.quantity,
            total_amount: ticket.total_amount.to_string(),
            payment_status: ticket.payment_status.to_string(),
            status: ticket.status.to_string(),
        }
    }
}

/// Full ticket representation with event snapshot and attendees.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    /// Ticket UUID.
    pub id: Uuid,
    /// Printed ticket number.
    pub ticket_number: String,
    /// Bearer code for entry.
    pub scan_code: String,
    /// Owner UUID.
    pub owner_id: Uuid,
    /// Event UUID.
    pub event_id: Uuid,
    /// Admissions covered.
    pub quantity: u32,
    /// Decimal amount as a string.
    pub total_amount: String,
    /// Payment state.
    pub payment_status: String,
    /// Payment reference, if any.
    pub payment_ref: Option<String>,
    /// Status as observed now (`EXPIRED` is derived).
    pub status: String,
    /// Issuance time.
    pub purchase_date: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Event snapshot, absent if the event was removed.
    pub event: Option<EventSummaryDto>,
    /// Admissions in issuance order.
    pub attendees: Vec<AttendeeDto>,
}

impl From<&TicketView> for TicketDto {
    fn from(view: &TicketView) -> Self {
        let ticket = &view.ticket;
        Self {
            id: *ticket.id.as_uuid(),
            ticket_number: ticket.ticket_number.to_string(),
            scan_code: ticket.scan_code.to_string(),
            owner_id: *ticket.owner_id.as_uuid(),
            event_id: *ticket.event_id.as_uuid(),
            quantity: ticket.quantity,
            total_amount: ticket.total_amount.to_string(),
            payment_status: ticket.payment_status.to_string(),
            payment_ref: ticket.payment_ref.clone(),
            status: view.status.to_string(),
            purchase_date: ticket.purchased_at,
            updated_at: ticket.updated_at,
            event: view.event.as_ref().map(EventSummaryDto::from),
            attendees: ticket.attendees.iter().map(AttendeeDto::from).collect(),
        }
    }
}

/// Response body for `GET /tickets`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketListResponse {
    /// Tickets on this page, newest first.
    pub data: Vec<TicketDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `DELETE /events/{id}/tickets`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurgeTicketsResponse {
    /// Event whose tickets were removed.
    pub event_id: Uuid,
    /// Number of tickets removed.
    pub deleted: u64,
}
