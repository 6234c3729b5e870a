//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    AttendeeDto, AttendeeInput, CheckInRequest, CheckInResponse, EventSummaryDto,
    IssueTicketRequest, IssueTicketResponse, LocationDto, PaginationMeta, PaymentSignalKind,
    PaymentSignalRequest, PurgeTicketsResponse, TicketDto, TicketListResponse, VerifyRequest,
    VerifyResponse,
};
use super::handlers::{checkin, events, payments, system, tickets};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::RejectionReason;

/// OpenAPI documentation for the ticketing API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Event Ticketing API",
        description = "Ticket issuance, scan verification and attendee check-in."
    ),
    paths(
        tickets::issue_ticket,
        tickets::list_tickets,
        tickets::get_ticket,
        tickets::cancel_ticket,
        tickets::download_ticket,
        checkin::verify_scan,
        checkin::check_in,
        payments::payment_signal,
        events::purge_event_tickets,
        system::health_handler,
    ),
    components(schemas(
        AttendeeDto,
        AttendeeInput,
        CheckInRequest,
        CheckInResponse,
        ErrorBody,
        ErrorResponse,
        EventSummaryDto,
        IssueTicketRequest,
        IssueTicketResponse,
        LocationDto,
        PaginationMeta,
        PaymentSignalKind,
        PaymentSignalRequest,
        PurgeTicketsResponse,
        RejectionReason,
        TicketDto,
        TicketListResponse,
        VerifyRequest,
        VerifyResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "Tickets", description = "Issue, list, cancel and download tickets"),
        (name = "Check-in", description = "Gate verification and attendee check-in"),
        (name = "Payments", description = "Payment collaborator callbacks"),
        (name = "Events", description = "Event-management collaborator hooks"),
        (name = "System", description = "Health checks"),
    )
)]
pub struct ApiDoc;
