//! Gate DTOs for scan verification and attendee check-in.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::AttendeeDto;
use super::ticket_dto::TicketDto;
use crate::domain::CheckInOutcome;
use crate::service::VerificationResult;

/// Request body for `POST /checkin/verify`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Code read from the ticket's QR image.
    pub scan_code: String,
}

/// Response body for `POST /checkin/verify`.
///
/// Always 200; `valid` and `reason` carry the verdict.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Whether the holder may enter.
    pub valid: bool,
    /// `InvalidCode`, `EventNotFound`, `TicketNotActive`, `TooEarly` or
    /// `EventEnded` when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Ticket summary with attendees, absent for unknown codes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketDto>,
}

impl From<&VerificationResult> for VerifyResponse {
    fn from(result: &VerificationResult) -> Self {
        Self {
            valid: result.valid,
            reason: result.reason.map(|r| r.as_str().to_string()),
            message: result.message.clone(),
            ticket: result.ticket.as_ref().map(TicketDto::from),
        }
    }
}

/// Request body for `POST /checkin`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    /// Ticket UUID.
    pub ticket_id: Uuid,
    /// Attendee entering.
    pub attendee_id: Uuid,
}

/// Response body for `POST /checkin`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    /// The attendee after check-in.
    pub attendee: AttendeeDto,
    /// Whether every attendee on the ticket is now inside.
    pub all_checked_in: bool,
}

impl From<&CheckInOutcome> for CheckInResponse {
    fn from(outcome: &CheckInOutcome) -> Self {
        Self {
            attendee: AttendeeDto::from(&outcome.attendee),
            all_checked_in: outcome.all_checked_in,
        }
    }
}
