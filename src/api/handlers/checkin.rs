//! Gate handlers: scan verification and attendee check-in.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CheckInRequest, CheckInResponse, VerifyRequest, VerifyResponse};
use crate::api::extract::ApiJson;
use crate::app_state::AppState;
use crate::domain::{AttendeeId, TicketId};
use crate::error::{ErrorResponse, TicketingError};

/// `POST /checkin/verify` — Resolve a scanned code.
///
/// # Errors
///
/// Returns [`TicketingError::Forbidden`] for callers without the gate staff
/// role, or a storage error; scan rejections are part of the 200 response.
#[utoipa::path(
    post,
    path = "/api/v1/checkin/verify",
    tag = "Check-in",
    summary = "Verify scan code",
    description = "Looks up the ticket for a scanned code and checks its status and the admission window. Rejections are reported with `valid: false` and a machine-readable `reason`. Requires the `staff` or `admin` role.",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification verdict", body = VerifyResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "No authenticated user", body = ErrorResponse),
        (status = 403, description = "Gate staff role required", body = ErrorResponse),
    )
)]
pub async fn verify_scan(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<impl IntoResponse, TicketingError> {
    user.require_gate_staff()?;
    let result = state.verification.verify(&req.scan_code).await?;
    tracing::debug!(scanned_by = %user.0.user_id, valid = result.valid, "scan verified");
    Ok(Json(VerifyResponse::from(&result)))
}

/// `POST /checkin` — Check one attendee in.
///
/// # Errors
///
/// Returns [`TicketingError::Forbidden`] for callers without the gate staff
/// role, [`TicketingError::AlreadyCheckedIn`] on repeated scans, and the
/// not-found and state errors of [`crate::service::VerificationService::check_in`].
#[utoipa::path(
    post,
    path = "/api/v1/checkin",
    tag = "Check-in",
    summary = "Check in attendee",
    description = "Marks one attendee as entered. When the last attendee of a ticket checks in, the ticket becomes USED. A repeated check-in returns 409 AlreadyCheckedIn and leaves the original timestamp untouched. Requires the `staff` or `admin` role.",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Attendee checked in", body = CheckInResponse),
        (status = 400, description = "Outside the admission window or malformed body", body = ErrorResponse),
        (status = 403, description = "Gate staff role required", body = ErrorResponse),
        (status = 404, description = "Ticket or attendee not found", body = ErrorResponse),
        (status = 409, description = "Already checked in or ticket not active", body = ErrorResponse),
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CheckInRequest>,
) -> Result<impl IntoResponse, TicketingError> {
    user.require_gate_staff()?;
    let outcome = state
        .verification
        .check_in(
            TicketId::from_uuid(req.ticket_id),
            AttendeeId::from_uuid(req.attendee_id),
        )
        .await?;
    Ok(Json(CheckInResponse::from(&outcome)))
}

/// Check-in routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkin/verify", post(verify_scan))
        .route("/checkin", post(check_in))
}
