//! Payment collaborator callback.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{PaymentSignalRequest, TicketDto};
use crate::api::extract::ApiJson;
use crate::app_state::AppState;
use crate::domain::{PaymentSignal, TicketId};
use crate::error::{ErrorResponse, TicketingError};

/// `POST /payments/signal` — Apply a payment outcome to a ticket.
///
/// # Errors
///
/// Returns [`TicketingError::Forbidden`] for non-admin callers and
/// [`TicketingError::InvalidPaymentTransition`] when the signal does not
/// apply.
#[utoipa::path(
    post,
    path = "/api/v1/payments/signal",
    tag = "Payments",
    summary = "Apply payment signal",
    description = "Called by the payment collaborator (administrator role). `completed` settles a PENDING or FAILED payment, `failed` marks a PENDING one, and `refunded` moves an ACTIVE or CANCELLED ticket to REFUNDED.",
    request_body = PaymentSignalRequest,
    responses(
        (status = 200, description = "Signal applied", body = TicketDto),
        (status = 400, description = "Missing reference", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Signal not applicable", body = ErrorResponse),
    )
)]
pub async fn payment_signal(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<PaymentSignalRequest>,
) -> Result<impl IntoResponse, TicketingError> {
    user.require_admin()?;
    let signal = PaymentSignal::try_from(&req)?;
    let view = state
        .lifecycle
        .apply_payment_signal(TicketId::from_uuid(req.ticket_id), signal)
        .await?;
    Ok(Json(TicketDto::from(&view)))
}

/// Payment routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments/signal", post(payment_signal))
}
