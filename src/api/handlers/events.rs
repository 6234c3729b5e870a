//! Event cleanup hook for the event-management collaborator.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::delete;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::dto::PurgeTicketsResponse;
use crate::api::extract::ApiPath;
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, TicketingError};

/// `DELETE /events/{id}/tickets` — Remove all tickets of a deleted event.
///
/// # Errors
///
/// Returns [`TicketingError::Forbidden`] for non-admin callers.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}/tickets",
    tag = "Events",
    summary = "Purge event tickets",
    description = "Deletes every ticket and attendee of an event after the event itself was deleted. Administrator role required.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Tickets removed", body = PurgeTicketsResponse),
        (status = 400, description = "Malformed event id", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
    )
)]
pub async fn purge_event_tickets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, TicketingError> {
    let deleted = state
        .lifecycle
        .purge_event(&user, EventId::from_uuid(id))
        .await?;
    Ok(Json(PurgeTicketsResponse {
        event_id: id,
        deleted,
    }))
}

/// Event routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{id}/tickets", delete(purge_event_tickets))
}
