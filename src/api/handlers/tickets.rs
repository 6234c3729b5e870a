//! Ticket handlers: issue, list, get, cancel, download.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::dto::{
    IssueTicketRequest, IssueTicketResponse, PaginationParams, TicketDto, TicketListResponse,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::TicketId;
use crate::error::{ErrorResponse, TicketingError};

/// `POST /tickets` — Issue a ticket to the caller.
///
/// # Errors
///
/// Returns [`TicketingError`] on validation failure, unknown event,
/// sold-out event or storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "Issue a ticket",
    description = "Issues a ticket for a published event. Omitting `attendees` issues every admission in the caller's name. Ticketed events without a `paymentRef` are issued with a PENDING payment.",
    request_body = IssueTicketRequest,
    responses(
        (status = 201, description = "Ticket issued", body = IssueTicketResponse),
        (status = 400, description = "Invalid request or unpublished event", body = ErrorResponse),
        (status = 401, description = "No authenticated user", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Sold out", body = ErrorResponse),
    )
)]
pub async fn issue_ticket(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<IssueTicketRequest>,
) -> Result<impl IntoResponse, TicketingError> {
    let ticket = state.issuance.issue(&user, req.into()).await?;
    Ok((StatusCode::CREATED, Json(IssueTicketResponse::from(&ticket))))
}

/// `GET /tickets` — List the caller's tickets.
///
/// # Errors
///
/// Returns [`TicketingError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "List my tickets",
    description = "Returns the caller's tickets, newest first, with event snapshot and attendees. Status reflects expiry at the time of the request.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated ticket list", body = TicketListResponse),
        (status = 401, description = "No authenticated user", body = ErrorResponse),
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<impl IntoResponse, TicketingError> {
    let views = state.lifecycle.list_for_owner(user.user_id).await?;
    let (page, pagination) = params.paginate(views);
    Ok(Json(TicketListResponse {
        data: page.iter().map(TicketDto::from).collect(),
        pagination,
    }))
}

/// `GET /tickets/{id}` — Get one ticket.
///
/// # Errors
///
/// Returns [`TicketingError::TicketNotFound`] or
/// [`TicketingError::Forbidden`].
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    summary = "Get ticket",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    responses(
        (status = 200, description = "Ticket details", body = TicketDto),
        (status = 403, description = "Ticket belongs to another user", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, TicketingError> {
    let view = state.lifecycle.get(&user, TicketId::from_uuid(id)).await?;
    Ok(Json(TicketDto::from(&view)))
}

/// `POST /tickets/{id}/cancel` — Cancel a ticket before its event starts.
///
/// # Errors
///
/// Returns [`TicketingError::NotCancellable`],
/// [`TicketingError::EventAlreadyStarted`], [`TicketingError::Forbidden`]
/// or [`TicketingError::TicketNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/cancel",
    tag = "Tickets",
    summary = "Cancel ticket",
    description = "Cancels an ACTIVE ticket whose event has not started. Only the owner or an administrator may cancel. Refund initiation is left to the payment collaborator.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    responses(
        (status = 200, description = "Ticket cancelled", body = TicketDto),
        (status = 400, description = "Not cancellable or event started", body = ErrorResponse),
        (status = 403, description = "Ticket belongs to another user", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn cancel_ticket(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, TicketingError> {
    let view = state.lifecycle.cancel(&user, TicketId::from_uuid(id)).await?;
    Ok(Json(TicketDto::from(&view)))
}

/// `GET /tickets/{id}/download` — Download the ticket document.
///
/// # Errors
///
/// Returns [`TicketingError::TicketNotFound`], [`TicketingError::Forbidden`]
/// or a rendering error.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/download",
    tag = "Tickets",
    summary = "Download ticket",
    description = "Renders the ticket number, scan code, event summary and attendee list as a downloadable document.",
    params(
        ("id" = uuid::Uuid, Path, description = "Ticket UUID"),
    ),
    responses(
        (status = 200, description = "Ticket document", content_type = "text/plain", body = String),
        (status = 403, description = "Ticket belongs to another user", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn download_ticket(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, TicketingError> {
    let view = state.lifecycle.get(&user, TicketId::from_uuid(id)).await?;
    let artifact = state.exporter.export(&view)?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.body,
    ))
}

/// Ticket routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(issue_ticket).get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/cancel", post(cancel_ticket))
        .route("/tickets/{id}/download", get(download_ticket))
}
