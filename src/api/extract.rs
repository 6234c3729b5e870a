//! Request extractors that reject with [`TicketingError`].
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain-text bodies.
//! These wrappers route the rejection through [`TicketingError`] so every
//! malformed request gets the JSON error body with reason `InvalidRequest`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::TicketingError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(TicketingError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(TicketingError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(TicketingError))]
pub struct ApiQuery<T>(pub T);
