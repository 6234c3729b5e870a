//! Payment signal DTOs.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::PaymentSignal;
use crate::error::TicketingError;

/// Signal kinds accepted from the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSignalKind {
    /// Payment settled.
    Completed,
    /// Payment attempt failed.
    Failed,
    /// Money returned to the buyer.
    Refunded,
}

/// Request body for `POST /payments/signal`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSignalRequest {
    /// Ticket the payment belongs to.
    pub ticket_id: Uuid,
    /// What happened.
    pub signal: PaymentSignalKind,
    /// Processor reference; required for `completed`.
    #[serde(default)]
    pub reference: Option<String>,
}

impl TryFrom<&PaymentSignalRequest> for PaymentSignal {
    type Error = TicketingError;

    fn try_from(req: &PaymentSignalRequest) -> Result<Self, Self::Error> {
        match req.signal {
            PaymentSignalKind::Completed => {
                let reference = req
                    .reference
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        TicketingError::InvalidRequest(
                            "completed signal requires a payment reference".to_string(),
                        )
                    })?;
                Ok(Self::Completed {
                    reference: reference.to_string(),
                })
            }
            PaymentSignalKind::Failed => Ok(Self::Failed),
            PaymentSignalKind::Refunded => Ok(Self::Refunded),
        }
    }
}
