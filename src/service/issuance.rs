//! Ticket issuance.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::{Requester, ServiceContext};
use crate::domain::{
    Attendee, AttendeeDetails, EventId, EventKind, EventSnapshot, IdentifierGenerator,
    PaymentStatus, Ticket, TicketEvent, TicketId, TicketStatus,
};
use crate::error::TicketingError;

/// Input to [`IssuanceService::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    /// Event to admit to.
    pub event_id: EventId,
    /// Admissions requested; `None` means one.
    pub quantity: Option<i64>,
    /// Per-admission details; empty means "use the owner's identity".
    pub attendees: Vec<AttendeeDetails>,
    /// Opaque payment reference from the payment collaborator.
    pub payment_ref: Option<String>,
}

impl IssueRequest {
    /// A single-admission request with no attendee data.
    #[must_use]
    pub const fn single(event_id: EventId) -> Self {
        Self {
            event_id,
            quantity: None,
            attendees: Vec::new(),
            payment_ref: None,
        }
    }
}

/// Creates tickets against published events.
///
/// Validation runs in a fixed order and fails before any write. The ticket,
/// its attendees and the capacity check commit in one store transaction;
/// identifier collisions are retried a bounded number of times.
#[derive(Debug, Clone)]
pub struct IssuanceService {
    ctx: ServiceContext,
    identifiers: Arc<dyn IdentifierGenerator>,
}

impl IssuanceService {
    /// Creates a new `IssuanceService`.
    #[must_use]
    pub fn new(ctx: ServiceContext, identifiers: Arc<dyn IdentifierGenerator>) -> Self {
        Self { ctx, identifiers }
    }

    /// Issues a ticket to `owner`.
    ///
    /// # Errors
    ///
    /// In validation order: [`TicketingError::EventNotFound`],
    /// [`TicketingError::EventNotPublished`],
    /// [`TicketingError::InvalidQuantity`],
    /// [`TicketingError::AttendeeCountMismatch`] /
    /// [`TicketingError::InvalidAttendee`],
    /// [`TicketingError::EventMisconfigured`]; then from the store
    /// [`TicketingError::SoldOut`], and [`TicketingError::IssuanceFailed`]
    /// once identifier retries are exhausted.
    pub async fn issue(
        &self,
        owner: &Requester,
        request: IssueRequest,
    ) -> Result<Ticket, TicketingError> {
        let event = self.ctx.require_event(request.event_id).await?;
        if !event.is_published {
            return Err(TicketingError::EventNotPublished(event.id));
        }

        let quantity = self.validate_quantity(request.quantity)?;
        let details = attendee_details(owner, quantity, request.attendees)?;

        let unit_price = event.unit_price().ok_or_else(|| {
            TicketingError::EventMisconfigured(
                event.id,
                "ticketed event has no positive price".to_string(),
            )
        })?;
        let total_amount = unit_price * Decimal::from(quantity);

        let payment_ref = request
            .payment_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let payment_status = match (event.kind, &payment_ref) {
            (EventKind::Free, _) | (EventKind::Ticketed, Some(_)) => PaymentStatus::Completed,
            (EventKind::Ticketed, None) => PaymentStatus::Pending,
        };

        let attempts = self.ctx.policy.identifier_retry_limit.max(1);
        for attempt in 1..=attempts {
            let ticket = self.build_ticket(
                owner,
                &event,
                quantity,
                &details,
                total_amount,
                payment_status,
                payment_ref.clone(),
            );
            match self.ctx.store.insert_ticket(&ticket, event.capacity).await {
                Ok(()) => {
                    let _ = self.ctx.event_bus.publish(TicketEvent::TicketIssued {
                        ticket_id: ticket.id,
                        event_id: ticket.event_id,
                        ticket_number: ticket.ticket_number.to_string(),
                        quantity,
                        payment_status,
                        timestamp: ticket.purchased_at,
                    });
                    tracing::info!(
                        ticket_id = %ticket.id,
                        event_id = %ticket.event_id,
                        owner_id = %ticket.owner_id,
                        quantity,
                        %total_amount,
                        %payment_status,
                        "ticket issued"
                    );
                    return Ok(ticket);
                }
                Err(TicketingError::DuplicateIdentifier(what)) => {
                    tracing::warn!(attempt, attempts, %what, "identifier collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(TicketingError::IssuanceFailed { attempts })
    }

    fn validate_quantity(&self, requested: Option<i64>) -> Result<u32, TicketingError> {
        let max = self.ctx.policy.max_quantity_per_ticket;
        let requested = requested.unwrap_or(1);
        u32::try_from(requested)
            .ok()
            .filter(|q| (1..=max).contains(q))
            .ok_or(TicketingError::InvalidQuantity { requested, max })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_ticket(
        &self,
        owner: &Requester,
        event: &EventSnapshot,
        quantity: u32,
        details: &[AttendeeDetails],
        total_amount: Decimal,
        payment_status: PaymentStatus,
        payment_ref: Option<String>,
    ) -> Ticket {
        let now = self.ctx.clock.now();
        let id = TicketId::new();
        Ticket {
            id,
            ticket_number: self.identifiers.ticket_number(now),
            scan_code: self.identifiers.scan_code(),
            owner_id: owner.user_id,
            event_id: event.id,
            quantity,
            total_amount,
            payment_status,
            payment_ref,
            status: TicketStatus::Active,
            purchased_at: now,
            updated_at: now,
            attendees: details
                .iter()
                .map(|d| Attendee::new(id, d.clone()))
                .collect(),
        }
    }
}

/// Resolves the attendee list for `quantity` admissions.
///
/// With no attendees supplied, every admission is issued in the owner's
/// name so that the attendee count always equals the quantity.
fn attendee_details(
    owner: &Requester,
    quantity: u32,
    supplied: Vec<AttendeeDetails>,
) -> Result<Vec<AttendeeDetails>, TicketingError> {
    let details = if supplied.is_empty() {
        let (Some(full_name), Some(email)) = (owner.name.clone(), owner.email.clone()) else {
            return Err(TicketingError::InvalidAttendee(
                "no attendees supplied and the caller has no name and email on file".to_string(),
            ));
        };
        let owner_details = AttendeeDetails {
            full_name,
            email,
            phone: None,
        };
        vec![owner_details; quantity as usize]
    } else {
        if supplied.len() != quantity as usize {
            return Err(TicketingError::AttendeeCountMismatch {
                expected: quantity,
                provided: supplied.len(),
            });
        }
        supplied
    };

    if let Some(problem) = details.iter().find_map(AttendeeDetails::problem) {
        return Err(TicketingError::InvalidAttendee(problem));
    }
    Ok(details)
}
