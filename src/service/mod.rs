//! Service layer: business logic orchestration.
//!
//! [`IssuanceService`] creates tickets, [`LifecycleService`] drives
//! cancellation, payment signals and cleanup, and [`VerificationService`]
//! handles gate scans and check-ins. Each service follows the same pattern:
//! load collaborators → run a pure transition from
//! [`crate::domain::lifecycle`] inside a store transaction → emit events
//! through the [`crate::domain::EventBus`] → return the result.

pub mod issuance;
pub mod lifecycle;
pub mod verification;

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    Clock, EventBus, EventId, EventSnapshot, Ticket, TicketStatus, TicketingPolicy, UserId,
    lifecycle::effective_status,
};
use crate::error::TicketingError;
use crate::persistence::{EventDirectory, TicketStore};

pub use issuance::{IssuanceService, IssueRequest};
pub use lifecycle::LifecycleService;
pub use verification::{RejectionReason, VerificationResult, VerificationService};

/// Identity of the caller, as provided by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Display name, when the session carries one.
    pub name: Option<String>,
    /// Email, when the session carries one.
    pub email: Option<String>,
    /// Administrators may act on any ticket.
    pub is_admin: bool,
    /// Gate staff may verify scan codes and check attendees in.
    pub is_gate_staff: bool,
}

impl Requester {
    /// A regular user with no profile data.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            email: None,
            is_admin: false,
            is_gate_staff: false,
        }
    }

    /// Fails with [`TicketingError::Forbidden`] unless the caller owns the
    /// ticket or is an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Forbidden`] for any other caller.
    pub fn authorize(&self, ticket: &Ticket) -> Result<(), TicketingError> {
        if self.is_admin || ticket.owner_id == self.user_id {
            Ok(())
        } else {
            Err(TicketingError::Forbidden(format!(
                "ticket {} belongs to another user",
                ticket.id
            )))
        }
    }
}

/// A ticket as seen at a point in time, with its event and derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketView {
    /// The stored aggregate.
    pub ticket: Ticket,
    /// Status after passive expiry derivation.
    pub status: TicketStatus,
    /// Event snapshot, absent if the event has been removed upstream.
    pub event: Option<EventSnapshot>,
}

/// Collaborators shared by every service.
///
/// Cheap to clone: everything is reference-counted.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Ticket persistence.
    pub store: Arc<dyn TicketStore>,
    /// Read-only event lookup.
    pub events: Arc<dyn EventDirectory>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Window and issuance policy.
    pub policy: TicketingPolicy,
    /// Domain event fan-out.
    pub event_bus: EventBus,
}

impl ServiceContext {
    /// Looks up an event, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::EventNotFound`] or a storage error.
    pub async fn require_event(&self, id: EventId) -> Result<EventSnapshot, TicketingError> {
        self.events
            .event(id)
            .await?
            .ok_or(TicketingError::EventNotFound(id))
    }

    /// Pairs a ticket with its event and effective status at `now`.
    #[must_use]
    pub fn view(&self, ticket: Ticket, event: Option<EventSnapshot>) -> TicketView {
        let status = match &event {
            Some(event) => effective_status(&ticket, event, &self.policy, self.clock.now()),
            None => ticket.status,
        };
        TicketView {
            ticket,
            status,
            event,
        }
    }
}
