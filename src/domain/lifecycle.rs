//! Ticket state machine.
//!
//! ```text
//!             cancel (before start)
//!   ACTIVE ─────────────────────────► CANCELLED ──┐
//!     │  \                                         │ refund
//!     │   \ last attendee checked in               ▼
//!     │    └────────────────────────► USED      REFUNDED
//!     │ refund                                     ▲
//!     └────────────────────────────────────────────┘
//!   ACTIVE + event over ═══(derived at read time)═══► EXPIRED
//! ```
//!
//! All functions here are pure: they inspect and mutate a [`Ticket`] that
//! the store has locked, and return an error without touching it when a
//! guard fails. The store commits only on `Ok`.
//!
//! `EXPIRED` is never persisted. Every read path (listing, fetch,
//! verification, check-in, cancellation, payment) goes through
//! [`effective_status`], so a ticket is never `ACTIVE` on one path and
//! `EXPIRED` on another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Attendee, AttendeeId, EventSnapshot, PaymentStatus, Ticket, TicketStatus, TicketingPolicy,
};
use crate::error::TicketingError;

/// Status as observed at `now`, with expiry derived from the event window.
#[must_use]
pub fn effective_status(
    ticket: &Ticket,
    event: &EventSnapshot,
    policy: &TicketingPolicy,
    now: DateTime<Utc>,
) -> TicketStatus {
    if ticket.status == TicketStatus::Active && policy.has_ended(event, now) {
        TicketStatus::Expired
    } else {
        ticket.status
    }
}

/// Cancels an active ticket before its event starts.
///
/// # Errors
///
/// - [`TicketingError::NotCancellable`] if the ticket is not `ACTIVE`.
/// - [`TicketingError::EventAlreadyStarted`] if `event.starts_at <= now`.
pub fn cancel(
    ticket: &mut Ticket,
    event: &EventSnapshot,
    policy: &TicketingPolicy,
    now: DateTime<Utc>,
) -> Result<(), TicketingError> {
    let status = effective_status(ticket, event, policy, now);
    if status != TicketStatus::Active {
        return Err(TicketingError::NotCancellable(status));
    }
    if event.has_started(now) {
        return Err(TicketingError::EventAlreadyStarted {
            starts_at: event.starts_at,
        });
    }
    ticket.status = TicketStatus::Cancelled;
    ticket.updated_at = now;
    Ok(())
}

/// Result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    /// The attendee as it is now stored.
    pub attendee: Attendee,
    /// Every attendee on the ticket is now inside.
    pub all_checked_in: bool,
    /// This check-in moved the ticket to `USED`.
    pub promoted: bool,
}

/// Marks one attendee as checked in, promoting the ticket to `USED` when it
/// was the last one.
///
/// # Errors
///
/// - [`TicketingError::TicketNotActive`] if the ticket is not `ACTIVE`.
/// - [`TicketingError::TooEarly`] / [`TicketingError::EventEnded`] outside
///   the admission window.
/// - [`TicketingError::AttendeeNotFound`] if the attendee is not on the ticket.
/// - [`TicketingError::AlreadyCheckedIn`] on a repeated scan; the original
///   timestamp is left untouched.
pub fn check_in(
    ticket: &mut Ticket,
    attendee_id: AttendeeId,
    event: &EventSnapshot,
    policy: &TicketingPolicy,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, TicketingError> {
    let status = effective_status(ticket, event, policy, now);
    if status != TicketStatus::Active {
        return Err(TicketingError::TicketNotActive(status));
    }
    policy.check_window(event, now)?;

    let ticket_id = ticket.id;
    let attendee = ticket
        .attendee_mut(attendee_id)
        .ok_or(TicketingError::AttendeeNotFound {
            ticket_id,
            attendee_id,
        })?;
    if let Some(checked_in_at) = attendee.checked_in_at {
        return Err(TicketingError::AlreadyCheckedIn {
            attendee_id,
            checked_in_at,
        });
    }
    attendee.checked_in_at = Some(now);
    let attendee = attendee.clone();

    let all_checked_in = ticket.all_checked_in();
    if all_checked_in {
        ticket.status = TicketStatus::Used;
    }
    ticket.updated_at = now;

    Ok(CheckInOutcome {
        attendee,
        all_checked_in,
        promoted: all_checked_in,
    })
}

/// Signal received from the payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentSignal {
    /// Payment settled; carries the processor reference.
    Completed {
        /// Opaque processor reference.
        reference: String,
    },
    /// Payment attempt failed.
    Failed,
    /// Money returned to the buyer.
    Refunded,
}

impl PaymentSignal {
    /// Returns the signal name used in logs and errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// Applies a payment signal.
///
/// - `completed`: `PENDING | FAILED → COMPLETED`, records the reference.
/// - `failed`: `PENDING → FAILED`.
/// - `refunded`: payment `COMPLETED → REFUNDED` and ticket
///   `ACTIVE | CANCELLED → REFUNDED`.
///
/// # Errors
///
/// Returns [`TicketingError::InvalidPaymentTransition`] when the signal
/// does not apply to the current payment or ticket state.
pub fn apply_payment(
    ticket: &mut Ticket,
    signal: &PaymentSignal,
    event: &EventSnapshot,
    policy: &TicketingPolicy,
    now: DateTime<Utc>,
) -> Result<(), TicketingError> {
    let status = effective_status(ticket, event, policy, now);
    let payment = ticket.payment_status;
    let rejected = || TicketingError::InvalidPaymentTransition {
        signal: signal.as_str(),
        payment,
        status,
    };

    match signal {
        PaymentSignal::Completed { reference } => {
            if !matches!(payment, PaymentStatus::Pending | PaymentStatus::Failed) {
                return Err(rejected());
            }
            ticket.payment_status = PaymentStatus::Completed;
            ticket.payment_ref = Some(reference.clone());
        }
        PaymentSignal::Failed => {
            if payment != PaymentStatus::Pending {
                return Err(rejected());
            }
            ticket.payment_status = PaymentStatus::Failed;
        }
        PaymentSignal::Refunded => {
            let refundable_status =
                matches!(status, TicketStatus::Active | TicketStatus::Cancelled);
            if payment != PaymentStatus::Completed || !refundable_status {
                return Err(rejected());
            }
            ticket.payment_status = PaymentStatus::Refunded;
            ticket.status = TicketStatus::Refunded;
        }
    }
    ticket.updated_at = now;
    Ok(())
}
