//! Domain events reflecting committed ticket mutations.
//!
//! Every successful mutation emits a [`TicketEvent`] through the
//! [`super::EventBus`] after the store has committed. Events are broadcast
//! to WebSocket subscribers (gate dashboards, organizer consoles).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AttendeeId, EventId, PaymentStatus, TicketId, TicketStatus};

/// Domain event emitted after every committed ticket mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// A ticket was issued.
    TicketIssued {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event admitted to.
        event_id: EventId,
        /// Printed ticket number.
        ticket_number: String,
        /// Admissions covered.
        quantity: u32,
        /// Payment state at issuance.
        payment_status: PaymentStatus,
        /// Issuance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A ticket was cancelled by its owner or an admin.
    TicketCancelled {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event admitted to.
        event_id: EventId,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// One attendee passed the gate.
    AttendeeCheckedIn {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event admitted to.
        event_id: EventId,
        /// Attendee checked in.
        attendee_id: AttendeeId,
        /// Whether every attendee on the ticket is now inside.
        all_checked_in: bool,
        /// Check-in timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The last attendee checked in and the ticket became `USED`.
    TicketUsed {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event admitted to.
        event_id: EventId,
        /// Promotion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A payment signal changed the ticket's payment state.
    PaymentUpdated {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event admitted to.
        event_id: EventId,
        /// New payment status.
        payment_status: PaymentStatus,
        /// Ticket status after the signal.
        status: TicketStatus,
        /// Timestamp of the update.
        timestamp: DateTime<Utc>,
    },

    /// All tickets of a deleted event were removed.
    TicketsPurged {
        /// Deleted event.
        event_id: EventId,
        /// Number of tickets removed.
        count: u64,
        /// Timestamp of the cleanup.
        timestamp: DateTime<Utc>,
    },
}

impl TicketEvent {
    /// Returns the event id associated with this ticket event.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::TicketIssued { event_id, .. }
            | Self::TicketCancelled { event_id, .. }
            | Self::AttendeeCheckedIn { event_id, .. }
            | Self::TicketUsed { event_id, .. }
            | Self::PaymentUpdated { event_id, .. }
            | Self::TicketsPurged { event_id, .. } => *event_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::TicketIssued { .. } => "ticket_issued",
            Self::TicketCancelled { .. } => "ticket_cancelled",
            Self::AttendeeCheckedIn { .. } => "attendee_checked_in",
            Self::TicketUsed { .. } => "ticket_used",
            Self::PaymentUpdated { .. } => "payment_updated",
            Self::TicketsPurged { .. } => "tickets_purged",
        }
    }
}
