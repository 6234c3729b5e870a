//! The ticket aggregate and its attendees.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identifiers::{ScanCode, TicketNumber};
use super::{AttendeeId, EventId, TicketId, UserId};

/// Persisted ticket status.
///
/// `Expired` is never written by this crate; it is derived at read time
/// (see [`super::lifecycle::effective_status`]). It still exists here so
/// that the derived value and the wire vocabulary share one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Valid for entry.
    Active,
    /// Every attendee has checked in.
    Used,
    /// Cancelled before the event started.
    Cancelled,
    /// Event ended without the ticket being used.
    Expired,
    /// Payment was refunded.
    Refunded,
}

impl TicketStatus {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Used => "USED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parses the storage/wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(Self::Active),
            "USED" => Some(Self::Used),
            "CANCELLED" => Some(Self::Cancelled),
            "EXPIRED" => Some(Self::Expired),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state as reported by the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Issued provisionally, awaiting reconciliation.
    Pending,
    /// Paid, or free.
    Completed,
    /// Payment attempt failed.
    Failed,
    /// Money returned to the buyer.
    Refunded,
}

impl PaymentStatus {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parses the storage/wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details for one admission, supplied at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeDetails {
    /// Full name printed on the ticket.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl AttendeeDetails {
    /// Returns a description of the first invalid field, if any.
    #[must_use]
    pub fn problem(&self) -> Option<String> {
        if self.full_name.trim().is_empty() {
            return Some("attendee full_name must not be empty".to_string());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Some(format!("attendee email is invalid: {:?}", self.email));
        }
        None
    }
}

/// One admission slot on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee identifier.
    pub id: AttendeeId,
    /// Owning ticket.
    pub ticket_id: TicketId,
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Set exactly once, when the attendee enters.
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Attendee {
    /// Creates an attendee that has not checked in.
    #[must_use]
    pub fn new(ticket_id: TicketId, details: AttendeeDetails) -> Self {
        Self {
            id: AttendeeId::new(),
            ticket_id,
            full_name: details.full_name,
            email: details.email,
            phone: details.phone,
            checked_in_at: None,
        }
    }

    /// Returns `true` once the attendee has checked in.
    #[must_use]
    pub const fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }
}

/// The ticket aggregate root.
///
/// Only `status`, `payment_status`, `payment_ref`, `updated_at` and the
/// attendees' check-in timestamps change after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier.
    pub id: TicketId,
    /// Printed ticket number.
    pub ticket_number: TicketNumber,
    /// Bearer credential for entry.
    pub scan_code: ScanCode,
    /// Purchasing user.
    pub owner_id: UserId,
    /// Event admitted to.
    pub event_id: EventId,
    /// Number of admissions; equals `attendees.len()`.
    pub quantity: u32,
    /// Zero for free events.
    pub total_amount: Decimal,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Opaque payment reference supplied by the caller.
    pub payment_ref: Option<String>,
    /// Persisted lifecycle status.
    pub status: TicketStatus,
    /// Issuance time.
    pub purchased_at: DateTime<Utc>,
    /// Time of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Admissions, in issuance order.
    pub attendees: Vec<Attendee>,
}

impl Ticket {
    /// Returns `true` if every attendee has checked in.
    #[must_use]
    pub fn all_checked_in(&self) -> bool {
        !self.attendees.is_empty() && self.attendees.iter().all(Attendee::is_checked_in)
    }

    /// Number of attendees already inside.
    #[must_use]
    pub fn checked_in_count(&self) -> usize {
        self.attendees.iter().filter(|a| a.is_checked_in()).count()
    }

    /// Looks up an attendee belonging to this ticket.
    #[must_use]
    pub fn attendee(&self, attendee_id: AttendeeId) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.id == attendee_id)
    }

    /// Mutable lookup of an attendee belonging to this ticket.
    pub fn attendee_mut(&mut self, attendee_id: AttendeeId) -> Option<&mut Attendee> {
        self.attendees.iter_mut().find(|a| a.id == attendee_id)
    }

    /// Returns `true` while the ticket still counts against event capacity.
    #[must_use]
    pub const fn holds_capacity(&self) -> bool {
        !matches!(self.status, TicketStatus::Cancelled | TicketStatus::Refunded)
    }
}
