//! Database row shapes and their conversion into domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    Attendee, AttendeeId, EventId, EventKind, EventSnapshot, Location, PaymentStatus, ScanCode,
    Ticket, TicketId, TicketNumber, TicketStatus, UserId,
};
use crate::error::TicketingError;

/// Column list matching [`TicketRow`].
pub const TICKET_COLUMNS: &str = "id, ticket_number, scan_code, owner_id, event_id, quantity, \
     total_amount, payment_status, payment_ref, status, purchased_at, updated_at";

/// Column list matching [`AttendeeRow`].
pub const ATTENDEE_COLUMNS: &str = "id, ticket_id, full_name, email, phone, checked_in_at";

/// Column list matching [`EventRow`].
pub const EVENT_COLUMNS: &str = "id, title, is_published, starts_at, ends_at, event_type, \
     ticket_price, capacity, is_online, online_url, venue_name, venue_address, venue_city";

/// Column list matching [`LegacyRegistrationRow`].
pub const LEGACY_COLUMNS: &str = "id, event_id, user_id, full_name, email, phone, status, \
     COALESCE(qr_code, ''), registered_at, checked_in_at";

/// A row from the `tickets` table.
pub type TicketRow = (
    Uuid,
    String,
    String,
    Uuid,
    Uuid,
    i32,
    Decimal,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// A row from the `ticket_attendees` table.
pub type AttendeeRow = (
    Uuid,
    Uuid,
    String,
    String,
    Option<String>,
    Option<DateTime<Utc>>,
);

/// A row from the collaborator-owned `events` table.
pub type EventRow = (
    Uuid,
    String,
    bool,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    String,
    Option<Decimal>,
    Option<i32>,
    bool,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// A row from the legacy `event_registrations` table.
pub type LegacyRegistrationRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    String,
    Option<String>,
    String,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn corrupt(what: &str, value: &str) -> TicketingError {
    TicketingError::Storage(format!("unexpected {what} in storage: {value:?}"))
}

/// Converts an attendee row.
#[must_use]
pub fn attendee_from_row(row: AttendeeRow) -> Attendee {
    let (id, ticket_id, full_name, email, phone, checked_in_at) = row;
    Attendee {
        id: AttendeeId::from_uuid(id),
        ticket_id: TicketId::from_uuid(ticket_id),
        full_name,
        email,
        phone,
        checked_in_at,
    }
}

/// Converts a ticket row plus its attendees, in issuance order.
///
/// # Errors
///
/// Returns [`TicketingError::Storage`] if a status column holds an unknown
/// value or the quantity is not positive.
pub fn ticket_from_row(row: TicketRow, attendees: Vec<Attendee>) -> Result<Ticket, TicketingError> {
    let (
        id,
        ticket_number,
        scan_code,
        owner_id,
        event_id,
        quantity,
        total_amount,
        payment_status,
        payment_ref,
        status,
        purchased_at,
        updated_at,
    ) = row;

    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| corrupt("quantity", &quantity.to_string()))?;

    Ok(Ticket {
        id: TicketId::from_uuid(id),
        ticket_number: TicketNumber::new(ticket_number),
        scan_code: ScanCode::new(scan_code),
        owner_id: UserId::from_uuid(owner_id),
        event_id: EventId::from_uuid(event_id),
        quantity,
        total_amount,
        payment_status: PaymentStatus::parse(&payment_status)
            .ok_or_else(|| corrupt("payment status", &payment_status))?,
        payment_ref,
        status: TicketStatus::parse(&status).ok_or_else(|| corrupt("ticket status", &status))?,
        purchased_at,
        updated_at,
        attendees,
    })
}

/// Converts an event row, rejecting venue rows with missing parts.
///
/// # Errors
///
/// Returns [`TicketingError::EventMisconfigured`] for an unknown event type,
/// a negative capacity or an incomplete venue.
pub fn event_from_row(row: EventRow) -> Result<EventSnapshot, TicketingError> {
    let (
        id,
        title,
        is_published,
        starts_at,
        ends_at,
        event_type,
        ticket_price,
        capacity,
        is_online,
        online_url,
        venue_name,
        venue_address,
        venue_city,
    ) = row;
    let id = EventId::from_uuid(id);

    let kind = EventKind::parse(&event_type)
        .ok_or_else(|| TicketingError::EventMisconfigured(id, format!("event type {event_type:?}")))?;

    let capacity = capacity
        .map(u32::try_from)
        .transpose()
        .map_err(|_| TicketingError::EventMisconfigured(id, "negative capacity".to_string()))?;

    let location = if is_online {
        Location::Online { url: online_url }
    } else {
        match (venue_name, venue_address, venue_city) {
            (Some(name), Some(address), Some(city)) => Location::Venue {
                name,
                address,
                city,
            },
            _ => {
                return Err(TicketingError::EventMisconfigured(
                    id,
                    "venue is missing name, address or city".to_string(),
                ));
            }
        }
    };

    Ok(EventSnapshot {
        id,
        title,
        is_published,
        starts_at,
        ends_at,
        kind,
        ticket_price,
        capacity,
        location,
    })
}

/// Maps the legacy registration status vocabulary onto [`TicketStatus`].
#[must_use]
pub fn legacy_status(value: &str) -> Option<TicketStatus> {
    match value {
        "registered" | "confirmed" => Some(TicketStatus::Active),
        "attended" => Some(TicketStatus::Used),
        "cancelled" => Some(TicketStatus::Cancelled),
        _ => None,
    }
}

/// Converts a legacy registration into a single-admission ticket.
///
/// Registrations carry no price or ticket number: the amount is zero, the
/// payment is complete, and the number is derived from the row id.
///
/// # Errors
///
/// Returns [`TicketingError::Storage`] for an unknown legacy status.
pub fn ticket_from_legacy(row: LegacyRegistrationRow) -> Result<Ticket, TicketingError> {
    let (id, event_id, user_id, full_name, email, phone, status, qr_code, registered_at, checked_in_at) =
        row;
    let ticket_id = TicketId::from_uuid(id);
    let status = legacy_status(&status).ok_or_else(|| corrupt("registration status", &status))?;

    Ok(Ticket {
        id: ticket_id,
        ticket_number: TicketNumber::new(format!("REG-{}", id.simple())),
        scan_code: ScanCode::new(qr_code),
        owner_id: UserId::from_uuid(user_id),
        event_id: EventId::from_uuid(event_id),
        quantity: 1,
        total_amount: Decimal::ZERO,
        payment_status: PaymentStatus::Completed,
        payment_ref: None,
        status,
        purchased_at: registered_at,
        updated_at: checked_in_at.unwrap_or(registered_at),
        attendees: vec![Attendee {
            // Legacy rows have one implicit attendee sharing the row id.
            id: AttendeeId::from_uuid(id),
            ticket_id,
            full_name,
            email,
            phone,
            checked_in_at,
        }],
    })
}
