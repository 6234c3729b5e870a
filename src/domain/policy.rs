//! Tunable ticketing policy: check-in window and issuance limits.

use chrono::{DateTime, Duration, Utc};

use super::EventSnapshot;
use crate::error::TicketingError;

/// Default minutes before event start at which check-in opens.
pub const DEFAULT_CHECKIN_EARLY_MINUTES: i64 = 120;

/// Default event duration assumed when the organizer declared no end.
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 24;

/// Default number of identifier generations attempted per issuance.
pub const DEFAULT_IDENTIFIER_RETRY_LIMIT: u32 = 3;

/// Upper bound on admissions covered by a single ticket.
pub const MAX_QUANTITY_PER_TICKET: u32 = 20;

/// Policy constants shared by the issuance, lifecycle and verification
/// services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketingPolicy {
    /// How long before `starts_at` the gate accepts scans.
    pub checkin_opens_before: Duration,
    /// Assumed event length when `ends_at` is absent.
    pub default_event_duration: Duration,
    /// Identifier generation attempts before giving up.
    pub identifier_retry_limit: u32,
    /// Maximum `quantity` per ticket.
    pub max_quantity_per_ticket: u32,
}

impl Default for TicketingPolicy {
    fn default() -> Self {
        Self {
            checkin_opens_before: Duration::minutes(DEFAULT_CHECKIN_EARLY_MINUTES),
            default_event_duration: Duration::hours(DEFAULT_EVENT_DURATION_HOURS),
            identifier_retry_limit: DEFAULT_IDENTIFIER_RETRY_LIMIT,
            max_quantity_per_ticket: MAX_QUANTITY_PER_TICKET,
        }
    }
}

impl TicketingPolicy {
    /// First instant at which scans are accepted.
    #[must_use]
    pub fn checkin_opens_at(&self, event: &EventSnapshot) -> DateTime<Utc> {
        event.starts_at - self.checkin_opens_before
    }

    /// Last instant at which scans are accepted; also the expiry instant.
    #[must_use]
    pub fn checkin_closes_at(&self, event: &EventSnapshot) -> DateTime<Utc> {
        event.ends_at_or(self.default_event_duration)
    }

    /// Returns `true` once the event's admission window has closed.
    #[must_use]
    pub fn has_ended(&self, event: &EventSnapshot, now: DateTime<Utc>) -> bool {
        now > self.checkin_closes_at(event)
    }

    /// Rejects scans outside `[opens_at, closes_at]`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::TooEarly`] before the window opens and
    /// [`TicketingError::EventEnded`] after it closes.
    pub fn check_window(
        &self,
        event: &EventSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), TicketingError> {
        let opens_at = self.checkin_opens_at(event);
        if now < opens_at {
            return Err(TicketingError::TooEarly { opens_at });
        }
        let closed_at = self.checkin_closes_at(event);
        if now > closed_at {
            return Err(TicketingError::EventEnded { closed_at });
        }
        Ok(())
    }
}
