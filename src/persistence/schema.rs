//! Startup detection of which ticket schema the database carries.
//!
//! Older deployments stored admissions in `event_registrations` rows with
//! their own status vocabulary. The store decides once, at startup, which
//! shape is authoritative; it never falls back from one to the other at
//! request time.

use std::fmt;

use sqlx::PgPool;

use crate::error::TicketingError;

/// Ticket schema present in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Neither table exists yet; migrations will create the current schema.
    Empty,
    /// `tickets` / `ticket_attendees` are present.
    Current,
    /// Only the legacy `event_registrations` table is present.
    Legacy,
}

impl SchemaVersion {
    /// Classifies a database from the presence of the two table families.
    #[must_use]
    pub const fn classify(has_tickets: bool, has_registrations: bool) -> Self {
        match (has_tickets, has_registrations) {
            (true, _) => Self::Current,
            (false, true) => Self::Legacy,
            (false, false) => Self::Empty,
        }
    }

    /// Inspects `information_schema` on the current search path.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] if the catalog query fails.
    pub async fn detect(pool: &PgPool) -> Result<Self, TicketingError> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() \
             AND table_name IN ('tickets', 'event_registrations')",
        )
        .fetch_all(pool)
        .await?;

        let has = |name: &str| tables.iter().any(|t| t == name);
        Ok(Self::classify(has("tickets"), has("event_registrations")))
    }

    /// Returns `true` if writes are allowed against this schema.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self, Self::Legacy)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Current => "current",
            Self::Legacy => "legacy",
        })
    }
}
