//! Read-only view of an event, as exposed by the event-management
//! collaborator.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EventId;

/// Whether admission to an event is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// No payment required; tickets are complete on issuance.
    Free,
    /// Priced per admission.
    Ticketed,
}

impl EventKind {
    /// Returns the storage/wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Ticketed => "ticketed",
        }
    }

    /// Parses the storage/wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "ticketed" => Some(Self::Ticketed),
            _ => None,
        }
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// Online event, optionally with a join link.
    Online {
        /// Join link, when already published.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// Physical venue.
    Venue {
        /// Venue name.
        name: String,
        /// Street address.
        address: String,
        /// City.
        city: String,
    },
}

impl Location {
    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Online { url: Some(url) } => format!("Online ({url})"),
            Self::Online { url: None } => "Online".to_string(),
            Self::Venue {
                name,
                address,
                city,
            } => format!("{name}, {address}, {city}"),
        }
    }
}

/// Snapshot of the event fields the ticketing core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Event identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Only published events accept issuance.
    pub is_published: bool,
    /// Start instant (date and time combined).
    pub starts_at: DateTime<Utc>,
    /// End instant, if the organizer declared one.
    pub ends_at: Option<DateTime<Utc>>,
    /// Free or ticketed.
    pub kind: EventKind,
    /// Unit price for ticketed events.
    pub ticket_price: Option<Decimal>,
    /// Maximum number of admissions, if limited.
    pub capacity: Option<u32>,
    /// Venue or online.
    pub location: Location,
}

impl EventSnapshot {
    /// Price of one admission: zero for free events.
    ///
    /// Returns `None` for a ticketed event without a positive price.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        match self.kind {
            EventKind::Free => Some(Decimal::ZERO),
            EventKind::Ticketed => self.ticket_price.filter(|p| *p > Decimal::ZERO),
        }
    }

    /// End instant, or `starts_at + default_duration` when none was declared.
    #[must_use]
    pub fn ends_at_or(&self, default_duration: Duration) -> DateTime<Utc> {
        self.ends_at
            .unwrap_or_else(|| self.starts_at + default_duration)
    }

    /// Returns `true` once the event has started.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }
}
