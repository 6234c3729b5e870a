//! Shared DTO types used across multiple endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Attendee, EventSnapshot, Location};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Returns the requested page of `items` with its metadata.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = total.div_ceil(params.per_page);
        let start = (params.page.saturating_sub(1) as usize).saturating_mul(params.per_page as usize);
        let page: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(params.per_page as usize)
            .collect();
        (
            page,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationDto {
    /// Online event.
    Online {
        /// Join link, if published.
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

impl From<&Location> for LocationDto {
    fn from(location: &Location) -> Self {
        match location {
            Location::Online { url } => Self::Online { url: url.clone() },
            Location::Venue {
                name,
                address,
                city,
            } => Self::Venue {
                name: name.clone(),
                address: address.clone(),
                city: city.clone(),
            },
        }
    }
}

/// Event snapshot embedded in ticket responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSummaryDto {
    /// Event UUID.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Start instant.
    pub starts_at: DateTime<Utc>,
    /// End instant, if declared.
    pub ends_at: Option<DateTime<Utc>>,
    /// `free` or `ticketed`.
    pub event_type: String,
    /// Venue or online.
    pub location: LocationDto,
}

impl From<&EventSnapshot> for EventSummaryDto {
    fn from(event: &EventSnapshot) -> Self {
        Self {
            id: *event.id.as_uuid(),
            title: event.title.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            event_type: event.kind.as_str().to_string(),
            location: LocationDto::from(&event.location),
        }
    }
}

/// One admission on a ticket.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDto {
    /// Attendee UUID.
    pub id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Whether the attendee has entered.
    pub checked_in: bool,
    /// When the attendee entered.
    pub check_in_at: Option<DateTime<Utc>>,
}

impl From<&Attendee> for AttendeeDto {
    fn from(attendee: &Attendee) -> Self {
        Self {
            id: *attendee.id.as_uuid(),
            full_name: attendee.full_name.clone(),
            email: attendee.email.clone(),
            phone: attendee.phone.clone(),
            checked_in: attendee.is_checked_in(),
            check_in_at: attendee.checked_in_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_clamps_and_slices() {
        let params = PaginationParams {
            page: 2,
            per_page: 2,
        };
        let (page, meta) = params.paginate((1..=5).collect::<Vec<u32>>());
        assert_eq!(page, vec![3, 4]);
        assert_eq!(meta.total, 5);
        assert_eq!(meta.total_pages, 3);

        let params = PaginationParams {
            page: 0,
            per_page: 500,
        };
        let (page, meta) = params.paginate(vec![1, 2, 3]);
        assert_eq!(page.len(), 3);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.per_page, 100);
    }
}
