//! Persistence layer: the ticket store and the event directory.
//!
//! [`TicketStore`] is the single shared mutable resource of the crate. Every
//! write goes through one of its transactional operations; services never
//! hold application-level locks across calls. Two backends are provided:
//! PostgreSQL (`sqlx::PgPool`) and an in-memory store for tests and local
//! runs.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{EventId, EventSnapshot, ScanCode, Ticket, TicketId, UserId};
use crate::error::TicketingError;

pub use memory::{InMemoryEventDirectory, InMemoryTicketStore};
pub use postgres::{PostgresEventDirectory, PostgresTicketStore};
pub use schema::SchemaVersion;

/// Pure transition applied to a locked ticket inside a store transaction.
///
/// Returning `Err` rolls the transaction back and leaves the ticket as it
/// was.
pub type TicketMutation = Box<dyn FnOnce(&mut Ticket) -> Result<(), TicketingError> + Send>;

/// Transactional ticket persistence.
#[async_trait]
pub trait TicketStore: Send + Sync + fmt::Debug {
    /// Inserts a ticket and all of its attendees atomically.
    ///
    /// When `capacity` is set, the admissions already held for the event
    /// are counted inside the same transaction.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::DuplicateIdentifier`] if the ticket number or scan
    ///   code is taken.
    /// - [`TicketingError::SoldOut`] if the ticket would exceed `capacity`.
    /// - [`TicketingError::Storage`] on infrastructure failure.
    async fn insert_ticket(
        &self,
        ticket: &Ticket,
        capacity: Option<u32>,
    ) -> Result<(), TicketingError>;

    /// Fetches a ticket with its attendees.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] on infrastructure failure.
    async fn ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketingError>;

    /// Resolves a scan code.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] on infrastructure failure.
    async fn ticket_by_scan_code(&self, code: &ScanCode)
    -> Result<Option<Ticket>, TicketingError>;

    /// Lists a user's tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] on infrastructure failure.
    async fn tickets_by_owner(&self, owner: UserId) -> Result<Vec<Ticket>, TicketingError>;

    /// Locks the ticket, re-reads it, applies `mutation` and writes back
    /// the changed rows, all in one transaction.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::TicketNotFound`] if no such ticket exists.
    /// - Whatever `mutation` returns; nothing is written in that case.
    /// - [`TicketingError::Storage`] on infrastructure failure.
    async fn modify_ticket(
        &self,
        id: TicketId,
        mutation: TicketMutation,
    ) -> Result<Ticket, TicketingError>;

    /// Deletes every ticket and attendee of an event. Only used when the
    /// event itself is deleted by its owner.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] on infrastructure failure.
    async fn delete_tickets_for_event(&self, event_id: EventId) -> Result<u64, TicketingError>;
}

/// Read-only access to events owned by the event-management collaborator.
#[async_trait]
pub trait EventDirectory: Send + Sync + fmt::Debug {
    /// Looks up an event.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::EventMisconfigured`] if the stored event cannot be
    ///   represented.
    /// - [`TicketingError::Storage`] on infrastructure failure.
    async fn event(&self, id: EventId) -> Result<Option<EventSnapshot>, TicketingError>;
}
