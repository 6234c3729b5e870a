//! In-memory store with per-ticket fine-grained locking.
//!
//! Tickets live in a `HashMap` where each entry is protected by its own
//! [`tokio::sync::Mutex`], so mutations on one ticket are serialized while
//! different tickets proceed concurrently. The unique indexes on ticket
//! number and scan code share the outer [`RwLock`] with the map so that
//! insertion is all-or-nothing.
//!
//! Lock order: a task never holds a ticket lock while acquiring the outer
//! lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{EventDirectory, TicketMutation, TicketStore};
use crate::domain::{EventId, EventSnapshot, ScanCode, Ticket, TicketId, UserId};
use crate::error::TicketingError;

#[derive(Debug, Default)]
struct Tables {
    tickets: HashMap<TicketId, Arc<Mutex<Ticket>>>,
    by_number: HashMap<String, TicketId>,
    by_scan_code: HashMap<String, TicketId>,
}

impl Tables {
    fn entry(&self, id: TicketId) -> Option<Arc<Mutex<Ticket>>> {
        self.tickets.get(&id).cloned()
    }
}

/// Ticket store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tables: RwLock<Tables>,
}

impl InMemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tickets.
    pub async fn len(&self) -> usize {
        self.tables.read().await.tickets.len()
    }

    /// Returns `true` if the store holds no tickets.
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.tickets.is_empty()
    }

    async fn snapshot(entry: Option<Arc<Mutex<Ticket>>>) -> Option<Ticket> {
        match entry {
            Some(lock) => Some(lock.lock().await.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert_ticket(
        &self,
        ticket: &Ticket,
        capacity: Option<u32>,
    ) -> Result<(), TicketingError> {
        let mut tables = self.tables.write().await;

        if tables.by_number.contains_key(ticket.ticket_number.as_str()) {
            return Err(TicketingError::DuplicateIdentifier(format!(
                "ticket_number {}",
                ticket.ticket_number
            )));
        }
        if tables.by_scan_code.contains_key(ticket.scan_code.as_str()) {
            return Err(TicketingError::DuplicateIdentifier(
                "scan_code".to_string(),
            ));
        }
        if tables.tickets.contains_key(&ticket.id) {
            return Err(TicketingError::DuplicateIdentifier(format!(
                "ticket id {}",
                ticket.id
            )));
        }

        if let Some(capacity) = capacity {
            let mut held: u32 = 0;
            for lock in tables.tickets.values() {
                let existing = lock.lock().await;
                if existing.event_id == ticket.event_id && existing.holds_capacity() {
                    held = held.saturating_add(existing.quantity);
                }
            }
            let remaining = capacity.saturating_sub(held);
            if ticket.quantity > remaining {
                return Err(TicketingError::SoldOut {
                    event_id: ticket.event_id,
                    remaining,
                });
            }
        }

        tables
            .by_number
            .insert(ticket.ticket_number.as_str().to_string(), ticket.id);
        tables
            .by_scan_code
            .insert(ticket.scan_code.as_str().to_string(), ticket.id);
        tables
            .tickets
            .insert(ticket.id, Arc::new(Mutex::new(ticket.clone())));
        Ok(())
    }

    async fn ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketingError> {
        let entry = self.tables.read().await.entry(id);
        Ok(Self::snapshot(entry).await)
    }

    async fn ticket_by_scan_code(
        &self,
        code: &ScanCode,
    ) -> Result<Option<Ticket>, TicketingError> {
        let entry = {
            let tables = self.tables.read().await;
            tables
                .by_scan_code
                .get(code.as_str())
                .and_then(|id| tables.entry(*id))
        };
        Ok(Self::snapshot(entry).await)
    }

    async fn tickets_by_owner(&self, owner: UserId) -> Result<Vec<Ticket>, TicketingError> {
        let entries: Vec<Arc<Mutex<Ticket>>> =
            self.tables.read().await.tickets.values().cloned().collect();

        let mut tickets = Vec::new();
        for lock in entries {
            let ticket = lock.lock().await;
            if ticket.owner_id == owner {
                tickets.push(ticket.clone());
            }
        }
        tickets.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(tickets)
    }

    async fn modify_ticket(
        &self,
        id: TicketId,
        mutation: TicketMutation,
    ) -> Result<Ticket, TicketingError> {
        let entry = self
            .tables
            .read()
            .await
            .entry(id)
            .ok_or(TicketingError::TicketNotFound(id))?;

        let mut stored = entry.lock().await;
        let mut working = stored.clone();
        mutation(&mut working)?;
        *stored = working.clone();
        Ok(working)
    }

    async fn delete_tickets_for_event(&self, event_id: EventId) -> Result<u64, TicketingError> {
        let mut tables = self.tables.write().await;

        let mut doomed = Vec::new();
        for (id, lock) in &tables.tickets {
            let ticket = lock.lock().await;
            if ticket.event_id == event_id {
                doomed.push((
                    *id,
                    ticket.ticket_number.as_str().to_string(),
                    ticket.scan_code.as_str().to_string(),
                ));
            }
        }

        for (id, number, code) in &doomed {
            tables.tickets.remove(id);
            tables.by_number.remove(number);
            tables.by_scan_code.remove(code);
        }
        Ok(doomed.len() as u64)
    }
}

/// Event directory kept in process memory, fed by the caller.
#[derive(Debug, Default)]
pub struct InMemoryEventDirectory {
    events: RwLock<HashMap<EventId, EventSnapshot>>,
}

impl InMemoryEventDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an event.
    pub async fn upsert(&self, event: EventSnapshot) {
        self.events.write().await.insert(event.id, event);
    }

    /// Removes an event, returning it if present.
    pub async fn remove(&self, id: EventId) -> Option<EventSnapshot> {
        self.events.write().await.remove(&id)
    }
}

#[async_trait]
impl EventDirectory for InMemoryEventDirectory {
    async fn event(&self, id: EventId) -> Result<Option<EventSnapshot>, TicketingError> {
        Ok(self.events.read().await.get(&id).cloned())
    }
}
