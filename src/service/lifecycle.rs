//! Ticket lifecycle: reads, cancellation, payment signals and event cleanup.

use std::collections::HashMap;

use super::{Requester, ServiceContext, TicketView};
use crate::domain::lifecycle::{self, PaymentSignal};
use crate::domain::{EventId, EventSnapshot, Ticket, TicketEvent, TicketId, UserId};
use crate::error::TicketingError;

/// Drives every ticket transition other than check-in.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    ctx: ServiceContext,
}

impl LifecycleService {
    /// Creates a new `LifecycleService`.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, id: TicketId) -> Result<Ticket, TicketingError> {
        self.ctx
            .store
            .ticket_by_id(id)
            .await?
            .ok_or(TicketingError::TicketNotFound(id))
    }

    /// Fetches one ticket visible to `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::TicketNotFound`], or
    /// [`TicketingError::Forbidden`] if the caller neither owns the ticket
    /// nor is an administrator.
    pub async fn get(
        &self,
        requester: &Requester,
        id: TicketId,
    ) -> Result<TicketView, TicketingError> {
        let ticket = self.load(id).await?;
        requester.authorize(&ticket)?;
        let event = self.ctx.events.event(ticket.event_id).await?;
        Ok(self.ctx.view(ticket, event))
    }

    /// Lists a user's tickets, newest first, with event snapshots.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store or event directory fails.
    pub async fn list_for_owner(&self, owner: UserId) -> Result<Vec<TicketView>, TicketingError> {
        let tickets = self.ctx.store.tickets_by_owner(owner).await?;

        let mut events: HashMap<EventId, Option<EventSnapshot>> = HashMap::new();
        let mut views = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let event = match events.get(&ticket.event_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.ctx.events.event(ticket.event_id).await?;
                    events.insert(ticket.event_id, fetched.clone());
                    fetched
                }
            };
            views.push(self.ctx.view(ticket, event));
        }
        Ok(views)
    }

    /// Cancels a ticket on behalf of its owner or an administrator.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::TicketNotFound`] / [`TicketingError::EventNotFound`].
    /// - [`TicketingError::Forbidden`] for other users.
    /// - [`TicketingError::NotCancellable`] if the ticket is not `ACTIVE`.
    /// - [`TicketingError::EventAlreadyStarted`] once the event has started.
    pub async fn cancel(
        &self,
        requester: &Requester,
        id: TicketId,
    ) -> Result<TicketView, TicketingError> {
        let ticket = self.load(id).await?;
        requester.authorize(&ticket)?;
        let event = self.ctx.require_event(ticket.event_id).await?;

        let now = self.ctx.clock.now();
        let policy = self.ctx.policy;
        let guard_event = event.clone();
        let cancelled = self
            .ctx
            .store
            .modify_ticket(
                id,
                Box::new(move |t: &mut Ticket| lifecycle::cancel(t, &guard_event, &policy, now)),
            )
            .await?;

        let _ = self.ctx.event_bus.publish(TicketEvent::TicketCancelled {
            ticket_id: id,
            event_id: cancelled.event_id,
            timestamp: now,
        });
        tracing::info!(
            ticket_id = %id,
            requested_by = %requester.user_id,
            admin = requester.is_admin,
            "ticket cancelled"
        );
        Ok(self.ctx.view(cancelled, Some(event)))
    }

    /// Applies a payment-collaborator signal to a ticket.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::TicketNotFound`] / [`TicketingError::EventNotFound`].
    /// - [`TicketingError::InvalidPaymentTransition`] if the signal does not
    ///   apply to the current state.
    pub async fn apply_payment_signal(
        &self,
        id: TicketId,
        signal: PaymentSignal,
    ) -> Result<TicketView, TicketingError> {
        let ticket = self.load(id).await?;
        let event = self.ctx.require_event(ticket.event_id).await?;

        let now = self.ctx.clock.now();
        let policy = self.ctx.policy;
        let guard_event = event.clone();
        let applied = signal.clone();
        let updated = self
            .ctx
            .store
            .modify_ticket(
                id,
                Box::new(move |t: &mut Ticket| {
                    lifecycle::apply_payment(t, &applied, &guard_event, &policy, now)
                }),
            )
            .await?;

        let _ = self.ctx.event_bus.publish(TicketEvent::PaymentUpdated {
            ticket_id: id,
            event_id: updated.event_id,
            payment_status: updated.payment_status,
            status: updated.status,
            timestamp: now,
        });
        tracing::info!(
            ticket_id = %id,
            signal = signal.as_str(),
            payment_status = %updated.payment_status,
            status = %updated.status,
            "payment signal applied"
        );
        Ok(self.ctx.view(updated, Some(event)))
    }

    /// Deletes every ticket of an event that its owner has deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Forbidden`] unless the caller is an
    /// administrator, or a storage error.
    pub async fn purge_event(
        &self,
        requester: &Requester,
        event_id: EventId,
    ) -> Result<u64, TicketingError> {
        if !requester.is_admin {
            return Err(TicketingError::Forbidden(
                "only administrators may purge event tickets".to_string(),
            ));
        }
        let count = self.ctx.store.delete_tickets_for_event(event_id).await?;
        let _ = self.ctx.event_bus.publish(TicketEvent::TicketsPurged {
            event_id,
            count,
            timestamp: self.ctx.clock.now(),
        });
        tracing::info!(%event_id, count, "event tickets purged");
        Ok(count)
    }
}
