//! Gate verification and attendee check-in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ServiceContext, TicketView};
use crate::domain::lifecycle::{self, CheckInOutcome};
use crate::domain::{
    AttendeeId, EventSnapshot, ScanCode, Ticket, TicketEvent, TicketId, TicketStatus,
};
use crate::error::TicketingError;

/// Why a scan was refused. Gate clients branch on these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RejectionReason {
    /// No ticket carries this scan code.
    InvalidCode,
    /// The ticket's event no longer exists.
    EventNotFound,
    /// The ticket is used, cancelled or refunded.
    TicketNotActive,
    /// The admission window has not opened yet.
    TooEarly,
    /// The admission window has closed.
    EventEnded,
}

impl RejectionReason {
    /// Reason string as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCode => "InvalidCode",
            Self::EventNotFound => "EventNotFound",
            Self::TicketNotActive => "TicketNotActive",
            Self::TooEarly => "TooEarly",
            Self::EventEnded => "EventEnded",
        }
    }
}

/// Outcome of [`VerificationService::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the holder may enter.
    pub valid: bool,
    /// Set whenever `valid` is false.
    pub reason: Option<RejectionReason>,
    /// Human-readable explanation of the rejection.
    pub message: Option<String>,
    /// The resolved ticket, absent only for unknown codes.
    pub ticket: Option<TicketView>,
}

impl VerificationResult {
    fn accepted(view: TicketView) -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
            ticket: Some(view),
        }
    }

    fn rejected(reason: RejectionReason, message: String, view: Option<TicketView>) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            message: Some(message),
            ticket: view,
        }
    }
}

/// Resolves scan codes and records check-ins.
#[derive(Debug, Clone)]
pub struct VerificationService {
    ctx: ServiceContext,
}

impl VerificationService {
    /// Creates a new `VerificationService`.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Checks whether a scanned code admits its holder right now.
    ///
    /// Rejections are reported in the result, not as errors. A ticket whose
    /// admission window has closed reads as `EXPIRED` and is rejected with
    /// [`RejectionReason::EventEnded`].
    ///
    /// # Errors
    ///
    /// Only storage failures are returned as errors.
    pub async fn verify(&self, scan_code: &str) -> Result<VerificationResult, TicketingError> {
        let code = ScanCode::new(scan_code.trim());
        let Some(ticket) = self.ctx.store.ticket_by_scan_code(&code).await? else {
            tracing::debug!(reason = "InvalidCode", "scan rejected");
            return Ok(VerificationResult::rejected(
                RejectionReason::InvalidCode,
                "no ticket matches this code".to_string(),
                None,
            ));
        };

        let Some(event) = self.ctx.events.event(ticket.event_id).await? else {
            let message = format!("event {} no longer exists", ticket.event_id);
            return Ok(self.reject(RejectionReason::EventNotFound, message, ticket, None));
        };

        let now = self.ctx.clock.now();
        let policy = &self.ctx.policy;
        let status = lifecycle::effective_status(&ticket, &event, policy, now);
        let rejection = match status {
            TicketStatus::Active => policy.check_window(&event, now).err(),
            TicketStatus::Expired => Some(TicketingError::EventEnded {
                closed_at: policy.checkin_closes_at(&event),
            }),
            other => Some(TicketingError::TicketNotActive(other)),
        };

        Ok(match rejection {
            None => VerificationResult::accepted(self.ctx.view(ticket, Some(event))),
            Some(e) => {
                let reason = match e {
                    TicketingError::TooEarly { .. } => RejectionReason::TooEarly,
                    TicketingError::EventEnded { .. } => RejectionReason::EventEnded,
                    _ => RejectionReason::TicketNotActive,
                };
                self.reject(reason, e.to_string(), ticket, Some(event))
            }
        })
    }

    fn reject(
        &self,
        reason: RejectionReason,
        message: String,
        ticket: Ticket,
        event: Option<EventSnapshot>,
    ) -> VerificationResult {
        tracing::debug!(
            ticket_id = %ticket.id,
            reason = reason.as_str(),
            %message,
            "scan rejected"
        );
        VerificationResult::rejected(reason, message, Some(self.ctx.view(ticket, event)))
    }

    /// Checks one attendee in, promoting the ticket to `USED` when every
    /// attendee is inside.
    ///
    /// The attendee update and the promotion commit in one store
    /// transaction, so of two concurrent check-ins on the same ticket
    /// exactly one observes `all_checked_in`.
    ///
    /// # Errors
    ///
    /// - [`TicketingError::TicketNotFound`] / [`TicketingError::EventNotFound`].
    /// - [`TicketingError::TicketNotActive`] if the ticket is not `ACTIVE`.
    /// - [`TicketingError::TooEarly`] / [`TicketingError::EventEnded`].
    /// - [`TicketingError::AttendeeNotFound`].
    /// - [`TicketingError::AlreadyCheckedIn`] on a repeated scan.
    pub async fn check_in(
        &self,
        ticket_id: TicketId,
        attendee_id: AttendeeId,
    ) -> Result<CheckInOutcome, TicketingError> {
        let ticket = self
            .ctx
            .store
            .ticket_by_id(ticket_id)
            .await?
            .ok_or(TicketingError::TicketNotFound(ticket_id))?;
        let event = self.ctx.require_event(ticket.event_id).await?;

        let now = self.ctx.clock.now();
        let policy = self.ctx.policy;
        let updated = self
            .ctx
            .store
            .modify_ticket(
                ticket_id,
                Box::new(move |t: &mut Ticket| {
                    lifecycle::check_in(t, attendee_id, &event, &policy, now).map(|_| ())
                }),
            )
            .await?;

        let attendee = updated
            .attendee(attendee_id)
            .cloned()
            .ok_or(TicketingError::AttendeeNotFound {
                ticket_id,
                attendee_id,
            })?;
        let all_checked_in = updated.all_checked_in();
        // Check-in is the only path to USED and required ACTIVE on entry.
        let promoted = updated.status == TicketStatus::Used;

        self.announce(&updated, attendee_id, all_checked_in, promoted, now);
        Ok(CheckInOutcome {
            attendee,
            all_checked_in,
            promoted,
        })
    }

    fn announce(
        &self,
        ticket: &Ticket,
        attendee_id: AttendeeId,
        all_checked_in: bool,
        promoted: bool,
        now: DateTime<Utc>,
    ) {
        let _ = self.ctx.event_bus.publish(TicketEvent::AttendeeCheckedIn {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            attendee_id,
            all_checked_in,
            timestamp: now,
        });
        tracing::info!(
            ticket_id = %ticket.id,
            %attendee_id,
            checked_in = ticket.checked_in_count(),
            quantity = ticket.quantity,
            "attendee checked in"
        );

        if promoted {
            let _ = self.ctx.event_bus.publish(TicketEvent::TicketUsed {
                ticket_id: ticket.id,
                event_id: ticket.event_id,
                timestamp: now,
            });
            tracing::info!(ticket_id = %ticket.id, "ticket used");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::domain::ticket::fixtures::details;
    use crate::domain::{RandomIdentifiers, UserId};
    use crate::service::testing::Harness;
    use crate::service::{IssuanceService, IssueRequest, LifecycleService, Requester};

    fn owner() -> Requester {
        Requester {
            user_id: UserId::new(),
            name: Some("Katherine Johnson".to_string()),
            email: Some("katherine@example.com".to_string()),
            is_admin: false,
            is_gate_staff: false,
        }
    }

    async fn issue(h: &Harness, event_id: crate::domain::EventId, quantity: u32) -> Ticket {
        let names = ["Ada Lovelace", "Alan Turing", "Edsger Dijkstra", "Barbara Liskov"];
        let attendees = names
            .iter()
            .take(quantity as usize)
            .map(|n| details(n))
            .collect();
        let request = IssueRequest {
            quantity: Some(i64::from(quantity)),
            attendees,
            ..IssueRequest::single(event_id)
        };
        let svc = IssuanceService::new(h.ctx.clone(), Arc::new(RandomIdentifiers));
        let Ok(ticket) = svc.issue(&owner(), request).await else {
            panic!("issuance failed");
        };
        ticket
    }

    fn attendee_ids(ticket: &Ticket) -> Vec<AttendeeId> {
        ticket.attendees.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let h = Harness::new();
        let svc = VerificationService::new(h.ctx.clone());
        let Ok(result) = svc.verify("QR-00000000-0000-4000-8000-000000000000").await else {
            panic!("verify failed");
        };
        assert!(!result.valid);
        assert_eq!(result.reason, Some(RejectionReason::InvalidCode));
        assert!(result.ticket.is_none());
    }

    #[tokio::test]
    async fn verification_time_window() {
        let h = Harness::new();
        let event = h.free_event(Duration::hours(5)).await;
        let ticket = issue(&h, event.id, 1).await;
        let svc = VerificationService::new(h.ctx.clone());
        let code = ticket.scan_code.as_str().to_string();

        let Ok(early) = svc.verify(&code).await else {
            panic!("verify failed");
        };
        assert_eq!(early.reason, Some(RejectionReason::TooEarly));

        h.clock.set(event.starts_at - Duration::hours(2) + Duration::seconds(1));
        let Ok(open) = svc.verify(&code).await else {
            panic!("verify failed");
        };
        assert!(open.valid);
        assert_eq!(open.reason, None);
        let Some(view) = open.ticket else {
            panic!("accepted scan without ticket");
        };
        assert_eq!(view.ticket.attendees.len(), 1);

        let Some(ends_at) = event.ends_at else {
            panic!("harness events have an end");
        };
        h.clock.set(ends_at + Duration::seconds(1));
        let Ok(late) = svc.verify(&code).await else {
            panic!("verify failed");
        };
        assert_eq!(late.reason, Some(RejectionReason::EventEnded));
        assert_eq!(late.ticket.map(|v| v.status), Some(TicketStatus::Expired));
    }

    #[tokio::test]
    async fn default_duration_applies_without_end_time() {
        let h = Harness::new();
        let mut event = h.free_event(Duration::hours(1)).await;
        event.ends_at = None;
        h.events.upsert(event.clone()).await;
        let ticket = issue(&h, event.id, 1).await;
        let svc = VerificationService::new(h.ctx.clone());
        let code = ticket.scan_code.as_str().to_string();

        h.clock.set(event.starts_at + Duration::hours(23));
        let Ok(result) = svc.verify(&code).await else {
            panic!("verify failed");
        };
        assert!(result.valid);

        h.clock.set(event.starts_at + Duration::hours(24) + Duration::seconds(1));
        let Ok(result) = svc.verify(&code).await else {
            panic!("verify failed");
        };
        assert_eq!(result.reason, Some(RejectionReason::EventEnded));
    }

    #[tokio::test]
    async fn cancelled_ticket_is_not_active() {
        let h = Harness::new();
        let event = h.free_event(Duration::hours(1)).await;
        let holder = owner();
        let svc = IssuanceService::new(h.ctx.clone(), Arc::new(RandomIdentifiers));
        let Ok(ticket) = svc.issue(&holder, IssueRequest::single(event.id)).await else {
            panic!("issuance failed");
        };
        let lifecycle = LifecycleService::new(h.ctx.clone());
        assert!(lifecycle.cancel(&holder, ticket.id).await.is_ok());

        let verify = VerificationService::new(h.ctx.clone());
        let Ok(result) = verify.verify(ticket.scan_code.as_str()).await else {
            panic!("verify failed");
        };
        assert_eq!(result.reason, Some(RejectionReason::TicketNotActive));
        assert_eq!(result.ticket.map(|v| v.status), Some(TicketStatus::Cancelled));

        let ids = attendee_ids(&ticket);
        let Some(first) = ids.first() else {
            panic!("no attendee");
        };
        let checkin = verify.check_in(ticket.id, *first).await;
        assert!(matches!(
            checkin,
            Err(TicketingError::TicketNotActive(TicketStatus::Cancelled))
        ));
    }

    #[tokio::test]
    async fn partial_then_full_check_in_promotes_to_used() {
        let h = Harness::new();
        let event = h.free_event(Duration::minutes(30)).await;
        let ticket = issue(&h, event.id, 2).await;
        let svc = VerificationService::new(h.ctx.clone());
        let ids = attendee_ids(&ticket);
        let [first, second] = ids.as_slice() else {
            panic!("expected two attendees");
        };
        let mut rx = h.ctx.event_bus.subscribe();

        let Ok(one) = svc.check_in(ticket.id, *first).await else {
            panic!("first check-in failed");
        };
        assert!(!one.all_checked_in);
        assert!(!one.promoted);
        assert_eq!(one.attendee.checked_in_at, Some(h.ctx.clock.now()));
        let Ok(Some(stored)) = h.ctx.store.ticket_by_id(ticket.id).await else {
            panic!("ticket vanished");
        };
        assert_eq!(stored.status, TicketStatus::Active);

        let Ok(two) = svc.check_in(ticket.id, *second).await else {
            panic!("second check-in failed");
        };
        assert!(two.all_checked_in);
        assert!(two.promoted);
        let Ok(Some(stored)) = h.ctx.store.ticket_by_id(ticket.id).await else {
            panic!("ticket vanished");
        };
        assert_eq!(stored.status, TicketStatus::Used);
        assert!(stored.all_checked_in());

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.event_type_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["attendee_checked_in", "attendee_checked_in", "ticket_used"]
        );
    }

    #[tokio::test]
    async fn repeated_check_in_keeps_original_timestamp() {
        let h = Harness::new();
        let event = h.free_event(Duration::minutes(30)).await;
        let ticket = issue(&h, event.id, 2).await;
        let svc = VerificationService::new(h.ctx.clone());
        let ids = attendee_ids(&ticket);
        let Some(first) = ids.first().copied() else {
            panic!("no attendee");
        };

        let Ok(outcome) = svc.check_in(ticket.id, first).await else {
            panic!("check-in failed");
        };
        let original = outcome.attendee.checked_in_at;

        h.clock.advance(Duration::minutes(3));
        let again = svc.check_in(ticket.id, first).await;
        let Err(TicketingError::AlreadyCheckedIn { checked_in_at, .. }) = again else {
            panic!("expected AlreadyCheckedIn");
        };
        assert_eq!(Some(checked_in_at), original);

        let Ok(Some(stored)) = h.ctx.store.ticket_by_id(ticket.id).await else {
            panic!("ticket vanished");
        };
        assert_eq!(stored.checked_in_count(), 1);
        assert_eq!(stored.attendee(first).and_then(|a| a.checked_in_at), original);
    }

    #[tokio::test]
    async fn check_in_rejects_foreign_attendee_and_unknown_ticket() {
        let h = Harness::new();
        let event = h.free_event(Duration::minutes(30)).await;
        let ticket = issue(&h, event.id, 1).await;
        let svc = VerificationService::new(h.ctx.clone());

        let foreign = svc.check_in(ticket.id, AttendeeId::new()).await;
        assert!(matches!(foreign, Err(TicketingError::AttendeeNotFound { .. })));

        let missing = svc.check_in(TicketId::new(), AttendeeId::new()).await;
        assert!(matches!(missing, Err(TicketingError::TicketNotFound(_))));
    }

    #[tokio::test]
    async fn check_in_respects_the_window() {
        let h = Harness::new();
        let event = h.free_event(Duration::hours(3)).await;
        let ticket = issue(&h, event.id, 1).await;
        let svc = VerificationService::new(h.ctx.clone());
        let Some(first) = attendee_ids(&ticket).first().copied() else {
            panic!("no attendee");
        };

        let early = svc.check_in(ticket.id, first).await;
        assert!(matches!(early, Err(TicketingError::TooEarly { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_check_ins_promote_exactly_once() {
        let h = Harness::new();
        let event = h.free_event(Duration::minutes(30)).await;
        let ticket = issue(&h, event.id, 2).await;
        let ids = attendee_ids(&ticket);
        let [first, second] = ids.as_slice() else {
            panic!("expected two attendees");
        };

        let a = VerificationService::new(h.ctx.clone());
        let b = VerificationService::new(h.ctx.clone());
        let (ra, rb) = tokio::join!(
            a.check_in(ticket.id, *first),
            b.check_in(ticket.id, *second)
        );
        let (Ok(ra), Ok(rb)) = (ra, rb) else {
            panic!("both check-ins must succeed");
        };
        assert_eq!(u8::from(ra.promoted) + u8::from(rb.promoted), 1);
        assert_eq!(
            u8::from(ra.all_checked_in) + u8::from(rb.all_checked_in),
            1
        );

        let Ok(Some(stored)) = h.ctx.store.ticket_by_id(ticket.id).await else {
            panic!("ticket vanished");
        };
        assert_eq!(stored.status, TicketStatus::Used);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_and_check_in_race_has_one_winner() {
        let h = Harness::new();
        // Inside the check-in window but before the start, so both may win.
        let event = h.free_event(Duration::minutes(30)).await;
        let holder = owner();
        let issuer = IssuanceService::new(h.ctx.clone(), Arc::new(RandomIdentifiers));
        let Ok(ticket) = issuer.issue(&holder, IssueRequest::single(event.id)).await else {
            panic!("issuance failed");
        };
        let Some(first) = attendee_ids(&ticket).first().copied() else {
            panic!("no attendee");
        };

        let lifecycle = LifecycleService::new(h.ctx.clone());
        let verify = VerificationService::new(h.ctx.clone());
        let (cancelled, checked_in) = tokio::join!(
            lifecycle.cancel(&holder, ticket.id),
            verify.check_in(ticket.id, first)
        );

        let Ok(Some(stored)) = h.ctx.store.ticket_by_id(ticket.id).await else {
            panic!("ticket vanished");
        };
        match (cancelled, checked_in) {
            (Ok(_), Err(TicketingError::TicketNotActive(TicketStatus::Cancelled))) => {
                assert_eq!(stored.status, TicketStatus::Cancelled);
                assert_eq!(stored.checked_in_count(), 0);
            }
            (Err(TicketingError::NotCancellable(TicketStatus::Used)), Ok(_)) => {
                assert_eq!(stored.status, TicketStatus::Used);
            }
            other => panic!("expected exactly one winner, got {other:?}"),
        }
    }
}
