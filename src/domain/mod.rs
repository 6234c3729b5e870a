//! Domain layer: ticket aggregate, state machine, policy and events.
//!
//! Everything in here is storage- and transport-agnostic. Services load
//! aggregates through [`crate::persistence`] and run the pure transitions
//! from [`lifecycle`] inside store transactions.

pub mod clock;
pub mod event;
pub mod event_bus;
pub mod identifiers;
pub mod ids;
pub mod lifecycle;
pub mod policy;
pub mod ticket;
pub mod ticket_event;

pub use clock::{Clock, FixedClock, SystemClock};
pub use event::{EventKind, EventSnapshot, Location};
pub use event_bus::EventBus;
pub use identifiers::{IdentifierGenerator, RandomIdentifiers, ScanCode, TicketNumber};
pub use ids::{AttendeeId, EventId, TicketId, UserId};
pub use lifecycle::{CheckInOutcome, PaymentSignal};
pub use policy::TicketingPolicy;
pub use ticket::{Attendee, AttendeeDetails, PaymentStatus, Ticket, TicketStatus};
pub use ticket_event::TicketEvent;
