//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire. Monetary amounts are serialized
//! as decimal strings to avoid floating-point rounding in clients.

pub mod checkin_dto;
pub mod common_dto;
pub mod payment_dto;
pub mod ticket_dto;

pub use checkin_dto::*;
pub use common_dto::*;
pub use payment_dto::*;
pub use ticket_dto::*;
