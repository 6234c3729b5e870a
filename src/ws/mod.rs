//! Live ticket activity feed over WebSocket.
//!
//! Clients connect to `/ws`, subscribe to event ids (or `*`) and receive
//! every committed ticket mutation for those events.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
