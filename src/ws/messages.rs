//! WebSocket message types: envelope and client commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-to-client message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Echoes the request id for responses; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds an envelope stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Server → Client response to a command.
    Response,
    /// Server → Client ticket event.
    Event,
    /// Server → Client error.
    Error,
}

/// Client request: an optional correlation id plus a command.
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    /// Correlation id echoed in the response.
    #[serde(default)]
    pub id: Option<String>,
    /// The command to run.
    #[serde(flatten)]
    pub command: WsCommand,
}

/// Commands a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Watch ticket activity for events. `["*"]` watches every event.
    Subscribe {
        /// Event ids, or `"*"`.
        event_ids: Vec<String>,
    },
    /// Stop watching events.
    Unsubscribe {
        /// Event ids.
        event_ids: Vec<String>,
    },
    /// Liveness ping.
    Ping,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_parses() {
        let raw = r#"{"id":"7","command":"subscribe","event_ids":["*"]}"#;
        let Ok(req) = serde_json::from_str::<WsRequest>(raw) else {
            panic!("parse failed");
        };
        assert_eq!(req.id.as_deref(), Some("7"));
        assert_eq!(
            req.command,
            WsCommand::Subscribe {
                event_ids: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        let raw = r#"{"command":"transfer"}"#;
        assert!(serde_json::from_str::<WsRequest>(raw).is_err());
    }
}
