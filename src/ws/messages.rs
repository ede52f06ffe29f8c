//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::AdapterAck;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
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
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
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
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client bus event.
    Event,
    /// Server → adapter platform request, answered with an `ack` command.
    Request,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the payload of a `command` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events of specific VZPs. Use `["*"]` for all.
    Subscribe {
        /// Event ids to subscribe to.
        vzp_ids: Vec<String>,
    },
    /// Unsubscribe from events of specific VZPs.
    Unsubscribe {
        /// Event ids to unsubscribe from.
        vzp_ids: Vec<String>,
    },
    /// Fetch the current state and rendered post of one VZP.
    GetState {
        /// Target event id.
        vzp_id: String,
    },
    /// List the active VZPs.
    ListVzps,
    /// Register this connection as the platform adapter.
    RegisterAdapter {
        /// Shared secret, required when the server has one configured.
        #[serde(default)]
        token: Option<String>,
    },
    /// Answer a platform request. Accepted from the adapter only.
    Ack(AdapterAck),
}
