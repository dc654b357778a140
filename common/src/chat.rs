use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::profile::UserId;

// ---------- Channel protocol ----------
//
// JSON text frames, adjacently tagged: {"event": "...", "data": {...}}.

/// Client → server events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { target_user_id: UserId },
    #[serde(rename_all = "camelCase")]
    SendMessage { target_user_id: UserId, text: String },
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage(Message),
}

impl ClientEvent {
    pub fn target(&self) -> &UserId {
        match self {
            ClientEvent::JoinRoom { target_user_id } => target_user_id,
            ClientEvent::SendMessage { target_user_id, .. } => target_user_id,
        }
    }
}
