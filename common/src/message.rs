use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::UserId;

/// A chat message, either loaded from history or pushed over the channel.
///
/// Ordering is arrival order. The server timestamp is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub sender_id: UserId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Which side of the conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Message {
    /// A message is incoming when the conversation partner sent it.
    pub fn direction(&self, target: &UserId) -> Direction {
        if &self.sender_id == target {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }
}
