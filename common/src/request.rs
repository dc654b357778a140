use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::ProfileCandidate;

/// Outcome the recipient picks for a pending connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_path(self) -> &'static str {
        match self {
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" | "accept" => Ok(ReviewStatus::Accepted),
            "rejected" | "reject" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// A pending incoming request, with the sender's profile populated by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub from_user_id: ProfileCandidate,
    #[serde(default)]
    pub status: Option<String>,
}
