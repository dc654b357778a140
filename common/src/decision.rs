use std::fmt;

use serde::{Deserialize, Serialize};

/// The user's choice on a feed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Interested,
    Ignore,
}

impl Decision {
    /// Path segment used by `POST /request/send/{status}/{userId}`.
    pub fn as_path(self) -> &'static str {
        match self {
            Decision::Interested => "interested",
            Decision::Ignore => "ignore",
        }
    }

    /// Decision implied by a released drag. Positive offsets are a right swipe.
    pub fn from_offset(offset: f64, threshold: f64) -> Option<Decision> {
        if offset.abs() <= threshold {
            None
        } else if offset > 0.0 {
            Some(Decision::Interested)
        } else {
            Some(Decision::Ignore)
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}
