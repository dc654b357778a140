use thiserror::Error;

/// Everything a client operation can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 401 on a credentialed call.
    #[error("authentication required")]
    AuthRequired,

    /// The server understood the request and refused it (4xx with a message).
    #[error("{0}")]
    Rejected(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("channel is closed")]
    ChannelClosed,

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The request was abandoned before it completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Coarse taxonomy the views act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Redirect to login unless already on a public route.
    AuthRequired,
    /// Logged and surfaced as a best-effort alert, never fatal.
    TransientNetwork,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::AuthRequired => ErrorKind::AuthRequired,
            ClientError::Http(e) if e.status().map(|s| s.as_u16()) == Some(401) => {
                ErrorKind::AuthRequired
            }
            _ => ErrorKind::TransientNetwork,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        self.kind() == ErrorKind::AuthRequired
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::Http(resp) if resp.status().as_u16() == 401 => ClientError::AuthRequired,
            other => ClientError::Channel(other.to_string()),
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
