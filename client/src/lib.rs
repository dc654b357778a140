//! Headless engine of the swipe client.
//!
//! - [`feed`]: paginated discovery feed with lookahead prefetch and
//!   swipe-to-decide.
//! - [`chat`]: per-conversation real-time channel and message store.
//! - [`session`]: current user, route gate and logout broadcast.
//! - [`api`]: REST client shared by all of the above.
//!
//! State machines are synchronous and return the I/O they want performed;
//! the `*Runtime` types run that I/O on tokio and feed the results back.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod feed;
pub mod session;

pub use api::{ApiClient, Backend};
pub use chat::{ChannelStatus, ConversationRuntime, WsConnector};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, Result};
pub use feed::{FeedRuntime, FeedSettings, FeedStatus};
pub use session::{Route, Session, SessionContext, SessionEvent};
