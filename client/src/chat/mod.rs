//! One-to-one conversations over a real-time channel.

pub mod controller;
pub mod runtime;
pub mod store;
pub mod transport;

pub use controller::{ChannelEffect, ChannelStatus, ConversationController, ConversationEvent};
pub use runtime::ConversationRuntime;
pub use store::ConversationStore;
pub use transport::{ChannelLink, Connector, WsConnector};
