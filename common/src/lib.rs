//! Shared data model and wire types for the swipe client and its test backend.

pub mod account;
pub mod chat;
pub mod decision;
pub mod envelope;
pub mod message;
pub mod profile;
pub mod request;

pub use decision::Decision;
pub use message::Message;
pub use profile::{ProfileCandidate, UserId, UserProfile};
