//! Discovery feed: a paginated stream of candidates with lookahead
//! prefetch and swipe-to-decide.

pub mod controller;
pub mod cursor;
pub mod gesture;
pub mod runtime;
pub mod store;

pub use controller::{
    FeedController, FeedEffect, FeedEvent, FeedSettings, FeedStatus, Notice, DECISION_FAILED_TEXT,
};
pub use cursor::PaginationCursor;
pub use gesture::{CardTransform, Gesture, Indicator};
pub use runtime::FeedRuntime;
pub use store::FeedStore;
