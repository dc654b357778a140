//! End-to-end fixtures for the swipe client: a mock backend and the
//! accounts and candidates the scenario tests share.

use std::sync::Arc;
use std::time::Duration;

use swipe_client::Session;
use swipe_common::{Message, ProfileCandidate, UserId, UserProfile};

pub mod harness;

use harness::{MockServer, MockState};

pub const PASSWORD: &str = "Str0ng#pass";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const CAROL: &str = "carol@example.com";

pub fn alice_id() -> UserId {
    UserId::new("U1")
}

pub fn bob_id() -> UserId {
    UserId::new("U2")
}

pub fn carol_id() -> UserId {
    UserId::new("U3")
}

pub fn account(id: &UserId, first_name: &str, email: &str) -> UserProfile {
    UserProfile {
        id: id.clone(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email_id: Some(email.to_string()),
        photo_url: None,
        about: None,
        gender: None,
        age: Some(30),
    }
}

pub fn candidate(id: &str) -> ProfileCandidate {
    ProfileCandidate {
        id: UserId::new(id),
        first_name: format!("Cand{id}"),
        last_name: "Idate".to_string(),
        photo_url: Some(format!("https://img.example.com/{id}.jpg")),
        about: Some("likes long walks".to_string()),
        gender: None,
        age: Some(28),
    }
}

/// `n` candidates with ids `c1..=cn`.
pub fn candidates(n: usize) -> Vec<ProfileCandidate> {
    (1..=n).map(|i| candidate(&format!("c{i}"))).collect()
}

pub fn message(id: &str, sender: &UserId, text: &str) -> Message {
    Message {
        id: id.to_string(),
        sender_id: sender.clone(),
        text: text.to_string(),
        created_at: None,
    }
}

/// Mock backend with Alice, Bob and Carol registered and `feed_len`
/// candidates in the feed.
pub async fn seeded_server(feed_len: usize) -> MockServer {
    let state = Arc::new(MockState::default());
    state.add_account(account(&alice_id(), "Alice", ALICE), PASSWORD);
    state.add_account(account(&bob_id(), "Bobby", BOB), PASSWORD);
    state.add_account(account(&carol_id(), "Carol", CAROL), PASSWORD);
    state.set_feed(candidates(feed_len));
    MockServer::start(state).await
}

/// A session on its own cookie jar, logged in as `email`.
pub async fn logged_in(server: &MockServer, email: &str) -> Session {
    let session = Session::new(server.client());
    session
        .login(email, PASSWORD)
        .await
        .unwrap_or_else(|e| panic!("login as {email} failed: {e}"));
    session
}
