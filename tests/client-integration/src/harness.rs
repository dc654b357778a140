//! In-process mock of the backend: REST endpoints, cookie sessions and the
//! WebSocket chat rooms, served by axum on an ephemeral port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use swipe_client::{ApiClient, ClientConfig};
use swipe_common::account::{LoginRequest, SignupRequest};
use swipe_common::chat::{ClientEvent, ServerEvent};
use swipe_common::profile::ProfilePatch;
use swipe_common::request::ConnectionRequest;
use swipe_common::{Message, ProfileCandidate, UserId, UserProfile};

const SESSION_COOKIE: &str = "token";

/// A registered account of the mock backend.
#[derive(Debug, Clone)]
pub struct Account {
    pub profile: UserProfile,
    pub password: String,
}

/// Everything the mock server knows and records.
#[derive(Default)]
pub struct MockState {
    pub accounts: Mutex<Vec<Account>>,
    /// Candidates served by `/feed`, identical for every user.
    pub feed: Mutex<Vec<ProfileCandidate>>,
    /// `/feed` answers 500 for these pages.
    pub failing_pages: Mutex<Vec<u32>>,
    pub feed_calls: Mutex<Vec<(UserId, u32, usize)>>,
    /// `(from, decision, to)` for every `/request/send`.
    pub decisions: Mutex<Vec<(UserId, String, UserId)>>,
    pub connections: Mutex<HashMap<UserId, Vec<ProfileCandidate>>>,
    pub requests: Mutex<HashMap<UserId, Vec<ConnectionRequest>>>,
    /// `(reviewer, status, request id)`.
    pub reviews: Mutex<Vec<(UserId, String, String)>>,
    /// Keyed by room id, see [`room_id`].
    pub history: Mutex<HashMap<String, Vec<Message>>>,
    /// Extra latency of `/chat/{target}`.
    pub history_delay: Mutex<Option<Duration>>,
    sessions: Mutex<HashMap<String, UserId>>,
    rooms: Mutex<HashMap<String, Vec<RoomMember>>>,
    seq: AtomicU64,
}

struct RoomMember {
    user: UserId,
    socket: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// Both participants of a conversation share one room.
pub fn room_id(a: &UserId, b: &UserId) -> String {
    let (lo, hi) = if a.as_str() <= b.as_str() { (a, b) } else { (b, a) };
    format!("{lo}_{hi}")
}

impl MockState {
    pub fn add_account(&self, profile: UserProfile, password: &str) {
        self.accounts.lock().unwrap().push(Account {
            profile,
            password: password.to_string(),
        });
    }

    pub fn set_feed(&self, feed: Vec<ProfileCandidate>) {
        *self.feed.lock().unwrap() = feed;
    }

    pub fn fail_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().push(page);
    }

    pub fn add_history(&self, a: &UserId, b: &UserId, messages: Vec<Message>) {
        self.history
            .lock()
            .unwrap()
            .entry(room_id(a, b))
            .or_default()
            .extend(messages);
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.feed_calls.lock().unwrap().iter().map(|c| c.1).collect()
    }

    /// Sockets currently joined to the conversation between `a` and `b`.
    pub fn room_size(&self, a: &UserId, b: &UserId) -> usize {
        self.rooms
            .lock()
            .unwrap()
            .get(&room_id(a, b))
            .map_or(0, Vec::len)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<UserId> {
        let token = session_token(headers)?;
        self.sessions.lock().unwrap().get(&token).cloned()
    }

    fn profile(&self, id: &UserId) -> Option<UserProfile> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.profile.id == id)
            .map(|a| a.profile.clone())
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|kv| kv.trim().split_once('='))
        .find(|(k, _)| *k == SESSION_COOKIE)
        .map(|(_, v)| v.to_string())
}

/// Running mock server. Stops when dropped.
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(state: Arc<MockState>) -> Self {
        tracing_subscriber::fmt::try_init().ok();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });
        tracing::debug!(%addr, "mock backend listening");
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url()).expect("mock base url")
    }

    /// Fresh client with its own cookie jar.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config()).expect("api client")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
        .route("/profile/view", get(profile_view))
        .route("/profile/edit", patch(profile_edit))
        .route("/feed", get(feed))
        .route("/request/send/{status}/{user_id}", post(send_request))
        .route("/request/review/{status}/{request_id}", post(review_request))
        .route("/user/connections", get(connections))
        .route("/user/requests", get(requests))
        .route("/chat/{target}", get(chat_history))
        .route("/ws", get(channel))
        .with_state(state)
}

type Shared = State<Arc<MockState>>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Please login" })),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

fn with_session(state: &MockState, user: &UserProfile, body: serde_json::Value) -> Response {
    let token = state.next_id("tok-");
    state
        .sessions
        .lock()
        .unwrap()
        .insert(token.clone(), user.id.clone());
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"))],
        Json(body),
    )
        .into_response()
}

async fn login(State(state): Shared, Json(body): Json<LoginRequest>) -> Response {
    let found = state
        .accounts
        .lock()
        .unwrap()
        .iter()
        .find(|a| a.profile.email_id.as_deref() == Some(body.email_id.as_str()))
        .cloned();
    match found {
        Some(account) if account.password == body.password => {
            // Bare body, like the real login endpoint.
            let value = serde_json::to_value(&account.profile).unwrap_or_default();
            with_session(&state, &account.profile, value)
        }
        _ => bad_request("Invalid credentials"),
    }
}

async fn signup(State(state): Shared, Json(body): Json<SignupRequest>) -> Response {
    let taken = state
        .accounts
        .lock()
        .unwrap()
        .iter()
        .any(|a| a.profile.email_id.as_deref() == Some(body.email_id.as_str()));
    if taken {
        return bad_request("Email already registered");
    }
    let profile = UserProfile {
        id: UserId::new(state.next_id("user-")),
        first_name: body.first_name,
        last_name: body.last_name,
        email_id: Some(body.email_id),
        photo_url: None,
        about: None,
        gender: None,
        age: None,
    };
    state.add_account(profile.clone(), &body.password);
    let value = json!({ "message": "User added", "data": profile });
    with_session(&state, &profile, value)
}

async fn logout(State(state): Shared, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.lock().unwrap().remove(&token);
    }
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"))],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

async fn profile_view(State(state): Shared, headers: HeaderMap) -> Response {
    let Some(user) = state.user_for(&headers).and_then(|id| state.profile(&id)) else {
        return unauthorized();
    };
    Json(user).into_response()
}

async fn profile_edit(
    State(state): Shared,
    headers: HeaderMap,
    Json(patch): Json<ProfilePatch>,
) -> Response {
    let Some(user_id) = state.user_for(&headers) else {
        return unauthorized();
    };
    let mut accounts = state.accounts.lock().unwrap();
    let Some(account) = accounts.iter_mut().find(|a| a.profile.id == user_id) else {
        return unauthorized();
    };
    let p = &mut account.profile;
    if let Some(v) = patch.first_name {
        p.first_name = v;
    }
    if let Some(v) = patch.last_name {
        p.last_name = v;
    }
    if patch.photo_url.is_some() {
        p.photo_url = patch.photo_url;
    }
    if patch.about.is_some() {
        p.about = patch.about;
    }
    if patch.gender.is_some() {
        p.gender = patch.gender;
    }
    if patch.age.is_some() {
        p.age = patch.age;
    }
    Json(json!({ "message": "Profile updated", "data": p.clone() })).into_response()
}

#[derive(Deserialize)]
struct FeedQuery {
    page: Option<u32>,
    limit: Option<usize>,
}

async fn feed(State(state): Shared, headers: HeaderMap, Query(q): Query<FeedQuery>) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).min(50);
    state
        .feed_calls
        .lock()
        .unwrap()
        .push((user.clone(), page, limit));
    if state.failing_pages.lock().unwrap().contains(&page) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "feed unavailable" })),
        )
            .into_response();
    }
    let skip = (page as usize - 1) * limit;
    let data: Vec<ProfileCandidate> = state
        .feed
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.id != user)
        .skip(skip)
        .take(limit)
        .cloned()
        .collect();
    Json(json!({ "data": data })).into_response()
}

async fn send_request(
    State(state): Shared,
    headers: HeaderMap,
    Path((status, to)): Path<(String, String)>,
) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    if status != "interested" && status != "ignore" {
        return bad_request("Invalid status type");
    }
    state
        .decisions
        .lock()
        .unwrap()
        .push((user, status.clone(), UserId::new(to)));
    Json(json!({ "message": format!("Request {status}") })).into_response()
}

async fn review_request(
    State(state): Shared,
    headers: HeaderMap,
    Path((status, request_id)): Path<(String, String)>,
) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let mut requests = state.requests.lock().unwrap();
    let pending = requests.entry(user.clone()).or_default();
    let Some(pos) = pending.iter().position(|r| r.id == request_id) else {
        return bad_request("Connection request not found");
    };
    let request = pending.remove(pos);
    if status == "accepted" {
        state
            .connections
            .lock()
            .unwrap()
            .entry(user.clone())
            .or_default()
            .push(request.from_user_id);
    }
    state.reviews.lock().unwrap().push((user, status, request_id));
    Json(json!({ "message": "Request reviewed" })).into_response()
}

async fn connections(State(state): Shared, headers: HeaderMap) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let data = state
        .connections
        .lock()
        .unwrap()
        .get(&user)
        .cloned()
        .unwrap_or_default();
    Json(json!({ "data": data })).into_response()
}

async fn requests(State(state): Shared, headers: HeaderMap) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let data = state
        .requests
        .lock()
        .unwrap()
        .get(&user)
        .cloned()
        .unwrap_or_default();
    Json(json!({ "data": data })).into_response()
}

async fn chat_history(
    State(state): Shared,
    headers: HeaderMap,
    Path(target): Path<String>,
) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let delay = *state.history_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let data = state
        .history
        .lock()
        .unwrap()
        .get(&room_id(&user, &UserId::new(target)))
        .cloned()
        .unwrap_or_default();
    Json(json!({ "data": data })).into_response()
}

async fn channel(State(state): Shared, headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    ws.on_upgrade(move |socket| serve_socket(state, user, socket))
}

async fn serve_socket(state: Arc<MockState>, user: UserId, socket: WebSocket) {
    let socket_id = state.seq.fetch_add(1, Ordering::Relaxed);
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(WsMessage::text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };
        let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "mock: bad client frame");
                continue;
            }
        };
        match event {
            ClientEvent::JoinRoom { target_user_id } => {
                let room = room_id(&user, &target_user_id);
                tracing::debug!(%user, %room, "mock: join");
                state.rooms.lock().unwrap().entry(room).or_default().push(RoomMember {
                    user: user.clone(),
                    socket: socket_id,
                    tx: tx.clone(),
                });
            }
            ClientEvent::SendMessage {
                target_user_id,
                text,
            } => {
                let message = Message {
                    id: state.next_id("msg-"),
                    sender_id: user.clone(),
                    text,
                    created_at: Some(chrono::Utc::now()),
                };
                let room = room_id(&user, &target_user_id);
                state
                    .history
                    .lock()
                    .unwrap()
                    .entry(room.clone())
                    .or_default()
                    .push(message.clone());
                let frame = match serde_json::to_string(&ServerEvent::ReceiveMessage(message)) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                if let Some(members) = state.rooms.lock().unwrap().get(&room) {
                    for member in members {
                        tracing::debug!(to = %member.user, %room, "mock: deliver");
                        let _ = member.tx.send(frame.clone());
                    }
                }
            }
        }
    }

    for members in state.rooms.lock().unwrap().values_mut() {
        members.retain(|m| m.socket != socket_id);
    }
    writer.abort();
}
