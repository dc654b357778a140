//! REST client for the backend.
//!
//! Every request goes through one `reqwest::Client` with a shared cookie jar,
//! so the session cookie set by `/login` is sent on every later call and on
//! the WebSocket upgrade.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use swipe_common::account::{LoginRequest, SignupRequest};
use swipe_common::envelope::{ApiMessage, Envelope, MaybeEnveloped};
use swipe_common::profile::{ProfilePatch, UserId, UserProfile};
use swipe_common::request::{ConnectionRequest, ReviewStatus};
use swipe_common::{Decision, Message, ProfileCandidate};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// The calls the feed and conversation engines depend on.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// `GET /feed?page={page}&limit={limit}`
    async fn feed_page(&self, page: u32, limit: usize) -> Result<Vec<ProfileCandidate>>;

    /// `POST /request/send/{interested|ignore}/{userId}`
    async fn send_decision(&self, profile_id: &UserId, decision: Decision) -> Result<()>;

    /// `GET /chat/{targetUserId}`
    async fn chat_history(&self, target: &UserId) -> Result<Vec<Message>>;
}

/// HTTP implementation of [`Backend`] plus the session, profile and
/// connection-request endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, jar, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `Cookie` header value the server set for `url`, if any.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        // Cookies are scoped to the http(s) origin; ws(s) URLs map onto it.
        let mut lookup = url.clone();
        let scheme = match url.scheme() {
            "ws" => "http",
            "wss" => "https",
            other => other,
        }
        .to_string();
        let _ = lookup.set_scheme(&scheme);
        self.jar
            .cookies(&lookup)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    // ── Session / profile collaborator ──────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<UserProfile> {
        req.validate()
            .map_err(|m| ClientError::Rejected(m.to_string()))?;
        let resp = self
            .http
            .post(self.config.endpoint("/login")?)
            .json(req)
            .send()
            .await?;
        let body: MaybeEnveloped<UserProfile> = decode(resp).await?;
        Ok(body.into_inner())
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<UserProfile> {
        req.validate()
            .map_err(|m| ClientError::Rejected(m.to_string()))?;
        let resp = self
            .http
            .post(self.config.endpoint("/signup")?)
            .json(req)
            .send()
            .await?;
        let body: MaybeEnveloped<UserProfile> = decode(resp).await?;
        Ok(body.into_inner())
    }

    pub async fn logout(&self) -> Result<()> {
        let resp = self
            .http
            .post(self.config.endpoint("/logout")?)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        check(resp).await.map(drop)
    }

    pub async fn profile_view(&self) -> Result<UserProfile> {
        let resp = self
            .http
            .get(self.config.endpoint("/profile/view")?)
            .send()
            .await?;
        let body: MaybeEnveloped<UserProfile> = decode(resp).await?;
        Ok(body.into_inner())
    }

    pub async fn profile_edit(&self, patch: &ProfilePatch) -> Result<UserProfile> {
        let resp = self
            .http
            .patch(self.config.endpoint("/profile/edit")?)
            .json(patch)
            .send()
            .await?;
        let body: MaybeEnveloped<UserProfile> = decode(resp).await?;
        Ok(body.into_inner())
    }

    // ── Connection-request collaborator ─────────────────────────────────

    pub async fn connections(&self) -> Result<Vec<ProfileCandidate>> {
        let resp = self
            .http
            .get(self.config.endpoint("/user/connections")?)
            .send()
            .await?;
        let body: Envelope<Vec<ProfileCandidate>> = decode(resp).await?;
        Ok(body.data)
    }

    pub async fn requests(&self) -> Result<Vec<ConnectionRequest>> {
        let resp = self
            .http
            .get(self.config.endpoint("/user/requests")?)
            .send()
            .await?;
        let body: Envelope<Vec<ConnectionRequest>> = decode(resp).await?;
        Ok(body.data)
    }

    pub async fn review_request(&self, status: ReviewStatus, request_id: &str) -> Result<()> {
        let url = self
            .config
            .resource("/request/review", &[status.as_path(), request_id])?;
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        check(resp).await.map(drop)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn feed_page(&self, page: u32, limit: usize) -> Result<Vec<ProfileCandidate>> {
        let resp = self
            .http
            .get(self.config.endpoint("/feed")?)
            .query(&[("page", page.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;
        let body: Envelope<Vec<ProfileCandidate>> = decode(resp).await?;
        Ok(body.data)
    }

    async fn send_decision(&self, profile_id: &UserId, decision: Decision) -> Result<()> {
        let url = self
            .config
            .resource("/request/send", &[decision.as_path(), profile_id.as_str()])?;
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        check(resp).await.map(drop)
    }

    async fn chat_history(&self, target: &UserId) -> Result<Vec<Message>> {
        let url = self.config.resource("/chat", &[target.as_str()])?;
        let resp = self
            .http
            .get(url)
            .send()
            .await?;
        let body: Envelope<Vec<Message>> = decode(resp).await?;
        Ok(body.data)
    }
}

/// Map non-success statuses onto [`ClientError`].
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::AuthRequired);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&text)
        .ok()
        .and_then(|m| m.message)
        .unwrap_or(text);
    if status.is_client_error() && !message.is_empty() {
        return Err(ClientError::Rejected(message));
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
