//! Session context, route gate and logout broadcast.
//!
//! `Session` is the only writer of the current-user slot. Everything else
//! holds a [`SessionContext`] and reads.

use tokio::sync::{broadcast, watch};

use swipe_common::account::{LoginRequest, SignupRequest};
use swipe_common::profile::{ProfilePatch, UserId, UserProfile};

use crate::api::ApiClient;
use crate::error::{ClientError, ErrorKind, Result};

/// Views of the client. Only the first three are reachable without a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Feed,
    Profile,
    Connections,
    Requests,
    Chat(UserId),
}

impl Route {
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Landing | Route::Login | Route::Signup)
    }
}

/// Where to send the user after `error` happened on `current`, if anywhere.
pub fn redirect_for(error: &ClientError, current: &Route) -> Option<Route> {
    match error.kind() {
        ErrorKind::AuthRequired if !current.is_public() => Some(Route::Login),
        _ => None,
    }
}

/// Broadcast to every store owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn(UserProfile),
    LoggedOut,
}

/// Read handle on the current user.
#[derive(Clone)]
pub struct SessionContext {
    user: watch::Receiver<Option<UserProfile>>,
}

impl SessionContext {
    pub fn current(&self) -> Option<UserProfile> {
        self.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.borrow().as_ref().map(|u| u.id.clone())
    }

    /// Fails with `AuthRequired` when nobody is signed in.
    pub fn require_user(&self) -> Result<UserProfile> {
        self.current().ok_or(ClientError::AuthRequired)
    }

    /// Resolves on the next login/logout.
    pub async fn changed(&mut self) -> bool {
        self.user.changed().await.is_ok()
    }
}

/// Owner of the session slot, backed by the session/profile endpoints.
pub struct Session {
    api: ApiClient,
    user: watch::Sender<Option<UserProfile>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        let (user, _) = watch::channel(None);
        let (events, _) = broadcast::channel(16);
        Self { api, user, events }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            user: self.user.subscribe(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let req = LoginRequest {
            email_id: email.to_string(),
            password: password.to_string(),
        };
        let user = self.api.login(&req).await?;
        tracing::info!(user_id = %user.id, "logged in");
        self.set_user(user.clone());
        Ok(user)
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<UserProfile> {
        let user = self.api.signup(req).await?;
        tracing::info!(user_id = %user.id, "signed up");
        self.set_user(user.clone());
        Ok(user)
    }

    /// Fetch the profile unless a user is already present.
    pub async fn load_profile(&self) -> Result<UserProfile> {
        if let Some(user) = self.user.borrow().clone() {
            return Ok(user);
        }
        let user = self.api.profile_view().await?;
        self.set_user(user.clone());
        Ok(user)
    }

    pub async fn edit_profile(&self, patch: &ProfilePatch) -> Result<UserProfile> {
        let user = self.api.profile_edit(patch).await?;
        self.user.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Clears local state even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "logout request failed; clearing local session anyway");
        }
        self.user.send_replace(None);
        let _ = self.events.send(SessionEvent::LoggedOut);
        result
    }

    fn set_user(&self, user: UserProfile) {
        self.user.send_replace(Some(user.clone()));
        let _ = self.events.send(SessionEvent::LoggedIn(user));
    }
}
