use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::controller::{FeedController, FeedEffect, FeedEvent, FeedSettings, Notice};
use crate::api::Backend;
use crate::error::ClientError;
use crate::session::SessionEvent;

/// Runs [`FeedEffect`]s on tokio tasks and routes their completions back
/// into the controller.
///
/// The runtime lives as long as the feed view. Dropping it cancels every
/// request it started; completions that were already queued are discarded
/// with it.
///
/// Page fetches of one generation share a child token that is cancelled
/// when the controller starts over, and each fetch waits for the previous
/// fetch task to finish, so at most one page request reaches the backend
/// at a time.
pub struct FeedRuntime {
    controller: FeedController,
    backend: Arc<dyn Backend>,
    tx: mpsc::UnboundedSender<FeedEvent>,
    rx: mpsc::UnboundedReceiver<FeedEvent>,
    cancel: CancellationToken,
    fetch_scope: Option<(u64, CancellationToken)>,
    last_fetch: Option<JoinHandle<()>>,
    pending: usize,
}

impl FeedRuntime {
    pub fn new(backend: Arc<dyn Backend>, settings: FeedSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: FeedController::new(settings),
            backend,
            tx,
            rx,
            cancel: CancellationToken::new(),
            fetch_scope: None,
            last_fetch: None,
            pending: 0,
        }
    }

    pub fn controller(&self) -> &FeedController {
        &self.controller
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.controller.dismiss_notice()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.controller.drain_notices()
    }

    /// Requests started and not yet routed back.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Feed a user or lifecycle event through the controller.
    pub fn dispatch(&mut self, event: FeedEvent) {
        let effects = self.controller.handle(event);
        for effect in effects {
            self.spawn(effect);
        }
    }

    /// Logout empties the feed.
    pub fn on_session_event(&mut self, event: &SessionEvent) {
        if let SessionEvent::LoggedOut = event {
            self.dispatch(FeedEvent::Reset);
        }
    }

    /// Wait for the next completion and apply it. Returns `false` when
    /// nothing is outstanding.
    pub async fn next_completion(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.pending -= 1;
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Apply completions that are already available without waiting.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Run until no request is outstanding, including follow-ups the
    /// completions themselves trigger.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn spawn(&mut self, effect: FeedEffect) {
        match effect {
            FeedEffect::FetchPage {
                generation,
                page,
                limit,
            } => {
                let backend = self.backend.clone();
                let tx = self.tx.clone();
                let token = self.fetch_scope(generation);
                let previous = self.last_fetch.take();
                self.pending += 1;
                self.last_fetch = Some(tokio::spawn(async move {
                    if let Some(previous) = previous {
                        let _ = previous.await;
                    }
                    let result = tokio::select! {
                        _ = token.cancelled() => {
                            tracing::debug!(page, generation, "feed fetch cancelled");
                            Err(ClientError::Cancelled)
                        }
                        result = backend.feed_page(page, limit) => result,
                    };
                    let _ = tx.send(FeedEvent::PageLoaded { generation, page, result });
                }));
            }
            FeedEffect::SubmitDecision {
                profile_id,
                decision,
            } => {
                let backend = self.backend.clone();
                let tx = self.tx.clone();
                let token = self.cancel.child_token();
                self.pending += 1;
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            tracing::debug!(%profile_id, "decision submission cancelled");
                        }
                        result = backend.send_decision(&profile_id, decision) => {
                            let _ = tx.send(FeedEvent::DecisionSettled { profile_id, decision, result });
                        }
                    }
                });
            }
            FeedEffect::CancelFetches { generation } => {
                if matches!(&self.fetch_scope, Some((scoped, _)) if *scoped == generation) {
                    if let Some((_, token)) = self.fetch_scope.take() {
                        tracing::debug!(generation, "cancelling stale feed fetches");
                        token.cancel();
                    }
                }
            }
        }
    }

    /// Token shared by the page fetches of `generation`.
    fn fetch_scope(&mut self, generation: u64) -> CancellationToken {
        match &self.fetch_scope {
            Some((scoped, token)) if *scoped == generation => token.clone(),
            _ => {
                if let Some((_, stale)) = self.fetch_scope.take() {
                    stale.cancel();
                }
                let token = self.cancel.child_token();
                self.fetch_scope = Some((generation, token.clone()));
                token
            }
        }
    }
}

impl Drop for FeedRuntime {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
