use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use swipe_common::chat::{ClientEvent, ServerEvent};
use swipe_common::UserId;

use super::controller::{ChannelEffect, ChannelStatus, ConversationController, ConversationEvent};
use super::transport::{ChannelLink, Connector};
use crate::api::Backend;
use crate::error::{ClientError, Result};
use crate::session::SessionEvent;

enum Inbound {
    Event(ConversationEvent),
    Connected { generation: u64, link: ChannelLink },
}

/// Sending half of the link currently owned by the runtime.
struct ActiveLink {
    generation: u64,
    outgoing: mpsc::UnboundedSender<ClientEvent>,
    cancel: CancellationToken,
}

/// Drives a [`ConversationController`] against a backend and a connector.
///
/// Owned by the conversation view. Dropping it closes the channel and
/// cancels the history fetch.
pub struct ConversationRuntime {
    controller: ConversationController,
    backend: Arc<dyn Backend>,
    connector: Arc<dyn Connector>,
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
    cancel: CancellationToken,
    /// Token for the requests of one open conversation.
    scope: Option<(u64, CancellationToken)>,
    link: Option<ActiveLink>,
}

impl ConversationRuntime {
    pub fn new(backend: Arc<dyn Backend>, connector: Arc<dyn Connector>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: ConversationController::new(),
            backend,
            connector,
            tx,
            rx,
            cancel: CancellationToken::new(),
            scope: None,
            link: None,
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn status(&self) -> ChannelStatus {
        self.controller.status()
    }

    pub fn open(&mut self, target: UserId) {
        self.dispatch(ConversationEvent::Open { target });
    }

    pub fn close(&mut self) {
        self.dispatch(ConversationEvent::Close);
    }

    /// Queue `text` for the open conversation. Whitespace-only text is
    /// silently dropped.
    pub fn send(&mut self, text: impl Into<String>) -> Result<()> {
        if !self.controller.can_send() {
            return Err(ClientError::ChannelClosed);
        }
        self.dispatch(ConversationEvent::Send { text: text.into() });
        Ok(())
    }

    pub fn on_session_event(&mut self, event: &SessionEvent) {
        if let SessionEvent::LoggedOut = event {
            self.dispatch(ConversationEvent::Reset);
        }
    }

    pub fn dispatch(&mut self, event: ConversationEvent) {
        let effects = self.controller.handle(event);
        for effect in effects {
            self.run(effect);
        }
    }

    /// Wait for the next completion or channel event and apply it.
    pub async fn next_event(&mut self) {
        if let Some(inbound) = self.rx.recv().await {
            self.apply(inbound);
        }
    }

    /// Apply whatever has already arrived without waiting.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(inbound) = self.rx.try_recv() {
            self.apply(inbound);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Event(event) => self.dispatch(event),
            Inbound::Connected { generation, link } => self.attach(generation, link),
        }
    }

    fn attach(&mut self, generation: u64, link: ChannelLink) {
        if generation != self.controller.generation()
            || self.controller.status() != ChannelStatus::Connecting
        {
            tracing::debug!(generation, "stale channel link closed");
            link.cancel.cancel();
            return;
        }

        let ChannelLink {
            outgoing,
            mut incoming,
            cancel,
        } = link;
        let tx = self.tx.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = incoming.recv() => match event {
                        Some(ServerEvent::ReceiveMessage(message)) => {
                            let _ = tx.send(Inbound::Event(ConversationEvent::Received {
                                generation,
                                message,
                            }));
                        }
                        None => {
                            let _ = tx.send(Inbound::Event(ConversationEvent::ChannelLost {
                                generation,
                                reason: ClientError::Channel("connection closed".into()),
                            }));
                            break;
                        }
                    },
                }
            }
        });

        self.link = Some(ActiveLink {
            generation,
            outgoing,
            cancel,
        });
        self.dispatch(ConversationEvent::ChannelOpened { generation });
    }

    fn run(&mut self, effect: ChannelEffect) {
        match effect {
            ChannelEffect::FetchHistory { generation, target } => {
                let backend = self.backend.clone();
                let tx = self.tx.clone();
                let token = self.scope(generation);
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            tracing::debug!(%target, "history fetch cancelled");
                        }
                        result = backend.chat_history(&target) => {
                            let _ = tx.send(Inbound::Event(ConversationEvent::HistoryLoaded {
                                generation,
                                result,
                            }));
                        }
                    }
                });
            }
            ChannelEffect::Connect { generation, target } => {
                let connector = self.connector.clone();
                let tx = self.tx.clone();
                let token = self.scope(generation);
                let link_token = token.child_token();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            tracing::debug!(%target, "channel connect cancelled");
                        }
                        result = connector.connect(&target, link_token) => {
                            let inbound = match result {
                                Ok(link) => Inbound::Connected { generation, link },
                                Err(reason) => {
                                    Inbound::Event(ConversationEvent::ChannelLost { generation, reason })
                                }
                            };
                            let _ = tx.send(inbound);
                        }
                    }
                });
            }
            ChannelEffect::Emit { generation, event } => match &self.link {
                Some(link) if link.generation == generation => {
                    if link.outgoing.send(event).is_err() {
                        tracing::warn!(generation, "channel link gone; event dropped");
                    }
                }
                _ => tracing::debug!(generation, "no link for event; dropped"),
            },
            ChannelEffect::Disconnect { generation } => {
                if let Some(link) = self.link.take() {
                    if link.generation == generation {
                        link.cancel.cancel();
                    } else {
                        self.link = Some(link);
                    }
                }
                // A teardown moved the controller past `generation`; a lost
                // link did not, and its history fetch may still land.
                if self.controller.generation() != generation {
                    if let Some((g, token)) = self.scope.take() {
                        if g == generation {
                            token.cancel();
                        } else {
                            self.scope = Some((g, token));
                        }
                    }
                }
            }
        }
    }

    fn scope(&mut self, generation: u64) -> CancellationToken {
        match &self.scope {
            Some((g, token)) if *g == generation => token.clone(),
            _ => {
                if let Some((_, old)) = self.scope.take() {
                    old.cancel();
                }
                let token = self.cancel.child_token();
                self.scope = Some((generation, token.clone()));
                token
            }
        }
    }
}

impl Drop for ConversationRuntime {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
