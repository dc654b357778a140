//! Conversation channel state machine.
//!
//! One controller per conversation view. It owns the [`ConversationStore`]
//! and decides what the channel runtime should do next; it never touches
//! the network itself.

use std::collections::VecDeque;

use swipe_common::chat::ClientEvent;
use swipe_common::{Message, UserId};

use super::store::ConversationStore;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Link being established and history in flight.
    Connecting,
    /// Room joined, live messages flowing.
    Joined,
    Closed,
}

#[derive(Debug)]
pub enum ConversationEvent {
    /// Show the conversation with `target`. Any other open channel is torn down.
    Open { target: UserId },
    /// The view went away.
    Close,
    HistoryLoaded {
        generation: u64,
        result: Result<Vec<Message>, ClientError>,
    },
    ChannelOpened { generation: u64 },
    ChannelLost { generation: u64, reason: ClientError },
    Received { generation: u64, message: Message },
    Send { text: String },
    /// Logout.
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEffect {
    FetchHistory { generation: u64, target: UserId },
    Connect { generation: u64, target: UserId },
    Emit { generation: u64, event: ClientEvent },
    Disconnect { generation: u64 },
}

#[derive(Debug)]
pub struct ConversationController {
    target: Option<UserId>,
    status: ChannelStatus,
    /// Bumped on every open and close; events from an older channel are dropped.
    generation: u64,
    store: ConversationStore,
    history_loaded: bool,
    /// Sends issued before the room was joined, flushed in order on join.
    pending: VecDeque<String>,
    last_error: Option<ClientError>,
}

impl Default for ConversationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationController {
    pub fn new() -> Self {
        Self {
            target: None,
            status: ChannelStatus::Closed,
            generation: 0,
            store: ConversationStore::new(),
            history_loaded: false,
            pending: VecDeque::new(),
            last_error: None,
        }
    }

    pub fn handle(&mut self, event: ConversationEvent) -> Vec<ChannelEffect> {
        let mut effects = Vec::new();
        match event {
            ConversationEvent::Open { target } => self.open(target, &mut effects),
            ConversationEvent::Close => {
                self.teardown(&mut effects);
                self.store.clear();
                self.history_loaded = false;
            }
            ConversationEvent::Reset => {
                self.teardown(&mut effects);
                self.store.clear();
                self.history_loaded = false;
                self.target = None;
                self.last_error = None;
            }
            ConversationEvent::HistoryLoaded { generation, result } => {
                if self.is_stale(generation, "history") {
                    return effects;
                }
                match result {
                    Ok(history) => {
                        tracing::debug!(
                            target_user_id = ?self.target.as_ref().map(UserId::as_str),
                            count = history.len(),
                            "history loaded"
                        );
                        self.store.replace_history(history);
                        self.history_loaded = true;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "history fetch failed");
                        self.last_error = Some(e);
                    }
                }
            }
            ConversationEvent::ChannelOpened { generation } => {
                if self.is_stale(generation, "channel open") {
                    return effects;
                }
                self.joined(generation, &mut effects);
            }
            ConversationEvent::ChannelLost { generation, reason } => {
                if self.is_stale(generation, "channel loss") || self.status == ChannelStatus::Closed
                {
                    return effects;
                }
                tracing::warn!(generation, error = %reason, "channel lost");
                self.status = ChannelStatus::Closed;
                self.pending.clear();
                self.last_error = Some(reason);
                effects.push(ChannelEffect::Disconnect { generation });
            }
            ConversationEvent::Received {
                generation,
                message,
            } => {
                if self.is_stale(generation, "message") {
                    return effects;
                }
                if self.status == ChannelStatus::Closed {
                    tracing::debug!(message_id = %message.id, "message after close dropped");
                    return effects;
                }
                self.store.push_live(message);
            }
            ConversationEvent::Send { text } => self.send(text, &mut effects),
        }
        effects
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    pub fn target(&self) -> Option<&UserId> {
        self.target.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn history_loaded(&self) -> bool {
        self.history_loaded
    }

    pub fn pending_sends(&self) -> usize {
        self.pending.len()
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    /// Sends are accepted while connecting (buffered) or joined.
    pub fn can_send(&self) -> bool {
        self.status != ChannelStatus::Closed
    }

    // ── Transitions ─────────────────────────────────────────────────────

    fn open(&mut self, target: UserId, effects: &mut Vec<ChannelEffect>) {
        if self.target.as_ref() == Some(&target) && self.status != ChannelStatus::Closed {
            tracing::debug!(target_user_id = %target, "conversation already open");
            return;
        }
        // A different target never reuses the old channel.
        self.teardown(effects);
        self.store.clear();
        self.history_loaded = false;
        self.last_error = None;

        self.generation += 1;
        self.status = ChannelStatus::Connecting;
        tracing::info!(target_user_id = %target, generation = self.generation, "opening conversation");
        effects.push(ChannelEffect::FetchHistory {
            generation: self.generation,
            target: target.clone(),
        });
        effects.push(ChannelEffect::Connect {
            generation: self.generation,
            target: target.clone(),
        });
        self.target = Some(target);
    }

    fn teardown(&mut self, effects: &mut Vec<ChannelEffect>) {
        if self.status != ChannelStatus::Closed {
            tracing::info!(
                target_user_id = ?self.target.as_ref().map(UserId::as_str),
                generation = self.generation,
                "closing conversation channel"
            );
            effects.push(ChannelEffect::Disconnect {
                generation: self.generation,
            });
        }
        self.generation += 1;
        self.status = ChannelStatus::Closed;
        self.pending.clear();
    }

    fn joined(&mut self, generation: u64, effects: &mut Vec<ChannelEffect>) {
        if self.status != ChannelStatus::Connecting {
            return;
        }
        let Some(target) = self.target.clone() else {
            return;
        };
        self.status = ChannelStatus::Joined;
        tracing::info!(target_user_id = %target, generation, "joined room");
        effects.push(ChannelEffect::Emit {
            generation,
            event: ClientEvent::JoinRoom {
                target_user_id: target.clone(),
            },
        });
        for text in self.pending.drain(..) {
            effects.push(ChannelEffect::Emit {
                generation,
                event: ClientEvent::SendMessage {
                    target_user_id: target.clone(),
                    text,
                },
            });
        }
    }

    fn send(&mut self, text: String, effects: &mut Vec<ChannelEffect>) {
        if text.trim().is_empty() {
            return;
        }
        let Some(target) = self.target.clone() else {
            return;
        };
        match self.status {
            ChannelStatus::Closed => {
                tracing::debug!(target_user_id = %target, "send on closed channel dropped");
            }
            ChannelStatus::Connecting => self.pending.push_back(text),
            ChannelStatus::Joined => effects.push(ChannelEffect::Emit {
                generation: self.generation,
                event: ClientEvent::SendMessage {
                    target_user_id: target,
                    text,
                },
            }),
        }
    }

    fn is_stale(&self, generation: u64, what: &str) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, what, "stale channel event dropped");
            return true;
        }
        false
    }
}
