//! Feed state machine.
//!
//! `FeedController::handle` is synchronous: it mutates local state and
//! returns the I/O to perform as [`FeedEffect`]s. Completions come back in
//! as [`FeedEvent`]s. Nothing here awaits, so the card can keep moving while
//! a page fetch or a decision submission is outstanding.

use std::collections::{HashSet, VecDeque};

use swipe_common::{Decision, ProfileCandidate, UserId};

use super::cursor::PaginationCursor;
use super::gesture::{CardTransform, Gesture};
use super::store::FeedStore;
use crate::config::{ClientConfig, DEFAULT_DECISION_THRESHOLD, DEFAULT_PAGE_SIZE};
use crate::error::ClientError;

/// Message shown when a decision could not be delivered.
pub const DECISION_FAILED_TEXT: &str = "Failed to send request. Please try again.";

#[derive(Debug)]
pub enum FeedEvent {
    /// The feed view appeared.
    Mount,
    PointerDown { x: f64 },
    PointerMove { x: f64 },
    PointerUp,
    PointerLeave,
    /// Like / pass buttons.
    Choose(Decision),
    PageLoaded {
        generation: u64,
        page: u32,
        result: Result<Vec<ProfileCandidate>, ClientError>,
    },
    DecisionSettled {
        profile_id: UserId,
        decision: Decision,
        result: Result<(), ClientError>,
    },
    /// Start over from page 1.
    Refresh,
    /// Drop everything (logout).
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEffect {
    FetchPage {
        generation: u64,
        page: u32,
        limit: usize,
    },
    SubmitDecision {
        profile_id: UserId,
        decision: Decision,
    },
    /// Abandon the page fetch still running for an old generation.
    CancelFetches { generation: u64 },
}

/// What the feed view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing fetched yet.
    Loading,
    /// A card is on screen.
    Active { index: usize },
    /// Past the loaded items, more may come. `fetching` tells a request in
    /// flight apart from one about to start.
    AwaitingMore { fetching: bool },
    /// Past the loaded items and the server has no more.
    Exhausted,
}

/// Dismissible user-facing notices.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    DecisionFailed { profile_id: UserId, message: String },
    AuthRequired,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub page_size: usize,
    pub decision_threshold: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }
}

impl From<&ClientConfig> for FeedSettings {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            page_size: cfg.page_size.max(1),
            decision_threshold: cfg.decision_threshold,
        }
    }
}

/// Single writer of the feed store.
#[derive(Debug)]
pub struct FeedController {
    settings: FeedSettings,
    store: FeedStore,
    cursor: PaginationCursor,
    current_index: usize,
    gesture: Gesture,
    /// Bumped on refresh/reset; completions tagged with an older value are stale.
    generation: u64,
    submitted: HashSet<UserId>,
    notices: VecDeque<Notice>,
}

impl FeedController {
    pub fn new(mut settings: FeedSettings) -> Self {
        // A zero page size would never mark the cursor exhausted.
        settings.page_size = settings.page_size.max(1);
        Self {
            settings,
            store: FeedStore::new(),
            cursor: PaginationCursor::new(),
            current_index: 0,
            gesture: Gesture::Idle,
            generation: 0,
            submitted: HashSet::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn handle(&mut self, event: FeedEvent) -> Vec<FeedEffect> {
        let mut effects = Vec::new();
        match event {
            FeedEvent::Mount => self.load_first_page(&mut effects),
            FeedEvent::PointerDown { x } => {
                if self.current().is_some() {
                    self.gesture.press(x);
                }
            }
            FeedEvent::PointerMove { x } => self.gesture.motion(x),
            FeedEvent::PointerUp | FeedEvent::PointerLeave => {
                if let Some(decision) = self.gesture.release(self.settings.decision_threshold) {
                    self.decide(decision, &mut effects);
                }
            }
            FeedEvent::Choose(decision) => {
                self.gesture.reset();
                self.decide(decision, &mut effects);
            }
            FeedEvent::PageLoaded {
                generation,
                page,
                result,
            } => self.page_loaded(generation, page, result, &mut effects),
            FeedEvent::DecisionSettled {
                profile_id,
                decision,
                result,
            } => self.decision_settled(profile_id, decision, result),
            FeedEvent::Refresh => {
                self.start_over(&mut effects);
                self.load_first_page(&mut effects);
            }
            FeedEvent::Reset => {
                self.start_over(&mut effects);
                self.submitted.clear();
                self.notices.clear();
            }
        }
        effects
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn status(&self) -> FeedStatus {
        if !self.store.is_loaded() {
            FeedStatus::Loading
        } else if self.current_index < self.store.len() {
            FeedStatus::Active {
                index: self.current_index,
            }
        } else if !self.cursor.is_exhausted() {
            FeedStatus::AwaitingMore {
                fetching: self.cursor.is_fetching(),
            }
        } else {
            FeedStatus::Exhausted
        }
    }

    /// Candidate on the top card.
    pub fn current(&self) -> Option<&ProfileCandidate> {
        self.store.get(self.current_index)
    }

    /// Candidate peeking out behind the top card.
    pub fn peek_next(&self) -> Option<&ProfileCandidate> {
        self.store.get(self.current_index + 1)
    }

    /// `(position, total)` with a 1-based position, for "3 / 10".
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.store.len())
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn card_transform(&self) -> CardTransform {
        self.gesture.transform()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Dismiss the oldest notice.
    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // ── Transitions ─────────────────────────────────────────────────────

    fn load_first_page(&mut self, effects: &mut Vec<FeedEffect>) {
        if self.store.is_loaded() {
            tracing::debug!("feed already loaded, skipping first-page fetch");
            return;
        }
        if let Some(page) = self.cursor.request(1) {
            effects.push(self.fetch(page));
        }
    }

    fn fetch(&self, page: u32) -> FeedEffect {
        tracing::debug!(page, generation = self.generation, "requesting feed page");
        FeedEffect::FetchPage {
            generation: self.generation,
            page,
            limit: self.settings.page_size,
        }
    }

    /// Prefetch once at most one candidate remains after the current one.
    fn lookahead(&mut self, effects: &mut Vec<FeedEffect>) {
        if !self.store.is_loaded() {
            return;
        }
        if self.current_index + 2 < self.store.len() {
            return;
        }
        if let Some(page) = self.cursor.request_next() {
            effects.push(self.fetch(page));
        }
    }

    fn decide(&mut self, decision: Decision, effects: &mut Vec<FeedEffect>) {
        let Some(profile) = self.current() else {
            tracing::debug!(?decision, "decision with no card on screen ignored");
            return;
        };
        let profile_id = profile.id.clone();
        if self.submitted.insert(profile_id.clone()) {
            effects.push(FeedEffect::SubmitDecision {
                profile_id: profile_id.clone(),
                decision,
            });
        } else {
            tracing::debug!(%profile_id, "decision already submitted this session");
        }
        // Advance without waiting for the submission to settle.
        self.current_index += 1;
        self.lookahead(effects);
    }

    fn page_loaded(
        &mut self,
        generation: u64,
        page: u32,
        result: Result<Vec<ProfileCandidate>, ClientError>,
        effects: &mut Vec<FeedEffect>,
    ) {
        if generation != self.generation {
            tracing::debug!(page, generation, current = self.generation, "stale page dropped");
            return;
        }
        match result {
            Ok(items) => {
                let received = items.len();
                tracing::debug!(page, received, "feed page loaded");
                if self.store.is_loaded() {
                    self.store.append(items);
                } else {
                    self.store.replace(items);
                }
                self.cursor.complete(received, self.settings.page_size);
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "feed fetch failed; treating as end of feed");
                if e.is_auth_required() {
                    self.notices.push_back(Notice::AuthRequired);
                }
                if !self.store.is_loaded() {
                    self.store.replace(Vec::new());
                }
                self.cursor.fail();
            }
        }
        self.lookahead(effects);
    }

    fn decision_settled(
        &mut self,
        profile_id: UserId,
        decision: Decision,
        result: Result<(), ClientError>,
    ) {
        match result {
            Ok(()) => tracing::debug!(%profile_id, %decision, "decision delivered"),
            Err(e) => {
                tracing::warn!(%profile_id, %decision, error = %e, "decision submission failed");
                if e.is_auth_required() {
                    self.notices.push_back(Notice::AuthRequired);
                }
                self.notices.push_back(Notice::DecisionFailed {
                    profile_id,
                    message: DECISION_FAILED_TEXT.to_string(),
                });
            }
        }
    }

    fn start_over(&mut self, effects: &mut Vec<FeedEffect>) {
        if self.cursor.is_fetching() {
            effects.push(FeedEffect::CancelFetches {
                generation: self.generation,
            });
        }
        self.generation += 1;
        self.store.clear();
        self.cursor = PaginationCursor::new();
        self.current_index = 0;
        self.gesture.reset();
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(FeedSettings::default())
    }
}
