//! Study session controller
//!
//! Owns the session cards, the study queue and the presentation state of the
//! current card. The controller is synchronous and clock-driven: callers pass
//! `now` in, and timers are deadlines checked by [`StudySession::tick`].
//! Network work is described by [`AnswerTicket`]s that the caller executes,
//! feeding the outcome back through [`StudySession::apply_outcome`].

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::gesture::GestureTracker;
use super::queue::{CooldownGate, StudyQueue, build_queue};
use super::recurrence::RecurrenceMonitor;
use crate::api::{AnswerEcho, ApiError};
use crate::config::StudyConfig;
use crate::domain::{Cooldowns, DeckXp, Presentation, SessionCard, Tier, XpUpdate};
use crate::notice::{NoticeLevel, NoticeQueue};

/// Answer results stay up for this long
const ANSWER_NOTICE_TTL: Duration = Duration::from_millis(2000);

/// Notices about re-admitted cards stay up for this long
const READMIT_NOTICE_TTL: Duration = Duration::from_millis(2000);

/// Which study view is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyMode {
    /// One deck, every card once
    SingleDeck { deck_id: String },
    /// Every deck, with tag filters and recurrence
    CrossDeck,
}

impl StudyMode {
    pub fn is_cross_deck(&self) -> bool {
        matches!(self, Self::CrossDeck)
    }
}

/// Timing and gesture settings of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub exit_delay: Duration,
    pub complete_delay: Duration,
    pub recurrence_interval: Duration,
    pub cooldowns: Cooldowns,
    pub swipe_threshold: i32,
}

impl SessionTiming {
    pub fn from_config(config: &StudyConfig, mode: &StudyMode) -> Self {
        let complete_delay_ms = match mode {
            StudyMode::SingleDeck { .. } => config.deck_complete_delay_ms,
            StudyMode::CrossDeck => config.all_complete_delay_ms,
        };
        Self {
            exit_delay: Duration::from_millis(config.exit_delay_ms),
            complete_delay: Duration::from_millis(complete_delay_ms),
            recurrence_interval: Duration::from_millis(config.recurrence_interval_ms),
            cooldowns: config.cooldowns(),
            swipe_threshold: config.swipe_threshold,
        }
    }

    pub fn for_mode(mode: &StudyMode) -> Self {
        Self::from_config(&StudyConfig::default(), mode)
    }
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing to study right now
    Idle,
    /// The current card is awaiting reveal or an answer
    Studying,
    /// The current card was answered and leaves the queue at `at`
    Advancing { card_id: String, at: Instant },
    /// The queue ran dry; the view closes at `exit_at`
    Complete { exit_at: Instant },
    /// The view should close
    Finished,
}

/// Remote work requested by an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerTicket {
    pub card_id: String,
    pub deck_id: String,
    pub tier: Tier,
    /// Experience to add to the deck; zero means no request
    pub reward: u32,
}

/// Result of executing an [`AnswerTicket`]
#[derive(Debug)]
pub struct AnswerOutcome {
    pub card_id: String,
    pub deck_id: String,
    pub progress: Result<AnswerEcho, ApiError>,
    pub xp: Option<Result<XpUpdate, ApiError>>,
}

/// Something the view may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new card became current
    Advanced { card_id: String },
    /// The queue ran dry
    Completed { session_xp: u32 },
    /// The view should close
    Finished,
    /// Cards came back after their cooldown
    Readmitted(Vec<String>),
}

/// Study session state machine
#[derive(Debug)]
pub struct StudySession {
    mode: StudyMode,
    timing: SessionTiming,
    cards: Vec<SessionCard>,
    index: HashMap<String, usize>,
    queue: StudyQueue,
    current: Option<String>,
    phase: SessionPhase,
    tags: BTreeSet<String>,
    gesture: GestureTracker,
    recurrence: Option<RecurrenceMonitor>,
    experience: HashMap<String, DeckXp>,
    session_xp: u32,
    completed: usize,
    notices: NoticeQueue,
}

impl StudySession {
    /// Start a session over `cards` in their fetched order
    pub fn new(
        mode: StudyMode,
        cards: Vec<SessionCard>,
        experience: HashMap<String, DeckXp>,
        timing: SessionTiming,
        notices: NoticeQueue,
        now: Instant,
    ) -> Self {
        debug!(?mode, cards = cards.len(), "StudySession::new: called");
        let index = cards
            .iter()
            .enumerate()
            .map(|(i, card)| (card.id().to_string(), i))
            .collect();
        let recurrence = mode
            .is_cross_deck()
            .then(|| RecurrenceMonitor::new(timing.cooldowns, timing.recurrence_interval, now));

        let mut session = Self {
            mode,
            timing,
            cards,
            index,
            queue: StudyQueue::new(),
            current: None,
            phase: SessionPhase::Idle,
            tags: BTreeSet::new(),
            gesture: GestureTracker::new(timing.swipe_threshold),
            recurrence,
            experience,
            session_xp: 0,
            completed: 0,
            notices,
        };
        session.rebuild_queue(now);
        session
    }

    // === Accessors ===

    pub fn mode(&self) -> &StudyMode {
        &self.mode
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn queue(&self) -> &StudyQueue {
        &self.queue
    }

    pub fn cards(&self) -> &[SessionCard] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&SessionCard> {
        self.index.get(id).map(|&i| &self.cards[i])
    }

    fn card_mut(&mut self, id: &str) -> Option<&mut SessionCard> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.cards[i]),
            None => None,
        }
    }

    /// The card on screen, if any
    pub fn current_card(&self) -> Option<&SessionCard> {
        self.current.as_deref().and_then(|id| self.card(id))
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Share of the session done, in percent
    pub fn progress_percent(&self) -> u16 {
        let remaining = self.queue.len();
        if remaining == 0 {
            return 100;
        }
        ((self.completed * 100) / (self.completed + remaining)) as u16
    }

    /// Experience earned by answers in this session
    pub fn session_xp(&self) -> u32 {
        self.session_xp
    }

    /// Local mirror of a deck's experience state
    pub fn experience(&self, deck_id: &str) -> Option<DeckXp> {
        self.experience.get(deck_id).copied()
    }

    pub fn tag_filter(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Every tag carried by a session card, sorted
    pub fn all_tags(&self) -> Vec<String> {
        let tags: BTreeSet<&String> = self.cards.iter().flat_map(|c| c.card.tags.iter()).collect();
        tags.into_iter().cloned().collect()
    }

    /// Live drag displacement for the card on screen
    pub fn drag_offset(&self) -> i32 {
        self.gesture.offset()
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, SessionPhase::Complete { .. } | SessionPhase::Finished)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    fn current_presentation(&self) -> Option<Presentation> {
        self.current_card().map(|c| c.presentation)
    }

    /// True while the current card may take an answer
    pub fn accepts_answer(&self) -> bool {
        self.phase == SessionPhase::Studying && self.current_presentation() == Some(Presentation::Revealed)
    }

    // === Card interaction ===

    /// Toggle the current card between front and answer
    ///
    /// Answered cards cannot be flipped.
    pub fn flip(&mut self) -> bool {
        if self.phase != SessionPhase::Studying {
            return false;
        }
        let Some(id) = self.current.clone() else {
            return false;
        };
        let flipped = match self.card_mut(&id) {
            Some(card) => match card.presentation {
                Presentation::Unrevealed => {
                    card.presentation = Presentation::Revealed;
                    true
                }
                Presentation::Revealed => {
                    card.presentation = Presentation::Unrevealed;
                    true
                }
                Presentation::Answered { .. } => false,
            },
            None => false,
        };
        if flipped {
            self.gesture.cancel();
        }
        debug!(%id, flipped, "StudySession::flip: called");
        flipped
    }

    /// Answer the current card
    ///
    /// Accepted once per presentation and only after the answer is revealed.
    /// Returns the remote work the caller must carry out.
    pub fn answer(&mut self, tier: Tier, now: Instant) -> Option<AnswerTicket> {
        if !self.accepts_answer() {
            debug!(%tier, "StudySession::answer: not accepting answers");
            return None;
        }
        let id = self.current.clone()?;
        self.gesture.cancel();

        let card = self.card_mut(&id)?;
        card.record_answer(tier, now);
        let deck_id = card.card.deck_id.clone();

        let reward = tier.reward();
        self.session_xp += reward;

        if let Some(monitor) = self.recurrence.as_mut() {
            monitor.schedule(id.clone(), tier, now);
        }

        let (title, body) = match tier {
            Tier::New => ("WRONG!", "Card stays at RED".to_string()),
            Tier::Learning => ("ALMOST!", format!("Card at YELLOW +{} XP", reward)),
            Tier::Mastered => ("CORRECT!", format!("Card leveled up! +{} XP", reward)),
        };
        let level = if tier == Tier::New {
            NoticeLevel::Info
        } else {
            NoticeLevel::Success
        };
        self.notices.push_at(level, title, body, Some(ANSWER_NOTICE_TTL), now);

        self.phase = SessionPhase::Advancing {
            card_id: id.clone(),
            at: now + self.timing.exit_delay,
        };
        info!(card_id = %id, %tier, reward, "StudySession::answer: recorded");

        Some(AnswerTicket {
            card_id: id,
            deck_id,
            tier,
            reward,
        })
    }

    /// Pointer contact began at column `x` (in drag units)
    pub fn pointer_down(&mut self, x: i32) -> bool {
        if !self.accepts_answer() {
            return false;
        }
        self.gesture.begin(x);
        true
    }

    /// Pointer moved; returns the live offset
    pub fn pointer_drag(&mut self, x: i32) -> i32 {
        if !self.accepts_answer() {
            return 0;
        }
        self.gesture.drag_to(x)
    }

    /// Pointer released; a long enough swipe answers the card
    pub fn pointer_up(&mut self, now: Instant) -> Option<AnswerTicket> {
        if !self.accepts_answer() {
            self.gesture.cancel();
            return None;
        }
        let swipe = self.gesture.release()?;
        self.answer(swipe.tier(), now)
    }

    /// Leave the session immediately
    pub fn finish(&mut self) {
        debug!("StudySession::finish: called");
        self.gesture.cancel();
        self.phase = SessionPhase::Finished;
    }

    // === Remote results ===

    /// Apply the result of an answer's remote work
    ///
    /// Progress failures raise a notice but keep the optimistic local
    /// state; experience failures are only logged.
    pub fn apply_outcome(&mut self, outcome: AnswerOutcome, now: Instant) {
        debug!(card_id = %outcome.card_id, "StudySession::apply_outcome: called");
        match outcome.progress {
            Ok(echo) => {
                if !self.mode.is_cross_deck()
                    && let Some(card) = self.card_mut(&outcome.card_id)
                {
                    card.tier = echo.status;
                    card.streak = echo.correct_streak;
                }
            }
            Err(e) => {
                warn!(card_id = %outcome.card_id, error = %e, "StudySession::apply_outcome: progress not saved");
                self.notices
                    .push_at(NoticeLevel::Warning, "Error", "Failed to save progress", None, now);
            }
        }

        match outcome.xp {
            Some(Ok(update)) => self.apply_xp(&outcome.deck_id, update, now),
            Some(Err(e)) => {
                warn!(deck_id = %outcome.deck_id, error = %e, "StudySession::apply_outcome: xp not updated");
            }
            None => {}
        }
    }

    fn apply_xp(&mut self, deck_id: &str, update: XpUpdate, now: Instant) {
        debug!(%deck_id, ?update, "StudySession::apply_xp: called");
        self.experience.insert(deck_id.to_string(), update.experience());
        if update.leveled_up {
            let title = self.card_deck_title(deck_id).unwrap_or_else(|| "Deck".to_string());
            self.notices.push_at(
                NoticeLevel::Success,
                "LEVEL UP!",
                format!("{} reached Level {}!", title, update.level),
                None,
                now,
            );
        }
    }

    fn card_deck_title(&self, deck_id: &str) -> Option<String> {
        self.cards
            .iter()
            .find(|c| c.card.deck_id == deck_id)
            .map(|c| c.deck_title.clone())
    }

    // === Filters ===

    /// Replace the tag filter and rebuild the queue (cross-deck only)
    pub fn set_tag_filter(&mut self, tags: BTreeSet<String>, now: Instant) -> bool {
        if !self.mode.is_cross_deck() || tags == self.tags {
            return false;
        }
        debug!(?tags, "StudySession::set_tag_filter: called");
        self.tags = tags;
        self.rebuild_queue(now);
        true
    }

    /// Add or remove one tag from the filter
    pub fn toggle_tag(&mut self, tag: &str, now: Instant) -> bool {
        let mut tags = self.tags.clone();
        if !tags.remove(tag) {
            tags.insert(tag.to_string());
        }
        self.set_tag_filter(tags, now)
    }

    pub fn clear_tags(&mut self, now: Instant) -> bool {
        self.set_tag_filter(BTreeSet::new(), now)
    }

    fn rebuild_queue(&mut self, now: Instant) {
        let gate = self.recurrence.as_ref().map(|_| CooldownGate {
            now,
            cooldowns: self.timing.cooldowns,
        });
        self.queue = build_queue(&self.cards, &self.tags, gate);

        match self.phase {
            SessionPhase::Idle | SessionPhase::Studying => {
                let head = self.queue.head().map(str::to_string);
                if head != self.current {
                    self.reset_current();
                    self.current = head;
                }
                self.phase = if self.current.is_some() {
                    SessionPhase::Studying
                } else {
                    SessionPhase::Idle
                };
            }
            // The answered card leaves on advance; the new head follows.
            SessionPhase::Advancing { .. } => {}
            SessionPhase::Complete { .. } | SessionPhase::Finished => {}
        }
        debug!(len = self.queue.len(), current = ?self.current, "StudySession::rebuild_queue: done");
    }

    fn reset_current(&mut self) {
        self.gesture.cancel();
        if let Some(id) = self.current.clone()
            && let Some(card) = self.card_mut(&id)
            && card.presentation == Presentation::Revealed
        {
            card.presentation = Presentation::Unrevealed;
        }
    }

    // === Timers ===

    /// Advance timers to `now`
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match self.phase.clone() {
            SessionPhase::Advancing { card_id, at } if now >= at => {
                events.push(self.advance(&card_id, now));
            }
            SessionPhase::Complete { exit_at } if now >= exit_at => {
                info!("StudySession::tick: session finished");
                self.phase = SessionPhase::Finished;
                events.push(SessionEvent::Finished);
            }
            _ => {}
        }

        if self.recurrence.as_ref().is_some_and(|m| m.poll_due(now)) {
            let readmitted = self.poll_recurrence(now);
            if !readmitted.is_empty() {
                events.push(SessionEvent::Readmitted(readmitted));
            }
        }

        self.notices.expire(now);
        events
    }

    fn advance(&mut self, answered_id: &str, now: Instant) -> SessionEvent {
        debug!(%answered_id, "StudySession::advance: called");
        self.queue.remove(answered_id);
        self.completed += 1;
        if let Some(card) = self.card_mut(answered_id) {
            card.presentation = Presentation::Unrevealed;
        }

        match self.queue.head().map(str::to_string) {
            Some(next) => {
                if let Some(card) = self.card_mut(&next) {
                    card.presentation = Presentation::Unrevealed;
                }
                self.current = Some(next.clone());
                self.phase = SessionPhase::Studying;
                SessionEvent::Advanced { card_id: next }
            }
            None => {
                self.current = None;
                self.phase = SessionPhase::Complete {
                    exit_at: now + self.timing.complete_delay,
                };
                info!(session_xp = self.session_xp, "StudySession::advance: session complete");
                self.notices.push_at(
                    NoticeLevel::Success,
                    "SESSION COMPLETE!",
                    format!("You earned {} XP this session!", self.session_xp),
                    Some(self.timing.complete_delay.max(Duration::from_millis(3000))),
                    now,
                );
                SessionEvent::Completed {
                    session_xp: self.session_xp,
                }
            }
        }
    }

    /// Re-admit cards whose cooldown has run out (cross-deck only)
    ///
    /// A card is appended only when it is not already queued, its latest
    /// answer is the one that was scheduled, and it matches the tag filter.
    pub fn poll_recurrence(&mut self, now: Instant) -> Vec<String> {
        let complete = self.is_complete();
        let Some(monitor) = self.recurrence.as_mut() else {
            return Vec::new();
        };
        let due_cards = monitor.poll(now);
        if complete {
            return Vec::new();
        }

        let mut readmitted = Vec::new();
        for due in due_cards {
            let Some(card) = self.index.get(&due.card_id).map(|&i| &self.cards[i]) else {
                continue;
            };
            if card.last_answered_at != Some(due.answered_at) || !card.matches_tags(&self.tags) {
                continue;
            }
            if self.queue.push_back(due.card_id.clone()) {
                let preview: String = card.card.front.chars().take(30).collect();
                self.notices.push_at(
                    NoticeLevel::Info,
                    "Card Ready!",
                    format!("\"{}...\" is back", preview),
                    Some(READMIT_NOTICE_TTL),
                    now,
                );
                readmitted.push(due.card_id);
            }
        }

        if !readmitted.is_empty() && self.phase == SessionPhase::Idle {
            self.current = self.queue.head().map(str::to_string);
            self.phase = SessionPhase::Studying;
        }
        debug!(?readmitted, "StudySession::poll_recurrence: done");
        readmitted
    }
}
