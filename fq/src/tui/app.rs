//! Study view input handling
//!
//! The App owns the [`StudySession`] plus the overlay state and maps key and
//! mouse events onto session operations. It does not render or talk to the
//! network; answers come back as [`Action::Submit`] for the runner to send.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::domain::Tier;
use crate::study::{AnswerTicket, SessionEvent, StudySession, Swipe};

/// What the runner should do after an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(AnswerTicket),
    Quit,
}

impl From<Option<AnswerTicket>> for Action {
    fn from(ticket: Option<AnswerTicket>) -> Self {
        ticket.map_or(Action::None, Action::Submit)
    }
}

/// Overlay drawn over the card
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Help,
    /// Tag filter picker with the highlighted row
    Tags { cursor: usize },
}

#[derive(Debug)]
pub struct App {
    session: StudySession,
    overlay: Overlay,
    /// Drag units per terminal column
    cell_width: i32,
    title: String,
}

impl App {
    pub fn new(session: StudySession, title: impl Into<String>, cell_width: i32) -> Self {
        debug!(cell_width, "App::new: called");
        Self {
            session,
            overlay: Overlay::None,
            cell_width: cell_width.max(1),
            title: title.into(),
        }
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StudySession {
        &mut self.session
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn should_quit(&self) -> bool {
        self.session.is_finished()
    }

    /// Advance session timers
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.session.tick(now)
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        debug!(?key, overlay = ?self.overlay, "App::handle_key: called");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.session.finish();
            return Action::Quit;
        }

        match self.overlay {
            Overlay::Help => {
                self.overlay = Overlay::None;
                Action::None
            }
            Overlay::Tags { cursor } => self.handle_tags_key(key, cursor, now),
            Overlay::None => self.handle_study_key(key, now),
        }
    }

    fn handle_study_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.session.finish();
                Action::Quit
            }
            KeyCode::Char('?') => {
                self.overlay = Overlay::Help;
                Action::None
            }
            KeyCode::Char('t') if self.session.mode().is_cross_deck() => {
                self.overlay = Overlay::Tags { cursor: 0 };
                Action::None
            }
            KeyCode::Char('c') => {
                self.session.clear_tags(now);
                Action::None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.session.flip();
                Action::None
            }
            KeyCode::Char('1') => self.session.answer(Tier::New, now).into(),
            KeyCode::Char('2') => self.session.answer(Tier::Learning, now).into(),
            KeyCode::Char('3') => self.session.answer(Tier::Mastered, now).into(),
            KeyCode::Left | KeyCode::Char('h') => self.session.answer(Swipe::Left.tier(), now).into(),
            KeyCode::Right | KeyCode::Char('l') => self.session.answer(Swipe::Right.tier(), now).into(),
            _ => Action::None,
        }
    }

    fn handle_tags_key(&mut self, key: KeyEvent, cursor: usize, now: Instant) -> Action {
        let tags = self.session.all_tags();
        match key.code {
            KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('q') => {
                self.overlay = Overlay::None;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.overlay = Overlay::Tags {
                    cursor: cursor.saturating_sub(1),
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = tags.len().saturating_sub(1);
                self.overlay = Overlay::Tags {
                    cursor: (cursor + 1).min(last),
                };
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(tag) = tags.get(cursor) {
                    self.session.toggle_tag(tag, now);
                }
            }
            KeyCode::Char('c') => {
                self.session.clear_tags(now);
            }
            _ => {}
        }
        Action::None
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Action {
        if self.overlay != Overlay::None {
            return Action::None;
        }
        let x = i32::from(mouse.column) * self.cell_width;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.session.pointer_down(x);
                Action::None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.session.pointer_drag(x);
                Action::None
            }
            MouseEventKind::Up(MouseButton::Left) => self.session.pointer_up(now).into(),
            _ => Action::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crossterm::event::{KeyEventKind, KeyEventState};

    use crate::domain::{Card, Classification, SessionCard};
    use crate::notice::NoticeQueue;
    use crate::study::{SessionTiming, StudyMode};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row: 10,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn session_card(id: &str, tags: &[&str]) -> SessionCard {
        let card = Card {
            id: id.to_string(),
            deck_id: "d1".to_string(),
            front: format!("front {}", id),
            back: format!("back {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        SessionCard::new(card, "Deck", Classification::default())
    }

    fn app(mode: StudyMode, now: Instant) -> App {
        let timing = SessionTiming::for_mode(&mode);
        let session = StudySession::new(
            mode,
            vec![session_card("a", &["x"]), session_card("b", &["y"])],
            HashMap::new(),
            timing,
            NoticeQueue::default(),
            now,
        );
        App::new(session, "Study", 8)
    }

    #[test]
    fn test_number_keys_answer_after_flip() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);

        assert_eq!(app.handle_key(key(KeyCode::Char('2')), now), Action::None);
        app.handle_key(key(KeyCode::Char(' ')), now);
        match app.handle_key(key(KeyCode::Char('2')), now) {
            Action::Submit(ticket) => {
                assert_eq!(ticket.card_id, "a");
                assert_eq!(ticket.tier, Tier::Learning);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_arrow_keys_swipe() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);

        app.handle_key(key(KeyCode::Enter), now);
        match app.handle_key(key(KeyCode::Right), now) {
            Action::Submit(ticket) => assert_eq!(ticket.tier, Tier::Mastered),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_mouse_drag_scales_columns() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);
        app.handle_key(key(KeyCode::Char(' ')), now);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 20), now);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 28), now);
        assert_eq!(app.session().drag_offset(), 64);

        // 13 columns * 8 = 104 units to the left
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 7), now);
        match app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 7), now) {
            Action::Submit(ticket) => assert_eq!(ticket.tier, Tier::New),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_tag_overlay_toggles_filter() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);

        app.handle_key(key(KeyCode::Char('t')), now);
        assert_eq!(app.overlay(), &Overlay::Tags { cursor: 0 });
        app.handle_key(key(KeyCode::Down), now);
        app.handle_key(key(KeyCode::Down), now);
        assert_eq!(app.overlay(), &Overlay::Tags { cursor: 1 });

        app.handle_key(key(KeyCode::Char(' ')), now);
        assert_eq!(app.session().remaining(), 1);
        assert_eq!(app.session().current_card().unwrap().id(), "b");

        app.handle_key(key(KeyCode::Esc), now);
        assert_eq!(app.overlay(), &Overlay::None);
        app.handle_key(key(KeyCode::Char('c')), now);
        assert_eq!(app.session().remaining(), 2);
    }

    #[test]
    fn test_tag_overlay_unavailable_in_single_deck() {
        let now = Instant::now();
        let mut app = app(
            StudyMode::SingleDeck {
                deck_id: "d1".to_string(),
            },
            now,
        );
        app.handle_key(key(KeyCode::Char('t')), now);
        assert_eq!(app.overlay(), &Overlay::None);
    }

    #[test]
    fn test_help_overlay_swallows_next_key() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);

        app.handle_key(key(KeyCode::Char('?')), now);
        assert_eq!(app.overlay(), &Overlay::Help);
        assert_eq!(app.handle_key(key(KeyCode::Char('q')), now), Action::None);
        assert!(!app.should_quit());
    }

    #[test]
    fn test_quit_finishes_session() {
        let now = Instant::now();
        let mut app = app(StudyMode::CrossDeck, now);
        assert_eq!(app.handle_key(key(KeyCode::Char('q')), now), Action::Quit);
        assert!(app.should_quit());
    }
}
