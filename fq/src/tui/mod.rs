//! Terminal study view
//!
//! Full-screen card view for single-deck and cross-deck sessions:
//! - flip and answer with the keyboard, or drag the card with the mouse
//! - notices for results, level ups and returning cards
//! - tag filter picker when studying every deck

mod app;
mod events;
mod runner;
mod views;

pub use app::{Action, App, Overlay};
pub use events::{Event, EventHandler};
pub use runner::StudyRunner;

use std::collections::BTreeSet;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info};

use crate::api::FlashcardApi;
use crate::config::Config;
use crate::notice::NoticeQueue;
use crate::study::{SessionData, SessionTiming, StudyMode, StudySession};

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Totals reported after the view closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudySummary {
    pub completed: usize,
    pub session_xp: u32,
}

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Build the session a study view starts with
pub fn build_session(config: &Config, data: SessionData, tags: Vec<String>, now: Instant) -> StudySession {
    let timing = SessionTiming::from_config(&config.study, &data.mode);
    let notices = NoticeQueue::from_config(&config.notices);
    let mut session = StudySession::new(data.mode, data.cards, data.experience, timing, notices, now);
    if !tags.is_empty() {
        session.set_tag_filter(tags.into_iter().collect::<BTreeSet<_>>(), now);
    }
    session
}

/// Run a study session in the terminal until it finishes or the user leaves
pub async fn run_study(
    config: &Config,
    api: Arc<dyn FlashcardApi>,
    data: SessionData,
    tags: Vec<String>,
) -> Result<StudySummary> {
    let title = match &data.mode {
        StudyMode::SingleDeck { deck_id } => data
            .cards
            .first()
            .map(|c| c.deck_title.clone())
            .unwrap_or_else(|| deck_id.clone()),
        StudyMode::CrossDeck => "Study All".to_string(),
    };
    debug!(%title, cards = data.cards.len(), "run_study: called");

    let session = build_session(config, data, tags, Instant::now());
    let app = App::new(session, title, config.study.cell_width);

    let terminal = init()?;

    // Restore the terminal even on early return or error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = StudyRunner::new(terminal, app, api);
    runner.run().await?;

    let session = runner.app().session();
    let summary = StudySummary {
        completed: session.completed(),
        session_xp: session.session_xp(),
    };
    info!(?summary, "run_study: done");
    Ok(summary)
}
