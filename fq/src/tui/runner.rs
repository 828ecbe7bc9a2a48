//! Study view main loop
//!
//! Draws the App, feeds it terminal events and sends answers to the API on
//! spawned tasks. Task results come back over an mpsc channel and are
//! applied to the session on the loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::Tui;
use super::app::{Action, App};
use super::events::{Event, EventHandler};
use super::views;
use crate::api::FlashcardApi;
use crate::study::{AnswerOutcome, AnswerTicket, SessionEvent, submit_answer};

/// Tick rate of the event thread; bounds timer resolution
const TICK_RATE: Duration = Duration::from_millis(100);

/// Capacity of the answer result channel
const RESULT_BUFFER: usize = 32;

/// Answer submissions in flight for one study view
///
/// Each submission runs on its own task and reports its outcome over a
/// channel. Aborting, or dropping the set, cancels every submission that
/// has not been received yet.
pub struct Submissions {
    api: Arc<dyn FlashcardApi>,
    tasks: Vec<JoinHandle<()>>,
    result_tx: mpsc::Sender<AnswerOutcome>,
    result_rx: mpsc::Receiver<AnswerOutcome>,
}

impl Submissions {
    pub fn new(api: Arc<dyn FlashcardApi>) -> Self {
        let (result_tx, result_rx) = mpsc::channel(RESULT_BUFFER);
        Self {
            api,
            tasks: Vec::new(),
            result_tx,
            result_rx,
        }
    }

    /// Send an answer to the API on a new task
    pub fn spawn(&mut self, ticket: AnswerTicket) {
        debug!(card_id = %ticket.card_id, "Submissions::spawn: called");
        let api = Arc::clone(&self.api);
        let tx = self.result_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let outcome = submit_answer(api.as_ref(), ticket).await;
            // The receiver is gone once the view closed
            let _ = tx.send(outcome).await;
        }));
    }

    /// Next finished submission; `None` once aborted
    pub async fn recv(&mut self) -> Option<AnswerOutcome> {
        self.result_rx.recv().await
    }

    /// Forget tasks that already finished
    pub fn reap(&mut self) {
        self.tasks.retain(|task| !task.is_finished());
    }

    /// Submissions still running
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Cancel running submissions and drop outcomes not yet received
    pub fn abort_all(&mut self) -> usize {
        let pending = self.pending();
        if pending > 0 {
            info!(pending, "Submissions::abort_all: aborting in-flight submissions");
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }

        self.result_rx.close();
        let mut dropped = 0;
        while self.result_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Submissions::abort_all: dropped unapplied outcomes");
        }
        pending
    }
}

impl Drop for Submissions {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

pub struct StudyRunner {
    terminal: Tui,
    app: App,
    event_handler: EventHandler,
    submissions: Submissions,
}

impl StudyRunner {
    pub fn new(terminal: Tui, app: App, api: Arc<dyn FlashcardApi>) -> Self {
        debug!("StudyRunner::new: called");
        Self {
            terminal,
            app,
            event_handler: EventHandler::new(TICK_RATE),
            submissions: Submissions::new(api),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Run until the session finishes or the user leaves
    pub async fn run(&mut self) -> Result<()> {
        debug!("StudyRunner::run: entering main loop");
        loop {
            self.terminal.draw(|frame| views::render(&self.app, frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    let now = Instant::now();
                    let action = match event? {
                        Event::Tick => {
                            self.handle_tick(now);
                            Action::None
                        }
                        Event::Key(key) => self.app.handle_key(key, now),
                        Event::Mouse(mouse) => self.app.handle_mouse(mouse, now),
                        Event::Resize(width, height) => {
                            debug!(width, height, "StudyRunner::run: resized");
                            Action::None
                        }
                    };
                    match action {
                        Action::None => {}
                        Action::Submit(ticket) => self.submissions.spawn(ticket),
                        Action::Quit => break,
                    }
                }
                Some(outcome) = self.submissions.recv() => {
                    self.app.session_mut().apply_outcome(outcome, Instant::now());
                }
            }

            if self.app.should_quit() {
                debug!("StudyRunner::run: session finished");
                break;
            }
        }

        self.submissions.abort_all();
        Ok(())
    }

    fn handle_tick(&mut self, now: Instant) {
        for event in self.app.tick(now) {
            match event {
                SessionEvent::Completed { session_xp } => info!(session_xp, "StudyRunner: session complete"),
                SessionEvent::Readmitted(ids) => debug!(?ids, "StudyRunner: cards readmitted"),
                SessionEvent::Advanced { card_id } => debug!(%card_id, "StudyRunner: advanced"),
                SessionEvent::Finished => debug!("StudyRunner: finished"),
            }
        }
        self.submissions.reap();
    }
}
