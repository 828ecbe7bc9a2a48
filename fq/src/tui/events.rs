//! Terminal event source
//!
//! A blocking thread polls crossterm and forwards key, mouse and resize
//! events over a tokio channel. A tick is sent once per tick rate whether
//! or not input arrives.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, KeyEvent, KeyEventKind, MouseEvent};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// One tick rate has passed
    Tick,
}

/// Map a crossterm event to one the study view cares about
fn translate(evt: event::Event) -> Option<Event> {
    match evt {
        // Key releases would double every press on terminals that report them
        event::Event::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        event::Event::Mouse(mouse) => Some(Event::Mouse(mouse)),
        event::Event::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

/// Forward terminal events and emit a tick every `tick_rate`
///
/// Ticks follow the clock, not the input: a steady stream of mouse moves or
/// key repeats still gets a tick once per `tick_rate`. Returns when the
/// receiving side is gone.
fn pump<P, R>(tick_rate: Duration, mut poll: P, mut read: R, tx: &mpsc::UnboundedSender<Event>)
where
    P: FnMut(Duration) -> io::Result<bool>,
    R: FnMut() -> io::Result<event::Event>,
{
    let mut last_tick = Instant::now();
    loop {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if poll(timeout).unwrap_or(false) {
            match read() {
                Ok(evt) => {
                    if let Some(event) = translate(evt)
                        && tx.send(event).is_err()
                    {
                        break;
                    }
                }
                Err(e) => debug!(error = %e, "EventHandler: read failed"),
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if tx.send(Event::Tick).is_err() {
                break;
            }
            last_tick = Instant::now();
        }
    }
    debug!("EventHandler: channel closed, exiting");
}

/// Channel-backed terminal event source
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        debug!(?tick_rate, "EventHandler::new: called");
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            debug!("EventHandler: polling thread started");
            pump(tick_rate, event::poll, event::read, &tx);
        });

        Self { rx }
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Result<Event> {
        let event = self.rx.recv().await.ok_or_else(|| eyre::eyre!("Event channel closed"))?;
        trace!(?event, "EventHandler::next: received");
        Ok(event)
    }
}
