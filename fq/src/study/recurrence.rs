//! Recurrence monitor for cross-deck study
//!
//! Answered cards are scheduled by the time their cooldown runs out. The
//! monitor is polled on a fixed interval and hands back the cards that have
//! become eligible; the session decides whether each one re-enters the queue.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{Cooldowns, Tier};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// A card whose cooldown has run out
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueCard {
    pub eligible_at: Instant,
    pub card_id: String,
    /// Answer time the entry was scheduled for; a newer answer supersedes it
    pub answered_at: Instant,
}

/// Min-heap of answered cards keyed by eligibility time
#[derive(Debug, Clone)]
pub struct RecurrenceMonitor {
    heap: BinaryHeap<Reverse<DueCard>>,
    cooldowns: Cooldowns,
    interval: Duration,
    next_poll: Instant,
}

impl RecurrenceMonitor {
    pub fn new(cooldowns: Cooldowns, interval: Duration, now: Instant) -> Self {
        debug!(?interval, "RecurrenceMonitor::new: called");
        Self {
            heap: BinaryHeap::new(),
            cooldowns,
            interval,
            next_poll: now + interval,
        }
    }

    /// Schedule a card answered with `tier` at `answered_at`
    pub fn schedule(&mut self, card_id: impl Into<String>, tier: Tier, answered_at: Instant) {
        let entry = DueCard {
            eligible_at: answered_at + self.cooldowns.for_tier(tier),
            card_id: card_id.into(),
            answered_at,
        };
        debug!(card_id = %entry.card_id, %tier, "RecurrenceMonitor::schedule: called");
        self.heap.push(Reverse(entry));
    }

    /// True once the polling interval has elapsed
    pub fn poll_due(&self, now: Instant) -> bool {
        now >= self.next_poll
    }

    /// Pop every entry eligible at `now` and restart the polling interval
    pub fn poll(&mut self, now: Instant) -> Vec<DueCard> {
        self.next_poll = now + self.interval;

        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.eligible_at > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry);
            }
        }
        debug!(due = due.len(), pending = self.heap.len(), "RecurrenceMonitor::poll: drained");
        due
    }

    /// Entries still cooling down
    pub fn pending(&self) -> usize {
        self.heap.len()
    }
}
