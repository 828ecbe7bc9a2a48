//! Swipe gesture interpretation
//!
//! A drag is measured from the point of contact to the point of release.
//! Far enough left means "wrong", far enough right means "correct";
//! anything shorter is ignored.

use tracing::debug;

use crate::domain::Tier;

/// Default drag distance that counts as a swipe
pub const DEFAULT_SWIPE_THRESHOLD: i32 = 100;

/// Direction of a completed swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
}

impl Swipe {
    /// Answer a swipe stands for
    pub fn tier(self) -> Tier {
        match self {
            Self::Left => Tier::New,
            Self::Right => Tier::Mastered,
        }
    }
}

/// Interpret a horizontal displacement
pub fn interpret(delta: i32, threshold: i32) -> Option<Swipe> {
    if delta <= -threshold {
        Some(Swipe::Left)
    } else if delta >= threshold {
        Some(Swipe::Right)
    } else {
        None
    }
}

/// Tracks one drag from contact to release
#[derive(Debug, Clone)]
pub struct GestureTracker {
    threshold: i32,
    origin: Option<i32>,
    offset: i32,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl GestureTracker {
    pub fn new(threshold: i32) -> Self {
        Self {
            threshold: threshold.max(1),
            origin: None,
            offset: 0,
        }
    }

    /// Contact began at `x`
    pub fn begin(&mut self, x: i32) {
        debug!(x, "GestureTracker::begin: called");
        self.origin = Some(x);
        self.offset = 0;
    }

    /// Contact moved to `x`; returns the live offset for display
    pub fn drag_to(&mut self, x: i32) -> i32 {
        if let Some(origin) = self.origin {
            self.offset = x - origin;
        }
        self.offset
    }

    /// Contact released; returns the decision, if any, and resets
    pub fn release(&mut self) -> Option<Swipe> {
        let decision = self.origin.and_then(|_| interpret(self.offset, self.threshold));
        debug!(offset = self.offset, ?decision, "GestureTracker::release: called");
        self.cancel();
        decision
    }

    /// Abandon the current drag
    pub fn cancel(&mut self) {
        self.origin = None;
        self.offset = 0;
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Live displacement of the current drag
    pub fn offset(&self) -> i32 {
        self.offset
    }
}
