//! Bounded queue of transient user notices
//!
//! The queue is a cloneable handle: the study controller and the TUI runner
//! each hold one and push into the same queue. Newest notices come first;
//! pushing beyond capacity evicts the oldest.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::NoticeConfig;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// A message shown to the user for a limited time
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }
}

#[derive(Debug)]
struct Inner {
    notices: VecDeque<Notice>,
    capacity: usize,
    default_ttl: Duration,
    next_id: u64,
}

/// Shared handle to the notice queue
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    inner: Arc<Mutex<Inner>>,
}

impl NoticeQueue {
    /// Create a queue holding at most `capacity` notices
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        debug!(capacity, ?default_ttl, "NoticeQueue::new: called");
        Self {
            inner: Arc::new(Mutex::new(Inner {
                notices: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                default_ttl,
                next_id: 0,
            })),
        }
    }

    pub fn from_config(config: &NoticeConfig) -> Self {
        Self::new(config.capacity, Duration::from_millis(config.ttl_ms))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a notice with the default ttl
    pub fn push(&self, level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> u64 {
        self.push_at(level, title, body, None, Instant::now())
    }

    /// Push a notice with an explicit ttl and creation time
    pub fn push_at(
        &self,
        level: NoticeLevel,
        title: impl Into<String>,
        body: impl Into<String>,
        ttl: Option<Duration>,
        now: Instant,
    ) -> u64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let notice = Notice {
            id: inner.next_id,
            level,
            title: title.into(),
            body: body.into(),
            created_at: now,
            ttl: ttl.unwrap_or(inner.default_ttl),
        };
        debug!(id = notice.id, title = %notice.title, "NoticeQueue::push_at: queued");

        inner.notices.push_front(notice);
        while inner.notices.len() > inner.capacity {
            inner.notices.pop_back();
        }
        inner.next_id
    }

    /// Remove a notice before its ttl runs out
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let before = inner.notices.len();
        inner.notices.retain(|n| n.id != id);
        inner.notices.len() != before
    }

    /// Drop expired notices; returns how many were removed
    pub fn expire(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let before = inner.notices.len();
        inner.notices.retain(|n| !n.is_expired(now));
        before - inner.notices.len()
    }

    /// Snapshot of the queued notices, newest first
    pub fn visible(&self) -> Vec<Notice> {
        self.lock().notices.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().notices.clear();
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::from_config(&NoticeConfig::default())
    }
}
