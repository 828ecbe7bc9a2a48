//! FlashQuest - flashcard study sessions in the terminal
//!
//! A client for the FlashQuest learning API. Cards are classified into
//! mastery tiers from the learner's progress, studied lowest tier first, and
//! answered by flipping and swiping. Answers earn experience for the deck.
//!
//! # Modules
//!
//! - [`domain`] - Cards, decks, tiers and deck summaries
//! - [`api`] - FlashcardApi trait and HTTP implementation
//! - [`study`] - Queue builder, gestures, recurrence and the session controller
//! - [`notice`] - Bounded queue of transient notices
//! - [`tui`] - Terminal study view
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod notice;
pub mod study;
pub mod tui;
