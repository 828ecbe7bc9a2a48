//! Domain types for FlashQuest
//!
//! Cards, decks and progress as the API describes them, plus the
//! session-scoped state the study views attach to each card.

mod card;
mod summary;
mod tier;

pub use card::{Card, Deck, DeckXp, Presentation, ProgressRecord, SessionCard, XpUpdate, progress_by_card};
pub use summary::{DeckSummary, TierCounts};
pub use tier::{Classification, Cooldowns, Tier, classify};
