//! Dashboard summaries of decks

use std::collections::HashMap;

use super::card::{Card, Deck, ProgressRecord};
use super::tier::{Tier, classify};

/// Number of mastered cards per dashboard level
const MASTERED_PER_LEVEL: u32 = 5;

/// Display xp granted per mastered card within a level
const XP_PER_MASTERED: u32 = 20;

/// Card counts per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierCounts {
    pub new: u32,
    pub learning: u32,
    pub mastered: u32,
}

impl TierCounts {
    pub fn add(&mut self, tier: Tier) {
        match tier {
            Tier::New => self.new += 1,
            Tier::Learning => self.learning += 1,
            Tier::Mastered => self.mastered += 1,
        }
    }

    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::New => self.new,
            Tier::Learning => self.learning,
            Tier::Mastered => self.mastered,
        }
    }

    pub fn total(&self) -> u32 {
        self.new + self.learning + self.mastered
    }
}

/// One dashboard row
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub deck: Deck,
    pub card_count: usize,
    pub counts: TierCounts,
    /// Level derived from mastered cards (every five mastered cards is a level)
    pub level: u32,
    /// Progress within the derived level
    pub xp: u32,
}

impl DeckSummary {
    pub fn new(deck: Deck, cards: &[Card], progress: &HashMap<&str, &ProgressRecord>) -> Self {
        let mut counts = TierCounts::default();
        for card in cards {
            counts.add(classify(progress.get(card.id.as_str()).copied()).tier);
        }

        Self {
            deck,
            card_count: cards.len(),
            level: counts.mastered / MASTERED_PER_LEVEL + 1,
            xp: (counts.mastered % MASTERED_PER_LEVEL) * XP_PER_MASTERED,
            counts,
        }
    }
}
