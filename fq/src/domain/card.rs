//! Cards, decks, progress records and session-scoped card state

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::tier::{Classification, Tier};

/// A flashcard as stored by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning deck; card listings scoped to a deck may omit it
    #[serde(rename = "deck", default)]
    pub deck_id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A deck as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub xp: Option<u32>,
    #[serde(default)]
    pub xp_to_next_level: Option<u32>,
}

impl Deck {
    /// Experience state carried inline by the deck listing, if any
    pub fn experience(&self) -> DeckXp {
        let defaults = DeckXp::default();
        DeckXp {
            level: self.level.unwrap_or(defaults.level),
            xp: self.xp.unwrap_or(defaults.xp),
            xp_to_next_level: self.xp_to_next_level.unwrap_or(defaults.xp_to_next_level),
        }
    }
}

/// Per-deck experience state mirrored from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckXp {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
}

impl Default for DeckXp {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: 100,
        }
    }
}

/// Experience state returned after adding xp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpUpdate {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    #[serde(default)]
    pub leveled_up: bool,
}

impl XpUpdate {
    pub fn experience(&self) -> DeckXp {
        DeckXp {
            level: self.level,
            xp: self.xp,
            xp_to_next_level: self.xp_to_next_level,
        }
    }
}

/// The learner's most recent progress on one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub flashcard_id: String,
    pub status: Tier,
    pub correct_streak: u32,
}

/// Index progress records by card id; later records win
pub fn progress_by_card(records: &[ProgressRecord]) -> HashMap<&str, &ProgressRecord> {
    records.iter().map(|r| (r.flashcard_id.as_str(), r)).collect()
}

/// Presentation state of a card within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Front shown, answer hidden
    #[default]
    Unrevealed,
    /// Answer shown, awaiting a tier choice
    Revealed,
    /// Tier chosen; waiting to leave the queue
    Answered { tier: Tier },
}

/// A card plus the study state that lives only for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub card: Card,
    pub deck_title: String,
    pub tier: Tier,
    pub previous_tier: Option<Tier>,
    pub streak: u32,
    pub seen_this_session: bool,
    pub last_answered_at: Option<Instant>,
    pub presentation: Presentation,
}

impl SessionCard {
    pub fn new(card: Card, deck_title: impl Into<String>, classification: Classification) -> Self {
        Self {
            card,
            deck_title: deck_title.into(),
            tier: classification.tier,
            previous_tier: None,
            streak: classification.streak,
            seen_this_session: false,
            last_answered_at: None,
            presentation: Presentation::Unrevealed,
        }
    }

    pub fn id(&self) -> &str {
        &self.card.id
    }

    /// True when the card carries at least one of the tags
    ///
    /// An empty tag set matches every card.
    pub fn matches_tags(&self, tags: &BTreeSet<String>) -> bool {
        tags.is_empty() || self.card.tags.iter().any(|t| tags.contains(t))
    }

    /// Record an answer locally
    pub fn record_answer(&mut self, tier: Tier, now: Instant) {
        self.previous_tier = Some(self.tier);
        self.tier = tier;
        self.streak = if tier == Tier::Mastered { self.streak + 1 } else { 0 };
        self.seen_this_session = true;
        self.last_answered_at = Some(now);
        self.presentation = Presentation::Answered { tier };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, tags: &[&str]) -> Card {
        Card {
            id: id.to_string(),
            deck_id: "d1".to_string(),
            front: format!("front {}", id),
            back: format!("back {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_card_deserializes_api_shape() {
        let json = r#"{"_id":"c1","deck":"d1","front":"Q","back":"A","tags":["x"],"media":{}}"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id, "c1");
        assert_eq!(card.deck_id, "d1");
        assert_eq!(card.tags, vec!["x".to_string()]);

        let json = r#"{"_id":"c2","front":"Q","back":"A"}"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert!(card.deck_id.is_empty());
        assert!(card.tags.is_empty());
    }

    #[test]
    fn test_deck_experience_defaults() {
        let deck: Deck = serde_json::from_str(r#"{"_id":"d1","title":"Spanish"}"#).unwrap();
        assert_eq!(deck.experience(), DeckXp::default());

        let deck: Deck =
            serde_json::from_str(r#"{"_id":"d1","title":"Spanish","level":3,"xp":40,"xpToNextLevel":150}"#).unwrap();
        assert_eq!(
            deck.experience(),
            DeckXp {
                level: 3,
                xp: 40,
                xp_to_next_level: 150
            }
        );
    }

    #[test]
    fn test_matches_tags() {
        let session_card = SessionCard::new(card("c1", &["x", "y"]), "Deck", Classification::default());

        assert!(session_card.matches_tags(&BTreeSet::new()));
        assert!(session_card.matches_tags(&BTreeSet::from(["y".to_string()])));
        assert!(!session_card.matches_tags(&BTreeSet::from(["z".to_string()])));
    }

    #[test]
    fn test_record_answer_updates_streak() {
        let mut session_card = SessionCard::new(
            card("c1", &[]),
            "Deck",
            Classification {
                tier: Tier::Learning,
                streak: 2,
            },
        );
        let now = Instant::now();

        session_card.record_answer(Tier::Mastered, now);
        assert_eq!(session_card.streak, 3);
        assert_eq!(session_card.previous_tier, Some(Tier::Learning));
        assert_eq!(session_card.last_answered_at, Some(now));
        assert!(session_card.seen_this_session);
        assert_eq!(session_card.presentation, Presentation::Answered { tier: Tier::Mastered });

        session_card.record_answer(Tier::Learning, now);
        assert_eq!(session_card.streak, 0);
        assert_eq!(session_card.previous_tier, Some(Tier::Mastered));
    }

    #[test]
    fn test_progress_by_card_last_wins() {
        let records = vec![
            ProgressRecord {
                flashcard_id: "c1".to_string(),
                status: Tier::New,
                correct_streak: 0,
            },
            ProgressRecord {
                flashcard_id: "c1".to_string(),
                status: Tier::Mastered,
                correct_streak: 4,
            },
        ];
        let map = progress_by_card(&records);
        assert_eq!(map.len(), 1);
        assert_eq!(map["c1"].status, Tier::Mastered);
    }
}
