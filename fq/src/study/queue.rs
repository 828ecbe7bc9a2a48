//! Study queue and the queue builder
//!
//! The queue is an ordered, de-duplicated list of card ids. The builder
//! filters session cards by tag and cooldown and orders them by tier.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::domain::{Cooldowns, SessionCard};

/// Ordered card ids awaiting presentation; each id appears at most once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyQueue {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl StudyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id; returns false when it is already queued
    pub fn push_back(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push_back(id);
        true
    }

    /// Remove an id wherever it sits; returns false when absent
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|queued| queued != id);
        true
    }

    pub fn head(&self) -> Option<&str> {
        self.order.front().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for StudyQueue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut queue = Self::new();
        for id in iter {
            queue.push_back(id);
        }
        queue
    }
}

/// Cooldown check applied in recurrence mode
#[derive(Debug, Clone, Copy)]
pub struct CooldownGate {
    pub now: Instant,
    pub cooldowns: Cooldowns,
}

impl CooldownGate {
    /// True while an answered card is still cooling down
    pub fn is_cooling(&self, card: &SessionCard) -> bool {
        match card.last_answered_at {
            Some(answered_at) => self.now.saturating_duration_since(answered_at) < self.cooldowns.for_tier(card.tier),
            None => false,
        }
    }
}

/// Build the study queue from session cards
///
/// Keeps cards matching at least one of `tags` (all cards when empty),
/// drops cards still cooling down when a gate is given, then orders by tier
/// with a stable sort so equal tiers keep their input order.
pub fn build_queue(cards: &[SessionCard], tags: &BTreeSet<String>, gate: Option<CooldownGate>) -> StudyQueue {
    debug!(cards = cards.len(), tags = tags.len(), gated = gate.is_some(), "build_queue: called");
    let mut eligible: Vec<&SessionCard> = cards
        .iter()
        .filter(|card| card.matches_tags(tags))
        .filter(|card| !gate.is_some_and(|g| g.is_cooling(card)))
        .collect();

    eligible.sort_by_key(|card| card.tier.rank());

    let queue: StudyQueue = eligible.into_iter().map(|card| card.id().to_string()).collect();
    debug!(len = queue.len(), "build_queue: built");
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Card, Classification, Tier};
    use proptest::prelude::*;
    use std::time::Duration;

    fn session_card(id: &str, tier: Tier, tags: &[&str]) -> SessionCard {
        SessionCard::new(
            Card {
                id: id.to_string(),
                deck_id: "d1".to_string(),
                front: format!("front {}", id),
                back: format!("back {}", id),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            "Deck",
            Classification { tier, streak: 0 },
        )
    }

    fn ids(queue: &StudyQueue) -> Vec<&str> {
        queue.iter().collect()
    }

    #[test]
    fn test_queue_rejects_duplicates() {
        let mut queue = StudyQueue::new();
        assert!(queue.push_back("a"));
        assert!(!queue.push_back("a"));
        assert_eq!(queue.len(), 1);

        assert!(queue.remove("a"));
        assert!(!queue.remove("a"));
        assert!(queue.push_back("a"));
    }

    #[test]
    fn test_sorts_by_tier_stably() {
        let cards = vec![
            session_card("m1", Tier::Mastered, &[]),
            session_card("n1", Tier::New, &[]),
            session_card("l1", Tier::Learning, &[]),
            session_card("n2", Tier::New, &[]),
            session_card("m2", Tier::Mastered, &[]),
        ];

        let queue = build_queue(&cards, &BTreeSet::new(), None);
        assert_eq!(ids(&queue), vec!["n1", "n2", "l1", "m1", "m2"]);
    }

    #[test]
    fn test_tag_filter_keeps_input_order() {
        let cards = vec![
            session_card("c1", Tier::New, &["x"]),
            session_card("c2", Tier::New, &["y"]),
            session_card("c3", Tier::New, &["x"]),
        ];

        let queue = build_queue(&cards, &BTreeSet::from(["x".to_string()]), None);
        assert_eq!(ids(&queue), vec!["c1", "c3"]);
    }

    #[test]
    fn test_cooldown_gate_excludes_recent_answers() {
        let start = Instant::now();
        let mut recent = session_card("recent", Tier::New, &[]);
        recent.last_answered_at = Some(start);
        let mut cooled = session_card("cooled", Tier::New, &[]);
        cooled.last_answered_at = Some(start);
        cooled.tier = Tier::Learning;
        let fresh = session_card("fresh", Tier::Mastered, &[]);
        let cards = vec![recent, cooled, fresh];

        let gate = CooldownGate {
            now: start + Duration::from_secs(45),
            cooldowns: Cooldowns::default(),
        };
        let queue = build_queue(&cards, &BTreeSet::new(), Some(gate));

        // new cools for 30s, learning for 60s
        assert_eq!(ids(&queue), vec!["recent", "fresh"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let cards = vec![
            session_card("a", Tier::Learning, &["x"]),
            session_card("b", Tier::New, &["y"]),
            session_card("c", Tier::Learning, &["x", "y"]),
        ];
        let tags = BTreeSet::from(["y".to_string()]);

        assert_eq!(build_queue(&cards, &tags, None), build_queue(&cards, &tags, None));
    }

    fn tier_strategy() -> impl Strategy<Value = Tier> {
        prop_oneof![Just(Tier::New), Just(Tier::Learning), Just(Tier::Mastered)]
    }

    proptest! {
        #[test]
        fn prop_unfiltered_queue_is_a_stable_permutation(tiers in proptest::collection::vec(tier_strategy(), 0..40)) {
            let cards: Vec<SessionCard> = tiers
                .iter()
                .enumerate()
                .map(|(i, tier)| session_card(&format!("c{}", i), *tier, &[]))
                .collect();

            let queue = build_queue(&cards, &BTreeSet::new(), None);
            prop_assert_eq!(queue.len(), cards.len());

            let positions: Vec<usize> = queue
                .iter()
                .map(|id| cards.iter().position(|c| c.id() == id).unwrap())
                .collect();
            for pair in positions.windows(2) {
                let (a, b) = (&cards[pair[0]], &cards[pair[1]]);
                prop_assert!(a.tier <= b.tier);
                if a.tier == b.tier {
                    prop_assert!(pair[0] < pair[1]);
                }
            }
        }

        #[test]
        fn prop_filtered_queue_has_no_duplicates(
            tagged in proptest::collection::vec((tier_strategy(), any::<bool>()), 0..40)
        ) {
            let cards: Vec<SessionCard> = tagged
                .iter()
                .enumerate()
                .map(|(i, (tier, x))| session_card(&format!("c{}", i), *tier, if *x { &["x"] } else { &["y"] }))
                .collect();

            let queue = build_queue(&cards, &BTreeSet::from(["x".to_string()]), None);
            let unique: HashSet<&str> = queue.iter().collect();
            prop_assert_eq!(unique.len(), queue.len());
            prop_assert!(queue.len() <= cards.len());
            prop_assert_eq!(queue.len(), tagged.iter().filter(|(_, x)| *x).count());
        }
    }
}
