//! FlashcardApi trait definition

use std::path::Path;

use async_trait::async_trait;

use super::ApiError;
use super::types::{AnswerEcho, LoginRequest, NewCard, NewDeck, SignupRequest, User};
use crate::domain::{Card, Deck, DeckXp, ProgressRecord, Tier, XpUpdate};

/// Remote FlashQuest API
///
/// Every call carries the session credential held by the implementation.
/// Nothing is retried: callers decide whether a failure is surfaced,
/// logged or ignored.
#[async_trait]
pub trait FlashcardApi: Send + Sync {
    /// Create an account; returns the server's message
    async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError>;

    /// Start a session; returns the server's message
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

    /// End the current session
    async fn logout(&self) -> Result<(), ApiError>;

    /// The account owning the current session
    async fn me(&self) -> Result<User, ApiError>;

    /// All decks of the current account
    async fn list_decks(&self) -> Result<Vec<Deck>, ApiError>;

    async fn create_deck(&self, deck: &NewDeck) -> Result<Deck, ApiError>;

    /// All cards of one deck
    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, ApiError>;

    async fn create_card(&self, deck_id: &str, card: &NewCard) -> Result<Card, ApiError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), ApiError>;

    /// Progress records of the current account across all decks
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError>;

    /// Record an answer against a card's progress
    async fn submit_answer(&self, card_id: &str, answer: Tier) -> Result<AnswerEcho, ApiError>;

    /// Current experience state of a deck
    async fn deck_xp(&self, deck_id: &str) -> Result<DeckXp, ApiError>;

    /// Add experience to a deck
    async fn add_xp(&self, deck_id: &str, amount: u32) -> Result<XpUpdate, ApiError>;

    /// Upload a document for flashcard generation; returns the number of cards created
    async fn generate_cards(&self, deck_id: &str, document: &Path) -> Result<u32, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing::debug;

    #[derive(Debug, Default)]
    struct MockState {
        decks: Vec<Deck>,
        cards: HashMap<String, Vec<Card>>,
        progress: Vec<ProgressRecord>,
        xp: HashMap<String, DeckXp>,
        answers: Vec<(String, Tier)>,
        xp_adds: Vec<(String, u32)>,
    }

    /// In-memory API for unit tests
    #[derive(Debug, Default)]
    pub struct MockApi {
        state: Mutex<MockState>,
        pub fail_cards: bool,
        pub fail_progress: bool,
        pub fail_answers: bool,
        pub fail_xp: bool,
        /// Hold every answer submission for this long before recording it
        pub answer_delay: Option<Duration>,
    }

    impl MockApi {
        pub fn new() -> Self {
            debug!("MockApi::new: called");
            Self::default()
        }

        pub fn with_deck(self, deck: Deck, cards: Vec<Card>) -> Self {
            {
                let mut state = self.state.lock().unwrap();
                state.cards.insert(deck.id.clone(), cards);
                state.decks.push(deck);
            }
            self
        }

        pub fn with_progress(self, record: ProgressRecord) -> Self {
            self.state.lock().unwrap().progress.push(record);
            self
        }

        pub fn with_xp(self, deck_id: &str, xp: DeckXp) -> Self {
            self.state.lock().unwrap().xp.insert(deck_id.to_string(), xp);
            self
        }

        pub fn answers(&self) -> Vec<(String, Tier)> {
            self.state.lock().unwrap().answers.clone()
        }

        pub fn xp_adds(&self) -> Vec<(String, u32)> {
            self.state.lock().unwrap().xp_adds.clone()
        }

        fn unavailable() -> ApiError {
            ApiError::Api {
                status: 500,
                message: "mock failure".to_string(),
            }
        }
    }

    #[async_trait]
    impl FlashcardApi for MockApi {
        async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError> {
            Ok(format!("Signed up {}", request.email))
        }

        async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
            Ok(format!("Logged in {}", request.email))
        }

        async fn logout(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn me(&self) -> Result<User, ApiError> {
            Ok(User {
                id: "u1".to_string(),
                first_name: Some("Test".to_string()),
                email: Some("test@example.com".to_string()),
            })
        }

        async fn list_decks(&self) -> Result<Vec<Deck>, ApiError> {
            Ok(self.state.lock().unwrap().decks.clone())
        }

        async fn create_deck(&self, deck: &NewDeck) -> Result<Deck, ApiError> {
            let mut state = self.state.lock().unwrap();
            let created = Deck {
                id: format!("d{}", state.decks.len() + 1),
                title: deck.title.clone(),
                description: Some(deck.description.clone()),
                level: None,
                xp: None,
                xp_to_next_level: None,
            };
            state.decks.push(created.clone());
            Ok(created)
        }

        async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, ApiError> {
            if self.fail_cards {
                return Err(Self::unavailable());
            }
            Ok(self.state.lock().unwrap().cards.get(deck_id).cloned().unwrap_or_default())
        }

        async fn create_card(&self, deck_id: &str, card: &NewCard) -> Result<Card, ApiError> {
            let mut state = self.state.lock().unwrap();
            let cards = state.cards.entry(deck_id.to_string()).or_default();
            let created = Card {
                id: format!("{}-c{}", deck_id, cards.len() + 1),
                deck_id: deck_id.to_string(),
                front: card.front.clone(),
                back: card.back.clone(),
                tags: card.tags.clone(),
            };
            cards.push(created.clone());
            Ok(created)
        }

        async fn delete_card(&self, card_id: &str) -> Result<(), ApiError> {
            let mut state = self.state.lock().unwrap();
            for cards in state.cards.values_mut() {
                cards.retain(|c| c.id != card_id);
            }
            Ok(())
        }

        async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError> {
            if self.fail_progress {
                return Err(Self::unavailable());
            }
            Ok(self.state.lock().unwrap().progress.clone())
        }

        async fn submit_answer(&self, card_id: &str, answer: Tier) -> Result<AnswerEcho, ApiError> {
            if let Some(delay) = self.answer_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_answers {
                return Err(Self::unavailable());
            }
            let mut state = self.state.lock().unwrap();
            state.answers.push((card_id.to_string(), answer));
            let previous = state
                .progress
                .iter()
                .rev()
                .find(|p| p.flashcard_id == card_id)
                .map(|p| p.correct_streak)
                .unwrap_or(0);
            let correct_streak = if answer == Tier::Mastered { previous + 1 } else { 0 };
            state.progress.push(ProgressRecord {
                flashcard_id: card_id.to_string(),
                status: answer,
                correct_streak,
            });
            Ok(AnswerEcho {
                status: answer,
                correct_streak,
            })
        }

        async fn deck_xp(&self, deck_id: &str) -> Result<DeckXp, ApiError> {
            if self.fail_xp {
                return Err(Self::unavailable());
            }
            Ok(self.state.lock().unwrap().xp.get(deck_id).copied().unwrap_or_default())
        }

        async fn add_xp(&self, deck_id: &str, amount: u32) -> Result<XpUpdate, ApiError> {
            if self.fail_xp {
                return Err(Self::unavailable());
            }
            let mut state = self.state.lock().unwrap();
            state.xp_adds.push((deck_id.to_string(), amount));
            let xp = state.xp.entry(deck_id.to_string()).or_default();
            xp.xp += amount;
            let mut leveled_up = false;
            while xp.xp >= xp.xp_to_next_level {
                xp.xp -= xp.xp_to_next_level;
                xp.level += 1;
                leveled_up = true;
            }
            Ok(XpUpdate {
                level: xp.level,
                xp: xp.xp,
                xp_to_next_level: xp.xp_to_next_level,
                leveled_up,
            })
        }

        async fn generate_cards(&self, deck_id: &str, _document: &Path) -> Result<u32, ApiError> {
            debug!(%deck_id, "MockApi::generate_cards: called");
            Ok(0)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_records_answers_and_xp() {
            let api = MockApi::new();

            let echo = api.submit_answer("c1", Tier::Mastered).await.unwrap();
            assert_eq!(echo.correct_streak, 1);
            let echo = api.submit_answer("c1", Tier::Mastered).await.unwrap();
            assert_eq!(echo.correct_streak, 2);

            let update = api.add_xp("d1", 15).await.unwrap();
            assert_eq!(update.xp, 15);
            assert!(!update.leveled_up);

            assert_eq!(api.answers().len(), 2);
            assert_eq!(api.xp_adds(), vec![("d1".to_string(), 15)]);
        }

        #[tokio::test]
        async fn test_mock_levels_up() {
            let api = MockApi::new().with_xp(
                "d1",
                DeckXp {
                    level: 1,
                    xp: 90,
                    xp_to_next_level: 100,
                },
            );

            let update = api.add_xp("d1", 15).await.unwrap();
            assert!(update.leveled_up);
            assert_eq!(update.level, 2);
            assert_eq!(update.xp, 5);
        }
    }
}
