//! Loading session data from the API and sending answers back

use std::collections::HashMap;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::session::{AnswerOutcome, AnswerTicket, StudyMode};
use crate::api::{ApiError, FlashcardApi};
use crate::domain::{Card, Deck, DeckXp, ProgressRecord, SessionCard, classify, progress_by_card};

/// Errors that stop a study view from opening
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Deck not found: {0}")]
    DeckNotFound(String),
}

impl LoadError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_unauthorized())
    }
}

/// Everything a study session starts from
#[derive(Debug, Clone)]
pub struct SessionData {
    pub mode: StudyMode,
    pub cards: Vec<SessionCard>,
    pub experience: HashMap<String, DeckXp>,
}

/// Fetch progress, treating failure as "no progress yet"
async fn progress_or_empty(api: &dyn FlashcardApi) -> Vec<ProgressRecord> {
    match api.list_progress().await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "progress_or_empty: failed to fetch progress, continuing without it");
            Vec::new()
        }
    }
}

fn classify_cards(cards: Vec<(Card, String)>, records: &[ProgressRecord]) -> Vec<SessionCard> {
    let progress = progress_by_card(records);
    cards
        .into_iter()
        .map(|(card, deck_title)| {
            let classification = classify(progress.get(card.id.as_str()).copied());
            SessionCard::new(card, deck_title, classification)
        })
        .collect()
}

/// Load one deck for a single-deck session
pub async fn load_deck(api: &dyn FlashcardApi, deck_id: &str) -> Result<SessionData, LoadError> {
    debug!(%deck_id, "load_deck: called");
    let decks = api.list_decks().await?;
    let deck = decks
        .into_iter()
        .find(|d| d.id == deck_id)
        .ok_or_else(|| LoadError::DeckNotFound(deck_id.to_string()))?;

    let cards = api.list_cards(deck_id).await?;
    let records = progress_or_empty(api).await;
    let xp = match api.deck_xp(deck_id).await {
        Ok(xp) => xp,
        Err(e) => {
            warn!(%deck_id, error = %e, "load_deck: failed to fetch deck xp, using defaults");
            DeckXp::default()
        }
    };

    let cards = cards.into_iter().map(|c| (c, deck.title.clone())).collect();
    let cards = classify_cards(cards, &records);
    info!(%deck_id, cards = cards.len(), "load_deck: loaded");

    Ok(SessionData {
        mode: StudyMode::SingleDeck {
            deck_id: deck_id.to_string(),
        },
        cards,
        experience: HashMap::from([(deck_id.to_string(), xp)]),
    })
}

/// Load every deck for a cross-deck session
///
/// Cards are fetched per deck concurrently; any card fetch failing fails the load.
pub async fn load_all(api: &dyn FlashcardApi) -> Result<SessionData, LoadError> {
    debug!("load_all: called");
    let decks: Vec<Deck> = api.list_decks().await?;
    let per_deck = try_join_all(decks.iter().map(|deck| api.list_cards(&deck.id))).await?;
    let records = progress_or_empty(api).await;

    let mut experience = HashMap::new();
    let mut cards = Vec::new();
    for (deck, deck_cards) in decks.iter().zip(per_deck) {
        experience.insert(deck.id.clone(), deck.experience());
        cards.extend(deck_cards.into_iter().map(|mut card| {
            if card.deck_id.is_empty() {
                card.deck_id = deck.id.clone();
            }
            (card, deck.title.clone())
        }));
    }

    let cards = classify_cards(cards, &records);
    info!(decks = decks.len(), cards = cards.len(), "load_all: loaded");

    Ok(SessionData {
        mode: StudyMode::CrossDeck,
        cards,
        experience,
    })
}

/// Carry out the remote work of one answer
///
/// The progress update and the experience grant run concurrently; a zero
/// reward sends no experience request.
pub async fn submit_answer(api: &dyn FlashcardApi, ticket: AnswerTicket) -> AnswerOutcome {
    debug!(card_id = %ticket.card_id, tier = %ticket.tier, reward = ticket.reward, "submit_answer: called");
    let progress = api.submit_answer(&ticket.card_id, ticket.tier);
    let xp = async {
        if ticket.reward > 0 {
            Some(api.add_xp(&ticket.deck_id, ticket.reward).await)
        } else {
            None
        }
    };
    let (progress, xp) = futures::join!(progress, xp);

    AnswerOutcome {
        card_id: ticket.card_id,
        deck_id: ticket.deck_id,
        progress,
        xp,
    }
}
