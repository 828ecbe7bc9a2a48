//! Request and response bodies exchanged with the API

use serde::{Deserialize, Serialize};

use crate::domain::{ProgressRecord, Tier};

/// Successful responses wrap their payload in `data`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Response carrying only a human-readable message
#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub email: String,
    pub password: String,
}

/// The logged-in account
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeck {
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCard {
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub flashcard_id: String,
    pub answer: Tier,
}

/// Progress after an answer was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEcho {
    pub status: Tier,
    #[serde(default)]
    pub correct_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddXpRequest {
    pub xp_to_add: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub flashcards_count: u32,
}

/// Reference to a card inside a progress record
///
/// Records either embed the populated card document or carry its id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CardRef {
    Id(String),
    Doc {
        #[serde(rename = "_id")]
        id: String,
    },
}

/// Progress record as listed by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProgress {
    #[serde(default)]
    pub flashcard: Option<CardRef>,
    #[serde(default)]
    pub flashcard_id: Option<String>,
    #[serde(default)]
    pub status: Tier,
    #[serde(default)]
    pub correct_streak: u32,
}

impl RawProgress {
    /// Convert to a domain record; records for deleted cards have no id
    pub fn into_record(self) -> Option<ProgressRecord> {
        let flashcard_id = match (self.flashcard, self.flashcard_id) {
            (Some(CardRef::Id(id)), _) | (Some(CardRef::Doc { id }), _) => id,
            (None, Some(id)) => id,
            (None, None) => return None,
        };
        Some(ProgressRecord {
            flashcard_id,
            status: self.status,
            correct_streak: self.correct_streak,
        })
    }
}
