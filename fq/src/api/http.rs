//! HTTP implementation of the FlashcardApi trait
//!
//! Talks JSON to the FlashQuest server. The session credential is a cookie
//! kept in a jar owned by the client; it is set by `login` or injected from
//! the environment.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    AddXpRequest, AnswerEcho, AnswerRequest, Envelope, GenerateResponse, LoginRequest, MessageResponse, NewCard,
    NewDeck, RawProgress, SignupRequest, User,
};
use super::{ApiError, FlashcardApi};
use crate::config::ApiConfig;
use crate::domain::{Card, Deck, DeckXp, ProgressRecord, Tier, XpUpdate};

/// FlashQuest API client over HTTP
pub struct HttpApi {
    base_url: Url,
    http: Client,
    jar: Arc<Jar>,
}

impl HttpApi {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "HttpApi::from_config: called");
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base-url '{}': {}", config.base_url, e)))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self { base_url, http, jar })
    }

    /// Seed the cookie jar from a `Cookie` header value (`name=value; other=value`)
    pub fn with_session(self, cookie_header: &str) -> Self {
        debug!("HttpApi::with_session: called");
        for cookie in cookie_header.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &self.base_url);
        }
        self
    }

    /// Current session cookies as a `Cookie` header value
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Config(format!("invalid request path '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.http.request(method, self.url(path)?))
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            debug!(status, "HttpApi::send: API error");
            return Err(ApiError::from_status(status, &body));
        }
        Ok(body)
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(%path, "HttpApi::get: called");
        self.data(self.request(Method::GET, path)?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        debug!(%path, "HttpApi::post: called");
        self.data(self.request(Method::POST, path)?.json(body)).await
    }

    async fn post_message<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        debug!(%path, "HttpApi::post_message: called");
        let body = self.send(self.request(Method::POST, path)?.json(body)).await?;
        let response: MessageResponse = serde_json::from_str(&body).unwrap_or_default();
        Ok(response.message.unwrap_or_default())
    }
}

#[async_trait]
impl FlashcardApi for HttpApi {
    async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError> {
        self.post_message("/api/auth/signup", request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        self.post_message("/api/auth/login", request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        debug!("HttpApi::logout: called");
        self.send(self.request(Method::POST, "/api/auth/logout")?).await?;
        Ok(())
    }

    async fn me(&self) -> Result<User, ApiError> {
        self.get("/api/auth/me").await
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, ApiError> {
        self.get("/api/deck/getAll").await
    }

    async fn create_deck(&self, deck: &NewDeck) -> Result<Deck, ApiError> {
        self.post("/api/deck/new", deck).await
    }

    async fn list_cards(&self, deck_id: &str) -> Result<Vec<Card>, ApiError> {
        let mut cards: Vec<Card> = self.get(&format!("/api/flashcard/getAll/{}", deck_id)).await?;
        for card in cards.iter_mut().filter(|c| c.deck_id.is_empty()) {
            card.deck_id = deck_id.to_string();
        }
        Ok(cards)
    }

    async fn create_card(&self, deck_id: &str, card: &NewCard) -> Result<Card, ApiError> {
        self.post(&format!("/api/flashcard/new/{}", deck_id), card).await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), ApiError> {
        debug!(%card_id, "HttpApi::delete_card: called");
        let path = format!("/api/flashcard/delete/{}", card_id);
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError> {
        let raw: Vec<RawProgress> = self.get("/api/cardprogress/getAll").await?;
        Ok(raw.into_iter().filter_map(RawProgress::into_record).collect())
    }

    async fn submit_answer(&self, card_id: &str, answer: Tier) -> Result<AnswerEcho, ApiError> {
        let request = AnswerRequest {
            flashcard_id: card_id.to_string(),
            answer,
        };
        self.post("/api/cardprogress/new", &request).await
    }

    async fn deck_xp(&self, deck_id: &str) -> Result<DeckXp, ApiError> {
        self.get(&format!("/api/deck/xp/{}", deck_id)).await
    }

    async fn add_xp(&self, deck_id: &str, amount: u32) -> Result<XpUpdate, ApiError> {
        let request = AddXpRequest { xp_to_add: amount };
        self.post(&format!("/api/deck/xp/{}", deck_id), &request).await
    }

    async fn generate_cards(&self, deck_id: &str, document: &Path) -> Result<u32, ApiError> {
        debug!(%deck_id, ?document, "HttpApi::generate_cards: called");
        let bytes = tokio::fs::read(document).await?;
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = Form::new()
            .part("syllabusFile", Part::bytes(bytes).file_name(file_name))
            .text("deckId", deck_id.to_string());

        let body = self
            .send(self.request(Method::POST, "/api/ai/generate-flashcards")?.multipart(form))
            .await?;
        let response: GenerateResponse = serde_json::from_str(&body)?;
        Ok(response.flashcards_count)
    }
}
