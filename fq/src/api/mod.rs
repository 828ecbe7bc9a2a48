//! Client for the FlashQuest HTTP API
//!
//! The [`FlashcardApi`] trait is the seam between the study logic and the
//! network; [`HttpApi`] is the real implementation.

pub mod client;
mod error;
mod http;
pub mod types;

pub use client::FlashcardApi;
pub use error::ApiError;
pub use http::HttpApi;
pub use types::{AnswerEcho, LoginRequest, NewCard, NewDeck, SignupRequest, User};
