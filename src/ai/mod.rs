//! AI layer - Completion service abstraction and the features built on it
//!
//! The rest of the crate only sees [`CompletionService`]; the Gemini HTTP
//! client is one implementation and tests plug in a canned one.

/// Free-form assistant questions answered from the roster or the AI
pub mod assistant;
/// Reading student ID cards from photos
pub mod card;
/// Gemini `generateContent` client
pub mod gemini;
/// Teacher comments and parent reports
pub mod prompts;

use crate::errors::{Error, Result};
use async_trait::async_trait;

/// An image attached to a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// MIME type such as `"image/jpeg"`
    pub mime_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

/// What to ask the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Prompt text
    pub prompt: String,
    /// Optional image sent alongside the prompt
    pub image: Option<ImagePayload>,
    /// Ask for a JSON response and parse it
    pub json_output: bool,
}

impl CompletionRequest {
    /// A text-only request expecting a text answer.
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            json_output: false,
        }
    }

    /// Attaches an image.
    #[must_use]
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// Requests a JSON answer.
    #[must_use]
    pub const fn expect_json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// A completion result.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Plain text answer
    Text(String),
    /// Parsed JSON answer
    Json(serde_json::Value),
}

impl Completion {
    /// The answer as text; JSON is serialized back to a string.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }

    /// The answer as JSON, parsing text if needed.
    pub fn into_json(self) -> Result<serde_json::Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(strip_code_fence(&text)).map_err(Into::into),
        }
    }
}

/// Removes a surrounding Markdown code fence (```` ```json ... ``` ````) if present.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the language tag on the opening line
    let inner = match inner.split_once('\n') {
        Some((tag, rest)) if tag.trim().chars().all(char::is_alphanumeric) => rest,
        _ => inner,
    };
    inner.trim()
}

/// A service that turns prompts (and optionally images) into answers.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

/// Error returned when a feature needs the AI service but none is configured.
#[must_use]
pub fn not_configured() -> Error {
    Error::Ai {
        message: "AI service is not configured (set GEMINI_API_KEY)".to_string(),
    }
}
