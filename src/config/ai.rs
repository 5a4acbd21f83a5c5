//! AI service settings loaded from environment variables.
//!
//! The Gemini key is optional: without it the bot still runs, and the
//! commands that need the AI service reply that it is not configured.

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Settings for the Gemini completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSettings {
    /// API key sent with every request
    pub api_key: String,
    /// Model name, e.g. `"gemini-2.5-flash-lite"`
    pub model: String,
}

/// Reads `GEMINI_API_KEY` and `GEMINI_MODEL`.
///
/// Returns `None` when the key is missing or blank.
#[must_use]
pub fn load_ai_settings() -> Option<AiSettings> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?.trim().to_string();
    if api_key.is_empty() {
        return None;
    }

    let model = std::env::var("GEMINI_MODEL")
        .ok()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

    Some(AiSettings { api_key, model })
}
