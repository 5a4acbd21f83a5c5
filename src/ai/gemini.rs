//! Gemini `generateContent` client.
//!
//! Sends the prompt as a text part and, when present, the image as a base64
//! `inline_data` part. JSON answers are requested through
//! `generationConfig.response_mime_type`. Transport failures, HTTP 429 and 5xx
//! responses are retried a few times with a growing delay.

use super::{Completion, CompletionRequest, CompletionService, strip_code_fence};
use crate::{
    config::ai::AiSettings,
    errors::{Error, Result},
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Builds a client from settings.
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Model the client talks to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    async fn send_once(&self, payload: &Value) -> Result<std::result::Result<Value, StatusCode>> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(Ok(response.json().await?))
        } else {
            Ok(Err(status))
        }
    }
}

/// Builds the `generateContent` request body.
#[must_use]
pub fn build_payload(request: &CompletionRequest) -> Value {
    let mut parts = vec![json!({ "text": request.prompt })];
    if let Some(image) = &request.image {
        parts.push(json!({
            "inline_data": {
                "mime_type": image.mime_type,
                "data": STANDARD.encode(&image.data),
            }
        }));
    }

    let mut payload = json!({ "contents": [{ "parts": parts }] });
    if request.json_output {
        payload["generationConfig"] = json!({ "response_mime_type": "application/json" });
    }
    payload
}

/// Extracts the first candidate's text and parses it when JSON was requested.
pub fn parse_response(body: Value, json_output: bool) -> Result<Completion> {
    let response: GenerateContentResponse = serde_json::from_value(body)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| Error::Ai {
            message: "AI response contained no text".to_string(),
        })?;

    if json_output {
        let value = serde_json::from_str(strip_code_fence(&text)).map_err(|e| Error::Ai {
            message: format!("AI returned invalid JSON: {e}"),
        })?;
        Ok(Completion::Json(value))
    } else {
        Ok(Completion::Text(text))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let payload = build_payload(&request);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = self.send_once(&payload).await;

            let retry_reason = match outcome {
                Ok(Ok(body)) => {
                    debug!("Gemini answered on attempt {attempt}");
                    return parse_response(body, request.json_output);
                }
                Ok(Err(status)) if is_retryable_status(status) => format!("HTTP {status}"),
                Ok(Err(status)) => {
                    return Err(Error::Ai {
                        message: format!("AI service returned HTTP {status}"),
                    });
                }
                Err(Error::Http(e)) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    e.to_string()
                }
                Err(e) => return Err(e),
            };

            if attempt > MAX_RETRIES {
                return Err(Error::Ai {
                    message: format!("AI service unavailable after {attempt} attempts: {retry_reason}"),
                });
            }
            warn!("Gemini request failed ({retry_reason}), retrying (attempt {attempt})");
            tokio::time::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(attempt))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ai::ImagePayload;

    #[test]
    fn test_payload_text_only() {
        let payload = build_payload(&CompletionRequest::text("Xin chào"));

        assert_eq!(payload["contents"][0]["parts"][0]["text"], "Xin chào");
        assert_eq!(payload["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn test_payload_with_image_and_json() {
        let request = CompletionRequest::text("read the card")
            .with_image(ImagePayload {
                mime_type: "image/jpeg".to_string(),
                data: b"abc".to_vec(),
            })
            .expect_json();
        let payload = build_payload(&request);

        let image = &payload["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(image["mime_type"], "image/jpeg");
        assert_eq!(image["data"], "YWJj");
        assert_eq!(
            payload["generationConfig"]["response_mime_type"],
            "application/json"
        );
    }

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello" }] } }]
        });
        assert_eq!(
            parse_response(body, false).unwrap(),
            Completion::Text("Hello".to_string())
        );
    }

    #[test]
    fn test_parse_json_response() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"student_code\": \"12TIN-001\"}" }] } }]
        });
        let Completion::Json(value) = parse_response(body, true).unwrap() else {
            panic!("expected JSON completion");
        };
        assert_eq!(value["student_code"], "12TIN-001");
    }

    #[test]
    fn test_parse_response_errors() {
        let empty = json!({ "candidates": [] });
        assert!(matches!(
            parse_response(empty, false).unwrap_err(),
            Error::Ai { .. }
        ));

        let not_json = json!({
            "candidates": [{ "content": { "parts": [{ "text": "sorry" }] } }]
        });
        assert!(matches!(
            parse_response(not_json, true).unwrap_err(),
            Error::Ai { .. }
        ));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new(&AiSettings {
            api_key: "k".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
        })
        .unwrap();
        assert!(client.endpoint().ends_with("/gemini-2.5-flash-lite:generateContent"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }
}
