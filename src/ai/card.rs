//! Reading student ID cards.
//!
//! The AI service is asked for `{name, class, student_code}` as JSON; the
//! answer is turned into [`CardFields`] and ranked against the roster.

use super::{CompletionRequest, CompletionService, ImagePayload};
use crate::{
    core::resolver::{self, CardFields, Resolution},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::info;

/// Prompt sent with every card photo.
pub const CARD_PROMPT: &str = "\
This photo shows a Vietnamese student ID card. Read the student's full name \
(with diacritics), the class label (for example \"12 Tin\") and the student code \
(upper-case letters and digits, for example 35TIN-001031, HS123 or 12TOAN-05).
Answer with JSON only: {\"name\": \"...\", \"class\": \"...\", \"student_code\": \"...\"}
Use an empty string for anything you cannot read.";

/// Fields read off a card together with the roster candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct CardScan {
    /// What the AI service read
    pub fields: CardFields,
    /// Best match and alternatives
    pub resolution: Resolution,
}

fn text_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| value.get(*k))
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Converts the AI's JSON answer into card fields. Missing keys become empty.
///
/// # Errors
/// Returns an error when the answer is not a JSON object.
pub fn fields_from_json(value: &Value) -> Result<CardFields> {
    // Some answers wrap the object in a one-element array
    let value = match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    if !value.is_object() {
        return Err(Error::Ai {
            message: format!("Expected a JSON object for the card, got {value}"),
        });
    }

    Ok(CardFields {
        name: text_field(value, &["name", "student_name"]),
        class: text_field(value, &["class", "student_class"]),
        code: text_field(value, &["student_code", "code"]),
    })
}

/// Asks the AI service to read a card photo.
pub async fn extract_card_fields(
    service: &dyn CompletionService,
    image: ImagePayload,
) -> Result<CardFields> {
    let request = CompletionRequest::text(CARD_PROMPT)
        .with_image(image)
        .expect_json();
    let value = service.complete(request).await?.into_json()?;
    fields_from_json(&value)
}

/// Reads a card photo and ranks the roster against it.
pub async fn scan_card(
    db: &DatabaseConnection,
    service: &dyn CompletionService,
    image: ImagePayload,
) -> Result<CardScan> {
    let fields = extract_card_fields(service, image).await?;
    let ranked = resolver::resolve(db, &fields).await?;
    let resolution = Resolution::from_ranked(ranked);

    info!(
        "Scanned card {:?}: best match {:?}",
        fields,
        resolution
            .best
            .as_ref()
            .map(|c| (&c.student.student_code, c.score))
    );
    Ok(CardScan { fields, resolution })
}
