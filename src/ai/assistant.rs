//! Teacher assistant chat.
//!
//! A message is first treated as a roster search (name or code). Only when no
//! student matches is it forwarded to the AI service.

use super::{CompletionRequest, CompletionService, not_configured};
use crate::{core::student, entities::student as student_entity, errors::Result};
use sea_orm::DatabaseConnection;

/// Most roster matches considered before asking for a narrower query
pub const MAX_ROSTER_MATCHES: usize = 3;

/// How a message was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantReply {
    /// Exactly one student matched
    Student(student_entity::Model),
    /// Several students matched; the teacher should be more specific
    Ambiguous(Vec<student_entity::Model>),
    /// The AI service answered
    Ai(String),
    /// The message was blank
    Empty,
}

impl AssistantReply {
    /// Text sent back to the teacher.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Student(s) => format!(
                "Found: **{}** ({}, {}) - conduct score: **{}**",
                s.name, s.student_code, s.student_class, s.current_score
            ),
            Self::Ambiguous(students) => {
                let names: Vec<String> = students
                    .iter()
                    .map(|s| format!("{} ({})", s.name, s.student_code))
                    .collect();
                format!(
                    "Found several students: {}. Please be more specific.",
                    names.join(", ")
                )
            }
            Self::Ai(answer) => answer.clone(),
            Self::Empty => "Please type a question or a student's name or code.".to_string(),
        }
    }
}

/// Answers a teacher's message.
///
/// # Errors
/// Returns an error when the roster query fails, or when the message matches
/// no student and the AI service is missing or fails.
pub async fn answer(
    db: &DatabaseConnection,
    service: Option<&dyn CompletionService>,
    message: &str,
) -> Result<AssistantReply> {
    let message = message.trim();
    if message.is_empty() {
        return Ok(AssistantReply::Empty);
    }

    let mut matches = student::list_students(db, None, Some(message)).await?;
    matches.truncate(MAX_ROSTER_MATCHES);
    match matches.len() {
        0 => {}
        1 => return Ok(AssistantReply::Student(matches.remove(0))),
        _ => return Ok(AssistantReply::Ambiguous(matches)),
    }

    let service = service.ok_or_else(not_configured)?;
    let prompt = format!(
        "You are a helpful assistant for a Vietnamese homeroom teacher. \
         Answer briefly, in the language of the question.\n\nQuestion: {message}"
    );
    let answer = service.complete(CompletionRequest::text(prompt)).await?;
    Ok(AssistantReply::Ai(answer.into_text()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ai::{Completion, testing::CannedService};
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_single_match_answers_from_roster() -> Result<()> {
        let (db, [a, _], _) = setup_with_class().await?;
        let service = CannedService::default();

        let reply = answer(&db, Some(&service), "12tin-001").await?;
        assert_eq!(reply, AssistantReply::Student(a));
        assert!(reply.message().contains("conduct score: **100**"));
        assert!(service.requests.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_several_matches_ask_for_more() -> Result<()> {
        let (db, _, _) = setup_with_class().await?;

        let reply = answer(&db, None, "12TIN").await?;
        let AssistantReply::Ambiguous(students) = &reply else {
            panic!("expected ambiguous reply, got {reply:?}");
        };
        assert_eq!(students.len(), 2);
        assert!(reply.message().contains("more specific"));
        Ok(())
    }

    #[tokio::test]
    async fn test_no_match_goes_to_ai() -> Result<()> {
        let (db, _, _) = setup_with_class().await?;
        let service = CannedService::new(vec![Completion::Text("Try a seating plan.".to_string())]);

        let reply = answer(&db, Some(&service), "How do I calm a noisy class?").await?;
        assert_eq!(reply, AssistantReply::Ai("Try a seating plan.".to_string()));
        assert!(service.last_prompt().unwrap().contains("noisy class"));
        Ok(())
    }

    #[tokio::test]
    async fn test_no_match_without_ai() -> Result<()> {
        let (db, _, _) = setup_with_class().await?;
        let result = answer(&db, None, "weather tomorrow?").await;
        assert!(matches!(result.unwrap_err(), Error::Ai { .. }));

        assert_eq!(answer(&db, None, "   ").await?, AssistantReply::Empty);
        Ok(())
    }
}
