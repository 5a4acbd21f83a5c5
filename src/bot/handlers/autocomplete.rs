//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are filtered case-insensitively on what the user typed so far
//! and capped at Discord's limit of 25 entries.

use crate::{
    bot::BotData,
    core::{classroom, grade, student, violation_type},
    errors::Error,
};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

fn filter_suggestions<I>(candidates: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let partial_lower = partial.trim().to_lowercase();
    candidates
        .into_iter()
        .filter(|c| c.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggests student codes matching the code or the student's name.
pub async fn autocomplete_student_code(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(students) = student::list_students(db, None, Some(partial)).await else {
        return Vec::new();
    };

    students
        .into_iter()
        .map(|s| s.student_code)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggests violation rule names.
pub async fn autocomplete_rule_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(rules) = violation_type::list_rules(db).await else {
        return Vec::new();
    };
    filter_suggestions(rules.into_iter().map(|r| r.name), partial)
}

/// Suggests class labels.
pub async fn autocomplete_class_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(classes) = classroom::list_classes(db).await else {
        return Vec::new();
    };
    filter_suggestions(classes.into_iter().map(|c| c.name), partial)
}

/// Suggests subject codes.
pub async fn autocomplete_subject_code(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(subjects) = grade::list_subjects(db).await else {
        return Vec::new();
    };
    filter_suggestions(subjects.into_iter().map(|s| s.code), partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_suggestions() {
        let names = vec![
            "Đi muộn".to_string(),
            "Nói chuyện".to_string(),
            "Không làm bài".to_string(),
        ];
        assert_eq!(filter_suggestions(names.clone(), "MUỘN"), vec!["Đi muộn"]);
        assert_eq!(filter_suggestions(names.clone(), "").len(), 3);

        let many = (0..40).map(|i| format!("rule {i}"));
        assert_eq!(filter_suggestions(many, "rule").len(), MAX_SUGGESTIONS);
    }
}
