//! Teacher comments and parent reports written by the AI service.

use super::{CompletionRequest, CompletionService};
use crate::{
    core::{grade, student, violation},
    entities::{student as student_entity, violation as violation_entity},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::fmt::Write as _;

/// Violations mentioned in a parent report
pub const RECENT_VIOLATIONS: usize = 10;

async fn require_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<student_entity::Model> {
    student::get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })
}

/// Prompt for a short conduct comment on one student.
pub fn student_comment_prompt(
    student: &student_entity::Model,
    violations: &[violation_entity::Model],
) -> Result<String> {
    let mut prompt = format!(
        "You are a homeroom teacher. Write a short comment (2-3 sentences, in Vietnamese) \
         on the conduct of student {} (class {}).\nCurrent conduct score: {}/100.\n",
        student.name, student.student_class, student.current_score
    );
    if violations.is_empty() {
        prompt.push_str("No violations recorded.\n");
    } else {
        prompt.push_str("Recent violations:\n");
        for v in violations.iter().take(RECENT_VIOLATIONS) {
            writeln!(
                prompt,
                "- {} (-{}, week {})",
                v.violation_type_name, v.points_deducted, v.week_number
            )?;
        }
    }
    Ok(prompt)
}

/// Prompt for a parent report combining grades and conduct.
pub fn parent_report_prompt(
    transcript: &grade::Transcript,
    recent_violations: &[violation_entity::Model],
) -> Result<String> {
    let student = &transcript.student;
    let averages: Vec<String> = transcript
        .subjects
        .iter()
        .filter_map(|s| s.average.map(|avg| format!("{}: {avg:.2}", s.subject.name)))
        .collect();

    let mut prompt = format!(
        "You are a homeroom teacher. Write a SHORT comment (3-4 sentences, in Vietnamese) \
         for the parents of {} (class {}).\n\nACADEMICS\n",
        student.name, student.student_class
    );
    match transcript.gpa {
        Some(gpa) => writeln!(
            prompt,
            "- GPA for semester {} ({}): {gpa:.2}/10",
            transcript.semester, transcript.school_year
        )?,
        None => writeln!(
            prompt,
            "- GPA for semester {} ({}): not available yet",
            transcript.semester, transcript.school_year
        )?,
    }
    if averages.is_empty() {
        prompt.push_str("- Subject averages: no grades yet\n");
    } else {
        writeln!(prompt, "- Subject averages: {}", averages.join(", "))?;
    }

    prompt.push_str("\nCONDUCT\n");
    writeln!(prompt, "- Current conduct score: {}/100", student.current_score)?;
    if recent_violations.is_empty() {
        prompt.push_str("- No violations\n");
    } else {
        writeln!(prompt, "- {} recent violations", recent_violations.len())?;
    }

    prompt.push_str(
        "\nBe sincere and encouraging and give concrete advice. \
         Do not add a greeting; write the comment directly.",
    );
    Ok(prompt)
}

/// Asks the AI service for a conduct comment on one student.
pub async fn generate_student_comment(
    db: &DatabaseConnection,
    service: &dyn CompletionService,
    student_id: i64,
) -> Result<String> {
    let student = require_student(db, student_id).await?;
    let violations = violation::list_violations_for_student(db, student_id).await?;
    let prompt = student_comment_prompt(&student, &violations)?;
    Ok(service
        .complete(CompletionRequest::text(prompt))
        .await?
        .into_text())
}

/// Asks the AI service for a parent report for one semester.
pub async fn generate_parent_report(
    db: &DatabaseConnection,
    service: &dyn CompletionService,
    student_id: i64,
    semester: i32,
    school_year: &str,
) -> Result<String> {
    let transcript = grade::build_transcript(db, student_id, semester, school_year).await?;
    let mut violations = violation::list_violations_for_student(db, student_id).await?;
    violations.truncate(RECENT_VIOLATIONS);

    let prompt = parent_report_prompt(&transcript, &violations)?;
    Ok(service
        .complete(CompletionRequest::text(prompt))
        .await?
        .into_text())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ai::{Completion, testing::CannedService};
    use crate::core::{
        grade::{GradeSlot, GradeType, record_grade},
        violation::apply_violation,
    };
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_parent_report_prompt_includes_grades_and_conduct() -> Result<()> {
        let (db, [a, _], rule) = setup_with_class().await?;
        let math = create_test_subject(&db, "Toán", "TOAN").await?;
        for (kind, score) in [
            (GradeType::Regular, 8.0),
            (GradeType::MidTerm, 8.0),
            (GradeType::Final, 8.0),
        ] {
            let slot = GradeSlot {
                student_id: a.id,
                subject_id: math.id,
                grade_type: kind,
                column_index: 1,
                semester: 1,
                school_year: "2024-2025".to_string(),
            };
            record_grade(&db, slot, score).await?;
        }
        apply_violation(&db, a.id, rule.id).await?;

        let service = CannedService::new(vec![Completion::Text("Em học tốt.".to_string())]);
        let report = generate_parent_report(&db, &service, a.id, 1, "2024-2025").await?;
        assert_eq!(report, "Em học tốt.");

        let prompt = service.last_prompt().unwrap();
        assert!(prompt.contains("Nguyễn Văn A"));
        assert!(prompt.contains("GPA for semester 1 (2024-2025): 8.00/10"));
        assert!(prompt.contains("Toán: 8.00"));
        assert!(prompt.contains("Current conduct score: 95/100"));
        assert!(prompt.contains("1 recent violations"));
        Ok(())
    }

    #[tokio::test]
    async fn test_student_comment() -> Result<()> {
        let (db, [_, b], _) = setup_with_class().await?;
        let service = CannedService::new(vec![Completion::Text("Ngoan.".to_string())]);

        let comment = generate_student_comment(&db, &service, b.id).await?;
        assert_eq!(comment, "Ngoan.");
        assert!(service.last_prompt().unwrap().contains("No violations recorded."));

        let missing = generate_student_comment(&db, &service, 404).await;
        assert!(matches!(missing.unwrap_err(), Error::StudentNotFound { .. }));
        Ok(())
    }
}
