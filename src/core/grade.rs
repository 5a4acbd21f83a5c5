//! Grade business logic - Subjects, grade entry and transcripts.
//!
//! Each subject declares how many regular (TX), mid-term (GK) and final (HK)
//! grade columns it uses. A grade fills one column for one student in one
//! semester of one school year; recording the same slot again overwrites it.

use crate::{
    entities::{Grade, Subject, grade, student, subject},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::{fmt, str::FromStr};
use tracing::info;

/// Default number of regular grade columns for a new subject
pub const DEFAULT_TX_COLUMNS: i32 = 3;
/// Default number of mid-term grade columns for a new subject
pub const DEFAULT_GK_COLUMNS: i32 = 1;
/// Default number of final grade columns for a new subject
pub const DEFAULT_HK_COLUMNS: i32 = 1;
/// Highest score a grade can hold
pub const MAX_GRADE: f64 = 10.0;

/// Month in which a new school year starts
pub const SCHOOL_YEAR_START_MONTH: u32 = 8;

/// School year label containing `date`, e.g. `"2024-2025"` for 2024-10-01.
#[must_use]
pub fn school_year_of(date: NaiveDate) -> String {
    let start = if date.month() >= SCHOOL_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{start}-{}", start + 1)
}

/// `school_year` when given and not blank, otherwise the year containing `today`.
#[must_use]
pub fn school_year_or(school_year: Option<String>, today: NaiveDate) -> String {
    school_year
        .map(|y| y.trim().to_string())
        .filter(|y| !y.is_empty())
        .unwrap_or_else(|| school_year_of(today))
}

/// Kind of grade column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeType {
    /// Regular assessment (weight 1)
    Regular,
    /// Mid-term exam (weight 2)
    MidTerm,
    /// Final exam (weight 3)
    Final,
}

impl GradeType {
    /// All grade types in transcript order
    pub const ALL: [Self; 3] = [Self::Regular, Self::MidTerm, Self::Final];

    /// Stored code: `"TX"`, `"GK"` or `"HK"`
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Regular => "TX",
            Self::MidTerm => "GK",
            Self::Final => "HK",
        }
    }

    /// Weight in the subject average
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Regular => 1.0,
            Self::MidTerm => 2.0,
            Self::Final => 3.0,
        }
    }

    /// Number of columns the subject allows for this type
    #[must_use]
    pub const fn columns_in(self, subject: &subject::Model) -> i32 {
        match self {
            Self::Regular => subject.num_tx_columns,
            Self::MidTerm => subject.num_gk_columns,
            Self::Final => subject.num_hk_columns,
        }
    }
}

impl fmt::Display for GradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GradeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "TX" => Ok(Self::Regular),
            "GK" => Ok(Self::MidTerm),
            "HK" => Ok(Self::Final),
            other => Err(Error::Config {
                message: format!("Unknown grade type '{other}' (expected TX, GK or HK)"),
            }),
        }
    }
}

/// Input for creating or editing a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectInput {
    /// Display name
    pub name: String,
    /// Code, upper-cased on save
    pub code: String,
    /// Optional description
    pub description: Option<String>,
    /// Regular grade columns
    pub num_tx_columns: i32,
    /// Mid-term grade columns
    pub num_gk_columns: i32,
    /// Final grade columns
    pub num_hk_columns: i32,
}

impl SubjectInput {
    /// A subject with the default 3/1/1 column layout.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            description: None,
            num_tx_columns: DEFAULT_TX_COLUMNS,
            num_gk_columns: DEFAULT_GK_COLUMNS,
            num_hk_columns: DEFAULT_HK_COLUMNS,
        }
    }

    fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let code = self.code.trim().to_uppercase();
        if name.is_empty() || code.is_empty() {
            return Err(Error::Config {
                message: "Subject name and code cannot be empty".to_string(),
            });
        }
        for (label, count) in [
            ("TX", self.num_tx_columns),
            ("GK", self.num_gk_columns),
            ("HK", self.num_hk_columns),
        ] {
            if count < 1 {
                return Err(Error::Config {
                    message: format!("Subject needs at least one {label} column, got {count}"),
                });
            }
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(Self {
            name,
            code,
            description,
            ..self
        })
    }
}

/// Lists subjects ordered by name.
pub async fn list_subjects<C>(db: &C) -> Result<Vec<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find()
        .order_by_asc(subject::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a subject by code, ignoring case.
pub async fn get_subject_by_code<C>(db: &C, code: &str) -> Result<Option<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find()
        .filter(subject::Column::Code.eq(code.trim().to_uppercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a subject.
///
/// # Errors
/// Returns an error if the name or code is empty, a column count is below
/// one, or the code is already taken.
pub async fn create_subject(db: &DatabaseConnection, input: SubjectInput) -> Result<subject::Model> {
    let input = input.validated()?;
    if get_subject_by_code(db, &input.code).await?.is_some() {
        return Err(Error::DuplicateSubject { code: input.code });
    }

    let subject = subject::ActiveModel {
        name: Set(input.name),
        code: Set(input.code),
        description: Set(input.description),
        num_tx_columns: Set(input.num_tx_columns),
        num_gk_columns: Set(input.num_gk_columns),
        num_hk_columns: Set(input.num_hk_columns),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Added subject {} ({})", subject.name, subject.code);
    Ok(subject)
}

/// Replaces a subject's fields. Existing grades are kept.
pub async fn update_subject(
    db: &DatabaseConnection,
    subject_id: i64,
    input: SubjectInput,
) -> Result<subject::Model> {
    let input = input.validated()?;
    let existing = Subject::find_by_id(subject_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::SubjectNotFound {
            code: subject_id.to_string(),
        })?;

    if let Some(other) = get_subject_by_code(db, &input.code).await? {
        if other.id != subject_id {
            return Err(Error::DuplicateSubject { code: input.code });
        }
    }

    let mut subject: subject::ActiveModel = existing.into();
    subject.name = Set(input.name);
    subject.code = Set(input.code);
    subject.description = Set(input.description);
    subject.num_tx_columns = Set(input.num_tx_columns);
    subject.num_gk_columns = Set(input.num_gk_columns);
    subject.num_hk_columns = Set(input.num_hk_columns);
    subject.update(db).await.map_err(Into::into)
}

/// Deletes a subject and all grades recorded for it.
pub async fn delete_subject(db: &DatabaseConnection, subject_id: i64) -> Result<subject::Model> {
    let txn = db.begin().await?;

    let subject = Subject::find_by_id(subject_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::SubjectNotFound {
            code: subject_id.to_string(),
        })?;
    let removed = Grade::delete_many()
        .filter(grade::Column::SubjectId.eq(subject_id))
        .exec(&txn)
        .await?;
    Subject::delete_by_id(subject_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted subject {} and {} grades",
        subject.code, removed.rows_affected
    );
    Ok(subject)
}

/// Which grade slot to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeSlot {
    /// Student id
    pub student_id: i64,
    /// Subject id
    pub subject_id: i64,
    /// Column kind
    pub grade_type: GradeType,
    /// 1-based column within the kind
    pub column_index: i32,
    /// Semester, 1 or 2
    pub semester: i32,
    /// School year label such as `"2024-2025"`
    pub school_year: String,
}

/// Writes a score into a grade slot, inserting or overwriting.
///
/// # Errors
/// Returns an error if the score is outside 0–10, the student or subject is
/// missing, the column index exceeds the subject's layout, or the semester is
/// not 1 or 2.
pub async fn record_grade(
    db: &DatabaseConnection,
    slot: GradeSlot,
    score: f64,
) -> Result<grade::Model> {
    if !(0.0..=MAX_GRADE).contains(&score) {
        return Err(Error::InvalidGrade { score });
    }
    if !(1..=2).contains(&slot.semester) {
        return Err(Error::Config {
            message: format!("Semester must be 1 or 2, got {}", slot.semester),
        });
    }
    if slot.school_year.trim().is_empty() {
        return Err(Error::Config {
            message: "School year cannot be empty".to_string(),
        });
    }

    let subject = Subject::find_by_id(slot.subject_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::SubjectNotFound {
            code: slot.subject_id.to_string(),
        })?;
    let columns = slot.grade_type.columns_in(&subject);
    if !(1..=columns).contains(&slot.column_index) {
        return Err(Error::Config {
            message: format!(
                "{} has {columns} {} columns, got column {}",
                subject.code, slot.grade_type, slot.column_index
            ),
        });
    }
    if student::Entity::find_by_id(slot.student_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(Error::StudentNotFound {
            code: slot.student_id.to_string(),
        });
    }

    let school_year = slot.school_year.trim().to_string();
    let existing = Grade::find()
        .filter(grade::Column::StudentId.eq(slot.student_id))
        .filter(grade::Column::SubjectId.eq(slot.subject_id))
        .filter(grade::Column::GradeType.eq(slot.grade_type.code()))
        .filter(grade::Column::ColumnIndex.eq(slot.column_index))
        .filter(grade::Column::Semester.eq(slot.semester))
        .filter(grade::Column::SchoolYear.eq(school_year.as_str()))
        .one(db)
        .await?;

    let saved = if let Some(existing) = existing {
        let mut grade: grade::ActiveModel = existing.into();
        grade.score = Set(score);
        grade.date_recorded = Set(Utc::now());
        grade.update(db).await?
    } else {
        grade::ActiveModel {
            student_id: Set(slot.student_id),
            subject_id: Set(slot.subject_id),
            grade_type: Set(slot.grade_type.code().to_string()),
            column_index: Set(slot.column_index),
            score: Set(score),
            semester: Set(slot.semester),
            school_year: Set(school_year),
            date_recorded: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    info!(
        "Recorded {} {}{} = {} for student {}",
        subject.code, saved.grade_type, saved.column_index, saved.score, saved.student_id
    );
    Ok(saved)
}

/// Deletes one grade.
pub async fn delete_grade(db: &DatabaseConnection, grade_id: i64) -> Result<grade::Model> {
    let grade = Grade::find_by_id(grade_id)
        .one(db)
        .await?
        .ok_or(Error::GradeNotFound { id: grade_id })?;
    Grade::delete_by_id(grade_id).exec(db).await?;
    Ok(grade)
}

/// One subject's row in a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectResult {
    /// The subject
    pub subject: subject::Model,
    /// Regular scores in column order
    pub regular: Vec<f64>,
    /// Mid-term scores in column order
    pub mid_term: Vec<f64>,
    /// Final scores in column order
    pub final_exam: Vec<f64>,
    /// Weighted average, present only when every grade type has a score
    pub average: Option<f64>,
}

/// A student's grades for one semester.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// The student
    pub student: student::Model,
    /// Semester, 1 or 2
    pub semester: i32,
    /// School year label
    pub school_year: String,
    /// One entry per subject, ordered by subject name
    pub subjects: Vec<SubjectResult>,
    /// Mean of the available subject averages
    pub gpa: Option<f64>,
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    Some(values.iter().sum::<f64>() / len)
}

/// Weighted subject average `(TX + 2·GK + 3·HK) / 6` over per-type means,
/// rounded to two decimals. `None` unless all three types have scores.
#[must_use]
pub fn subject_average(regular: &[f64], mid_term: &[f64], final_exam: &[f64]) -> Option<f64> {
    let tx = mean(regular)?;
    let gk = mean(mid_term)?;
    let hk = mean(final_exam)?;
    let weighted = tx.mul_add(
        GradeType::Regular.weight(),
        gk.mul_add(GradeType::MidTerm.weight(), hk * GradeType::Final.weight()),
    );
    let total_weight: f64 = GradeType::ALL.iter().map(|t| t.weight()).sum();
    Some(round2(weighted / total_weight))
}

/// Mean of the subject averages that exist, rounded to two decimals.
#[must_use]
pub fn grade_point_average(subjects: &[SubjectResult]) -> Option<f64> {
    let averages: Vec<f64> = subjects.iter().filter_map(|s| s.average).collect();
    mean(&averages).map(round2)
}

/// Builds a student's transcript for one semester of one school year.
pub async fn build_transcript(
    db: &DatabaseConnection,
    student_id: i64,
    semester: i32,
    school_year: &str,
) -> Result<Transcript> {
    let student = student::Entity::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })?;
    let school_year = school_year.trim().to_string();

    let grades = Grade::find()
        .filter(grade::Column::StudentId.eq(student_id))
        .filter(grade::Column::Semester.eq(semester))
        .filter(grade::Column::SchoolYear.eq(school_year.as_str()))
        .order_by_asc(grade::Column::ColumnIndex)
        .all(db)
        .await?;

    let subjects: Vec<SubjectResult> = list_subjects(db)
        .await?
        .into_iter()
        .map(|subject| {
            let scores = |kind: GradeType| -> Vec<f64> {
                grades
                    .iter()
                    .filter(|g| g.subject_id == subject.id && g.grade_type == kind.code())
                    .map(|g| g.score)
                    .collect()
            };
            let regular = scores(GradeType::Regular);
            let mid_term = scores(GradeType::MidTerm);
            let final_exam = scores(GradeType::Final);
            let average = subject_average(&regular, &mid_term, &final_exam);
            SubjectResult {
                subject,
                regular,
                mid_term,
                final_exam,
                average,
            }
        })
        .collect();

    let gpa = grade_point_average(&subjects);
    Ok(Transcript {
        student,
        semester,
        school_year,
        subjects,
        gpa,
    })
}

fn format_scores(scores: &[f64]) -> String {
    if scores.is_empty() {
        "-".to_string()
    } else {
        scores
            .iter()
            .map(|s| format!("{s:.1}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Formats a transcript for display.
pub fn format_transcript(transcript: &Transcript) -> Result<String> {
    use std::fmt::Write as _;

    let mut out = format!(
        "**Transcript: {} ({})**\nSemester {} · {}\n\n",
        transcript.student.name,
        transcript.student.student_code,
        transcript.semester,
        transcript.school_year
    );

    if transcript.subjects.is_empty() {
        out.push_str("No subjects configured.");
        return Ok(out);
    }

    for row in &transcript.subjects {
        let average = row
            .average
            .map_or_else(|| "-".to_string(), |a| format!("{a:.2}"));
        writeln!(
            out,
            "**{}** | TX: {} | GK: {} | HK: {} | Avg: {average}",
            row.subject.name,
            format_scores(&row.regular),
            format_scores(&row.mid_term),
            format_scores(&row.final_exam),
        )?;
    }

    match transcript.gpa {
        Some(gpa) => write!(out, "\nGPA: **{gpa:.2}**/10")?,
        None => out.push_str("\nGPA: not enough grades yet"),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn slot(student_id: i64, subject_id: i64, grade_type: GradeType, column: i32) -> GradeSlot {
        GradeSlot {
            student_id,
            subject_id,
            grade_type,
            column_index: column,
            semester: 1,
            school_year: "2024-2025".to_string(),
        }
    }

    #[test]
    fn test_grade_type_parsing() {
        assert_eq!("tx".parse::<GradeType>().unwrap(), GradeType::Regular);
        assert_eq!(" GK ".parse::<GradeType>().unwrap(), GradeType::MidTerm);
        assert_eq!("HK".parse::<GradeType>().unwrap(), GradeType::Final);
        assert!("XX".parse::<GradeType>().is_err());
        assert_eq!(GradeType::Final.to_string(), "HK");
    }

    #[test]
    fn test_subject_average_weights() {
        // (8 + 2*7 + 3*9) / 6 = 49 / 6 = 8.1666..
        assert_eq!(subject_average(&[8.0], &[7.0], &[9.0]), Some(8.17));
        // TX mean of 6 and 8 is 7
        assert_eq!(subject_average(&[6.0, 8.0], &[7.0], &[7.0]), Some(7.0));
    }

    #[test]
    fn test_subject_average_requires_every_type() {
        assert_eq!(subject_average(&[8.0], &[7.0], &[]), None);
        assert_eq!(subject_average(&[], &[], &[]), None);
    }

    #[test]
    fn test_school_year_of() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(school_year_of(date(2024, 10, 1)), "2024-2025");
        assert_eq!(school_year_of(date(2025, 3, 15)), "2024-2025");
        assert_eq!(school_year_of(date(2025, 8, 1)), "2025-2026");

        assert_eq!(school_year_or(Some(" 2023-2024 ".into()), date(2025, 1, 1)), "2023-2024");
        assert_eq!(school_year_or(Some("  ".into()), date(2025, 1, 1)), "2024-2025");
        assert_eq!(school_year_or(None, date(2025, 9, 1)), "2025-2026");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.166_666), 8.17);
        assert_eq!(round2(7.0), 7.0);
    }

    #[tokio::test]
    async fn test_create_subject_normalizes_code() -> Result<()> {
        let db = setup_test_db().await?;

        let subject = create_subject(&db, SubjectInput::new(" Toán ", "toan")).await?;
        assert_eq!(subject.code, "TOAN");
        assert_eq!(subject.name, "Toán");
        assert_eq!(
            (subject.num_tx_columns, subject.num_gk_columns, subject.num_hk_columns),
            (3, 1, 1)
        );

        let duplicate = create_subject(&db, SubjectInput::new("Toán 2", "TOAN")).await;
        assert!(matches!(
            duplicate.unwrap_err(),
            Error::DuplicateSubject { code } if code == "TOAN"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_subject_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_subject(&db, SubjectInput::new("", "LY")).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));

        let mut input = SubjectInput::new("Lý", "LY");
        input.num_gk_columns = 0;
        let result = create_subject(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_grade_upserts_slot() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let subject = create_test_subject(&db, "Toán", "TOAN").await?;

        let first = record_grade(&db, slot(student.id, subject.id, GradeType::Regular, 1), 6.5).await?;
        let second =
            record_grade(&db, slot(student.id, subject.id, GradeType::Regular, 1), 8.0).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.score, 8.0);
        assert_eq!(Grade::find().count(&db).await?, 1);

        // Same column, other semester is a different slot
        let mut other = slot(student.id, subject.id, GradeType::Regular, 1);
        other.semester = 2;
        record_grade(&db, other, 9.0).await?;
        assert_eq!(Grade::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_grade_rejects_bad_input() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let subject = create_test_subject(&db, "Toán", "TOAN").await?;

        let too_high =
            record_grade(&db, slot(student.id, subject.id, GradeType::Final, 1), 10.5).await;
        assert!(matches!(too_high.unwrap_err(), Error::InvalidGrade { .. }));

        let negative =
            record_grade(&db, slot(student.id, subject.id, GradeType::Final, 1), -1.0).await;
        assert!(matches!(negative.unwrap_err(), Error::InvalidGrade { .. }));

        // Only one GK column by default
        let column = record_grade(&db, slot(student.id, subject.id, GradeType::MidTerm, 2), 7.0).await;
        assert!(matches!(column.unwrap_err(), Error::Config { .. }));

        let missing_student =
            record_grade(&db, slot(999, subject.id, GradeType::Regular, 1), 7.0).await;
        assert!(matches!(
            missing_student.unwrap_err(),
            Error::StudentNotFound { .. }
        ));

        let missing_subject =
            record_grade(&db, slot(student.id, 999, GradeType::Regular, 1), 7.0).await;
        assert!(matches!(
            missing_subject.unwrap_err(),
            Error::SubjectNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_transcript_and_gpa() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let math = create_test_subject(&db, "Toán", "TOAN").await?;
        let literature = create_test_subject(&db, "Văn", "VAN").await?;
        let physics = create_test_subject(&db, "Lý", "LY").await?;

        record_grade(&db, slot(student.id, math.id, GradeType::Regular, 1), 9.0).await?;
        record_grade(&db, slot(student.id, math.id, GradeType::MidTerm, 1), 8.0).await?;
        record_grade(&db, slot(student.id, math.id, GradeType::Final, 1), 8.5).await?;

        record_grade(&db, slot(student.id, literature.id, GradeType::Regular, 1), 6.0).await?;
        record_grade(&db, slot(student.id, literature.id, GradeType::Regular, 2), 8.0).await?;
        record_grade(&db, slot(student.id, literature.id, GradeType::MidTerm, 1), 7.0).await?;
        record_grade(&db, slot(student.id, literature.id, GradeType::Final, 1), 7.0).await?;

        // Physics has no final yet
        record_grade(&db, slot(student.id, physics.id, GradeType::Regular, 1), 5.0).await?;

        let transcript = build_transcript(&db, student.id, 1, "2024-2025").await?;
        let names: Vec<_> = transcript
            .subjects
            .iter()
            .map(|s| s.subject.name.as_str())
            .collect();
        assert_eq!(names, vec!["Lý", "Toán", "Văn"]);

        assert_eq!(transcript.subjects[0].average, None);
        // (9 + 2*8 + 3*8.5) / 6 = 8.4166..
        assert_eq!(transcript.subjects[1].average, Some(8.42));
        assert_eq!(transcript.subjects[2].average, Some(7.0));
        assert_eq!(transcript.subjects[2].regular, vec![6.0, 8.0]);
        assert_eq!(transcript.gpa, Some(7.71));

        let text = format_transcript(&transcript)?;
        assert!(text.contains("Toán"));
        assert!(text.contains("GPA: **7.71**/10"));

        let empty = build_transcript(&db, student.id, 2, "2024-2025").await?;
        assert_eq!(empty.gpa, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_subject_removes_grades() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let subject = create_test_subject(&db, "Toán", "TOAN").await?;
        let grade = record_grade(&db, slot(student.id, subject.id, GradeType::Regular, 1), 8.0).await?;

        delete_subject(&db, subject.id).await?;

        assert!(get_subject_by_code(&db, "TOAN").await?.is_none());
        assert!(matches!(
            delete_grade(&db, grade.id).await.unwrap_err(),
            Error::GradeNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_subject() -> Result<()> {
        let db = setup_test_db().await?;
        let math = create_test_subject(&db, "Toán", "TOAN").await?;
        create_test_subject(&db, "Văn", "VAN").await?;

        let mut input = SubjectInput::new("Toán học", "toan");
        input.num_tx_columns = 4;
        let updated = update_subject(&db, math.id, input).await?;
        assert_eq!(updated.name, "Toán học");
        assert_eq!(updated.num_tx_columns, 4);

        let clash = update_subject(&db, math.id, SubjectInput::new("Toán", "VAN")).await;
        assert!(matches!(clash.unwrap_err(), Error::DuplicateSubject { .. }));
        Ok(())
    }
}
