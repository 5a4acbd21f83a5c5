//! Student business logic - Roster management and live score updates.
//!
//! Provides functions for creating, finding, editing and deleting students, plus
//! the atomic score adjustments used when violations are recorded or removed.
//! Deleting a student removes its violations and grades in the same transaction.

use crate::{
    entities::{Grade, Student, Violation, grade, student, violation},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;

/// Score every student starts a logical week with, and the restoration ceiling
pub const MAX_SCORE: i32 = 100;

/// Finds a student by primary key.
pub async fn get_student_by_id<C>(db: &C, student_id: i64) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by exact (trimmed) student code.
pub async fn get_student_by_code<C>(db: &C, code: &str) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::StudentCode.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the whole roster in insertion order.
///
/// The fuzzy resolver relies on this order to break score ties.
pub async fn get_all_students<C>(db: &C) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists students ordered by code, optionally restricted to one class and to
/// names or codes containing `search` (case-insensitive).
///
/// The search runs in Rust rather than `LIKE` because `SQLite` only folds ASCII
/// case and most names here are Vietnamese.
pub async fn list_students(
    db: &DatabaseConnection,
    class_filter: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<student::Model>> {
    let mut query = Student::find().order_by_asc(student::Column::StudentCode);
    if let Some(class_name) = class_filter.map(str::trim).filter(|c| !c.is_empty()) {
        query = query.filter(student::Column::StudentClass.eq(class_name));
    }
    let students = query.all(db).await?;

    let Some(needle) = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
    else {
        return Ok(students);
    };

    Ok(students
        .into_iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle)
                || s.student_code.to_lowercase().contains(&needle)
        })
        .collect())
}

fn validate_fields(code: &str, name: &str, class_name: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(Error::Config {
            message: "Student code cannot be empty".to_string(),
        });
    }
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Student name cannot be empty".to_string(),
        });
    }
    if class_name.trim().is_empty() {
        return Err(Error::Config {
            message: "Student class cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Adds a student to the roster with a full score.
///
/// # Errors
/// Returns an error if:
/// - The code, name or class is empty or whitespace-only
/// - Another student already uses the code
/// - The database insert fails
pub async fn create_student(
    db: &DatabaseConnection,
    code: String,
    name: String,
    class_name: String,
) -> Result<student::Model> {
    validate_fields(&code, &name, &class_name)?;

    let code = code.trim().to_string();
    if get_student_by_code(db, &code).await?.is_some() {
        return Err(Error::DuplicateStudent { code });
    }

    let student = student::ActiveModel {
        student_code: Set(code),
        name: Set(name.trim().to_string()),
        student_class: Set(class_name.trim().to_string()),
        current_score: Set(MAX_SCORE),
        ..Default::default()
    };
    let result = student.insert(db).await?;
    info!("Added student {} ({})", result.name, result.student_code);
    Ok(result)
}

/// Updates a student's code, name and class. The live score is untouched.
pub async fn update_student(
    db: &DatabaseConnection,
    student_id: i64,
    code: String,
    name: String,
    class_name: String,
) -> Result<student::Model> {
    validate_fields(&code, &name, &class_name)?;

    let existing = get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })?;

    let code = code.trim().to_string();
    if code != existing.student_code {
        if let Some(other) = get_student_by_code(db, &code).await? {
            if other.id != student_id {
                return Err(Error::DuplicateStudent { code });
            }
        }
    }

    let mut student: student::ActiveModel = existing.into();
    student.student_code = Set(code);
    student.name = Set(name.trim().to_string());
    student.student_class = Set(class_name.trim().to_string());
    student.update(db).await.map_err(Into::into)
}

/// Deletes a student together with its violations and grades.
///
/// Weekly archives keep their by-value copy of the student.
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<student::Model> {
    let txn = db.begin().await?;

    let student = get_student_by_id(&txn, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })?;

    Violation::delete_many()
        .filter(violation::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    Grade::delete_many()
        .filter(grade::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    Student::delete_by_id(student_id).exec(&txn).await?;

    txn.commit().await?;
    info!("Deleted student {} ({})", student.name, student.student_code);
    Ok(student)
}

/// Subtracts `points` from a student's live score with a single `UPDATE`.
///
/// Scores may go below zero; only restorations are clamped.
pub async fn deduct_score_atomic<C>(db: &C, student_id: i64, points: i32) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let result = Student::update_many()
        .col_expr(
            student::Column::CurrentScore,
            Expr::col(student::Column::CurrentScore).sub(points),
        )
        .filter(student::Column::Id.eq(student_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::StudentNotFound {
            code: student_id.to_string(),
        });
    }

    get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })
}

/// Adds `points` back to a student's live score, never exceeding [`MAX_SCORE`].
pub async fn restore_score_atomic<C>(
    db: &C,
    student_id: i64,
    points: i32,
) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let result = Student::update_many()
        .col_expr(
            student::Column::CurrentScore,
            Expr::col(student::Column::CurrentScore).add(points),
        )
        .filter(student::Column::Id.eq(student_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::StudentNotFound {
            code: student_id.to_string(),
        });
    }

    Student::update_many()
        .col_expr(student::Column::CurrentScore, Expr::value(MAX_SCORE))
        .filter(student::Column::Id.eq(student_id))
        .filter(student::Column::CurrentScore.gt(MAX_SCORE))
        .exec(db)
        .await?;

    get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })
}

/// Sets every student's live score back to [`MAX_SCORE`]. Returns the number of rows touched.
pub async fn reset_all_scores<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Student::update_many()
        .col_expr(student::Column::CurrentScore, Expr::value(MAX_SCORE))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
