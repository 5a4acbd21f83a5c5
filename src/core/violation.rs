//! Violation business logic - Recording and undoing conduct deductions.
//!
//! Applying a rule copies its name and points into a new violation tagged with
//! the current logical week and lowers the student's live score in the same
//! transaction. Deleting a violation gives the points back, clamped to
//! [`MAX_SCORE`](crate::core::student::MAX_SCORE).

use crate::{
    core::{student as student_logic, system_config, violation_type},
    entities::{Student, Violation, student, violation, violation_type as rule},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::{debug, info};

/// A freshly recorded violation and the student's score after the deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedViolation {
    /// The recorded violation
    pub violation: violation::Model,
    /// The student after the deduction
    pub student: student::Model,
}

/// Outcome of applying one rule to a list of student codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Violations recorded, in input order
    pub applied: Vec<AppliedViolation>,
    /// Non-blank codes that matched no student
    pub unknown_codes: Vec<String>,
}

async fn record_violation<C>(
    db: &C,
    student: &student::Model,
    rule: &rule::Model,
    week: i32,
) -> Result<AppliedViolation>
where
    C: ConnectionTrait,
{
    let violation = violation::ActiveModel {
        student_id: Set(student.id),
        violation_type_name: Set(rule.name.clone()),
        points_deducted: Set(rule.points_deducted),
        date_committed: Set(Utc::now()),
        week_number: Set(week),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let student = student_logic::deduct_score_atomic(db, student.id, rule.points_deducted).await?;
    debug!(
        "Recorded '{}' (-{}) for {} in week {}",
        violation.violation_type_name, violation.points_deducted, student.student_code, week
    );

    Ok(AppliedViolation { violation, student })
}

async fn require_rule<C>(db: &C, rule_id: i64) -> Result<rule::Model>
where
    C: ConnectionTrait,
{
    violation_type::get_rule_by_id(db, rule_id)
        .await?
        .ok_or_else(|| Error::RuleNotFound {
            name: rule_id.to_string(),
        })
}

/// Applies a rule to one student in the current logical week.
///
/// # Errors
/// Returns an error if the rule or the student does not exist, or if the
/// insert or score update fails (nothing is persisted in that case).
pub async fn apply_violation(
    db: &DatabaseConnection,
    student_id: i64,
    rule_id: i64,
) -> Result<AppliedViolation> {
    let txn = db.begin().await?;

    let rule = require_rule(&txn, rule_id).await?;
    let student = student_logic::get_student_by_id(&txn, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })?;
    let week = system_config::get_current_week(&txn).await?;

    let applied = record_violation(&txn, &student, &rule, week).await?;

    txn.commit().await?;
    info!(
        "Applied '{}' to {} (score now {})",
        rule.name, applied.student.student_code, applied.student.current_score
    );
    Ok(applied)
}

/// Applies a rule to every student whose code is listed, in one transaction.
///
/// Blank codes are ignored and unknown codes are reported back rather than
/// failing the whole batch.
pub async fn apply_violation_to_codes(
    db: &DatabaseConnection,
    codes: &[String],
    rule_id: i64,
) -> Result<BatchOutcome> {
    let txn = db.begin().await?;

    let rule = require_rule(&txn, rule_id).await?;
    let week = system_config::get_current_week(&txn).await?;
    let mut outcome = BatchOutcome::default();

    for code in codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        match student_logic::get_student_by_code(&txn, code).await? {
            Some(student) => {
                outcome
                    .applied
                    .push(record_violation(&txn, &student, &rule, week).await?);
            }
            None => outcome.unknown_codes.push(code.to_string()),
        }
    }

    txn.commit().await?;
    info!(
        "Applied '{}' to {} students ({} unknown codes)",
        rule.name,
        outcome.applied.len(),
        outcome.unknown_codes.len()
    );
    Ok(outcome)
}

/// Deletes a violation and gives its points back to the student, never above 100.
///
/// Returns the student after the restoration.
pub async fn delete_violation(db: &DatabaseConnection, violation_id: i64) -> Result<student::Model> {
    let txn = db.begin().await?;

    let violation = Violation::find_by_id(violation_id)
        .one(&txn)
        .await?
        .ok_or(Error::ViolationNotFound { id: violation_id })?;

    let student_id = violation.student_id;
    let points = violation.points_deducted;
    violation.delete(&txn).await?;

    let student = student_logic::restore_score_atomic(&txn, student_id, points).await?;

    txn.commit().await?;
    info!(
        "Deleted violation {violation_id}, restored {points} points to {} (score now {})",
        student.student_code, student.current_score
    );
    Ok(student)
}

/// Lists a student's violations, newest first.
pub async fn list_violations_for_student<C>(db: &C, student_id: i64) -> Result<Vec<violation::Model>>
where
    C: ConnectionTrait,
{
    Violation::find()
        .filter(violation::Column::StudentId.eq(student_id))
        .order_by_desc(violation::Column::DateCommitted)
        .order_by_desc(violation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the violations of a logical week with their students, oldest first.
pub async fn list_violations_for_week(
    db: &DatabaseConnection,
    week: i32,
) -> Result<Vec<(violation::Model, Option<student::Model>)>> {
    Violation::find()
        .find_also_related(Student)
        .filter(violation::Column::WeekNumber.eq(week))
        .order_by_asc(violation::Column::DateCommitted)
        .order_by_asc(violation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums the points deducted per student during a logical week.
///
/// Students without violations that week are absent from the map.
pub async fn weekly_deductions<C>(db: &C, week: i32) -> Result<HashMap<i64, i32>>
where
    C: ConnectionTrait,
{
    let rows: Vec<(i64, i64)> = Violation::find()
        .select_only()
        .column(violation::Column::StudentId)
        .column_as(
            Expr::col(violation::Column::PointsDeducted).sum(),
            "total_deducted",
        )
        .filter(violation::Column::WeekNumber.eq(week))
        .group_by(violation::Column::StudentId)
        .into_tuple()
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(student_id, total)| Ok((student_id, i32::try_from(total)?)))
        .collect()
}
