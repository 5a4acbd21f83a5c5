//! Weekly rollover business logic
//!
//! Closes out a logical week: snapshots every student's standing into
//! `weekly_archives`, resets live scores to 100 and advances the logical week
//! counter. The calendar check compares the current ISO week with the last one
//! recorded in `system_config`, so no background scheduler is needed; the bot
//! runs the check before every command.
//!
//! Executions are serialized by the engine's mutex and the calendar marker is
//! written with a compare-and-set, so two processes sharing a database cannot
//! both roll over for the same calendar week.

use crate::{
    core::{
        clock::{Clock, iso_week_id},
        student as student_logic, system_config,
        violation::weekly_deductions,
    },
    entities::{WeeklyArchive, weekly_archive},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What started a rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverTrigger {
    /// A new real-world calendar week was detected
    Calendar,
    /// An administrator closed the week early
    Manual,
}

/// Represents the result of a completed rollover.
#[derive(Debug, Clone)]
pub struct RolloverResult {
    /// Logical week that was archived
    pub archived_week: i32,
    /// Logical week now in effect
    pub new_week: i32,
    /// Archive rows written for `archived_week`, in roster order
    pub archived: Vec<weekly_archive::Model>,
    /// Calendar week marker recorded, `None` for manual closes
    pub week_id: Option<String>,
    /// What started the rollover
    pub trigger: RolloverTrigger,
}

/// Checks whether the calendar has moved to a new ISO week since the last
/// recorded rollover. Returns true if no week was ever recorded.
///
/// This only reads, so it is safe to call on every request.
pub async fn is_rollover_due<C>(db: &C, clock: &dyn Clock) -> Result<bool>
where
    C: ConnectionTrait,
{
    let current = iso_week_id(clock.today());
    let last_seen = system_config::get_last_reset_week_id(db).await?;
    Ok(last_seen.is_none_or(|last| last != current))
}

/// Replaces the snapshot of `week` with one row per student.
///
/// `final_score` is the live score and `total_deductions` the sum of the
/// week's recorded violation points.
async fn archive_week<C>(db: &C, week: i32) -> Result<Vec<weekly_archive::Model>>
where
    C: ConnectionTrait,
{
    WeeklyArchive::delete_many()
        .filter(weekly_archive::Column::WeekNumber.eq(week))
        .exec(db)
        .await?;

    let deductions = weekly_deductions(db, week).await?;
    let students = student_logic::get_all_students(db).await?;

    let now = Utc::now();
    let mut archived = Vec::with_capacity(students.len());
    for s in students {
        let row = weekly_archive::ActiveModel {
            week_number: Set(week),
            student_id: Set(Some(s.id)),
            student_name: Set(s.name),
            student_code: Set(s.student_code),
            student_class: Set(s.student_class),
            final_score: Set(s.current_score),
            total_deductions: Set(deductions.get(&s.id).copied().unwrap_or(0)),
            created_at: Set(now),
            ..Default::default()
        };
        archived.push(row.insert(db).await?);
    }

    Ok(archived)
}

/// Archive, reset and advance. Shared by calendar and manual rollovers.
async fn close_out_week<C>(db: &C, week: i32) -> Result<Vec<weekly_archive::Model>>
where
    C: ConnectionTrait,
{
    let archived = archive_week(db, week).await?;
    student_logic::reset_all_scores(db).await?;
    system_config::set_current_week(db, week + 1).await?;
    Ok(archived)
}

/// Runs rollovers one at a time against an injected clock.
pub struct RolloverEngine {
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for RolloverEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolloverEngine")
            .field("today", &self.clock.today())
            .finish_non_exhaustive()
    }
}

impl RolloverEngine {
    /// Creates an engine reading "now" from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lock: Mutex::new(()),
        }
    }

    /// ISO week identifier for the clock's current date.
    #[must_use]
    pub fn current_week_id(&self) -> String {
        iso_week_id(self.clock.today())
    }

    /// See [`is_rollover_due`].
    pub async fn is_rollover_due<C>(&self, db: &C) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        is_rollover_due(db, self.clock.as_ref()).await
    }

    /// Closes logical week `week` and marks the current calendar week as handled.
    ///
    /// All four steps (archive, reset, advance, mark) share one transaction;
    /// any failure leaves the database untouched.
    ///
    /// # Errors
    /// Returns [`Error::RolloverConflict`] if another process marked the
    /// calendar week first, or any database error.
    pub async fn run_rollover(&self, db: &DatabaseConnection, week: i32) -> Result<RolloverResult> {
        let _guard = self.lock.lock().await;
        let observed = system_config::get_last_reset_week_id(db).await?;
        self.execute(db, Some(week), observed).await
    }

    /// Runs a rollover if the calendar week changed. Returns `None` when no
    /// rollover was due or another process got there first.
    pub async fn check_and_run(&self, db: &DatabaseConnection) -> Result<Option<RolloverResult>> {
        if !self.is_rollover_due(db).await? {
            return Ok(None);
        }

        let _guard = self.lock.lock().await;

        // Another task may have finished a rollover while we waited
        let observed = system_config::get_last_reset_week_id(db).await?;
        let current = self.current_week_id();
        if observed.as_deref() == Some(current.as_str()) {
            return Ok(None);
        }

        match self.execute(db, None, observed).await {
            Ok(result) => Ok(Some(result)),
            Err(Error::RolloverConflict { week_id }) => {
                warn!("Rollover for {week_id} already applied elsewhere, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `observed` is the marker value the caller based its decision on; the
    /// marker is only replaced if it still holds that value.
    async fn execute(
        &self,
        db: &DatabaseConnection,
        week: Option<i32>,
        observed: Option<String>,
    ) -> Result<RolloverResult> {
        let week_id = self.current_week_id();
        let txn = db.begin().await?;

        let week = match week {
            Some(w) => w,
            None => system_config::get_current_week(&txn).await?,
        };
        let archived = close_out_week(&txn, week).await?;

        let marked = system_config::compare_and_set(
            &txn,
            system_config::LAST_RESET_WEEK_KEY,
            observed.as_deref(),
            &week_id,
        )
        .await?;
        if !marked {
            // Dropping the transaction rolls back the archive, reset and advance
            return Err(Error::RolloverConflict { week_id });
        }

        txn.commit().await?;
        info!(
            "Weekly rollover for {week_id}: archived week {week} ({} students), now week {}",
            archived.len(),
            week + 1
        );

        Ok(RolloverResult {
            archived_week: week,
            new_week: week + 1,
            archived,
            week_id: Some(week_id),
            trigger: RolloverTrigger::Calendar,
        })
    }

    /// Closes the current logical week immediately, regardless of the calendar.
    ///
    /// Uses the same archive/reset/advance steps as the calendar rollover but
    /// leaves the calendar marker alone, so the next real week still rolls over.
    pub async fn close_week(&self, db: &DatabaseConnection) -> Result<RolloverResult> {
        let _guard = self.lock.lock().await;
        let txn = db.begin().await?;

        let week = system_config::get_current_week(&txn).await?;
        let archived = close_out_week(&txn, week).await?;

        txn.commit().await?;
        info!(
            "Week {week} closed manually ({} students archived)",
            archived.len()
        );

        Ok(RolloverResult {
            archived_week: week,
            new_week: week + 1,
            archived,
            week_id: None,
            trigger: RolloverTrigger::Manual,
        })
    }
}

/// Formats a rollover result into a human-readable summary string.
pub fn format_rollover_summary(result: &RolloverResult) -> Result<String> {
    use std::fmt::Write;

    let trigger = match result.trigger {
        RolloverTrigger::Calendar => "Weekly rollover",
        RolloverTrigger::Manual => "Week closed",
    };
    let mut summary = format!(
        "{trigger} - Week {} archived, now week {}\n",
        result.archived_week, result.new_week
    );
    if let Some(week_id) = &result.week_id {
        writeln!(summary, "  Calendar week: {week_id}")?;
    }
    writeln!(summary, "  Students archived: {}\n", result.archived.len())?;

    for row in &result.archived {
        writeln!(
            summary,
            "  {} ({}, {}) | final {} | -{}",
            row.student_name,
            row.student_code,
            row.student_class,
            row.final_score,
            row.total_deductions
        )?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        clock::FixedClock, student::MAX_SCORE, student::get_student_by_id, violation,
    };
    use crate::test_utils::*;
    use chrono::NaiveDate;
    use sea_orm::QueryOrder;

    fn engine_on(year: i32, month: u32, day: u32) -> RolloverEngine {
        RolloverEngine::new(Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        )))
    }

    async fn archive_rows(
        db: &DatabaseConnection,
        week: i32,
    ) -> Result<Vec<weekly_archive::Model>> {
        WeeklyArchive::find()
            .filter(weekly_archive::Column::WeekNumber.eq(week))
            .order_by_asc(weekly_archive::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    #[tokio::test]
    async fn test_due_when_no_marker() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine_on(2024, 3, 6);

        assert!(engine.is_rollover_due(&db).await?);
        // Pure predicate: asking twice changes nothing
        assert!(engine.is_rollover_due(&db).await?);
        assert!(system_config::get_last_reset_week_id(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_not_due_within_same_calendar_week() -> Result<()> {
        let db = setup_test_db().await?;
        engine_on(2024, 3, 4).check_and_run(&db).await?.unwrap();

        let later_same_week = engine_on(2024, 3, 10);
        assert!(!later_same_week.is_rollover_due(&db).await?);
        assert!(!later_same_week.is_rollover_due(&db).await?);
        assert!(later_same_week.check_and_run(&db).await?.is_none());

        assert!(engine_on(2024, 3, 11).is_rollover_due(&db).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_end_to_end_week_scenario() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let b = create_test_student(&db, "X2", "Bình", "12Tin").await?;
        let rule = create_test_rule(&db, "Đi muộn", 5).await?;
        system_config::set_current_week(&db, 3).await?;

        violation::apply_violation(&db, a.id, rule.id).await?;
        let second = violation::apply_violation(&db, a.id, rule.id).await?;
        assert_eq!(second.student.current_score, 90);
        assert_eq!(violation::list_violations_for_week(&db, 3).await?.len(), 2);

        let engine = engine_on(2024, 9, 16);
        let result = engine.run_rollover(&db, 3).await?;
        assert_eq!(result.archived_week, 3);
        assert_eq!(result.new_week, 4);
        assert_eq!(result.week_id.as_deref(), Some("2024-W38"));

        let rows = archive_rows(&db, 3).await?;
        assert_eq!(rows.len(), 2);
        let row_a = rows.iter().find(|r| r.student_code == "X1").unwrap();
        assert_eq!(row_a.final_score, 90);
        assert_eq!(row_a.total_deductions, 10);
        let row_b = rows.iter().find(|r| r.student_code == "X2").unwrap();
        assert_eq!(row_b.final_score, 100);
        assert_eq!(row_b.total_deductions, 0);
        assert_eq!(row_b.student_class, "12Tin");

        for id in [a.id, b.id] {
            let s = get_student_by_id(&db, id).await?.unwrap();
            assert_eq!(s.current_score, MAX_SCORE);
        }
        assert_eq!(system_config::get_current_week(&db).await?, 4);
        assert!(!engine.is_rollover_due(&db).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_final_score_matches_deductions() -> Result<()> {
        let db = setup_test_db().await?;
        let late = create_test_rule(&db, "Đi muộn", 2).await?;
        let noisy = create_test_rule(&db, "Nói chuyện", 7).await?;
        let mut students = Vec::new();
        for i in 0..4 {
            students.push(create_test_student(&db, &format!("S{i}"), "HS", "12 Tin").await?);
        }
        violation::apply_violation(&db, students[0].id, late.id).await?;
        violation::apply_violation(&db, students[1].id, noisy.id).await?;
        violation::apply_violation(&db, students[1].id, late.id).await?;
        violation::apply_violation(&db, students[3].id, noisy.id).await?;

        let result = engine_on(2024, 5, 1).run_rollover(&db, 1).await?;

        for row in &result.archived {
            assert_eq!(row.final_score, MAX_SCORE - row.total_deductions);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_week_counter_advances_by_one_per_rollover() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "X1", "An", "12 Tin").await?;

        let mut expected = system_config::get_current_week(&db).await?;
        for day in [1, 8, 15] {
            let result = engine_on(2024, 7, day).check_and_run(&db).await?.unwrap();
            assert_eq!(result.archived_week, expected);
            expected += 1;
            assert_eq!(system_config::get_current_week(&db).await?, expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rearchiving_week_replaces_snapshot() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "X1", "An", "12 Tin").await?;
        create_test_student(&db, "X2", "Bình", "12 Tin").await?;
        let engine = engine_on(2024, 4, 2);

        system_config::set_current_week(&db, 5).await?;
        engine.close_week(&db).await?;
        system_config::set_current_week(&db, 5).await?;
        engine.close_week(&db).await?;

        assert_eq!(archive_rows(&db, 5).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_manual_close_leaves_calendar_marker() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let rule = create_test_rule(&db, "Đi muộn", 4).await?;
        violation::apply_violation(&db, student.id, rule.id).await?;
        let engine = engine_on(2024, 4, 2);

        let result = engine.close_week(&db).await?;

        assert_eq!(result.trigger, RolloverTrigger::Manual);
        assert_eq!(result.archived[0].final_score, 96);
        assert_eq!(system_config::get_current_week(&db).await?, 2);
        assert_eq!(
            get_student_by_id(&db, student.id).await?.unwrap().current_score,
            MAX_SCORE
        );
        assert!(system_config::get_last_reset_week_id(&db).await?.is_none());
        assert!(engine.is_rollover_due(&db).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_rollover_rolls_everything_back() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let rule = create_test_rule(&db, "Đi muộn", 5).await?;
        violation::apply_violation(&db, student.id, rule.id).await?;

        // Advancing the week fails after the archive and reset steps ran
        db.execute_unprepared("DROP TABLE system_config").await?;

        let engine = engine_on(2024, 4, 2);
        assert!(engine.run_rollover(&db, 1).await.is_err());

        assert!(archive_rows(&db, 1).await?.is_empty());
        assert_eq!(
            get_student_by_id(&db, student.id).await?.unwrap().current_score,
            95
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_check_stays_due() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "X1", "An", "12 Tin").await?;
        system_config::set_value(&db, system_config::CURRENT_WEEK_KEY, "garbage").await?;
        let engine = engine_on(2024, 4, 2);

        assert!(engine.check_and_run(&db).await.is_err());
        assert!(engine.is_rollover_due(&db).await?);

        system_config::set_current_week(&db, 2).await?;
        let result = engine.check_and_run(&db).await?.unwrap();
        assert_eq!(result.archived_week, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_checks_roll_over_once() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "X1", "An", "12 Tin").await?;
        let engine = Arc::new(engine_on(2024, 4, 2));

        let (first, second) = tokio::join!(engine.check_and_run(&db), engine.check_and_run(&db));

        let ran = [first?, second?].into_iter().flatten().count();
        assert_eq!(ran, 1);
        assert_eq!(system_config::get_current_week(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_marker_written_elsewhere_is_a_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "X1", "An", "12 Tin").await?;
        let rule = create_test_rule(&db, "Đi muộn", 5).await?;
        violation::apply_violation(&db, student.id, rule.id).await?;
        let engine = engine_on(2024, 4, 2);

        // We decided based on "no marker", but another process has since written one
        system_config::set_value(&db, system_config::LAST_RESET_WEEK_KEY, "2024-W14").await?;
        let result = engine.execute(&db, Some(1), None).await;

        assert!(matches!(result, Err(Error::RolloverConflict { .. })));
        assert_eq!(system_config::get_current_week(&db).await?, 1);
        assert!(archive_rows(&db, 1).await?.is_empty());
        assert_eq!(
            get_student_by_id(&db, student.id).await?.unwrap().current_score,
            95
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_roster_still_advances() -> Result<()> {
        let db = setup_test_db().await?;

        let result = engine_on(2024, 4, 2).check_and_run(&db).await?.unwrap();

        assert!(result.archived.is_empty());
        assert_eq!(result.new_week, 2);
        Ok(())
    }

    #[test]
    fn test_format_rollover_summary() -> Result<()> {
        let result = RolloverResult {
            archived_week: 3,
            new_week: 4,
            week_id: Some("2024-W38".to_string()),
            trigger: RolloverTrigger::Calendar,
            archived: vec![weekly_archive::Model {
                id: 1,
                week_number: 3,
                student_id: Some(1),
                student_name: "An".to_string(),
                student_code: "X1".to_string(),
                student_class: "12 Tin".to_string(),
                final_score: 90,
                total_deductions: 10,
                created_at: Utc::now(),
            }],
        };

        let summary = format_rollover_summary(&result)?;

        assert!(summary.contains("Week 3 archived, now week 4"));
        assert!(summary.contains("2024-W38"));
        assert!(summary.contains("An (X1, 12 Tin) | final 90 | -10"));
        Ok(())
    }
}
