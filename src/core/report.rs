//! Report generation business logic.
//!
//! This module builds the dashboard statistics, weekly violation reports,
//! archived week views and per-student timelines. All functions are
//! framework-agnostic and return structured data; the `format_*` helpers turn
//! that data into text for the bot layer.

use crate::{
    core::{student::MAX_SCORE, student as student_logic, violation as violation_logic},
    entities::{Student, Violation, WeeklyArchive, student, violation, weekly_archive},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, JoinType, Order, QueryOrder, QuerySelect, RelationTrait, prelude::*,
    sea_query::Expr,
};
use std::{collections::BTreeMap, fmt::Write as _};

/// Number of rule names listed in the dashboard
pub const TOP_VIOLATIONS: u64 = 5;
/// Violation rows printed before a weekly report is cut short
pub const MAX_REPORT_ROWS: usize = 25;

/// Conduct tier of a live score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConductTier {
    /// 90 and above
    Good,
    /// 70 to 89
    Fair,
    /// Below 70
    NeedsEffort,
}

impl ConductTier {
    /// Lowest score counted as [`ConductTier::Good`]
    pub const GOOD_FROM: i32 = 90;
    /// Lowest score counted as [`ConductTier::Fair`]
    pub const FAIR_FROM: i32 = 70;

    /// Tier for a score.
    #[must_use]
    pub const fn of(score: i32) -> Self {
        if score >= Self::GOOD_FROM {
            Self::Good
        } else if score >= Self::FAIR_FROM {
            Self::Fair
        } else {
            Self::NeedsEffort
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsEffort => "Needs effort",
        }
    }
}

/// Dashboard numbers for the whole school or one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    /// Class the stats are restricted to, if any
    pub class_filter: Option<String>,
    /// Students scoring 90 or more
    pub good: u64,
    /// Students scoring 70 to 89
    pub fair: u64,
    /// Students scoring below 70
    pub needs_effort: u64,
    /// Most frequent rule names with their counts, most frequent first
    pub top_violations: Vec<(String, i64)>,
}

/// Counts students per conduct tier and finds the most frequent violations.
///
/// Violations of every week are counted, matching what the dashboard has
/// always shown.
pub async fn dashboard_stats(
    db: &DatabaseConnection,
    class_filter: Option<&str>,
) -> Result<DashboardStats> {
    let class_filter = class_filter
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string);

    let students = || {
        let query = Student::find();
        match &class_filter {
            Some(c) => query.filter(student::Column::StudentClass.eq(c.as_str())),
            None => query,
        }
    };

    let good = students()
        .filter(student::Column::CurrentScore.gte(ConductTier::GOOD_FROM))
        .count(db)
        .await?;
    let fair = students()
        .filter(student::Column::CurrentScore.gte(ConductTier::FAIR_FROM))
        .filter(student::Column::CurrentScore.lt(ConductTier::GOOD_FROM))
        .count(db)
        .await?;
    let needs_effort = students()
        .filter(student::Column::CurrentScore.lt(ConductTier::FAIR_FROM))
        .count(db)
        .await?;

    let mut top = Violation::find()
        .select_only()
        .column(violation::Column::ViolationTypeName)
        .column_as(
            Expr::col((violation::Entity, violation::Column::Id)).count(),
            "violation_count",
        );
    if let Some(c) = &class_filter {
        top = top
            .join(JoinType::InnerJoin, violation::Relation::Student.def())
            .filter(student::Column::StudentClass.eq(c.as_str()));
    }
    let top_violations: Vec<(String, i64)> = top
        .group_by(violation::Column::ViolationTypeName)
        .order_by(Expr::cust("violation_count"), Order::Desc)
        .order_by_asc(violation::Column::ViolationTypeName)
        .limit(TOP_VIOLATIONS)
        .into_tuple()
        .all(db)
        .await?;

    Ok(DashboardStats {
        class_filter,
        good,
        fair,
        needs_effort,
        top_violations,
    })
}

/// One class's standing for a week.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRanking {
    /// Class label
    pub class_name: String,
    /// Students in the class
    pub student_count: usize,
    /// Points deducted across the class
    pub total_deductions: i32,
    /// Mean score across the class
    pub average_score: f64,
}

/// Orders classes by fewest deductions, then by highest average, then by name.
fn sort_rankings(rankings: &mut [ClassRanking]) {
    rankings.sort_by(|a, b| {
        a.total_deductions
            .cmp(&b.total_deductions)
            .then(b.average_score.total_cmp(&a.average_score))
            .then_with(|| a.class_name.cmp(&b.class_name))
    });
}

/// Ranks classes from `(class, score, deductions)` triples, one per student.
#[must_use]
pub fn rank_classes<'a, I>(entries: I) -> Vec<ClassRanking>
where
    I: IntoIterator<Item = (&'a str, i32, i32)>,
{
    let mut by_class: BTreeMap<&str, (usize, i32, i64)> = BTreeMap::new();
    for (class_name, score, deductions) in entries {
        let entry = by_class.entry(class_name).or_default();
        entry.0 += 1;
        entry.1 += deductions;
        entry.2 += i64::from(score);
    }

    let mut rankings: Vec<ClassRanking> = by_class
        .into_iter()
        .map(|(class_name, (count, deductions, score_sum))| {
            #[allow(clippy::cast_precision_loss)]
            let average_score = score_sum as f64 / count as f64;
            ClassRanking {
                class_name: class_name.to_string(),
                student_count: count,
                total_deductions: deductions,
                average_score,
            }
        })
        .collect();
    sort_rankings(&mut rankings);
    rankings
}

/// Violations of one logical week with totals and class rankings.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    /// Logical week reported on
    pub week: i32,
    /// Violations with their students, oldest first
    pub rows: Vec<(violation::Model, Option<student::Model>)>,
    /// Sum of points deducted
    pub total_points: i32,
    /// Number of violations
    pub total_count: usize,
    /// Classes ranked by fewest deductions this week
    pub class_rankings: Vec<ClassRanking>,
}

/// Builds the report for a logical week.
///
/// Class rankings cover every class on the current roster, so a class with no
/// violations ranks first with zero deductions. The average is taken over
/// `100 − week deductions`, which is the live score for the current week.
pub async fn weekly_report(db: &DatabaseConnection, week: i32) -> Result<WeeklyReport> {
    let rows = violation_logic::list_violations_for_week(db, week).await?;
    let deductions = violation_logic::weekly_deductions(db, week).await?;
    let roster = student_logic::get_all_students(db).await?;

    let total_points = rows.iter().map(|(v, _)| v.points_deducted).sum();
    let total_count = rows.len();
    let class_rankings = rank_classes(roster.iter().map(|s| {
        let deducted = deductions.get(&s.id).copied().unwrap_or(0);
        (s.student_class.as_str(), MAX_SCORE - deducted, deducted)
    }));

    Ok(WeeklyReport {
        week,
        rows,
        total_points,
        total_count,
        class_rankings,
    })
}

/// Logical weeks that have archive rows, newest first.
pub async fn archived_weeks(db: &DatabaseConnection) -> Result<Vec<i32>> {
    WeeklyArchive::find()
        .select_only()
        .column(weekly_archive::Column::WeekNumber)
        .distinct()
        .order_by_desc(weekly_archive::Column::WeekNumber)
        .into_tuple()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Archive rows of one logical week, ordered by class then code.
pub async fn archive_for_week(
    db: &DatabaseConnection,
    week: i32,
) -> Result<Vec<weekly_archive::Model>> {
    WeeklyArchive::find()
        .filter(weekly_archive::Column::WeekNumber.eq(week))
        .order_by_asc(weekly_archive::Column::StudentClass)
        .order_by_asc(weekly_archive::Column::StudentCode)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Class rankings computed from archived snapshots.
#[must_use]
pub fn archive_class_rankings(rows: &[weekly_archive::Model]) -> Vec<ClassRanking> {
    rank_classes(
        rows.iter()
            .map(|r| (r.student_class.as_str(), r.final_score, r.total_deductions)),
    )
}

/// Violations of one student in one logical week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSummary {
    /// Logical week
    pub week_number: i32,
    /// Violations that week
    pub count: usize,
    /// Points deducted that week
    pub total_deducted: i32,
}

/// A point on a student's score chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePoint {
    /// When the score changed; `None` for the starting point
    pub at: Option<DateTime<Utc>>,
    /// Score after the change
    pub score: i32,
}

/// A student's violation history.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentTimeline {
    /// The student
    pub student: student::Model,
    /// Every violation, newest first
    pub violations: Vec<violation::Model>,
    /// Per-week totals, oldest week first
    pub by_week: Vec<WeekSummary>,
    /// Rule names with counts, most frequent first
    pub by_type: Vec<(String, usize)>,
    /// Score starting at 100 and lowered by each violation in order
    pub trajectory: Vec<ScorePoint>,
}

/// Groups violations by logical week, oldest week first.
#[must_use]
pub fn summarize_by_week(violations: &[violation::Model]) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<i32, WeekSummary> = BTreeMap::new();
    for v in violations {
        let summary = weeks.entry(v.week_number).or_insert(WeekSummary {
            week_number: v.week_number,
            count: 0,
            total_deducted: 0,
        });
        summary.count += 1;
        summary.total_deducted += v.points_deducted;
    }
    weeks.into_values().collect()
}

/// Counts violations per rule name, most frequent first, ties by name.
#[must_use]
pub fn summarize_by_type(violations: &[violation::Model]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in violations {
        *counts.entry(v.violation_type_name.as_str()).or_default() += 1;
    }
    let mut by_type: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    by_type.sort_by(|a, b| b.1.cmp(&a.1));
    by_type
}

/// Replays violations in chronological order starting from 100.
///
/// This ignores rollovers, so it shows the cumulative conduct trend rather
/// than the live score.
#[must_use]
pub fn score_trajectory(violations: &[violation::Model]) -> Vec<ScorePoint> {
    let mut ordered: Vec<&violation::Model> = violations.iter().collect();
    ordered.sort_by_key(|v| (v.date_committed, v.id));

    let mut score = MAX_SCORE;
    let mut points = vec![ScorePoint { at: None, score }];
    for v in ordered {
        score -= v.points_deducted;
        points.push(ScorePoint {
            at: Some(v.date_committed),
            score,
        });
    }
    points
}

/// Builds the violation timeline for one student.
pub async fn student_timeline(db: &DatabaseConnection, student_id: i64) -> Result<StudentTimeline> {
    let student = student_logic::get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            code: student_id.to_string(),
        })?;
    let violations = violation_logic::list_violations_for_student(db, student_id).await?;

    Ok(StudentTimeline {
        by_week: summarize_by_week(&violations),
        by_type: summarize_by_type(&violations),
        trajectory: score_trajectory(&violations),
        student,
        violations,
    })
}

/// Formats dashboard stats for display.
pub fn format_dashboard(stats: &DashboardStats) -> Result<String> {
    let scope = stats.class_filter.as_deref().unwrap_or("all classes");
    let mut out = format!("**Conduct overview ({scope})**\n");
    writeln!(
        out,
        "🟢 {}: {} | 🟡 {}: {} | 🔴 {}: {}",
        ConductTier::Good.label(),
        stats.good,
        ConductTier::Fair.label(),
        stats.fair,
        ConductTier::NeedsEffort.label(),
        stats.needs_effort
    )?;

    if stats.top_violations.is_empty() {
        out.push_str("\nNo violations recorded.");
    } else {
        out.push_str("\n**Most frequent violations**\n");
        for (i, (name, count)) in stats.top_violations.iter().enumerate() {
            writeln!(out, "{}. {name} ({count})", i + 1)?;
        }
    }
    Ok(out)
}

fn write_rankings(out: &mut String, rankings: &[ClassRanking]) -> Result<()> {
    if rankings.is_empty() {
        return Ok(());
    }
    out.push_str("\n**Class rankings**\n");
    for (i, r) in rankings.iter().enumerate() {
        writeln!(
            out,
            "{}. {} | -{} pts | avg {:.1} | {} students",
            i + 1,
            r.class_name,
            r.total_deductions,
            r.average_score,
            r.student_count
        )?;
    }
    Ok(())
}

/// Formats a weekly report, listing at most [`MAX_REPORT_ROWS`] violations.
pub fn format_weekly_report(report: &WeeklyReport) -> Result<String> {
    let mut out = format!(
        "**Week {} report**\n{} violations, {} points deducted\n\n",
        report.week, report.total_count, report.total_points
    );

    for (v, s) in report.rows.iter().take(MAX_REPORT_ROWS) {
        let who = s.as_ref().map_or_else(
            || format!("student #{}", v.student_id),
            |s| format!("{} ({}, {})", s.name, s.student_code, s.student_class),
        );
        writeln!(
            out,
            "• {} | {who} | {} (-{})",
            v.date_committed.format("%d/%m"),
            v.violation_type_name,
            v.points_deducted
        )?;
    }
    if report.rows.len() > MAX_REPORT_ROWS {
        writeln!(out, "… and {} more", report.rows.len() - MAX_REPORT_ROWS)?;
    }

    write_rankings(&mut out, &report.class_rankings)?;
    Ok(out)
}

/// Formats the archived snapshot of one week.
pub fn format_archive(week: i32, rows: &[weekly_archive::Model]) -> Result<String> {
    if rows.is_empty() {
        return Ok(format!("No archive for week {week}."));
    }

    let mut out = format!("**Week {week} archive** ({} students)\n", rows.len());
    for r in rows.iter().take(MAX_REPORT_ROWS) {
        writeln!(
            out,
            "• {} ({}, {}): {} (-{})",
            r.student_name, r.student_code, r.student_class, r.final_score, r.total_deductions
        )?;
    }
    if rows.len() > MAX_REPORT_ROWS {
        writeln!(out, "… and {} more", rows.len() - MAX_REPORT_ROWS)?;
    }

    write_rankings(&mut out, &archive_class_rankings(rows))?;
    Ok(out)
}

/// Formats a student's timeline.
pub fn format_timeline(timeline: &StudentTimeline) -> Result<String> {
    let s = &timeline.student;
    let mut out = format!(
        "**{} ({}, {})**\nCurrent score: **{}** ({})\n",
        s.name,
        s.student_code,
        s.student_class,
        s.current_score,
        ConductTier::of(s.current_score).label()
    );

    if timeline.violations.is_empty() {
        out.push_str("\nNo violations recorded. 🎉");
        return Ok(out);
    }

    out.push_str("\n**By week**\n");
    for w in &timeline.by_week {
        writeln!(
            out,
            "Week {}: {} violations, -{}",
            w.week_number, w.count, w.total_deducted
        )?;
    }

    out.push_str("\n**By type**\n");
    for (name, count) in &timeline.by_type {
        writeln!(out, "{name}: {count}")?;
    }

    out.push_str("\n**Recent**\n");
    for v in timeline.violations.iter().take(10) {
        writeln!(
            out,
            "`#{}` {} | week {} | {} (-{})",
            v.id,
            v.date_committed.format("%d/%m/%Y"),
            v.week_number,
            v.violation_type_name,
            v.points_deducted
        )?;
    }

    let trend: Vec<String> = timeline
        .trajectory
        .iter()
        .map(|p| p.score.to_string())
        .collect();
    write!(out, "\nTrend: {}", trend.join(" → "))?;
    Ok(out)
}
