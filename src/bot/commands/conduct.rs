//! Conduct Discord commands - recording and undoing violations, standings and
//! per-student timelines.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, say_long},
        core::{report, student, violation, violation_type},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Splits a list of codes typed as `A, B C` into separate codes.
    fn split_codes(input: &str) -> Vec<String> {
        input
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Records a violation for one student.
    #[poise::command(slash_command)]
    pub async fn violate(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        student: String,
        #[description = "Violation rule"]
        #[autocomplete = "autocomplete::autocomplete_rule_name"]
        rule: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };
        let Some(rule) = violation_type::get_rule_by_name(db, &rule).await? else {
            ctx.say(format!("❌ Rule '{rule}' not found.")).await?;
            return Ok(());
        };

        let applied = violation::apply_violation(db, target.id, rule.id).await?;
        ctx.say(format!(
            "⚠️ **{}** (`{}`): {} (-{}) in week {}.\nConduct score: **{}** (violation #{})",
            applied.student.name,
            applied.student.student_code,
            applied.violation.violation_type_name,
            applied.violation.points_deducted,
            applied.violation.week_number,
            applied.student.current_score,
            applied.violation.id
        ))
        .await?;
        Ok(())
    }

    /// Records the same violation for several students at once.
    #[poise::command(slash_command)]
    pub async fn violate_many(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student codes separated by commas or spaces"] codes: String,
        #[description = "Violation rule"]
        #[autocomplete = "autocomplete::autocomplete_rule_name"]
        rule: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let codes = split_codes(&codes);
        if codes.is_empty() {
            ctx.say("❌ Please list at least one student code.").await?;
            return Ok(());
        }
        let Some(rule) = violation_type::get_rule_by_name(db, &rule).await? else {
            ctx.say(format!("❌ Rule '{rule}' not found.")).await?;
            return Ok(());
        };

        let outcome = violation::apply_violation_to_codes(db, &codes, rule.id).await?;

        let mut response = format!(
            "⚠️ **{}** (-{}) recorded for {} student(s):\n",
            rule.name,
            rule.points_deducted,
            outcome.applied.len()
        );
        for applied in &outcome.applied {
            writeln!(
                &mut response,
                "• {} (`{}`) → **{}**",
                applied.student.name, applied.student.student_code, applied.student.current_score
            )?;
        }
        if !outcome.unknown_codes.is_empty() {
            writeln!(
                &mut response,
                "\n❓ Unknown codes skipped: {}",
                outcome.unknown_codes.join(", ")
            )?;
        }

        say_long(ctx, &response).await
    }

    /// Deletes a violation and gives the points back.
    #[poise::command(slash_command)]
    pub async fn undo_violation(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Violation number"] id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let restored = violation::delete_violation(db, id).await?;

        ctx.say(format!(
            "↩️ Removed violation #{id}. **{}** (`{}`) is back to **{}**.",
            restored.name, restored.student_code, restored.current_score
        ))
        .await?;
        Ok(())
    }

    /// Shows conduct tiers, frequent violations and current scores.
    #[poise::command(slash_command)]
    pub async fn standings(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this class"]
        #[autocomplete = "autocomplete::autocomplete_class_name"]
        class: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let stats = report::dashboard_stats(db, class.as_deref()).await?;
        let mut response = report::format_dashboard(&stats)?;

        let mut students = student::list_students(db, stats.class_filter.as_deref(), None).await?;
        students.sort_by(|a, b| {
            b.current_score
                .cmp(&a.current_score)
                .then_with(|| a.student_code.cmp(&b.student_code))
        });
        if !students.is_empty() {
            response.push_str("\n**Scores**\n");
            for s in &students {
                writeln!(
                    &mut response,
                    "`{}` {} - **{}** ({})",
                    s.student_code,
                    s.name,
                    s.current_score,
                    report::ConductTier::of(s.current_score).label()
                )?;
            }
        }

        say_long(ctx, &response).await
    }

    /// Shows a student's violation history and score over time.
    #[poise::command(slash_command)]
    pub async fn timeline(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        student: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };

        let timeline = report::student_timeline(db, target.id).await?;
        say_long(ctx, &report::format_timeline(&timeline)?).await
    }

    #[cfg(test)]
    mod tests {
        use super::split_codes;

        #[test]
        fn test_split_codes() {
            assert_eq!(
                split_codes(" 12TIN-001, 12TIN-002;12TIN-003  12TIN-004,,"),
                vec!["12TIN-001", "12TIN-002", "12TIN-003", "12TIN-004"]
            );
            assert!(split_codes(" , ").is_empty());
        }
    }
}

// Re-export all commands
pub use inner::*;
