//! AI Discord commands - card scanning, the teacher assistant, and generated
//! comments and parent reports.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        ai::{ImagePayload, assistant, card, prompts},
        bot::{BotData, handlers::autocomplete, say_long},
        core::{grade, resolver::Candidate, student, violation, violation_type},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;
    use tracing::info;

    const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

    fn describe(candidate: &Candidate) -> String {
        format!(
            "**{}** (`{}`, {}) - {} pts: {}",
            candidate.student.name,
            candidate.student.student_code,
            candidate.student.student_class,
            candidate.score,
            candidate.explain()
        )
    }

    /// Reads a student ID card photo and finds the student.
    ///
    /// When a rule is given and the card's code matches exactly, the violation
    /// is recorded.
    #[poise::command(slash_command)]
    pub async fn scan_card(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Photo of the student ID card"] image: serenity::Attachment,
        #[description = "Violation to record for the matched student (optional)"]
        #[autocomplete = "autocomplete::autocomplete_rule_name"]
        rule: Option<String>,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let db = &data.database;
        let service = data.ai_service()?;

        let rule = match rule {
            Some(name) => {
                let Some(found) = violation_type::get_rule_by_name(db, &name).await? else {
                    ctx.say(format!("❌ Rule '{name}' not found.")).await?;
                    return Ok(());
                };
                Some(found)
            }
            None => None,
        };

        let payload = ImagePayload {
            mime_type: image
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string()),
            data: image.download().await?,
        };
        let scan = card::scan_card(db, service, payload).await?;

        let mut response = format!(
            "🪪 Card read: name '{}', class '{}', code '{}'\n\n",
            scan.fields.name, scan.fields.class, scan.fields.code
        );

        let Some(best) = &scan.resolution.best else {
            response.push_str("❓ No student on the roster matches this card.");
            ctx.say(response).await?;
            return Ok(());
        };

        if let (Some(rule), Some(confident)) = (&rule, scan.resolution.confident_match()) {
            let applied = violation::apply_violation(db, confident.student.id, rule.id).await?;
            info!(
                "Card scan recorded '{}' for {}",
                rule.name, applied.student.student_code
            );
            writeln!(
                &mut response,
                "⚠️ Recorded **{}** (-{}) for {}.\nConduct score: **{}**",
                rule.name,
                rule.points_deducted,
                describe(confident),
                applied.student.current_score
            )?;
            ctx.say(response).await?;
            return Ok(());
        }

        writeln!(&mut response, "Best match: {}", describe(best))?;
        if !scan.resolution.alternatives.is_empty() {
            response.push_str("\nOther candidates:\n");
            for alt in &scan.resolution.alternatives {
                writeln!(&mut response, "• {}", describe(alt))?;
            }
        }
        if rule.is_some() {
            response.push_str(
                "\nThe match is not certain, so nothing was recorded. \
                 Use `/violate` with the right student code.",
            );
        }

        say_long(ctx, &response).await
    }

    /// Looks a student up by name or code, or asks the AI assistant.
    #[poise::command(slash_command)]
    pub async fn ask(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student name or code, or a question"] message: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let reply = assistant::answer(&data.database, data.ai.as_deref(), &message).await?;
        say_long(ctx, &reply.message()).await
    }

    /// Writes a short conduct comment on a student.
    #[poise::command(slash_command)]
    pub async fn comment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        student: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let db = &data.database;
        let service = data.ai_service()?;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };

        let comment = prompts::generate_student_comment(db, service, target.id).await?;
        say_long(
            ctx,
            &format!("📝 **{}** ({})\n{comment}", target.name, target.student_code),
        )
        .await
    }

    /// Writes a report for a student's parents covering grades and conduct.
    #[poise::command(slash_command)]
    pub async fn parent_report(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        student: String,
        #[description = "Semester, default 1"]
        #[min = 1]
        #[max = 2]
        semester: Option<i32>,
        #[description = "School year such as 2024-2025 (defaults to the current one)"]
        school_year: Option<String>,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let db = &data.database;
        let service = data.ai_service()?;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };

        let semester = semester.unwrap_or(1);
        let school_year = grade::school_year_or(school_year, chrono::Local::now().date_naive());

        let report =
            prompts::generate_parent_report(db, service, target.id, semester, &school_year)
                .await?;
        say_long(
            ctx,
            &format!(
                "👪 **{}** ({}) - semester {semester}, {school_year}\n{report}",
                target.name, target.student_code
            ),
        )
        .await
    }
}

// Re-export all commands
pub use inner::*;
