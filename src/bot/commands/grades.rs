//! Grade Discord commands - subjects, grade entry and transcripts.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, say_long},
        core::{
            grade::{self, GradeSlot, GradeType, SubjectInput},
            student,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// School year used when a command leaves it out.
    fn default_school_year(school_year: Option<String>) -> String {
        grade::school_year_or(school_year, chrono::Local::now().date_naive())
    }

    /// Lists subjects with their grade column layout.
    #[poise::command(slash_command)]
    pub async fn subjects(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let all = grade::list_subjects(db).await?;

        if all.is_empty() {
            ctx.say("📘 No subjects yet. Add one with `/add_subject`.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("📘 **Subjects**\n\n");
        for s in &all {
            write!(
                &mut response,
                "`{}` **{}** - TX×{} GK×{} HK×{}",
                s.code, s.name, s.num_tx_columns, s.num_gk_columns, s.num_hk_columns
            )?;
            if let Some(description) = &s.description {
                write!(&mut response, " ({description})")?;
            }
            response.push('\n');
        }
        say_long(ctx, &response).await
    }

    /// Adds a subject.
    #[poise::command(slash_command)]
    pub async fn add_subject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Subject name, e.g. Toán"] name: String,
        #[description = "Subject code, e.g. TOAN"] code: String,
        #[description = "Description (optional)"] description: Option<String>,
        #[description = "Regular (TX) columns, default 3"]
        #[min = 1]
        tx_columns: Option<i32>,
        #[description = "Mid-term (GK) columns, default 1"]
        #[min = 1]
        gk_columns: Option<i32>,
        #[description = "Final (HK) columns, default 1"]
        #[min = 1]
        hk_columns: Option<i32>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let mut input = SubjectInput::new(name, code);
        input.description = description;
        input.num_tx_columns = tx_columns.unwrap_or(input.num_tx_columns);
        input.num_gk_columns = gk_columns.unwrap_or(input.num_gk_columns);
        input.num_hk_columns = hk_columns.unwrap_or(input.num_hk_columns);

        let subject = grade::create_subject(db, input).await?;
        ctx.say(format!(
            "✅ Added subject **{}** (`{}`).",
            subject.name, subject.code
        ))
        .await?;
        Ok(())
    }

    /// Deletes a subject and every grade recorded for it.
    #[poise::command(slash_command)]
    pub async fn delete_subject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Subject code"]
        #[autocomplete = "autocomplete::autocomplete_subject_code"]
        code: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(subject) = grade::get_subject_by_code(db, &code).await? else {
            ctx.say(format!("❌ Subject `{code}` not found.")).await?;
            return Ok(());
        };

        grade::delete_subject(db, subject.id).await?;
        ctx.say(format!(
            "✅ Deleted subject **{}** and its grades.",
            subject.name
        ))
        .await?;
        Ok(())
    }

    /// Records or overwrites one grade.
    #[poise::command(slash_command)]
    #[allow(clippy::too_many_arguments)]
    pub async fn grade(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        student: String,
        #[description = "Subject code"]
        #[autocomplete = "autocomplete::autocomplete_subject_code"]
        subject: String,
        #[description = "TX (regular), GK (mid-term) or HK (final)"]
        #[choices("TX", "GK", "HK")]
        grade_type: &'static str,
        #[description = "Column number within the type"]
        #[min = 1]
        column: i32,
        #[description = "Score from 0 to 10"]
        #[min = 0]
        #[max = 10]
        score: f64,
        #[description = "Semester, default 1"]
        #[min = 1]
        #[max = 2]
        semester: Option<i32>,
        #[description = "School year such as 2024-2025 (defaults to the current one)"]
        school_year: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };
        let Some(subject) = grade::get_subject_by_code(db, &subject).await? else {
            ctx.say(format!("❌ Subject `{subject}` not found.")).await?;
            return Ok(());
        };

        let slot = GradeSlot {
            student_id: target.id,
            subject_id: subject.id,
            grade_type: grade_type.parse::<GradeType>()?,
            column_index: column,
            semester: semester.unwrap_or(1),
            school_year: default_school_year(school_year),
        };
        let saved = grade::record_grade(db, slot, score).await?;

        ctx.say(format!(
            "✅ {} - {} {}{}: **{:.1}** (semester {}, {})",
            target.name,
            subject.code,
            saved.grade_type,
            saved.column_index,
            saved.score,
            saved.semester,
            saved.school_year
        ))
        .await?;
        Ok(())
    }

    /// Shows a student's grades and averages for one semester.
    #[poise::command(slash_command)]
    pub async fn transcript(
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
        let db = &ctx.data().database;

        let Some(target) = student::get_student_by_code(db, &student).await? else {
            ctx.say(format!("❌ Student `{student}` not found.")).await?;
            return Ok(());
        };

        let transcript = grade::build_transcript(
            db,
            target.id,
            semester.unwrap_or(1),
            &default_school_year(school_year),
        )
        .await?;
        say_long(ctx, &grade::format_transcript(&transcript)?).await
    }
}

// Re-export all commands
pub use inner::*;
