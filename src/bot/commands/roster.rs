//! Roster Discord commands - listing, adding, editing and deleting students,
//! and registering class labels.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, say_long},
        core::{classroom, student},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Lists students, optionally for one class or matching a search.
    #[poise::command(slash_command)]
    pub async fn students(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this class"]
        #[autocomplete = "autocomplete::autocomplete_class_name"]
        class: Option<String>,
        #[description = "Name or code contains"] search: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let found = student::list_students(db, class.as_deref(), search.as_deref()).await?;

        if found.is_empty() {
            ctx.say("👥 No students found. Add one with `/add_student`.")
                .await?;
            return Ok(());
        }

        let mut response = format!("👥 **Students** ({})\n\n", found.len());
        for s in &found {
            writeln!(
                &mut response,
                "`{}` **{}** - {} | score {}",
                s.student_code, s.name, s.student_class, s.current_score
            )?;
        }

        say_long(ctx, &response).await
    }

    /// Adds a student with a full conduct score.
    #[poise::command(slash_command)]
    pub async fn add_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code, e.g. 12TIN-001"] code: String,
        #[description = "Full name"] name: String,
        #[description = "Class"]
        #[autocomplete = "autocomplete::autocomplete_class_name"]
        class: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let created = student::create_student(db, code, name, class).await?;
        classroom::add_class(db, &created.student_class).await?;

        ctx.say(format!(
            "✅ Added **{}** (`{}`) to {}.",
            created.name, created.student_code, created.student_class
        ))
        .await?;
        Ok(())
    }

    /// Changes a student's code, name or class.
    #[poise::command(slash_command)]
    pub async fn edit_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Current student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        code: String,
        #[description = "New code (optional)"] new_code: Option<String>,
        #[description = "New name (optional)"] name: Option<String>,
        #[description = "New class (optional)"]
        #[autocomplete = "autocomplete::autocomplete_class_name"]
        class: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        if new_code.is_none() && name.is_none() && class.is_none() {
            ctx.say("❌ Please specify at least one field to update (new_code, name, or class).")
                .await?;
            return Ok(());
        }

        let Some(existing) = student::get_student_by_code(db, &code).await? else {
            ctx.say(format!("❌ Student `{code}` not found.")).await?;
            return Ok(());
        };

        let updated = student::update_student(
            db,
            existing.id,
            new_code.unwrap_or(existing.student_code),
            name.unwrap_or(existing.name),
            class.unwrap_or(existing.student_class),
        )
        .await?;
        classroom::add_class(db, &updated.student_class).await?;

        ctx.say(format!(
            "✅ Updated **{}** (`{}`, {}).",
            updated.name, updated.student_code, updated.student_class
        ))
        .await?;
        Ok(())
    }

    /// Deletes a student together with their violations and grades.
    #[poise::command(slash_command)]
    pub async fn delete_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student code"]
        #[autocomplete = "autocomplete::autocomplete_student_code"]
        code: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(existing) = student::get_student_by_code(db, &code).await? else {
            ctx.say(format!("❌ Student `{code}` not found.")).await?;
            return Ok(());
        };

        let deleted = student::delete_student(db, existing.id).await?;
        ctx.say(format!(
            "✅ Deleted **{}** (`{}`). Weekly archives keep their copy.",
            deleted.name, deleted.student_code
        ))
        .await?;
        Ok(())
    }

    /// Registers a class label.
    #[poise::command(slash_command)]
    pub async fn add_class(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Class name, e.g. 12 Tin"] name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let class = classroom::add_class(db, &name).await?;
        let all = classroom::list_classes(db).await?;

        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        ctx.say(format!(
            "✅ Class **{}** is registered.\nClasses: {}",
            class.name,
            names.join(", ")
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
