//! Week Discord commands - week status, rollovers, archives and weekly reports.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, rollover_message, say_long},
        core::{report, system_config},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Shows the logical week and the calendar week.
    #[poise::command(slash_command)]
    pub async fn week(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let db = &data.database;

        let current = system_config::get_current_week(db).await?;
        let last_reset = system_config::get_last_reset_week_id(db).await?;
        let due = data.rollover.is_rollover_due(db).await?;

        let status = if due { "due" } else { "up to date" };
        ctx.say(format!(
            "📅 **Week {current}**\nCalendar week: {}\nLast rollover: {}\nRollover: {status}",
            data.rollover.current_week_id(),
            last_reset.as_deref().unwrap_or("never")
        ))
        .await?;
        Ok(())
    }

    /// Runs the calendar rollover now if a new week has started.
    #[poise::command(slash_command)]
    pub async fn rollover(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let db = &data.database;

        match data.rollover.check_and_run(db).await? {
            Some(result) => say_long(ctx, &rollover_message(&result)?).await,
            None => {
                let current = system_config::get_current_week(db).await?;
                ctx.say(format!(
                    "ℹ️ Calendar week {} is already rolled over. Current week: {current}.",
                    data.rollover.current_week_id()
                ))
                .await?;
                Ok(())
            }
        }
    }

    /// Archives the current week, resets scores and starts the next week.
    #[poise::command(slash_command)]
    pub async fn close_week(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let result = data.rollover.close_week(&data.database).await?;
        say_long(ctx, &rollover_message(&result)?).await
    }

    /// Sets the logical week counter.
    #[poise::command(slash_command)]
    pub async fn set_week(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Week number"]
        #[min = 1]
        week: i32,
    ) -> Result<()> {
        let db = &ctx.data().database;
        system_config::set_current_week(db, week).await?;

        ctx.say(format!("✅ Current week set to **{week}**.")).await?;
        Ok(())
    }

    /// Shows the archived scores of a closed week.
    #[poise::command(slash_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Week number (defaults to the latest archived week)"]
        #[min = 1]
        week: Option<i32>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let weeks = report::archived_weeks(db).await?;
        let Some(week) = week.or_else(|| weeks.first().copied()) else {
            ctx.say("📚 No weeks have been archived yet.").await?;
            return Ok(());
        };

        let rows = report::archive_for_week(db, week).await?;
        let mut response = report::format_archive(week, &rows)?;
        if !weeks.is_empty() {
            let listed: Vec<String> = weeks.iter().map(ToString::to_string).collect();
            write!(response, "\nArchived weeks: {}", listed.join(", "))?;
        }

        say_long(ctx, &response).await
    }

    /// Lists the violations of a week with class rankings.
    #[poise::command(slash_command)]
    pub async fn weekly_report(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Week number (defaults to the current week)"]
        #[min = 1]
        week: Option<i32>,
    ) -> Result<()> {
        ctx.defer().await?;
        let db = &ctx.data().database;

        let week = match week {
            Some(w) => w,
            None => system_config::get_current_week(db).await?,
        };
        let weekly = report::weekly_report(db, week).await?;
        say_long(ctx, &report::format_weekly_report(&weekly)?).await
    }
}

// Re-export all commands
pub use inner::*;
